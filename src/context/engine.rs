//! The context switching engine.
//!
//! A session moves `Unresolved → NoAffiliations | Active(X)` on load, and
//! between `Active` states on switch. The session is only written after
//! every read and the marker write have succeeded, so a failed or abandoned
//! switch leaves the previous context in place.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;

use super::{
    ActiveContext, ActiveContextRepository, ContextState, WorkContext, WorkContextSummary,
    WorkSession,
};
use crate::affiliations::{
    Affiliation, AffiliationRepository, resolve_by_establishment, resolve_capabilities,
};
use crate::config::PraxisConfig;
use crate::directory::EstablishmentRepository;
use crate::events::{PraxisEvent, dispatch};
use crate::retry::RetryPolicy;
use crate::PraxisError;

pub struct ContextEngine<A, E, C>
where
    A: AffiliationRepository,
    E: EstablishmentRepository,
    C: ActiveContextRepository,
{
    affiliation_repo: A,
    establishment_repo: E,
    context_repo: C,
    retry: RetryPolicy,
    switch_timeout: Duration,
}

impl<A, E, C> ContextEngine<A, E, C>
where
    A: AffiliationRepository,
    E: EstablishmentRepository,
    C: ActiveContextRepository,
{
    pub fn new(affiliation_repo: A, establishment_repo: E, context_repo: C) -> Self {
        Self::with_config(
            affiliation_repo,
            establishment_repo,
            context_repo,
            &PraxisConfig::default(),
        )
    }

    pub fn with_config(
        affiliation_repo: A,
        establishment_repo: E,
        context_repo: C,
        config: &PraxisConfig,
    ) -> Self {
        Self {
            affiliation_repo,
            establishment_repo,
            context_repo,
            retry: config.retry.clone(),
            switch_timeout: config.switch_timeout,
        }
    }

    /// Resolves the session's context. Never fails: store errors and unknown
    /// professionals resolve to [`ContextState::NoAffiliations`].
    ///
    /// A persisted marker that still points at an active affiliation is
    /// honoured; otherwise the most recently started active affiliation is
    /// chosen and the marker is rewritten.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "load_work_context", skip(self, session)))]
    pub async fn load_work_context(
        &self,
        session: &mut WorkSession,
        professional_id: i64,
    ) -> ContextState {
        let state = match self.resolve_default(professional_id).await {
            Ok(Some(context)) => ContextState::Active(Box::new(context)),
            Ok(None) => ContextState::NoAffiliations,
            Err(e) => {
                log::warn!(
                    target: "praxis",
                    "msg=\"work context resolution degraded\", professional_id={professional_id}, error=\"{e}\""
                );
                ContextState::NoAffiliations
            }
        };

        session.replace(state.clone());
        state
    }

    async fn resolve_default(&self, professional_id: i64) -> Result<Option<WorkContext>, PraxisError> {
        let candidates: Vec<Affiliation> = self
            .list_affiliations(professional_id)
            .await?
            .into_iter()
            .filter(Affiliation::is_active)
            .collect();

        if candidates.is_empty() {
            return Ok(None);
        }

        let marker = match self.context_repo.get(professional_id).await {
            Ok(marker) => marker,
            Err(e) => {
                log::warn!(
                    target: "praxis",
                    "msg=\"active context marker unreadable\", professional_id={professional_id}, error=\"{e}\""
                );
                None
            }
        };

        let remembered = marker.as_ref().and_then(|m| {
            candidates
                .iter()
                .find(|a| a.id == m.affiliation_id && a.matches(m.establishment_id, m.department_id))
        });

        // marker first, then by start date; skip dangling establishments
        let ordered = remembered.into_iter().chain(candidates.iter());
        for affiliation in ordered {
            let Some(context) = self.build_context(affiliation).await? else {
                continue;
            };

            let stale = remembered.is_none_or(|r| r.id != affiliation.id);
            if stale {
                self.repair_marker(context.marker()).await;
            }
            return Ok(Some(context));
        }

        Ok(None)
    }

    /// Makes the (establishment, department) target the active context.
    ///
    /// Without a department the establishment-level affiliation is preferred,
    /// then the most recently started active one at that establishment.
    ///
    /// - `Err(PraxisError::NotAffiliated)` - no active affiliation matches
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "switch_context", skip(self, session), err)
    )]
    pub async fn switch_context(
        &self,
        session: &mut WorkSession,
        professional_id: i64,
        establishment_id: i64,
        department_id: Option<i64>,
    ) -> Result<WorkContext, PraxisError> {
        let affiliations = self.list_affiliations(professional_id).await?;
        let target = select_target(&affiliations, establishment_id, department_id)
            .ok_or(PraxisError::NotAffiliated)?;

        let context = self
            .build_context(target)
            .await?
            .ok_or(PraxisError::NotAffiliated)?;

        let repo = &self.context_repo;
        let marker = context.marker();
        let stored = self
            .retry
            .run("set_active_context", move || repo.set(marker.clone()))
            .await?;

        if stored.affiliation_id != context.affiliation.id {
            log::info!(
                target: "praxis",
                "msg=\"newer context from another session kept\", professional_id={professional_id}, stored_establishment_id={}",
                stored.establishment_id
            );
        }

        session.replace(ContextState::Active(Box::new(context.clone())));

        log::info!(
            target: "praxis",
            "msg=\"context switched\", professional_id={professional_id}, establishment_id={establishment_id}, affiliation_id={}",
            context.affiliation.id
        );

        dispatch(PraxisEvent::ContextSwitched {
            professional_id,
            establishment_id,
            affiliation_id: context.affiliation.id,
            at: context.activated_at,
        })
        .await;

        Ok(context)
    }

    /// [`switch_context`](Self::switch_context) bounded by the configured
    /// switch timeout.
    ///
    /// On elapse the outcome is unknown: the session is re-resolved with
    /// [`load_work_context`](Self::load_work_context) and `Timeout` is
    /// returned.
    pub async fn switch_context_with_timeout(
        &self,
        session: &mut WorkSession,
        professional_id: i64,
        establishment_id: i64,
        department_id: Option<i64>,
    ) -> Result<WorkContext, PraxisError> {
        let outcome = tokio::time::timeout(
            self.switch_timeout,
            self.switch_context(session, professional_id, establishment_id, department_id),
        )
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    target: "praxis",
                    "msg=\"context switch timed out\", professional_id={professional_id}, establishment_id={establishment_id}, timeout_ms={}",
                    self.switch_timeout.as_millis()
                );
                self.load_work_context(session, professional_id).await;
                Err(PraxisError::Timeout)
            }
        }
    }

    /// Establishments the professional can switch to, one entry each.
    pub async fn list_my_establishments(
        &self,
        session: &WorkSession,
        professional_id: i64,
    ) -> Result<Vec<WorkContextSummary>, PraxisError> {
        let active: Vec<Affiliation> = self
            .list_affiliations(professional_id)
            .await?
            .into_iter()
            .filter(Affiliation::is_active)
            .collect();

        let mut capabilities = resolve_by_establishment(&active);
        let current = session.current_context().map(|c| c.establishment_id);

        let mut grouped: BTreeMap<i64, Vec<&Affiliation>> = BTreeMap::new();
        for affiliation in &active {
            grouped.entry(affiliation.establishment_id).or_default().push(affiliation);
        }

        let mut summaries = Vec::with_capacity(grouped.len());
        for (establishment_id, affiliations) in grouped {
            let Some(establishment) = self.establishment_repo.find_by_id(establishment_id).await?
            else {
                continue;
            };

            let mut roles = Vec::new();
            let mut department_ids = Vec::new();
            for affiliation in affiliations {
                if !roles.contains(&affiliation.role) {
                    roles.push(affiliation.role);
                }
                if !department_ids.contains(&affiliation.department_id) {
                    department_ids.push(affiliation.department_id);
                }
            }

            summaries.push(WorkContextSummary {
                establishment_id,
                establishment_name: establishment.name,
                establishment_type: establishment.establishment_type,
                roles,
                department_ids,
                capabilities: capabilities.remove(&establishment_id).unwrap_or_default(),
                is_current: current == Some(establishment_id),
            });
        }

        summaries.sort_by(|a, b| {
            b.is_current
                .cmp(&a.is_current)
                .then_with(|| a.establishment_name.cmp(&b.establishment_name))
        });

        Ok(summaries)
    }

    /// Logout: discards the session context and the persisted marker.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "clear_context", skip(self, session), err))]
    pub async fn clear_context(
        &self,
        session: &mut WorkSession,
        professional_id: i64,
    ) -> Result<(), PraxisError> {
        session.reset();

        let repo = &self.context_repo;
        self.retry
            .run("clear_active_context", move || repo.clear(professional_id))
            .await?;

        dispatch(PraxisEvent::ContextCleared {
            professional_id,
            at: Utc::now(),
        })
        .await;

        Ok(())
    }

    async fn list_affiliations(&self, professional_id: i64) -> Result<Vec<Affiliation>, PraxisError> {
        let repo = &self.affiliation_repo;
        self.retry
            .run("list_affiliations", move || repo.find_by_professional(professional_id))
            .await
    }

    /// `None` when the establishment row is gone.
    async fn build_context(&self, affiliation: &Affiliation) -> Result<Option<WorkContext>, PraxisError> {
        let repo = &self.establishment_repo;
        let establishment_id = affiliation.establishment_id;
        let Some(establishment) = self
            .retry
            .run("find_establishment", move || repo.find_by_id(establishment_id))
            .await?
        else {
            log::warn!(
                target: "praxis",
                "msg=\"affiliation points at missing establishment\", affiliation_id={}, establishment_id={establishment_id}",
                affiliation.id
            );
            return Ok(None);
        };

        Ok(Some(WorkContext {
            professional_id: affiliation.professional_id,
            establishment_id,
            establishment_name: establishment.name,
            establishment_type: establishment.establishment_type,
            department_id: affiliation.department_id,
            affiliation: affiliation.clone(),
            capabilities: resolve_capabilities(affiliation),
            activated_at: Utc::now(),
        }))
    }

    async fn repair_marker(&self, marker: ActiveContext) {
        let professional_id = marker.professional_id;
        if let Err(e) = self.context_repo.set(marker).await {
            log::warn!(
                target: "praxis",
                "msg=\"active context marker not repaired\", professional_id={professional_id}, error=\"{e}\""
            );
        }
    }
}

/// Picks the affiliation a switch lands on. `affiliations` is newest first.
fn select_target(
    affiliations: &[Affiliation],
    establishment_id: i64,
    department_id: Option<i64>,
) -> Option<&Affiliation> {
    let mut active = affiliations
        .iter()
        .filter(|a| a.establishment_id == establishment_id && a.is_active());

    match department_id {
        Some(_) => active.find(|a| a.department_id == department_id),
        None => {
            let candidates: Vec<&Affiliation> = active.collect();
            candidates
                .iter()
                .find(|a| a.department_id.is_none())
                .or_else(|| candidates.first())
                .copied()
        }
    }
}
