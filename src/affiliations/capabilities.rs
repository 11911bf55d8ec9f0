//! Named capabilities and the set type stored on every affiliation.
//!
//! Stored form is the permission map used by the setup scripts:
//! `{"consultation": true, "billing": false}`. A `false` entry grants
//! nothing; it cannot take away a capability the role already implies.
//! Names outside [`Capability`] are kept verbatim and written back, so a
//! grant made by a newer setup script survives a load and re-save.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PraxisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Consultation,
    Prescription,
    ViewPatients,
    ManageAppointments,
    Billing,
    Dispense,
    ManageInventory,
    LabResults,
    ManageDepartment,
    ManageEstablishment,
    ViewAllReports,
    ManageAllStaff,
}

impl Capability {
    pub const ALL: [Self; 12] = [
        Self::Consultation,
        Self::Prescription,
        Self::ViewPatients,
        Self::ManageAppointments,
        Self::Billing,
        Self::Dispense,
        Self::ManageInventory,
        Self::LabResults,
        Self::ManageDepartment,
        Self::ManageEstablishment,
        Self::ViewAllReports,
        Self::ManageAllStaff,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consultation => "consultation",
            Self::Prescription => "prescription",
            Self::ViewPatients => "view_patients",
            Self::ManageAppointments => "manage_appointments",
            Self::Billing => "billing",
            Self::Dispense => "dispense",
            Self::ManageInventory => "manage_inventory",
            Self::LabResults => "lab_results",
            Self::ManageDepartment => "manage_department",
            Self::ManageEstablishment => "manage_establishment",
            Self::ViewAllReports => "view_all_reports",
            Self::ManageAllStaff => "manage_all_staff",
        }
    }
}

impl FromStr for Capability {
    type Err = PraxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| PraxisError::Validation(format!("unknown capability \"{s}\"")))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An additive set of capabilities.
///
/// ```rust
/// use praxis::affiliations::{Capability, CapabilitySet};
///
/// let mut caps = CapabilitySet::new();
/// caps.grant(Capability::Billing);
/// assert!(caps.can(Capability::Billing));
/// assert!(!caps.can(Capability::Prescription));
///
/// caps.grant_named("view_consultations");
/// assert!(caps.has("view_consultations"));
/// assert!(caps.has("billing"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    capabilities: BTreeSet<Capability>,
    /// Granted names with no [`Capability`] variant.
    other: BTreeSet<String>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, capability: Capability) {
        self.capabilities.insert(capability);
    }

    /// Removes an explicit grant.
    pub fn revoke(&mut self, capability: Capability) {
        self.capabilities.remove(&capability);
    }

    /// Grants a capability by name. Known names map onto [`Capability`].
    pub fn grant_named(&mut self, name: &str) {
        match name.parse::<Capability>() {
            Ok(capability) => self.grant(capability),
            Err(_) => {
                self.other.insert(name.to_owned());
            }
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Checks a capability by name, including names with no enum variant.
    pub fn has(&self, name: &str) -> bool {
        match name.parse::<Capability>() {
            Ok(capability) => self.can(capability),
            Err(_) => self.other.contains(name),
        }
    }

    /// Adds every capability of `other`.
    pub fn extend_from(&mut self, other: &Self) {
        self.capabilities.extend(other.capabilities.iter().copied());
        self.other.extend(other.other.iter().cloned());
    }

    /// True when every capability of `other` is also in `self`.
    pub fn is_superset(&self, other: &Self) -> bool {
        self.capabilities.is_superset(&other.capabilities) && self.other.is_superset(&other.other)
    }

    /// Known capabilities only. See [`Self::names`] for the full set.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().copied()
    }

    /// Every granted name in sorted order, known or not.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        let all: BTreeSet<&str> = self
            .capabilities
            .iter()
            .map(|c| c.as_str())
            .chain(self.other.iter().map(String::as_str))
            .collect();
        all.into_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty() && self.other.is_empty()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len() + self.other.len()
    }

    /// Serialize to the stored permission-map form.
    ///
    /// Format: `{"billing": true, "consultation": true}`
    pub fn to_json(&self) -> String {
        let map: BTreeMap<&str, bool> = self.names().map(|name| (name, true)).collect();
        serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_owned())
    }

    /// Parse a stored permission map.
    ///
    /// Accepts the object form (`{"billing": true}`) and a plain array of
    /// names. Malformed JSON is an error.
    pub fn from_json(json: &str) -> Result<Self, PraxisError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| PraxisError::Validation(format!("malformed permission map: {e}")))?;

        let names: Vec<String> = match value {
            serde_json::Value::Object(map) => map
                .into_iter()
                .filter(|(_, granted)| granted.as_bool().unwrap_or(false))
                .map(|(name, _)| name)
                .collect(),
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| item.as_str().map(ToOwned::to_owned))
                .collect(),
            serde_json::Value::Null => Vec::new(),
            _ => {
                return Err(PraxisError::Validation(
                    "permission map must be an object or an array".into(),
                ));
            }
        };

        let mut set = Self::new();
        for name in names {
            set.grant_named(&name);
        }
        if !set.other.is_empty() {
            log::debug!(
                target: "praxis",
                "msg=\"permission map carries custom capabilities\", count={}",
                set.other.len()
            );
        }
        Ok(set)
    }
}

impl Serialize for CapabilitySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

impl<'de> Deserialize<'de> for CapabilitySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let mut set = Self::new();
        for name in &names {
            set.grant_named(name);
        }
        Ok(set)
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self {
            capabilities: iter.into_iter().collect(),
            other: BTreeSet::new(),
        }
    }
}

/// Builder for capability sets with a fluent API.
#[must_use]
#[derive(Default)]
pub struct CapabilitySetBuilder {
    set: CapabilitySet,
}

impl CapabilitySetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, capability: Capability) -> Self {
        self.set.grant(capability);
        self
    }

    pub fn build(self) -> CapabilitySet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_and_check() {
        let mut caps = CapabilitySet::new();
        caps.grant(Capability::Consultation);
        caps.grant(Capability::Billing);

        assert!(caps.can(Capability::Consultation));
        assert!(caps.can(Capability::Billing));
        assert!(!caps.can(Capability::ManageAllStaff));
        assert_eq!(caps.len(), 2);
    }

    #[test]
    fn test_revoke() {
        let mut caps = CapabilitySetBuilder::new()
            .grant(Capability::Billing)
            .grant(Capability::Dispense)
            .build();

        caps.revoke(Capability::Billing);

        assert!(!caps.can(Capability::Billing));
        assert!(caps.can(Capability::Dispense));
    }

    #[test]
    fn test_json_object_form() {
        let caps = CapabilitySet::from_json(
            r#"{"consultation": true, "billing": false, "manage_appointments": true}"#,
        )
        .unwrap();

        assert!(caps.can(Capability::Consultation));
        assert!(caps.can(Capability::ManageAppointments));
        assert!(!caps.can(Capability::Billing));
    }

    #[test]
    fn test_json_array_form_keeps_custom_names() {
        let caps = CapabilitySet::from_json(r#"["dispense", "teleconsultation"]"#).unwrap();

        assert_eq!(caps.len(), 2);
        assert!(caps.can(Capability::Dispense));
        assert!(caps.has("teleconsultation"));
        assert!(!caps.has("radiology"));
    }

    #[test]
    fn test_custom_names_survive_reload() {
        let caps =
            CapabilitySet::from_json(r#"{"consultation": true, "view_consultations": true}"#)
                .unwrap();

        let stored = caps.to_json();
        assert_eq!(stored, r#"{"consultation":true,"view_consultations":true}"#);

        let reloaded = CapabilitySet::from_json(&stored).unwrap();
        assert_eq!(reloaded, caps);
        assert!(reloaded.can(Capability::Consultation));
        assert!(reloaded.has("view_consultations"));
        assert_eq!(
            reloaded.names().collect::<Vec<_>>(),
            ["consultation", "view_consultations"]
        );
    }

    #[test]
    fn test_custom_names_are_unioned() {
        let mut effective = CapabilitySetBuilder::new().grant(Capability::Billing).build();
        let explicit = CapabilitySet::from_json(r#"["view_consultations"]"#).unwrap();

        effective.extend_from(&explicit);

        assert!(effective.has("view_consultations"));
        assert!(effective.has("billing"));
        assert!(effective.is_superset(&explicit));
        assert!(!explicit.is_superset(&effective));
    }

    #[test]
    fn test_json_malformed() {
        assert!(matches!(
            CapabilitySet::from_json("{not json"),
            Err(PraxisError::Validation(_))
        ));
        assert!(CapabilitySet::from_json("42").is_err());
        assert!(CapabilitySet::from_json("null").unwrap().is_empty());
    }

    #[test]
    fn test_to_json_is_stable() {
        let caps = CapabilitySetBuilder::new()
            .grant(Capability::ViewAllReports)
            .grant(Capability::Billing)
            .build();

        assert_eq!(caps.to_json(), r#"{"billing":true,"view_all_reports":true}"#);
        assert_eq!(CapabilitySet::from_json(&caps.to_json()).unwrap(), caps);
    }

    #[test]
    fn test_capability_parse() {
        for capability in Capability::ALL {
            assert_eq!(capability.as_str().parse::<Capability>(), Ok(capability));
        }
        assert!("fly".parse::<Capability>().is_err());
    }

    #[test]
    fn test_serializes_as_list() {
        let caps = CapabilitySetBuilder::new()
            .grant(Capability::Prescription)
            .grant(Capability::Consultation)
            .build();
        assert_eq!(
            serde_json::to_string(&caps).unwrap(),
            r#"["consultation","prescription"]"#
        );

        let parsed: CapabilitySet =
            serde_json::from_str(r#"["prescription","home_visits"]"#).unwrap();
        assert!(parsed.can(Capability::Prescription));
        assert!(parsed.has("home_visits"));
    }
}
