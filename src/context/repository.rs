use async_trait::async_trait;

use super::ActiveContext;
use crate::PraxisError;

#[async_trait]
pub trait ActiveContextRepository: Send + Sync {
    async fn get(&self, professional_id: i64) -> Result<Option<ActiveContext>, PraxisError>;

    /// Writes `marker` unless the stored one has a later `updated_at`.
    ///
    /// Returns the marker that is stored afterwards, which is the existing
    /// one when it won.
    async fn set(&self, marker: ActiveContext) -> Result<ActiveContext, PraxisError>;

    /// Idempotent.
    async fn clear(&self, professional_id: i64) -> Result<(), PraxisError>;
}
