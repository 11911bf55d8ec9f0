mod list;
mod provision;
mod remove;
mod set_status;
mod upsert;

pub use list::ListAffiliationsAction;
pub use provision::{ProvisionAffiliationsAction, ProvisionEntry};
pub use remove::RemoveAffiliationAction;
pub use set_status::SetAffiliationStatusAction;
pub use upsert::{AffiliationAttributes, UpsertAffiliationAction, UpsertAffiliationInput};
