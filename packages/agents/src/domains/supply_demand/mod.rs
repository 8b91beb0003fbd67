//! Supply/demand balance: shortage detection over open posts.

pub mod activities;
pub mod models;
pub mod stage;
pub mod utils;

pub use models::{
    CategoryBalance, OrganizationContact, ProviderContact, ShortageNotification,
    SupplyDemandReport,
};
pub use stage::{SupplyDemandConfig, SupplyDemandStage};
pub use utils::ShortageThresholds;
