mod balance;
mod report;

pub use balance::CategoryBalance;
pub use report::{OrganizationContact, ProviderContact, ShortageNotification, SupplyDemandReport};
