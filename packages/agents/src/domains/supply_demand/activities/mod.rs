mod balance;

pub use balance::{
    balance_categories, create_shortage_need, select_organizations, select_providers, Balances,
};
