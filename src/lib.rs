//! WarmeLeads — chat funnel, lead package recommendation, and checkout
//! hand-off.

pub mod checkout;
pub mod config;
pub mod error;
pub mod funnel;
pub mod notify;
pub mod store;
