//! Domain entities.

pub mod contract;
pub mod dorm;
pub mod leasing_history;
pub mod leasing_request;
pub mod order;
pub mod receipt;
pub mod transaction;
pub mod user;

pub use self::{
    contract::Contract, dorm::Dorm, leasing_history::LeasingHistory,
    leasing_request::LeasingRequest, order::Order, receipt::Receipt,
    transaction::Transaction, user::User,
};
