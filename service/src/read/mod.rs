//! Read entities definitions.

pub mod contract;
pub mod leasing_history;
pub mod leasing_request;
pub mod order;
pub mod receipt;
pub mod transaction;
