//! Background [`Task`]s definitions.

mod background;
pub mod sweep_open_transactions;

pub use common::Handler as Task;

pub use self::{
    background::Background, sweep_open_transactions::SweepOpenTransactions,
};
