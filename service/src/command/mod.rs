//! [`Command`] definition.

pub mod apply_gateway_event;
pub mod approve_leasing_request;
pub mod cancel_leasing_request;
pub mod create_contract;
pub mod create_leasing_request;
pub mod create_order;
pub mod create_receipt;
pub mod delete_contract;
pub mod reject_leasing_request;
pub mod update_contract_status;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    apply_gateway_event::ApplyGatewayEvent,
    approve_leasing_request::ApproveLeasingRequest,
    cancel_leasing_request::CancelLeasingRequest,
    create_contract::CreateContract,
    create_leasing_request::CreateLeasingRequest,
    create_order::{CreateOrder, CreatedOrder},
    create_receipt::CreateReceipt, delete_contract::DeleteContract,
    reject_leasing_request::RejectLeasingRequest,
    update_contract_status::UpdateContractStatus,
};
