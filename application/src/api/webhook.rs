//! Payment gateway webhook endpoint.

use axum::{body::Bytes, extract::Extension};
use http::StatusCode;
use service::{command, Command as _};

use crate::{define_error, AsError, Error};

/// Name of the header carrying the webhook signature.
const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// `POST /transaction/webhook` endpoint.
///
/// Verifies the signature of the delivered event, decodes it and reconciles
/// the matching transaction. Redelivered events are acknowledged with `200`
/// without being re-applied.
///
/// # Errors
///
/// See [`WebhookError`].
pub async fn transaction(
    Extension(service): Extension<crate::Service>,
    headers: http::HeaderMap,
    body: Bytes,
) -> Result<StatusCode, Error> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::from(WebhookError::BadSignature))?;

    service
        .payment()
        .verify_webhook_signature(&body, signature)
        .map_err(|_| Error::from(WebhookError::BadSignature))?;

    let event = service
        .payment()
        .decode_event(&body)
        .map_err(|_| Error::from(WebhookError::BadEvent))?;

    service
        .execute(command::ApplyGatewayEvent(event))
        .await
        .map(|_| StatusCode::OK)
        .map_err(|e| e.into_error())
}

impl AsError for command::apply_gateway_event::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UnknownSession(_) => {
                Some(WebhookError::UnknownSession.into())
            }
            Self::Receipt(e) => e.try_as_error(),
            Self::OrderNotExists(_) | Self::HistoryNotExists(_) => None,
        }
    }
}

impl AsError for command::create_receipt::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Storage(e) => e.try_as_error(),
            Self::TransactionNotExists(_)
            | Self::NotComplete(_)
            | Self::NotOwner(_)
            | Self::OrderNotExists(_)
            | Self::HistoryNotExists(_)
            | Self::DormNotExists(_)
            | Self::UserNotExists(_) => None,
        }
    }
}

define_error! {
    enum WebhookError {
        #[code = "INVALID_SIGNATURE"]
        #[status = BAD_REQUEST]
        #[message = "Missing or invalid webhook signature"]
        BadSignature,

        #[code = "INVALID_EVENT"]
        #[status = BAD_REQUEST]
        #[message = "Malformed or unsupported webhook event"]
        BadEvent,

        #[code = "UNKNOWN_SESSION"]
        #[status = NOT_FOUND]
        #[message = "No transaction matches the reported session"]
        UnknownSession,
    }
}
