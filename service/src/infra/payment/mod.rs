//! Payment gateway integration.

pub mod stripe;

use std::future::Future;

use common::Money;
use derive_more::{AsRef, Display, Error as StdError, From, Into};
use tracerr::Traced;

use crate::domain::{transaction, user};
#[cfg(doc)]
use crate::domain::{Order, Transaction};

pub use self::stripe::Stripe;

/// External payment gateway hosting checkout sessions and reporting their
/// outcome via webhook [`Event`]s.
pub trait Gateway {
    /// Creates a new one-time payment [`Session`] for the provided product
    /// and price, tagged with the payer's contact email.
    ///
    /// # Errors
    ///
    /// If the gateway cannot be reached or rejects the request.
    fn create_one_time_session(
        &self,
        product_name: &str,
        price: Money,
        payer_email: &user::Email,
    ) -> impl Future<Output = Result<Session, Traced<Error>>>;
}

/// Checkout session hosted by a [`Gateway`].
#[derive(Clone, Debug)]
pub struct Session {
    /// Identifier of this [`Session`], used as the [`Transaction`] ID.
    pub id: transaction::Id,

    /// [`CheckoutUrl`] collecting the payment for this [`Session`].
    pub checkout_url: CheckoutUrl,
}

/// URL of a [`Gateway`]-hosted checkout page.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
pub struct CheckoutUrl(String);

/// Webhook event emitted by a [`Gateway`], reporting the outcome of a
/// checkout [`Session`].
///
/// Delivery is at-least-once and possibly reordered.
#[derive(Clone, Debug)]
pub struct Event {
    /// Unique identifier of this [`Event`].
    pub id: transaction::EventId,

    /// [`event::Kind`] of this [`Event`].
    pub kind: event::Kind,

    /// Identifier of the [`Session`] this [`Event`] reports about.
    pub session_id: transaction::Id,
}

pub mod event {
    //! [`Event`]-related definitions.

    use crate::domain::transaction;

    #[cfg(doc)]
    use super::Event;

    /// Kind of a gateway [`Event`].
    ///
    /// Any other kind the gateway may emit is unsupported and rejected
    /// before reaching the reconciliation logic.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum Kind {
        /// Checkout session completed with a successful payment.
        SessionCompleted,

        /// Checkout session expired without a payment.
        SessionExpired,

        /// Delayed payment method succeeded after the session completed.
        AsyncPaymentSucceeded,

        /// Delayed payment method failed after the session completed.
        AsyncPaymentFailed,
    }

    impl Kind {
        /// Parses a [`Kind`] from its wire name.
        ///
        /// [`None`] is returned for unsupported event types.
        #[must_use]
        pub fn from_wire(name: &str) -> Option<Self> {
            Some(match name {
                "checkout.session.completed" => Self::SessionCompleted,
                "checkout.session.expired" => Self::SessionExpired,
                "checkout.session.async_payment_succeeded" => {
                    Self::AsyncPaymentSucceeded
                }
                "checkout.session.async_payment_failed" => {
                    Self::AsyncPaymentFailed
                }
                _ => return None,
            })
        }

        /// Returns the [`transaction::Status`] this [`Kind`] drives a
        /// [`Transaction`] towards.
        ///
        /// [`Transaction`]: crate::domain::Transaction
        #[must_use]
        pub fn target_status(&self) -> transaction::Status {
            match self {
                Self::SessionCompleted | Self::AsyncPaymentSucceeded => {
                    transaction::Status::Complete
                }
                Self::SessionExpired | Self::AsyncPaymentFailed => {
                    transaction::Status::Expired
                }
            }
        }
    }
}

/// [`Gateway`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Failed to reach the [`Gateway`].
    #[display("failed to reach the payment gateway: {_0}")]
    Request(reqwest::Error),

    /// [`Gateway`] returned an unexpected response.
    #[display("unexpected payment gateway response: {_0}")]
    BadResponse(#[error(not(source))] String),
}
