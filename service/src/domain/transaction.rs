//! [`Transaction`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

use crate::domain::order;
#[cfg(doc)]
use crate::domain::Order;

/// Payment attempt for an [`Order`], keyed by the payment gateway checkout
/// session it was collected through.
#[derive(Clone, Debug, From)]
pub struct Transaction {
    /// ID of this [`Transaction`]: the checkout session identifier issued
    /// by the payment gateway, not a locally generated key.
    pub id: Id,

    /// ID of the [`Order`] this [`Transaction`] pays for.
    pub order_id: order::Id,

    /// [`Status`] of this [`Transaction`].
    pub status: Status,

    /// Price collected by this [`Transaction`].
    pub price: Money,

    /// ID of the last gateway event applied to this [`Transaction`].
    ///
    /// Used to short-circuit webhook redeliveries of the same event.
    pub last_event_id: Option<EventId>,

    /// [`DateTime`] when this [`Transaction`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Transaction`]: a payment gateway checkout session identifier.
#[derive(
    AsRef,
    Clone,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(String);

impl Id {
    /// Creates a new [`Id`] from the provided gateway session identifier.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self(session_id.into())
    }
}

/// ID of a payment gateway event applied to a [`Transaction`].
#[derive(
    AsRef,
    Clone,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Into,
    PartialEq,
    Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct EventId(String);

define_kind! {
    #[doc = "Status of a [`Transaction`]."]
    enum Status {
        #[doc = "Checkout session is created and awaits payment."]
        Open = 1,

        #[doc = "Payment succeeded. Terminal."]
        Complete = 2,

        #[doc = "Checkout session expired or payment failed. Terminal."]
        Expired = 3,
    }
}

impl Status {
    /// Returns whether this [`Status`] is terminal.
    ///
    /// Terminal statuses are never overwritten, even by a late or
    /// redelivered gateway event.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Expired)
    }
}

/// [`DateTime`] when a [`Transaction`] was created.
pub type CreationDateTime = DateTimeOf<(Transaction, unit::Creation)>;
