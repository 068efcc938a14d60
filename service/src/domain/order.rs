//! [`Order`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{leasing_history, transaction};
#[cfg(doc)]
use crate::domain::{LeasingHistory, Transaction};

/// Billable order against a [`LeasingHistory`].
#[derive(Clone, Debug, From)]
pub struct Order {
    /// ID of this [`Order`].
    pub id: Id,

    /// [`Kind`] of this [`Order`].
    pub kind: Kind,

    /// Price of this [`Order`], computed at creation time and immutable
    /// thereafter.
    pub price: Money,

    /// ID of the [`LeasingHistory`] this [`Order`] is billed against.
    pub history_id: leasing_history::Id,

    /// ID of the single [`Transaction`] considered as the one having paid
    /// this [`Order`], if any.
    pub paid_transaction_id: Option<transaction::Id>,

    /// [`DateTime`] when this [`Order`] was created.
    pub created_at: CreationDateTime,
}

impl Order {
    /// Returns whether this [`Order`] is paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.paid_transaction_id.is_some()
    }
}

/// ID of an [`Order`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
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
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Kind of an [`Order`]."]
    enum Kind {
        #[doc = "One-time insurance payment."]
        Insurance = 1,

        #[doc = "Recurring monthly rent bill."]
        MonthlyBill = 2,
    }
}

/// [`DateTime`] when an [`Order`] was created.
pub type CreationDateTime = DateTimeOf<(Order, unit::Creation)>;
