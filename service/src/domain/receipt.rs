//! [`Receipt`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{transaction, user};
#[cfg(doc)]
use crate::domain::{Transaction, User};

/// Immutable proof-of-payment document reference, created once a
/// [`Transaction`] completes.
#[derive(Clone, Debug, From)]
pub struct Receipt {
    /// ID of this [`Receipt`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Receipt`].
    pub owner_id: user::Id,

    /// ID of the paid [`Transaction`] this [`Receipt`] proves.
    pub transaction_id: transaction::Id,

    /// [`DocumentKey`] of the rendered document in the storage.
    pub document_key: DocumentKey,

    /// [`DateTime`] when this [`Receipt`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Receipt`].
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

/// Storage key of a rendered [`Receipt`] document.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, Into, PartialEq,
    Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Returns the [`DocumentKey`] a [`Receipt`] document of the provided
    /// [`Transaction`] is stored under.
    #[must_use]
    pub fn of(transaction_id: &transaction::Id) -> Self {
        Self(format!("receipts/{transaction_id}.txt"))
    }
}

/// [`DateTime`] when a [`Receipt`] was created.
pub type CreationDateTime = DateTimeOf<(Receipt, unit::Creation)>;
