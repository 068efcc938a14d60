//! [`Dorm`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Rentable dorm unit.
#[derive(Clone, Debug, From)]
pub struct Dorm {
    /// ID of this [`Dorm`].
    pub id: Id,

    /// [`Name`] of this [`Dorm`].
    pub name: Name,

    /// ID of the [`User`] owning this [`Dorm`].
    pub owner_id: user::Id,

    /// Monthly rent price of this [`Dorm`].
    pub monthly_price: Money,

    /// One-time insurance price of this [`Dorm`].
    pub insurance_price: Money,

    /// [`DateTime`] when this [`Dorm`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Dorm`] was deleted.
    pub deleted_at: Option<DeletionDateTime>,
}

/// ID of a [`Dorm`].
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

/// Name of a [`Dorm`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` is not empty.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// [`DateTime`] when a [`Dorm`] was created.
pub type CreationDateTime = DateTimeOf<(Dorm, unit::Creation)>;

/// [`DateTime`] when a [`Dorm`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Dorm, unit::Deletion)>;
