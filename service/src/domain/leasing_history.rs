//! [`LeasingHistory`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{dorm, user};
#[cfg(doc)]
use crate::domain::{Contract, Dorm, Order, User};

/// Billable record of an active or past tenancy, created once a
/// [`Contract`] is fully signed.
#[derive(Clone, Copy, Debug, From)]
pub struct LeasingHistory {
    /// ID of this [`LeasingHistory`].
    pub id: Id,

    /// ID of the rented [`Dorm`].
    pub dorm_id: dorm::Id,

    /// ID of the [`User`] renting the [`Dorm`].
    pub tenant_id: user::Id,

    /// [`DateTime`] when the tenancy started.
    pub started_at: StartDateTime,

    /// [`DateTime`] when the tenancy ended.
    ///
    /// [`None`] means the tenancy is still active, and [`Order`]s may be
    /// billed against this record.
    pub ended_at: Option<EndDateTime>,
}

impl LeasingHistory {
    /// Returns whether this [`LeasingHistory`] is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// ID of a [`LeasingHistory`].
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

/// Marker type describing a tenancy start.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// [`DateTime`] when a [`LeasingHistory`] tenancy started.
pub type StartDateTime = DateTimeOf<(LeasingHistory, unit::Start)>;

/// [`DateTime`] when a [`LeasingHistory`] tenancy ended.
pub type EndDateTime = DateTimeOf<(LeasingHistory, unit::End)>;
