//! [`LeasingRequest`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{dorm, user};
#[cfg(doc)]
use crate::domain::{Contract, Dorm, User};

/// Request of a tenant [`User`] to rent a [`Dorm`], negotiated before any
/// [`Contract`] exists.
#[derive(Clone, Copy, Debug, From)]
pub struct LeasingRequest {
    /// ID of this [`LeasingRequest`].
    pub id: Id,

    /// ID of the requested [`Dorm`].
    pub dorm_id: dorm::Id,

    /// ID of the [`User`] requesting the [`Dorm`].
    pub tenant_id: user::Id,

    /// ID of the [`User`] owning the [`Dorm`].
    pub landlord_id: user::Id,

    /// [`Status`] of this [`LeasingRequest`].
    pub status: Status,

    /// [`DateTime`] when this [`LeasingRequest`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`LeasingRequest`] reached a terminal
    /// [`Status`], if it did.
    pub ended_at: Option<EndDateTime>,
}

impl LeasingRequest {
    /// Returns whether this [`LeasingRequest`] is still negotiable.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }
}

/// ID of a [`LeasingRequest`].
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
    #[doc = "Status of a [`LeasingRequest`]."]
    enum Status {
        #[doc = "Not decided by the landlord yet."]
        Pending = 1,

        #[doc = "Accepted by the landlord."]
        Accepted = 2,

        #[doc = "Rejected by the landlord."]
        Rejected = 3,

        #[doc = "Canceled by the tenant."]
        Canceled = 4,
    }
}

/// [`DateTime`] when a [`LeasingRequest`] was created.
pub type CreationDateTime = DateTimeOf<(LeasingRequest, unit::Creation)>;

/// [`DateTime`] when a [`LeasingRequest`] reached a terminal [`Status`].
pub type EndDateTime = DateTimeOf<(LeasingRequest, unit::End)>;
