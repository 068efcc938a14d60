//! [`Contract`] definitions.

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
use crate::domain::{Dorm, LeasingHistory, User};

/// Rental contract over a [`Dorm`], signed independently by its landlord
/// and its tenant.
#[derive(Clone, Copy, Debug, From)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// ID of the rented [`Dorm`].
    pub dorm_id: dorm::Id,

    /// ID of the [`User`] renting out the [`Dorm`].
    pub landlord_id: user::Id,

    /// ID of the [`User`] renting the [`Dorm`].
    pub tenant_id: user::Id,

    /// [`PartyStatus`] of the landlord on this [`Contract`].
    pub landlord_status: PartyStatus,

    /// [`PartyStatus`] of the tenant on this [`Contract`].
    pub tenant_status: PartyStatus,

    /// [`DateTime`] when this [`Contract`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Contract`] was deleted.
    pub deleted_at: Option<DeletionDateTime>,
}

impl Contract {
    /// Returns the overall [`Status`] of this [`Contract`], derived from
    /// both party statuses.
    #[must_use]
    pub fn status(&self) -> Status {
        Status::derive(self.landlord_status, self.tenant_status)
    }

    /// Returns the [`Party`] the provided [`User`] acts as on this
    /// [`Contract`], if any.
    #[must_use]
    pub fn party_of(&self, user_id: user::Id) -> Option<Party> {
        if user_id == self.landlord_id {
            Some(Party::Landlord)
        } else if user_id == self.tenant_id {
            Some(Party::Tenant)
        } else {
            None
        }
    }

    /// Returns the [`PartyStatus`] of the provided [`Party`].
    #[must_use]
    pub fn party_status(&self, party: Party) -> PartyStatus {
        match party {
            Party::Landlord => self.landlord_status,
            Party::Tenant => self.tenant_status,
        }
    }

    /// Returns a mutable reference to the [`PartyStatus`] of the provided
    /// [`Party`].
    #[must_use]
    pub fn party_status_mut(&mut self, party: Party) -> &mut PartyStatus {
        match party {
            Party::Landlord => &mut self.landlord_status,
            Party::Tenant => &mut self.tenant_status,
        }
    }
}

/// ID of a [`Contract`].
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

/// Actor on a [`Contract`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Party {
    /// [`User`] renting out the [`Dorm`].
    Landlord,

    /// [`User`] renting the [`Dorm`].
    Tenant,
}

define_kind! {
    #[doc = "Signing status of a single [`Party`] on a [`Contract`]."]
    enum PartyStatus {
        #[doc = "The [`Party`] has not decided yet."]
        Waiting = 1,

        #[doc = "The [`Party`] has signed the [`Contract`]."]
        Signed = 2,

        #[doc = "The [`Party`] has cancelled the [`Contract`]."]
        Cancelled = 3,
    }
}

/// Overall status of a [`Contract`].
///
/// Never stored: always derived from both [`PartyStatus`]es via
/// [`Status::derive()`].
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// At least one [`Party`] has not signed yet, and none cancelled.
    Waiting,

    /// Both parties have signed: the [`LeasingHistory`] exists.
    Signed,

    /// At least one [`Party`] has cancelled.
    Cancelled,
}

impl Status {
    /// Derives the overall [`Status`] from both party statuses.
    #[must_use]
    pub fn derive(landlord: PartyStatus, tenant: PartyStatus) -> Self {
        use PartyStatus as P;

        match (landlord, tenant) {
            (P::Cancelled, _) | (_, P::Cancelled) => Self::Cancelled,
            (P::Signed, P::Signed) => Self::Signed,
            (P::Waiting, _) | (_, P::Waiting) => Self::Waiting,
        }
    }

    /// Returns whether this [`Status`] is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Signed | Self::Cancelled)
    }
}

/// [`DateTime`] when a [`Contract`] was created.
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;

/// [`DateTime`] when a [`Contract`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Contract, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use super::{PartyStatus as P, Status};

    #[test]
    fn derives_overall_status() {
        for (landlord, tenant, expected) in [
            (P::Waiting, P::Waiting, Status::Waiting),
            (P::Waiting, P::Signed, Status::Waiting),
            (P::Signed, P::Waiting, Status::Waiting),
            (P::Signed, P::Signed, Status::Signed),
            (P::Cancelled, P::Waiting, Status::Cancelled),
            (P::Cancelled, P::Signed, Status::Cancelled),
            (P::Cancelled, P::Cancelled, Status::Cancelled),
            (P::Waiting, P::Cancelled, Status::Cancelled),
            (P::Signed, P::Cancelled, Status::Cancelled),
        ] {
            assert_eq!(
                Status::derive(landlord, tenant),
                expected,
                "({landlord:?}, {tenant:?})",
            );
        }
    }
}
