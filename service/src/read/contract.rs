//! [`Contract`] read model definition.

#[cfg(doc)]
use crate::domain::Contract;

/// Wrapper around [`Contract`] indicating that it's not soft-deleted.
#[derive(Clone, Copy, Debug)]
pub struct Active<T>(pub T);

/// Wrapper around [`Contract`] indicating that it's not soft-deleted and its
/// derived [`Status`] is still [`Status::Waiting`].
///
/// [`Status`]: crate::domain::contract::Status
/// [`Status::Waiting`]: crate::domain::contract::Status::Waiting
#[derive(Clone, Copy, Debug)]
pub struct Undecided<T>(pub T);

pub mod list {
    //! [`Contract`]s list definitions.

    use common::define_pagination;

    use crate::domain::{contract, dorm, user};
    #[cfg(doc)]
    use crate::domain::Contract;

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = crate::domain::Contract;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// [`dorm::Id`] to list [`Contract`]s of.
        pub dorm_id: Option<dorm::Id>,

        /// [`user::Id`] of a party (either side) to list [`Contract`]s of.
        pub party_id: Option<user::Id>,

        /// Derived [`contract::Status`] to list [`Contract`]s with.
        pub status: Option<contract::Status>,
    }
}
