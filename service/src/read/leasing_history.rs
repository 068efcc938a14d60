//! [`LeasingHistory`] read model definition.

#[cfg(doc)]
use crate::domain::LeasingHistory;

/// Wrapper around [`LeasingHistory`] indicating that it [`is_open()`].
///
/// [`is_open()`]: LeasingHistory::is_open
#[derive(Clone, Copy, Debug)]
pub struct Open<T>(pub T);

pub mod list {
    //! [`LeasingHistory`] list definitions.

    use common::define_pagination;

    use crate::domain::{dorm, user};
    #[cfg(doc)]
    use crate::domain::LeasingHistory;

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = crate::domain::LeasingHistory;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// [`dorm::Id`] to list [`LeasingHistory`] records of.
        pub dorm_id: Option<dorm::Id>,

        /// [`user::Id`] of the tenant to list [`LeasingHistory`] records of.
        pub tenant_id: Option<user::Id>,
    }
}
