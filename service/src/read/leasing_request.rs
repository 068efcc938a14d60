//! [`LeasingRequest`] read model definition.

#[cfg(doc)]
use crate::domain::LeasingRequest;

/// Wrapper around [`LeasingRequest`] indicating that it [`is_pending()`].
///
/// [`is_pending()`]: LeasingRequest::is_pending
#[derive(Clone, Copy, Debug)]
pub struct Pending<T>(pub T);

pub mod list {
    //! [`LeasingRequest`]s list definitions.

    use common::define_pagination;

    use crate::domain::{dorm, leasing_request, user};
    #[cfg(doc)]
    use crate::domain::LeasingRequest;

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = crate::domain::LeasingRequest;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// [`dorm::Id`] to list [`LeasingRequest`]s of.
        pub dorm_id: Option<dorm::Id>,

        /// [`user::Id`] of the tenant to list [`LeasingRequest`]s of.
        pub tenant_id: Option<user::Id>,

        /// [`user::Id`] of the landlord to list [`LeasingRequest`]s of.
        pub landlord_id: Option<user::Id>,

        /// [`leasing_request::Status`] to list [`LeasingRequest`]s with.
        pub status: Option<leasing_request::Status>,
    }
}
