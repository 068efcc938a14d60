//! [`Order`] read model definition.

#[cfg(doc)]
use crate::domain::Order;

/// Wrapper around [`Order`] indicating that it's not [`is_paid()`] yet.
///
/// [`is_paid()`]: Order::is_paid
#[derive(Clone, Copy, Debug)]
pub struct Unpaid<T>(pub T);

pub mod list {
    //! [`Order`]s list definitions.

    use common::define_pagination;

    use crate::domain::{leasing_history, order, user};
    #[cfg(doc)]
    use crate::domain::Order;

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = crate::domain::Order;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// [`leasing_history::Id`] to list [`Order`]s of.
        pub history_id: Option<leasing_history::Id>,

        /// [`user::Id`] of the tenant whose [`Order`]s to list.
        pub tenant_id: Option<user::Id>,

        /// [`order::Kind`] to list [`Order`]s with.
        pub kind: Option<order::Kind>,

        /// Indicator whether only paid (`true`) or only unpaid (`false`)
        /// [`Order`]s should be listed.
        pub paid: Option<bool>,
    }
}
