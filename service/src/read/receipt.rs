//! [`Receipt`] read model definition.

#[cfg(doc)]
use crate::domain::Receipt;

pub mod list {
    //! [`Receipt`]s list definitions.

    use common::define_pagination;

    use crate::domain::user;
    #[cfg(doc)]
    use crate::domain::Receipt;

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = crate::domain::Receipt;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// [`user::Id`] of the owner to list [`Receipt`]s of.
        pub owner_id: Option<user::Id>,
    }
}
