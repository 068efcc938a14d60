//! [`Query`] collection related to a single [`Contract`].

use common::operations::By;

use crate::{
    domain::{contract, Contract},
    read::contract::Active,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a non-deleted [`Contract`] by its [`contract::Id`].
pub type ActiveById =
    DatabaseQuery<By<Option<Active<Contract>>, contract::Id>>;
