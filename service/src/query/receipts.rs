//! [`Query`] collection related to [`Receipt`]s.

use common::operations::By;

use crate::{
    domain::{receipt, transaction, Receipt},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Receipt`] by its [`receipt::Id`].
pub type ById = DatabaseQuery<By<Option<Receipt>, receipt::Id>>;

/// Queries a [`Receipt`] by the [`transaction::Id`] it proves.
pub type ByTransaction =
    DatabaseQuery<By<Option<Receipt>, transaction::Id>>;

/// Queries a list of [`Receipt`]s.
pub type List = DatabaseQuery<
    By<read::receipt::list::Page, read::receipt::list::Selector>,
>;
