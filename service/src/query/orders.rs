//! [`Query`] collection related to the multiple [`Order`]s.

use common::operations::By;

use crate::{
    domain::{leasing_history, order, Order},
    read::{self, order::Unpaid},
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a list of [`Order`]s.
pub type List =
    DatabaseQuery<By<read::order::list::Page, read::order::list::Selector>>;

/// Queries the unpaid [`Order`] of the provided [`LeasingHistory`] and
/// [`order::Kind`], if any.
///
/// [`LeasingHistory`]: crate::domain::LeasingHistory
pub type UnpaidByObligation = DatabaseQuery<
    By<Option<Unpaid<Order>>, (leasing_history::Id, order::Kind)>,
>;
