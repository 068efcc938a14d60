//! [`Query`] collection related to [`LeasingHistory`] records.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::LeasingHistory, Query};

use super::DatabaseQuery;

/// Queries a list of [`LeasingHistory`] records.
pub type List = DatabaseQuery<
    By<
        read::leasing_history::list::Page,
        read::leasing_history::list::Selector,
    >,
>;
