//! [`Query`] collection related to the multiple [`LeasingRequest`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::LeasingRequest, Query};

use super::DatabaseQuery;

/// Queries a list of [`LeasingRequest`]s.
pub type List = DatabaseQuery<
    By<read::leasing_request::list::Page, read::leasing_request::list::Selector>,
>;
