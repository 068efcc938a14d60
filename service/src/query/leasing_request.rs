//! [`Query`] collection related to a single [`LeasingRequest`].

use common::operations::By;

use crate::domain::{leasing_request, LeasingRequest};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`LeasingRequest`] by its [`leasing_request::Id`].
pub type ById =
    DatabaseQuery<By<Option<LeasingRequest>, leasing_request::Id>>;
