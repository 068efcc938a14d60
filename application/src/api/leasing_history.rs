//! REST API surface of [`LeasingHistory`] records.
//!
//! [`LeasingHistory`]: service::domain::LeasingHistory

use axum::{
    extract::{Extension, Query},
    Json,
};
use common::pagination;
use serde::{Deserialize, Serialize};
use service::{domain, query, Query as _};
use uuid::Uuid;

use crate::{AsError, Error, Session};

use super::{PageQuery, PageResponse};

/// Representation of a [`LeasingHistory`] record.
///
/// [`LeasingHistory`]: domain::LeasingHistory
#[derive(Clone, Debug, Serialize)]
pub struct LeasingHistoryValue {
    /// ID of the leasing history record.
    pub id: Uuid,

    /// ID of the leased dorm.
    pub dorm_id: Uuid,

    /// ID of the leasing tenant.
    pub tenant_id: Uuid,

    /// [RFC 3339] timestamp of when the leasing started.
    ///
    /// [RFC 3339]: https://datatracker.ietf.org/doc/html/rfc3339
    pub started_at: String,

    /// [RFC 3339] timestamp of when the leasing ended, if it did.
    ///
    /// [RFC 3339]: https://datatracker.ietf.org/doc/html/rfc3339
    pub ended_at: Option<String>,
}

impl From<domain::LeasingHistory> for LeasingHistoryValue {
    fn from(history: domain::LeasingHistory) -> Self {
        Self {
            id: history.id.into(),
            dorm_id: history.dorm_id.into(),
            tenant_id: history.tenant_id.into(),
            started_at: history.started_at.to_rfc3339(),
            ended_at: history.ended_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Query parameters of the [`list()`] endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Number of items per page.
    pub limit: Option<u32>,

    /// 1-based number of the page to select.
    pub page: Option<u32>,

    /// ID of the dorm to filter by.
    pub dorm_id: Option<Uuid>,

    /// ID of the tenant to filter by.
    pub tenant_id: Option<Uuid>,
}

/// `GET /leasing-histories` endpoint.
///
/// # Errors
///
/// If the database is unreachable.
pub async fn list(
    Extension(service): Extension<crate::Service>,
    _session: Session,
    Query(params): Query<ListQuery>,
) -> Result<Json<PageResponse<LeasingHistoryValue>>, Error> {
    let selector = pagination::Selector {
        arguments: PageQuery { limit: params.limit, page: params.page }
            .arguments(),
        filter: service::read::leasing_history::list::Filter {
            dorm_id: params.dorm_id.map(Into::into),
            tenant_id: params.tenant_id.map(Into::into),
        },
    };
    service
        .execute(query::leasing_histories::List::by(selector))
        .await
        .map(|page| Json(PageResponse::new(page)))
        .map_err(|e| e.into_error())
}
