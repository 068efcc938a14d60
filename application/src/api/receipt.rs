//! REST API surface of [`Receipt`]s.
//!
//! [`Receipt`]: service::domain::Receipt

use std::time::Duration;

use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use common::pagination;
use serde::{Deserialize, Serialize};
use service::{
    domain::{self, receipt},
    infra::Storage as _,
    query, Query as _,
};
use uuid::Uuid;

use crate::{define_error, AsError, Error, Session};

use super::{PageQuery, PageResponse};

/// Lifetime of the signed document URLs handed out to clients.
const DOCUMENT_URL_TTL: Duration = Duration::from_secs(10 * 60);

/// Representation of a [`Receipt`].
///
/// [`Receipt`]: domain::Receipt
#[derive(Clone, Debug, Serialize)]
pub struct ReceiptValue {
    /// ID of the receipt.
    pub id: Uuid,

    /// ID of the user the receipt belongs to.
    pub owner_id: Uuid,

    /// ID of the transaction the receipt proves.
    pub transaction_id: String,

    /// [RFC 3339] timestamp of when the receipt was created.
    ///
    /// [RFC 3339]: https://datatracker.ietf.org/doc/html/rfc3339
    pub created_at: String,
}

impl From<domain::Receipt> for ReceiptValue {
    fn from(receipt: domain::Receipt) -> Self {
        Self {
            id: receipt.id.into(),
            owner_id: receipt.owner_id.into(),
            transaction_id: receipt.transaction_id.to_string(),
            created_at: receipt.created_at.to_rfc3339(),
        }
    }
}

/// Query parameters of the [`list()`] endpoint.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Number of items per page.
    pub limit: Option<u32>,

    /// 1-based number of the page to select.
    pub page: Option<u32>,
}

/// `GET /receipts` endpoint.
///
/// Lists receipts of the authenticated user.
///
/// # Errors
///
/// On [`Database`] failures.
///
/// [`Database`]: service::infra::Database
pub async fn list(
    Extension(service): Extension<crate::Service>,
    session: Session,
    Query(params): Query<ListQuery>,
) -> Result<Json<PageResponse<ReceiptValue>>, Error> {
    let selector = pagination::Selector {
        arguments: PageQuery { limit: params.limit, page: params.page }
            .arguments(),
        filter: service::read::receipt::list::Filter {
            owner_id: Some(session.user_id),
        },
    };
    service
        .execute(query::receipts::List::by(selector))
        .await
        .map(|page| Json(PageResponse::new(page)))
        .map_err(|e| e.into_error())
}

/// Response of the [`document()`] endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct DocumentValue {
    /// Signed URL of the receipt document.
    pub url: String,
}

/// `GET /receipts/{id}/document` endpoint.
///
/// Returns a short-lived signed URL of the receipt document.
///
/// # Errors
///
/// See [`ReceiptError`].
pub async fn document(
    Extension(service): Extension<crate::Service>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentValue>, Error> {
    let receipt = service
        .execute(query::receipts::ById::by(receipt::Id::from(id)))
        .await
        .map_err(|e| e.into_error())?
        .ok_or_else(|| Error::from(ReceiptError::NotFound))?;

    if receipt.owner_id != session.user_id {
        return Err(ReceiptError::NotOwner.into());
    }

    let url = service
        .storage()
        .signed_url(&receipt.document_key, DOCUMENT_URL_TTL)
        .await
        .map_err(|e| e.into_error())?;

    Ok(Json(DocumentValue { url }))
}

define_error! {
    enum ReceiptError {
        #[code = "RECEIPT_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Receipt not found"]
        NotFound,

        #[code = "NOT_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not the owner of this receipt"]
        NotOwner,
    }
}
