//! REST API surface of [`Order`]s.
//!
//! [`Order`]: service::domain::Order

use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use common::pagination;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, order},
    query, Command as _,
};
use uuid::Uuid;

use crate::{define_error, AsError, Error, Session};

use super::{MoneyValue, PageQuery, PageResponse};

/// Representation of an [`Order`].
///
/// [`Order`]: domain::Order
#[derive(Clone, Debug, Serialize)]
pub struct OrderValue {
    /// ID of the order.
    pub id: Uuid,

    /// Kind of the order.
    pub kind: String,

    /// Price of the order.
    pub price: MoneyValue,

    /// ID of the leasing history the order bills.
    pub history_id: Uuid,

    /// ID of the transaction that paid the order, if any.
    pub paid_transaction_id: Option<String>,

    /// [RFC 3339] timestamp of when the order was created.
    ///
    /// [RFC 3339]: https://datatracker.ietf.org/doc/html/rfc3339
    pub created_at: String,
}

impl From<domain::Order> for OrderValue {
    fn from(order: domain::Order) -> Self {
        Self {
            id: order.id.into(),
            kind: order.kind.to_string(),
            price: order.price.into(),
            history_id: order.history_id.into(),
            paid_transaction_id: order
                .paid_transaction_id
                .map(|id| id.to_string()),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// Body of the [`create()`] endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateRequest {
    /// Kind of the order to create.
    pub kind: String,

    /// ID of the open leasing history the order bills.
    pub history_id: Uuid,
}

/// Response of the [`create()`] endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct CreatedOrderValue {
    /// Created order itself.
    pub order: OrderValue,

    /// URL of the checkout page collecting the payment.
    pub checkout_url: String,
}

/// `POST /orders` endpoint.
///
/// Creates a new order along with its checkout session, returning the URL
/// the payer should be redirected to.
///
/// # Errors
///
/// See [`OrderError`].
pub async fn create(
    Extension(service): Extension<crate::Service>,
    _session: Session,
    Json(body): Json<CreateRequest>,
) -> Result<(StatusCode, Json<CreatedOrderValue>), Error> {
    let kind = body
        .kind
        .parse::<order::Kind>()
        .map_err(|_| Error::from(OrderError::BadKind))?;

    service
        .execute(command::CreateOrder {
            kind,
            history_id: body.history_id.into(),
        })
        .await
        .map(|created| {
            (
                StatusCode::CREATED,
                Json(CreatedOrderValue {
                    order: created.order.into(),
                    checkout_url: created.checkout_url.into(),
                }),
            )
        })
        .map_err(|e| e.into_error())
}

/// `GET /orders/{id}` endpoint.
///
/// # Errors
///
/// See [`OrderError`].
pub async fn get(
    Extension(service): Extension<crate::Service>,
    _session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderValue>, Error> {
    service
        .execute(query::order::ById::by(id.into()))
        .await
        .map_err(|e| e.into_error())?
        .map(|o| Json(o.into()))
        .ok_or_else(|| OrderError::NotFound.into())
}

/// Query parameters of the [`list_unpaid()`] endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Number of items per page.
    pub limit: Option<u32>,

    /// 1-based number of the page to select.
    pub page: Option<u32>,

    /// ID of the leasing history to filter by.
    pub history_id: Option<Uuid>,

    /// Kind to filter by.
    pub kind: Option<String>,
}

/// `GET /orders/unpaid` endpoint.
///
/// Lists unpaid orders of the authenticated user.
///
/// # Errors
///
/// See [`OrderError`].
pub async fn list_unpaid(
    Extension(service): Extension<crate::Service>,
    session: Session,
    Query(params): Query<ListQuery>,
) -> Result<Json<PageResponse<OrderValue>>, Error> {
    let kind = params
        .kind
        .as_deref()
        .map(str::parse::<order::Kind>)
        .transpose()
        .map_err(|_| Error::from(OrderError::BadKind))?;

    let selector = pagination::Selector {
        arguments: PageQuery { limit: params.limit, page: params.page }
            .arguments(),
        filter: service::read::order::list::Filter {
            history_id: params.history_id.map(Into::into),
            tenant_id: Some(session.user_id),
            kind,
            paid: Some(false),
        },
    };
    service
        .execute(query::orders::List::by(selector))
        .await
        .map(|page| Json(PageResponse::new(page)))
        .map_err(|e| e.into_error())
}

impl AsError for command::create_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Gateway(e) => e.try_as_error(),
            Self::HistoryNotExists(_) => {
                Some(OrderError::HistoryNotFound.into())
            }
            Self::HistoryEnded(_) => Some(OrderError::HistoryEnded.into()),
            Self::AlreadyPending(_) => Some(OrderError::AlreadyPending.into()),
            Self::DormNotExists(_) | Self::UserNotExists(_) => None,
        }
    }
}

define_error! {
    enum OrderError {
        #[code = "INVALID_ORDER_KIND"]
        #[status = BAD_REQUEST]
        #[message = "Invalid order kind"]
        BadKind,

        #[code = "HISTORY_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Leasing history not found"]
        HistoryNotFound,

        #[code = "HISTORY_ENDED"]
        #[status = CONFLICT]
        #[message = "Leasing history has already ended"]
        HistoryEnded,

        #[code = "ORDER_ALREADY_PENDING"]
        #[status = CONFLICT]
        #[message = "An unpaid order of this kind already exists"]
        AlreadyPending,

        #[code = "ORDER_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Order not found"]
        NotFound,
    }
}
