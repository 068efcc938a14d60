//! REST API surface of [`LeasingRequest`]s.
//!
//! [`LeasingRequest`]: service::domain::LeasingRequest

use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use common::pagination;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, leasing_request},
    query, Command as _,
};
use uuid::Uuid;

use crate::{define_error, AsError, Error, Session};

use super::{PageQuery, PageResponse};

/// Representation of a [`LeasingRequest`].
///
/// [`LeasingRequest`]: domain::LeasingRequest
#[derive(Clone, Debug, Serialize)]
pub struct LeasingRequestValue {
    /// ID of the leasing request.
    pub id: Uuid,

    /// ID of the requested dorm.
    pub dorm_id: Uuid,

    /// ID of the requesting tenant.
    pub tenant_id: Uuid,

    /// ID of the dorm's landlord.
    pub landlord_id: Uuid,

    /// Status of the leasing request.
    pub status: String,

    /// [RFC 3339] timestamp of when the leasing request was created.
    ///
    /// [RFC 3339]: https://datatracker.ietf.org/doc/html/rfc3339
    pub created_at: String,

    /// [RFC 3339] timestamp of when the leasing request reached a terminal
    /// status, if it did.
    ///
    /// [RFC 3339]: https://datatracker.ietf.org/doc/html/rfc3339
    pub ended_at: Option<String>,
}

impl From<domain::LeasingRequest> for LeasingRequestValue {
    fn from(request: domain::LeasingRequest) -> Self {
        Self {
            id: request.id.into(),
            dorm_id: request.dorm_id.into(),
            tenant_id: request.tenant_id.into(),
            landlord_id: request.landlord_id.into(),
            status: request.status.to_string(),
            created_at: request.created_at.to_rfc3339(),
            ended_at: request.ended_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Body of the [`create()`] endpoint.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CreateRequest {
    /// ID of the dorm to request leasing of.
    pub dorm_id: Uuid,
}

/// `POST /leasing-requests` endpoint.
///
/// Creates a new pending leasing request, with the authenticated user as
/// its tenant.
///
/// # Errors
///
/// See [`RequestError`].
pub async fn create(
    Extension(service): Extension<crate::Service>,
    session: Session,
    Json(body): Json<CreateRequest>,
) -> Result<(StatusCode, Json<LeasingRequestValue>), Error> {
    service
        .execute(command::CreateLeasingRequest {
            dorm_id: body.dorm_id.into(),
            tenant_id: session.user_id,
        })
        .await
        .map(|r| (StatusCode::CREATED, Json(r.into())))
        .map_err(|e| e.into_error())
}

/// `POST /leasing-requests/{id}/approve` endpoint.
///
/// # Errors
///
/// See [`RequestError`].
pub async fn approve(
    Extension(service): Extension<crate::Service>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<LeasingRequestValue>, Error> {
    service
        .execute(command::ApproveLeasingRequest {
            id: id.into(),
            acting_user_id: session.user_id,
        })
        .await
        .map(|r| Json(r.into()))
        .map_err(|e| e.into_error())
}

/// `POST /leasing-requests/{id}/reject` endpoint.
///
/// # Errors
///
/// See [`RequestError`].
pub async fn reject(
    Extension(service): Extension<crate::Service>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<LeasingRequestValue>, Error> {
    service
        .execute(command::RejectLeasingRequest {
            id: id.into(),
            acting_user_id: session.user_id,
        })
        .await
        .map(|r| Json(r.into()))
        .map_err(|e| e.into_error())
}

/// `POST /leasing-requests/{id}/cancel` endpoint.
///
/// # Errors
///
/// See [`RequestError`].
pub async fn cancel(
    Extension(service): Extension<crate::Service>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<LeasingRequestValue>, Error> {
    service
        .execute(command::CancelLeasingRequest {
            id: id.into(),
            acting_user_id: session.user_id,
        })
        .await
        .map(|r| Json(r.into()))
        .map_err(|e| e.into_error())
}

/// `GET /leasing-requests/{id}` endpoint.
///
/// # Errors
///
/// See [`RequestError`].
pub async fn get(
    Extension(service): Extension<crate::Service>,
    _session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<LeasingRequestValue>, Error> {
    service
        .execute(query::leasing_request::ById::by(id.into()))
        .await
        .map_err(|e| e.into_error())?
        .map(|r| Json(r.into()))
        .ok_or_else(|| RequestError::NotFound.into())
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

    /// ID of the landlord to filter by.
    pub landlord_id: Option<Uuid>,

    /// Status to filter by.
    pub status: Option<String>,
}

/// `GET /leasing-requests` endpoint.
///
/// # Errors
///
/// See [`super::ParseError`].
pub async fn list(
    Extension(service): Extension<crate::Service>,
    _session: Session,
    Query(params): Query<ListQuery>,
) -> Result<Json<PageResponse<LeasingRequestValue>>, Error> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<leasing_request::Status>)
        .transpose()
        .map_err(|_| Error::from(super::ParseError::Status))?;

    let selector = pagination::Selector {
        arguments: PageQuery { limit: params.limit, page: params.page }
            .arguments(),
        filter: service::read::leasing_request::list::Filter {
            dorm_id: params.dorm_id.map(Into::into),
            tenant_id: params.tenant_id.map(Into::into),
            landlord_id: params.landlord_id.map(Into::into),
            status,
        },
    };
    service
        .execute(query::leasing_requests::List::by(selector))
        .await
        .map(|page| Json(PageResponse::new(page)))
        .map_err(|e| e.into_error())
}

impl AsError for command::create_leasing_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DormNotExists(_) => Some(RequestError::DormNotFound.into()),
            Self::UserNotExists(_) => Some(RequestError::UserNotFound.into()),
            Self::AlreadyRequested(_) => {
                Some(RequestError::AlreadyRequested.into())
            }
        }
    }
}

impl AsError for command::approve_leasing_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
            Self::NotLandlord(_) => Some(RequestError::NotLandlord.into()),
            Self::NotPending(_) => Some(RequestError::NotPending.into()),
        }
    }
}

impl AsError for command::reject_leasing_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
            Self::NotLandlord(_) => Some(RequestError::NotLandlord.into()),
            Self::NotPending(_) => Some(RequestError::NotPending.into()),
        }
    }
}

impl AsError for command::cancel_leasing_request::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(RequestError::NotFound.into()),
            Self::NotTenant(_) => Some(RequestError::NotTenant.into()),
            Self::NotPending(_) => Some(RequestError::NotPending.into()),
        }
    }
}

define_error! {
    enum RequestError {
        #[code = "DORM_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Dorm not found"]
        DormNotFound,

        #[code = "USER_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "User not found"]
        UserNotFound,

        #[code = "ALREADY_REQUESTED"]
        #[status = CONFLICT]
        #[message = "A pending leasing request for this dorm already exists"]
        AlreadyRequested,

        #[code = "REQUEST_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Leasing request not found"]
        NotFound,

        #[code = "NOT_LANDLORD"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not the landlord of this request"]
        NotLandlord,

        #[code = "NOT_TENANT"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not the tenant of this request"]
        NotTenant,

        #[code = "REQUEST_NOT_PENDING"]
        #[status = CONFLICT]
        #[message = "Leasing request is not pending anymore"]
        NotPending,
    }
}
