//! REST API surface of [`Contract`]s.
//!
//! [`Contract`]: service::domain::Contract

use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use common::pagination;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, contract},
    query, Command as _,
};
use uuid::Uuid;

use crate::{define_error, AsError, Error, Session};

use super::{PageQuery, PageResponse};

/// Representation of a [`Contract`].
///
/// [`Contract`]: domain::Contract
#[derive(Clone, Debug, Serialize)]
pub struct ContractValue {
    /// ID of the contract.
    pub id: Uuid,

    /// ID of the rented dorm.
    pub dorm_id: Uuid,

    /// ID of the landlord party.
    pub landlord_id: Uuid,

    /// ID of the tenant party.
    pub tenant_id: Uuid,

    /// Signature status of the landlord party.
    pub landlord_status: String,

    /// Signature status of the tenant party.
    pub tenant_status: String,

    /// Overall status of the contract, derived from both party statuses.
    pub status: String,

    /// [RFC 3339] timestamp of when the contract was created.
    ///
    /// [RFC 3339]: https://datatracker.ietf.org/doc/html/rfc3339
    pub created_at: String,
}

impl From<domain::Contract> for ContractValue {
    fn from(contract: domain::Contract) -> Self {
        Self {
            id: contract.id.into(),
            dorm_id: contract.dorm_id.into(),
            landlord_id: contract.landlord_id.into(),
            tenant_id: contract.tenant_id.into(),
            landlord_status: contract.landlord_status.to_string(),
            tenant_status: contract.tenant_status.to_string(),
            status: contract.status().to_string(),
            created_at: contract.created_at.to_rfc3339(),
        }
    }
}

/// Body of the [`create()`] endpoint.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CreateRequest {
    /// ID of the accepted leasing request to create the contract for.
    pub leasing_request_id: Uuid,
}

/// `POST /contracts` endpoint.
///
/// # Errors
///
/// See [`ContractError`].
pub async fn create(
    Extension(service): Extension<crate::Service>,
    session: Session,
    Json(body): Json<CreateRequest>,
) -> Result<(StatusCode, Json<ContractValue>), Error> {
    service
        .execute(command::CreateContract {
            leasing_request_id: body.leasing_request_id.into(),
            acting_user_id: session.user_id,
        })
        .await
        .map(|c| (StatusCode::CREATED, Json(c.into())))
        .map_err(|e| e.into_error())
}

/// Body of the [`update_status()`] endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New signature status of the authenticated party.
    pub status: String,
}

/// `PATCH /contracts/{id}/status` endpoint.
///
/// Signs or cancels the contract on behalf of the authenticated party.
///
/// # Errors
///
/// See [`ContractError`].
pub async fn update_status(
    Extension(service): Extension<crate::Service>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ContractValue>, Error> {
    let status = body
        .status
        .parse::<contract::PartyStatus>()
        .map_err(|_| Error::from(ContractError::BadStatus))?;

    service
        .execute(command::UpdateContractStatus {
            contract_id: id.into(),
            status,
            acting_user_id: session.user_id,
        })
        .await
        .map(|c| Json(c.into()))
        .map_err(|e| e.into_error())
}

/// `DELETE /contracts/{id}` endpoint.
///
/// # Errors
///
/// See [`ContractError`].
pub async fn delete(
    Extension(service): Extension<crate::Service>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    service
        .execute(command::DeleteContract {
            contract_id: id.into(),
            acting_user_id: session.user_id,
        })
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| e.into_error())
}

/// `GET /contracts/{id}` endpoint.
///
/// Soft-deleted contracts are not returned.
///
/// # Errors
///
/// See [`ContractError`].
pub async fn get(
    Extension(service): Extension<crate::Service>,
    _session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<ContractValue>, Error> {
    service
        .execute(query::contract::ActiveById::by(id.into()))
        .await
        .map_err(|e| e.into_error())?
        .map(|active| Json(active.0.into()))
        .ok_or_else(|| ContractError::NotFound.into())
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

    /// ID of a party (either side) to filter by.
    pub party_id: Option<Uuid>,

    /// Derived status to filter by.
    pub status: Option<String>,
}

/// `GET /contracts` endpoint.
///
/// # Errors
///
/// See [`super::ParseError`].
pub async fn list(
    Extension(service): Extension<crate::Service>,
    _session: Session,
    Query(params): Query<ListQuery>,
) -> Result<Json<PageResponse<ContractValue>>, Error> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<contract::Status>)
        .transpose()
        .map_err(|_| Error::from(super::ParseError::Status))?;

    let selector = pagination::Selector {
        arguments: PageQuery { limit: params.limit, page: params.page }
            .arguments(),
        filter: service::read::contract::list::Filter {
            dorm_id: params.dorm_id.map(Into::into),
            party_id: params.party_id.map(Into::into),
            status,
        },
    };
    service
        .execute(query::contracts::List::by(selector))
        .await
        .map(|page| Json(PageResponse::new(page)))
        .map_err(|e| e.into_error())
}

impl AsError for command::create_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::RequestNotExists(_) => {
                Some(ContractError::RequestNotFound.into())
            }
            Self::NotLandlord(_) => Some(ContractError::NotLandlord.into()),
            Self::NotAccepted(_) => {
                Some(ContractError::RequestNotAccepted.into())
            }
            Self::DormContracted(_) => {
                Some(ContractError::DormContracted.into())
            }
        }
    }
}

impl AsError for command::update_contract_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::BadTargetStatus(_) => Some(ContractError::BadStatus.into()),
            Self::NotExists(_) => Some(ContractError::NotFound.into()),
            Self::NotParty(_) => Some(ContractError::NotParty.into()),
            Self::AlreadyTerminal(_) => {
                Some(ContractError::AlreadyTerminal.into())
            }
            Self::DormOccupied(_) => Some(ContractError::DormOccupied.into()),
        }
    }
}

impl AsError for command::delete_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) | Self::NotAdmin(_) => {
                Some(ContractError::NotAdmin.into())
            }
            Self::NotExists(_) => Some(ContractError::NotFound.into()),
        }
    }
}

define_error! {
    enum ContractError {
        #[code = "REQUEST_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Leasing request not found"]
        RequestNotFound,

        #[code = "NOT_LANDLORD"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not the landlord of this request"]
        NotLandlord,

        #[code = "REQUEST_NOT_ACCEPTED"]
        #[status = CONFLICT]
        #[message = "Leasing request hasn't been accepted"]
        RequestNotAccepted,

        #[code = "INVALID_CONTRACT_STATUS"]
        #[status = BAD_REQUEST]
        #[message = "Invalid target contract status"]
        BadStatus,

        #[code = "CONTRACT_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Contract not found"]
        NotFound,

        #[code = "NOT_PARTY"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not a party of this contract"]
        NotParty,

        #[code = "CONTRACT_TERMINAL"]
        #[status = CONFLICT]
        #[message = "Contract has already reached a terminal status"]
        AlreadyTerminal,

        #[code = "DORM_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "Dorm is already leased out"]
        DormOccupied,

        #[code = "DORM_CONTRACTED"]
        #[status = CONFLICT]
        #[message = "Dorm already has an undecided contract"]
        DormContracted,

        #[code = "NOT_ADMIN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated user is not an administrator"]
        NotAdmin,
    }
}
