//! [`Command`] for creating a new [`Contract`] out of an accepted
//! [`LeasingRequest`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        contract, dorm, leasing_request, user, Contract, Dorm, LeasingRequest,
    },
    infra::{database, Database},
    read::contract::Undecided,
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Contract`] out of an accepted
/// [`LeasingRequest`].
#[derive(Clone, Copy, Debug)]
pub struct CreateContract {
    /// ID of the accepted [`LeasingRequest`] to create the [`Contract`] for.
    pub leasing_request_id: leasing_request::Id,

    /// ID of the [`User`] creating the [`Contract`].
    ///
    /// [`User`]: crate::domain::User
    pub acting_user_id: user::Id,
}

impl<Db, Pg, Ds> Command<CreateContract> for Service<Db, Pg, Ds>
where
    Db: Database<
            Select<By<Option<LeasingRequest>, leasing_request::Id>>,
            Ok = Option<LeasingRequest>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Dorm, dorm::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Undecided<Contract>>, dorm::Id>>,
            Ok = Option<Undecided<Contract>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateContract) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContract { leasing_request_id, acting_user_id } = cmd;

        let request = self
            .database()
            .execute(Select(By::<Option<LeasingRequest>, _>::new(
                leasing_request_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RequestNotExists(leasing_request_id))
            .map_err(tracerr::wrap!())?;

        if request.landlord_id != acting_user_id {
            return Err(tracerr::new!(E::NotLandlord(acting_user_id)));
        }
        if request.status != leasing_request::Status::Accepted {
            return Err(tracerr::new!(E::NotAccepted(request.status)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes with any concurrent contract creation over the same
        // dorm.
        tx.execute(Lock(By::<Dorm, _>::new(request.dorm_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if tx
            .execute(Select(By::<Option<Undecided<Contract>>, _>::new(
                request.dorm_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            return Err(tracerr::new!(E::DormContracted(request.dorm_id)));
        }

        let contract = Contract {
            id: contract::Id::new(),
            dorm_id: request.dorm_id,
            landlord_id: request.landlord_id,
            tenant_id: request.tenant_id,
            landlord_status: contract::PartyStatus::Waiting,
            tenant_status: contract::PartyStatus::Waiting,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };
        tx.execute(Insert(contract))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(contract)
    }
}

/// Error of [`CreateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`LeasingRequest`] with the provided ID doesn't exist.
    #[display("`LeasingRequest(id: {_0})` doesn't exist")]
    RequestNotExists(#[error(not(source))] leasing_request::Id),

    /// Acting [`User`] is not the landlord of the [`LeasingRequest`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` is not the landlord of this request")]
    NotLandlord(#[error(not(source))] user::Id),

    /// [`LeasingRequest`] hasn't been accepted.
    #[display("request is `{_0}`, not `ACCEPTED`")]
    NotAccepted(#[error(not(source))] leasing_request::Status),

    /// [`Dorm`] already has an undecided [`Contract`] over it.
    #[display("`Dorm(id: {_0})` already has an undecided contract")]
    DormContracted(#[error(not(source))] dorm::Id),
}
