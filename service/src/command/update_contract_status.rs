//! [`Command`] for signing or cancelling a [`Contract`] on behalf of one of
//! its parties.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        contract, dorm, leasing_history, user, Contract, Dorm, LeasingHistory,
    },
    infra::{database, Database},
    read::{contract::Active, leasing_history::Open},
    Service,
};

use super::Command;

/// [`Command`] for signing or cancelling a [`Contract`] on behalf of one of
/// its parties.
#[derive(Clone, Copy, Debug)]
pub struct UpdateContractStatus {
    /// ID of the [`Contract`] to update.
    pub contract_id: contract::Id,

    /// New [`PartyStatus`] of the acting party.
    ///
    /// [`PartyStatus`]: contract::PartyStatus
    pub status: contract::PartyStatus,

    /// ID of the [`User`] acting on the [`Contract`].
    ///
    /// [`User`]: crate::domain::User
    pub acting_user_id: user::Id,
}

impl<Db, Pg, Ds> Command<UpdateContractStatus> for Service<Db, Pg, Ds>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Active<Contract>>, contract::Id>>,
            Ok = Option<Active<Contract>>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Dorm, dorm::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Open<LeasingHistory>>, dorm::Id>>,
            Ok = Option<Open<LeasingHistory>>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<LeasingHistory>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Contract>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateContractStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateContractStatus { contract_id, status, acting_user_id } = cmd;

        if status == contract::PartyStatus::Waiting {
            return Err(tracerr::new!(E::BadTargetStatus(status)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes with any concurrent transition of the same contract.
        tx.execute(Lock(By::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut contract = tx
            .execute(Select(By::<Option<Active<Contract>>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(contract_id))
            .map_err(tracerr::wrap!())?
            .0;

        let party = contract
            .party_of(acting_user_id)
            .ok_or(E::NotParty(acting_user_id))
            .map_err(tracerr::wrap!())?;

        let previous = contract.status();
        if previous != contract::Status::Waiting {
            return Err(tracerr::new!(E::AlreadyTerminal(previous)));
        }

        *contract.party_status_mut(party) = status;

        if contract.status() == contract::Status::Signed {
            // Both signatures landed, so the dorm becomes occupied. The dorm
            // row lock serializes concurrent signings over the same dorm.
            tx.execute(Lock(By::<Dorm, _>::new(contract.dorm_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            if tx
                .execute(Select(By::<Option<Open<LeasingHistory>>, _>::new(
                    contract.dorm_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .is_some()
            {
                return Err(tracerr::new!(E::DormOccupied(contract.dorm_id)));
            }

            let history = LeasingHistory {
                id: leasing_history::Id::new(),
                dorm_id: contract.dorm_id,
                tenant_id: contract.tenant_id,
                started_at: DateTime::now().coerce(),
                ended_at: None,
            };
            tx.execute(Insert(history))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }

        tx.execute(Update(contract))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(contract)
    }
}

/// Error of [`UpdateContractStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Provided [`PartyStatus`] is not a valid transition target.
    ///
    /// [`PartyStatus`]: contract::PartyStatus
    #[display("`{_0}` is not a valid target status")]
    BadTargetStatus(#[error(not(source))] contract::PartyStatus),

    /// Active [`Contract`] with the provided ID doesn't exist.
    #[display("active `Contract(id: {_0})` doesn't exist")]
    NotExists(#[error(not(source))] contract::Id),

    /// Acting [`User`] is not a party of the [`Contract`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` is not a party of this contract")]
    NotParty(#[error(not(source))] user::Id),

    /// [`Contract`] has already reached a terminal [`Status`].
    ///
    /// [`Status`]: contract::Status
    #[display("contract is already `{_0}`")]
    AlreadyTerminal(#[error(not(source))] contract::Status),

    /// [`Dorm`] already has an open [`LeasingHistory`].
    #[display("`Dorm(id: {_0})` is already leased out")]
    DormOccupied(#[error(not(source))] dorm::Id),
}
