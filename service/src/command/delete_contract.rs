//! [`Command`] for soft-deleting a [`Contract`].

use common::operations::{By, Delete, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contract, user, Contract, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for soft-deleting a [`Contract`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteContract {
    /// ID of the [`Contract`] to delete.
    pub contract_id: contract::Id,

    /// ID of the [`User`] performing the deletion.
    pub acting_user_id: user::Id,
}

impl<Db, Pg, Ds> Command<DeleteContract> for Service<Db, Pg, Ds>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Contract, contract::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteContract) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteContract { contract_id, acting_user_id } = cmd;

        let actor = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(acting_user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(acting_user_id))
            .map_err(tracerr::wrap!())?;
        if actor.role != user::Role::Admin {
            return Err(tracerr::new!(E::NotAdmin(acting_user_id)));
        }

        self.database()
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(contract_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        self.database()
            .execute(Delete(By::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`DeleteContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Acting [`User`] with the provided ID doesn't exist.
    #[display("`User(id: {_0})` doesn't exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// Acting [`User`] is not an administrator.
    #[display("`User(id: {_0})` is not an administrator")]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Contract`] with the provided ID doesn't exist.
    #[display("`Contract(id: {_0})` doesn't exist")]
    NotExists(#[error(not(source))] contract::Id),
}
