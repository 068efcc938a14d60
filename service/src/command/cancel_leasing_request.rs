//! [`Command`] for canceling a pending [`LeasingRequest`] by its tenant.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{leasing_request, user, LeasingRequest},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for canceling a pending [`LeasingRequest`] by its tenant.
#[derive(Clone, Copy, Debug)]
pub struct CancelLeasingRequest {
    /// ID of the [`LeasingRequest`] to cancel.
    pub id: leasing_request::Id,

    /// ID of the [`User`] performing the cancellation.
    ///
    /// [`User`]: crate::domain::User
    pub acting_user_id: user::Id,
}

impl<Db, Pg, Ds> Command<CancelLeasingRequest> for Service<Db, Pg, Ds>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<LeasingRequest, leasing_request::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<LeasingRequest>, leasing_request::Id>>,
            Ok = Option<LeasingRequest>,
            Err = Traced<database::Error>,
        > + Database<
            Update<LeasingRequest>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = LeasingRequest;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CancelLeasingRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelLeasingRequest { id, acting_user_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut request = tx
            .execute(Select(By::<Option<LeasingRequest>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;

        if request.tenant_id != acting_user_id {
            return Err(tracerr::new!(E::NotTenant(acting_user_id)));
        }
        if !request.is_pending() {
            return Err(tracerr::new!(E::NotPending(request.status)));
        }

        request.status = leasing_request::Status::Canceled;
        request.ended_at = Some(DateTime::now().coerce());
        tx.execute(Update(request))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(request)
    }
}

/// Error of [`CancelLeasingRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`LeasingRequest`] with the provided ID doesn't exist.
    #[display("`LeasingRequest(id: {_0})` doesn't exist")]
    NotExists(#[error(not(source))] leasing_request::Id),

    /// Acting [`User`] is not the tenant who created the [`LeasingRequest`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` is not the tenant of this request")]
    NotTenant(#[error(not(source))] user::Id),

    /// [`LeasingRequest`] is not pending anymore.
    #[display("request is already `{_0}`")]
    NotPending(#[error(not(source))] leasing_request::Status),
}
