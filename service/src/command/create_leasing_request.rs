//! [`Command`] for creating a new [`LeasingRequest`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{dorm, leasing_request, user, Dorm, LeasingRequest, User},
    infra::{database, Database},
    read::leasing_request::Pending,
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`LeasingRequest`].
#[derive(Clone, Copy, Debug)]
pub struct CreateLeasingRequest {
    /// ID of the [`Dorm`] to request leasing of.
    pub dorm_id: dorm::Id,

    /// ID of the [`User`] requesting the leasing.
    pub tenant_id: user::Id,
}

impl<Db, Pg, Ds> Command<CreateLeasingRequest> for Service<Db, Pg, Ds>
where
    Db: Database<
            Select<By<Option<Dorm>, dorm::Id>>,
            Ok = Option<Dorm>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Pending<LeasingRequest>>, (dorm::Id, user::Id)>>,
            Ok = Option<Pending<LeasingRequest>>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<LeasingRequest>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = LeasingRequest;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateLeasingRequest,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateLeasingRequest { dorm_id, tenant_id } = cmd;

        let dorm = self
            .database()
            .execute(Select(By::<Option<Dorm>, _>::new(dorm_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DormNotExists(dorm_id))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Select(By::<Option<User>, _>::new(tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(tenant_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        if self
            .database()
            .execute(Select(By::<Option<Pending<LeasingRequest>>, _>::new((
                dorm_id, tenant_id,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            return Err(tracerr::new!(E::AlreadyRequested(dorm_id)));
        }

        let request = LeasingRequest {
            id: leasing_request::Id::new(),
            dorm_id,
            tenant_id,
            landlord_id: dorm.owner_id,
            status: leasing_request::Status::Pending,
            created_at: DateTime::now().coerce(),
            ended_at: None,
        };
        self.database()
            .execute(Insert(request))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(request)
    }
}

/// Error of [`CreateLeasingRequest`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Dorm`] with the provided ID doesn't exist.
    #[display("`Dorm(id: {_0})` doesn't exist")]
    DormNotExists(#[error(not(source))] dorm::Id),

    /// [`User`] with the provided ID doesn't exist.
    #[display("`User(id: {_0})` doesn't exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// A pending [`LeasingRequest`] for the [`Dorm`] already exists.
    #[display("`Dorm(id: {_0})` is already requested by this tenant")]
    AlreadyRequested(#[error(not(source))] dorm::Id),
}
