//! [`SweepOpenTransactions`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Start, Update};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{transaction, Transaction},
    infra::{database, Database},
    Service,
};

use super::Task;

/// Configuration for [`SweepOpenTransactions`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between sweeps.
    pub interval: time::Duration,

    /// Lifetime of a gateway checkout session, after which an [`Open`]
    /// [`Transaction`] is considered abandoned.
    ///
    /// [`Open`]: transaction::Status::Open
    pub session_lifetime: time::Duration,
}

/// [`Task`] expiring [`Open`] [`Transaction`]s whose checkout session has
/// outlived the gateway session lifetime.
///
/// Such [`Transaction`]s are left behind when the gateway never resolves a
/// session, or when a crash loses the webhook delivery for it. Only the
/// `Open` → `Expired` transition is ever applied, so a late webhook that
/// already reconciled the [`Transaction`] is never overridden.
///
/// [`Open`]: transaction::Status::Open
#[derive(Clone, Copy, Debug)]
pub struct SweepOpenTransactions<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Pg, Ds> Task<Start<By<SweepOpenTransactions<Self>, Config>>>
    for Service<Db, Pg, Ds>
where
    SweepOpenTransactions<Service<Db, Pg, Ds>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<SweepOpenTransactions<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = SweepOpenTransactions { config, service: self.clone() };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::SweepOpenTransactions` failed: {e}");
            });
        }
    }
}

impl<Db, Pg, Ds> Task<Perform<()>>
    for SweepOpenTransactions<Service<Db, Pg, Ds>>
where
    Db: Database<
        Update<By<Transaction, transaction::CreationDateTime>>,
        Ok = Vec<transaction::Id>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let deadline = transaction::CreationDateTime::now()
            - self.config.session_lifetime;
        let expired = self
            .service
            .database()
            .execute(Update(By::new(deadline)))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;
        if !expired.is_empty() {
            log::info!("expired {} abandoned transaction(s)", expired.len());
        }
        Ok(())
    }
}

/// Error of [`SweepOpenTransactions`] execution.
pub type ExecutionError = Traced<database::Error>;
