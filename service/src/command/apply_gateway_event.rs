//! [`Command`] for reconciling a [`Transaction`] with a payment gateway
//! [`Event`].

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        leasing_history, order, transaction, LeasingHistory, Order, Receipt,
        Transaction,
    },
    infra::{database, payment::Event, Database},
    Service,
};

use super::{create_receipt, Command, CreateReceipt};

/// [`Command`] for reconciling a [`Transaction`] with a payment gateway
/// [`Event`].
///
/// Reconciliation is idempotent and monotone: a [`Transaction`] in a
/// terminal [`Status`] is never transitioned again, and redelivered
/// [`Event`]s are acknowledged without re-applying.
///
/// [`Status`]: transaction::Status
#[derive(Clone, Debug)]
pub struct ApplyGatewayEvent(pub Event);

impl<Db, Pg, Ds> Command<ApplyGatewayEvent> for Service<Db, Pg, Ds>
where
    Self: Command<
        CreateReceipt,
        Ok = Receipt,
        Err = Traced<create_receipt::ExecutionError>,
    >,
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<LeasingHistory>, leasing_history::Id>>,
            Ok = Option<LeasingHistory>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Transaction, transaction::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Transaction>, transaction::Id>>,
            Ok = Option<Transaction>,
            Err = Traced<database::Error>,
        > + Database<
            Update<Transaction>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Order, order::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<
            Update<Order>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Transaction;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ApplyGatewayEvent,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApplyGatewayEvent(event) = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes with any concurrently delivered event of the same
        // session.
        tx.execute(Lock(By::new(event.session_id.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut transaction = tx
            .execute(Select(By::<Option<Transaction>, _>::new(
                event.session_id.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::UnknownSession(event.session_id.clone()))
            .map_err(tracerr::wrap!())?;

        if transaction.status.is_terminal() {
            // Already reconciled by an earlier delivery. The receipt is
            // still re-asserted below, as its generation may have failed
            // after the previous commit.
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        } else {
            transaction.status = event.kind.target_status();
            transaction.last_event_id = Some(event.id.clone());
            tx.execute(Update(transaction.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            if transaction.status == transaction::Status::Complete {
                tx.execute(Lock(By::<Order, _>::new(transaction.order_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                let mut order = tx
                    .execute(Select(By::<Option<Order>, _>::new(
                        transaction.order_id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::OrderNotExists(transaction.order_id))
                    .map_err(tracerr::wrap!())?;
                // The first completed payment settles the order. Later ones
                // only get their receipt.
                if order.paid_transaction_id.is_none() {
                    order.paid_transaction_id = Some(transaction.id.clone());
                    tx.execute(Update(order))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?;
                }
            }

            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        if transaction.status == transaction::Status::Complete {
            let order = self
                .database()
                .execute(Select(By::<Option<Order>, _>::new(
                    transaction.order_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::OrderNotExists(transaction.order_id))
                .map_err(tracerr::wrap!())?;
            let history = self
                .database()
                .execute(Select(By::<Option<LeasingHistory>, _>::new(
                    order.history_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::HistoryNotExists(order.history_id))
                .map_err(tracerr::wrap!())?;

            self.execute(CreateReceipt {
                transaction_id: transaction.id.clone(),
                owner_id: history.tenant_id,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        }

        Ok(transaction)
    }
}

/// Error of [`ApplyGatewayEvent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// No [`Transaction`] matches the reported session.
    #[display("`Transaction(id: {_0})` doesn't exist")]
    UnknownSession(#[error(not(source))] transaction::Id),

    /// [`Order`] of the [`Transaction`] doesn't exist.
    #[display("`Order(id: {_0})` doesn't exist")]
    OrderNotExists(#[error(not(source))] order::Id),

    /// [`LeasingHistory`] of the [`Order`] doesn't exist.
    #[display("`LeasingHistory(id: {_0})` doesn't exist")]
    HistoryNotExists(#[error(not(source))] leasing_history::Id),

    /// Generating the [`Receipt`] of the completed [`Transaction`] failed.
    #[display("generating receipt failed: {_0}")]
    #[from]
    Receipt(create_receipt::ExecutionError),
}
