//! [`Command`] for generating a [`Receipt`] of a completed [`Transaction`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        dorm, leasing_history, order, receipt, transaction, user, Dorm,
        LeasingHistory, Order, Receipt, Transaction, User,
    },
    infra::{database, storage, Database, Storage},
    Service,
};

use super::Command;

/// [`Command`] for generating a [`Receipt`] of a completed [`Transaction`].
///
/// Generation is idempotent: re-executing it for the same [`Transaction`]
/// returns the already existing [`Receipt`].
#[derive(Clone, Debug)]
pub struct CreateReceipt {
    /// ID of the completed [`Transaction`] to generate the [`Receipt`] of.
    pub transaction_id: transaction::Id,

    /// ID of the [`User`] the [`Receipt`] belongs to.
    ///
    /// Must be the tenant who paid the [`Transaction`].
    pub owner_id: user::Id,
}

impl<Db, Pg, Ds> Command<CreateReceipt> for Service<Db, Pg, Ds>
where
    Ds: Storage,
    Db: Database<
            Select<By<Option<Transaction>, transaction::Id>>,
            Ok = Option<Transaction>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Receipt>, transaction::Id>>,
            Ok = Option<Receipt>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<LeasingHistory>, leasing_history::Id>>,
            Ok = Option<LeasingHistory>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Dorm>, dorm::Id>>,
            Ok = Option<Dorm>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Receipt>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Receipt;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateReceipt) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateReceipt { transaction_id, owner_id } = cmd;

        let transaction = self
            .database()
            .execute(Select(By::<Option<Transaction>, _>::new(
                transaction_id.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::TransactionNotExists(transaction_id.clone()))
            .map_err(tracerr::wrap!())?;
        if transaction.status != transaction::Status::Complete {
            return Err(tracerr::new!(E::NotComplete(transaction.status)));
        }

        if let Some(existing) = self
            .database()
            .execute(Select(By::<Option<Receipt>, _>::new(
                transaction_id.clone(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            if existing.owner_id != owner_id {
                return Err(tracerr::new!(E::NotOwner(owner_id)));
            }
            return Ok(existing);
        }

        let order = self
            .database()
            .execute(Select(By::<Option<Order>, _>::new(transaction.order_id)))
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
        if history.tenant_id != owner_id {
            return Err(tracerr::new!(E::NotOwner(owner_id)));
        }

        let dorm = self
            .database()
            .execute(Select(By::<Option<Dorm>, _>::new(history.dorm_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DormNotExists(history.dorm_id))
            .map_err(tracerr::wrap!())?;
        let tenant = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(history.tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(history.tenant_id))
            .map_err(tracerr::wrap!())?;
        let landlord = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(dorm.owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(dorm.owner_id))
            .map_err(tracerr::wrap!())?;

        let receipt = Receipt {
            id: receipt::Id::new(),
            owner_id,
            transaction_id: transaction.id.clone(),
            document_key: receipt::DocumentKey::of(&transaction.id),
            created_at: DateTime::now().coerce(),
        };
        let document = format!(
            "RECEIPT {id}\n\
             Transaction: {tx}\n\
             Order: {kind}\n\
             Dorm: {dorm}\n\
             Landlord: {landlord}\n\
             Tenant: {tenant}\n\
             Amount: {amount}\n\
             Issued: {issued}\n",
            id = receipt.id,
            tx = transaction.id,
            kind = order.kind,
            dorm = dorm.name,
            landlord = landlord.name,
            tenant = tenant.name,
            amount = transaction.price,
            issued = DateTime::now().to_rfc3339(),
        );

        self.storage()
            .put(&receipt.document_key, "text/plain", document.into_bytes())
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        match self.database().execute(Insert(receipt.clone())).await {
            Ok(()) => Ok(receipt),
            // A concurrent generation won the race. The unique constraint on
            // the transaction ID guarantees at most one receipt, so pick up
            // the winner's row.
            Err(e)
                if e.as_ref()
                    .is_unique_violation(Some("receipts_transaction_id_key")) =>
            {
                self.database()
                    .execute(Select(By::<Option<Receipt>, _>::new(
                        transaction.id.clone(),
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or_else(|| E::TransactionNotExists(transaction.id))
                    .map_err(tracerr::wrap!())
            }
            Err(e) => Err(e).map_err(tracerr::map_from_and_wrap!(=> E)),
        }
    }
}

/// Error of [`CreateReceipt`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Storage`] error.
    #[display("`Storage` operation failed: {_0}")]
    #[from]
    Storage(storage::Error),

    /// [`Transaction`] with the provided ID doesn't exist.
    #[display("`Transaction(id: {_0})` doesn't exist")]
    TransactionNotExists(#[error(not(source))] transaction::Id),

    /// [`Transaction`] hasn't completed successfully.
    #[display("transaction is `{_0}`, not `COMPLETE`")]
    NotComplete(#[error(not(source))] transaction::Status),

    /// Provided [`User`] is not the payer of the [`Transaction`].
    #[display("`User(id: {_0})` is not the payer of this transaction")]
    NotOwner(#[error(not(source))] user::Id),

    /// [`Order`] of the [`Transaction`] doesn't exist.
    #[display("`Order(id: {_0})` doesn't exist")]
    OrderNotExists(#[error(not(source))] order::Id),

    /// [`LeasingHistory`] of the [`Order`] doesn't exist.
    #[display("`LeasingHistory(id: {_0})` doesn't exist")]
    HistoryNotExists(#[error(not(source))] leasing_history::Id),

    /// [`Dorm`] of the [`LeasingHistory`] doesn't exist.
    #[display("`Dorm(id: {_0})` doesn't exist")]
    DormNotExists(#[error(not(source))] dorm::Id),

    /// [`User`] referenced by the [`Transaction`] chain doesn't exist.
    #[display("`User(id: {_0})` doesn't exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
