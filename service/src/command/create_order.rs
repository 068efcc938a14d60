//! [`Command`] for creating a new [`Order`] along with its checkout
//! [`Session`].
//!
//! [`Session`]: crate::infra::payment::Session

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        dorm, leasing_history, order, transaction, user, Dorm, LeasingHistory,
        Order, Transaction, User,
    },
    infra::{database, payment, Database},
    read::{order::Unpaid, transaction::Open},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Order`] along with its checkout
/// [`Session`].
///
/// [`Session`]: crate::infra::payment::Session
#[derive(Clone, Copy, Debug)]
pub struct CreateOrder {
    /// [`order::Kind`] of the [`Order`] to create.
    pub kind: order::Kind,

    /// ID of the open [`LeasingHistory`] the [`Order`] bills.
    pub history_id: leasing_history::Id,
}

/// Freshly created [`Order`] along with the [`CheckoutUrl`] collecting its
/// payment.
///
/// [`CheckoutUrl`]: payment::CheckoutUrl
#[derive(Clone, Debug)]
pub struct CreatedOrder {
    /// Created [`Order`] itself.
    pub order: Order,

    /// URL of the checkout page collecting the payment.
    pub checkout_url: payment::CheckoutUrl,
}

impl<Db, Pg, Ds> Command<CreateOrder> for Service<Db, Pg, Ds>
where
    Pg: payment::Gateway,
    Db: Database<
            Select<By<Option<LeasingHistory>, leasing_history::Id>>,
            Ok = Option<LeasingHistory>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Unpaid<Order>>, (leasing_history::Id, order::Kind)>>,
            Ok = Option<Unpaid<Order>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Open<Transaction>>, order::Id>>,
            Ok = Option<Open<Transaction>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Dorm>, dorm::Id>>,
            Ok = Option<Dorm>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Order>, Ok = (), Err = Traced<database::Error>>
        + Database<Insert<Transaction>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = CreatedOrder;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateOrder { kind, history_id } = cmd;

        let history = self
            .database()
            .execute(Select(By::<Option<LeasingHistory>, _>::new(history_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::HistoryNotExists(history_id))
            .map_err(tracerr::wrap!())?;
        if !history.is_open() {
            return Err(tracerr::new!(E::HistoryEnded(history_id)));
        }

        // An unpaid order whose checkout session is still open is awaiting
        // its payment. One whose sessions have all expired is re-billed with
        // a fresh session instead of creating a duplicate.
        let rebilled = match self
            .database()
            .execute(Select(By::<Option<Unpaid<Order>>, _>::new((
                history_id, kind,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            Some(Unpaid(existing)) => {
                if self
                    .database()
                    .execute(Select(By::<Option<Open<Transaction>>, _>::new(
                        existing.id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .is_some()
                {
                    return Err(tracerr::new!(E::AlreadyPending(kind)));
                }
                Some(existing)
            }
            None => None,
        };

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

        let (product_name, dorm_price) = match kind {
            order::Kind::Insurance => {
                (format!("Insurance for {}", dorm.name), dorm.insurance_price)
            }
            order::Kind::MonthlyBill => {
                (format!("Monthly bill for {}", dorm.name), dorm.monthly_price)
            }
        };
        // An order's price is fixed at its creation, so a re-billed one keeps
        // it even if the dorm's pricing has changed since.
        let price = rebilled.as_ref().map_or(dorm_price, |o| o.price);

        let session = self
            .payment()
            .create_one_time_session(&product_name, price, &tenant.email)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let is_fresh = rebilled.is_none();
        let order = rebilled.unwrap_or_else(|| Order {
            id: order::Id::new(),
            kind,
            price,
            history_id,
            paid_transaction_id: None,
            created_at: DateTime::now().coerce(),
        });
        let transaction = Transaction {
            id: session.id,
            order_id: order.id,
            status: transaction::Status::Open,
            price,
            last_event_id: None,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if is_fresh {
            tx.execute(Insert(order.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
        }
        tx.execute(Insert(transaction))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(CreatedOrder { order, checkout_url: session.checkout_url })
    }
}

/// Error of [`CreateOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Payment [`Gateway`] error.
    ///
    /// [`Gateway`]: payment::Gateway
    #[display("payment gateway request failed: {_0}")]
    #[from]
    Gateway(payment::Error),

    /// [`LeasingHistory`] with the provided ID doesn't exist.
    #[display("`LeasingHistory(id: {_0})` doesn't exist")]
    HistoryNotExists(#[error(not(source))] leasing_history::Id),

    /// [`LeasingHistory`] with the provided ID has already ended.
    #[display("`LeasingHistory(id: {_0})` has already ended")]
    HistoryEnded(#[error(not(source))] leasing_history::Id),

    /// An unpaid [`Order`] of the same [`order::Kind`] is already awaiting
    /// its payment via an open checkout session.
    #[display("an unpaid `{_0}` order is already awaiting its payment")]
    AlreadyPending(#[error(not(source))] order::Kind),

    /// [`Dorm`] of the [`LeasingHistory`] doesn't exist.
    #[display("`Dorm(id: {_0})` doesn't exist")]
    DormNotExists(#[error(not(source))] dorm::Id),

    /// Tenant [`User`] of the [`LeasingHistory`] doesn't exist.
    #[display("`User(id: {_0})` doesn't exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
