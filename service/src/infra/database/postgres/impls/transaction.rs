//! [`Transaction`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{order, transaction, Transaction},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Constructs a [`Transaction`] from the provided [`Row`].
fn from_row(row: &Row) -> Transaction {
    Transaction {
        id: row.get("id"),
        order_id: row.get("order_id"),
        status: row.get("status"),
        price: Money {
            amount: row.get("price_amount"),
            currency: row.get("price_currency"),
        },
        last_event_id: row.get("last_event_id"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Transaction>, transaction::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Transaction>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Transaction>, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: transaction::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, order_id, status, price_amount, price_currency, \
                   last_event_id, created_at \
            FROM transactions \
            WHERE id = $1::VARCHAR \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row)))
    }
}

impl<C>
    Database<
        Select<By<Option<read::transaction::Open<Transaction>>, order::Id>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<read::transaction::Open<Transaction>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<read::transaction::Open<Transaction>>, order::Id>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let order_id: order::Id = by.into_inner();
        let open = transaction::Status::Open;

        const SQL: &str = "\
            SELECT id, order_id, status, price_amount, price_currency, \
                   last_event_id, created_at \
            FROM transactions \
            WHERE order_id = $1::UUID AND status = $2::INT2 \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&order_id, &open])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| read::transaction::Open(from_row(&row))))
    }
}

impl<C> Database<Insert<Transaction>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Transaction>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(transaction): Insert<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(transaction)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Transaction>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(transaction): Update<Transaction>,
    ) -> Result<Self::Ok, Self::Err> {
        let Transaction {
            id,
            order_id,
            status,
            price,
            last_event_id,
            created_at,
        } = transaction;

        const SQL: &str = "\
            INSERT INTO transactions (\
                id, order_id, status, price_amount, price_currency, \
                last_event_id, created_at\
            ) \
            VALUES (\
                $1::VARCHAR, $2::UUID, $3::INT2, $4::INT8, $5::INT2, \
                $6::VARCHAR, $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET order_id = EXCLUDED.order_id, \
                status = EXCLUDED.status, \
                price_amount = EXCLUDED.price_amount, \
                price_currency = EXCLUDED.price_currency, \
                last_event_id = EXCLUDED.last_event_id, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &order_id,
                &status,
                &price.amount,
                &price.currency,
                &last_event_id,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<By<Transaction, transaction::CreationDateTime>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<transaction::Id>;
    type Err = Traced<database::Error>;

    /// Expires all the open [`Transaction`]s created before the provided
    /// deadline, returning IDs of the expired ones.
    async fn execute(
        &self,
        Update(by): Update<By<Transaction, transaction::CreationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline: transaction::CreationDateTime = by.into_inner();

        const SQL: &str = "\
            UPDATE transactions \
            SET status = 3 \
            WHERE status = 1 AND created_at < $1::TIMESTAMPTZ \
            RETURNING id";
        Ok(self
            .query(SQL, &[&deadline])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("id"))
            .collect())
    }
}

impl<C> Database<Lock<By<Transaction, transaction::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Transaction, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: transaction::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id FROM transactions \
            WHERE id = $1::VARCHAR \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
