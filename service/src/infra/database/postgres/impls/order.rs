//! [`Order`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{leasing_history, order, Order},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{self, order::Unpaid},
};

/// Constructs an [`Order`] from the provided [`Row`].
fn from_row(row: &Row) -> Order {
    Order {
        id: row.get("id"),
        kind: row.get("kind"),
        price: Money {
            amount: row.get("price_amount"),
            currency: row.get("price_currency"),
        },
        history_id: row.get("history_id"),
        paid_transaction_id: row.get("paid_transaction_id"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Order>, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: order::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, kind, price_amount, price_currency, \
                   history_id, paid_transaction_id, created_at \
            FROM orders \
            WHERE id = $1::UUID \
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
        Select<
            By<Option<Unpaid<Order>>, (leasing_history::Id, order::Kind)>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Unpaid<Order>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Unpaid<Order>>, (leasing_history::Id, order::Kind)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (history_id, kind) = by.into_inner();

        const SQL: &str = "\
            SELECT id, kind, price_amount, price_currency, \
                   history_id, paid_transaction_id, created_at \
            FROM orders \
            WHERE history_id = $1::UUID AND kind = $2::INT2 \
                  AND paid_transaction_id IS NULL \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&history_id, &kind])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Unpaid(from_row(&row))))
    }
}

impl<C>
    Database<Select<By<read::order::list::Page, read::order::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::order::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::order::list::Page, read::order::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::order::list::Selector {
            arguments,
            filter:
                read::order::list::Filter { history_id, tenant_id, kind, paid },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;
        let offset = i64::try_from(arguments.offset()).unwrap();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit, &offset];

        let history_idx = history_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });
        let tenant_idx = tenant_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });
        let kind_idx = kind.as_ref().map(|k| {
            ps.push(k);
            ps.len()
        });

        let sql = format!(
            "SELECT o.id, o.kind, o.price_amount, o.price_currency, \
                    o.history_id, o.paid_transaction_id, o.created_at \
             FROM orders AS o \
             JOIN leasing_histories AS h ON h.id = o.history_id \
             WHERE true \
                   {history_filtering} \
                   {tenant_filtering} \
                   {kind_filtering} \
                   {paid_filtering} \
             ORDER BY o.created_at DESC, o.id DESC \
             LIMIT $1::INT4 OFFSET $2::INT8",
            history_filtering =
                history_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND o.history_id = ${idx}::UUID"))
                }),
            tenant_filtering =
                tenant_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND h.tenant_id = ${idx}::UUID"))
                }),
            kind_filtering = kind_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND o.kind = ${idx}::INT2"))
            }),
            paid_filtering = match paid {
                Some(true) => "AND o.paid_transaction_id IS NOT NULL",
                Some(false) => "AND o.paid_transaction_id IS NULL",
                None => "",
            },
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::order::list::Page::new(
            &arguments,
            rows.iter().map(from_row),
        ))
    }
}

impl<C> Database<Insert<Order>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Order>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(order)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Order>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        let Order {
            id,
            kind,
            price,
            history_id,
            paid_transaction_id,
            created_at,
        } = order;

        const SQL: &str = "\
            INSERT INTO orders (\
                id, kind, price_amount, price_currency, \
                history_id, paid_transaction_id, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::INT2, $3::INT8, $4::INT2, \
                $5::UUID, $6::VARCHAR, $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET kind = EXCLUDED.kind, \
                price_amount = EXCLUDED.price_amount, \
                price_currency = EXCLUDED.price_currency, \
                history_id = EXCLUDED.history_id, \
                paid_transaction_id = EXCLUDED.paid_transaction_id, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &kind,
                &price.amount,
                &price.currency,
                &history_id,
                &paid_transaction_id,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Order, order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Order, order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: order::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id FROM orders \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
