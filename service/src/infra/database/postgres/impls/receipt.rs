//! [`Receipt`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{receipt, transaction, Receipt},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Constructs a [`Receipt`] from the provided [`Row`].
fn from_row(row: &Row) -> Receipt {
    Receipt {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        transaction_id: row.get("transaction_id"),
        document_key: row.get("document_key"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Receipt>, receipt::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Receipt>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Receipt>, receipt::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: receipt::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, owner_id, transaction_id, document_key, created_at \
            FROM receipts \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row)))
    }
}

impl<C> Database<Select<By<Option<Receipt>, transaction::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Receipt>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Receipt>, transaction::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let transaction_id: transaction::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, owner_id, transaction_id, document_key, created_at \
            FROM receipts \
            WHERE transaction_id = $1::VARCHAR \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&transaction_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row)))
    }
}

impl<C>
    Database<
        Select<By<read::receipt::list::Page, read::receipt::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::receipt::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::receipt::list::Page, read::receipt::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::receipt::list::Selector {
            arguments,
            filter: read::receipt::list::Filter { owner_id },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;
        let offset = i64::try_from(arguments.offset()).unwrap();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit, &offset];

        let owner_idx = owner_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });

        let sql = format!(
            "SELECT id, owner_id, transaction_id, document_key, created_at \
             FROM receipts \
             WHERE true \
                   {owner_filtering} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1::INT4 OFFSET $2::INT8",
            owner_filtering =
                owner_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND owner_id = ${idx}::UUID"))
                }),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::receipt::list::Page::new(
            &arguments,
            rows.iter().map(from_row),
        ))
    }
}

impl<C> Database<Insert<Receipt>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(receipt): Insert<Receipt>,
    ) -> Result<Self::Ok, Self::Err> {
        let Receipt { id, owner_id, transaction_id, document_key, created_at } =
            receipt;

        // No upsert: a second `Receipt` for the same `Transaction` must
        // surface as a unique violation.
        const SQL: &str = "\
            INSERT INTO receipts (\
                id, owner_id, transaction_id, document_key, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::VARCHAR, \
                $5::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[&id, &owner_id, &transaction_id, &document_key, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
