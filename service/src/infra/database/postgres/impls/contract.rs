//! [`Contract`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contract, dorm, Contract},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{
        self,
        contract::{Active, Undecided},
    },
};

/// Constructs a [`Contract`] from the provided [`Row`].
fn from_row(row: &Row) -> Contract {
    Contract {
        id: row.get("id"),
        dorm_id: row.get("dorm_id"),
        landlord_id: row.get("landlord_id"),
        tenant_id: row.get("tenant_id"),
        landlord_status: row.get("landlord_status"),
        tenant_status: row.get("tenant_status"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    }
}

/// Returns an SQL predicate matching the provided derived
/// [`contract::Status`].
fn status_predicate(status: contract::Status) -> &'static str {
    match status {
        contract::Status::Cancelled => {
            "AND (landlord_status = 3 OR tenant_status = 3)"
        }
        contract::Status::Signed => {
            "AND landlord_status = 2 AND tenant_status = 2"
        }
        contract::Status::Waiting => {
            "AND landlord_status != 3 AND tenant_status != 3 \
             AND NOT (landlord_status = 2 AND tenant_status = 2)"
        }
    }
}

impl<C> Database<Select<By<Option<Contract>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: contract::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, dorm_id, landlord_id, tenant_id, \
                   landlord_status, tenant_status, \
                   created_at, deleted_at \
            FROM contracts \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row)))
    }
}

impl<C> Database<Select<By<Option<Active<Contract>>, contract::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Active<Contract>>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: contract::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, dorm_id, landlord_id, tenant_id, \
                   landlord_status, tenant_status, \
                   created_at, deleted_at \
            FROM contracts \
            WHERE id = $1::UUID AND deleted_at IS NULL \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Active(from_row(&row))))
    }
}

impl<C> Database<Select<By<Option<Undecided<Contract>>, dorm::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Undecided<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Undecided<Contract>>, dorm::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let dorm_id: dorm::Id = by.into_inner();

        let sql = format!(
            "SELECT id, dorm_id, landlord_id, tenant_id, \
                    landlord_status, tenant_status, \
                    created_at, deleted_at \
             FROM contracts \
             WHERE dorm_id = $1::UUID AND deleted_at IS NULL \
                   {} \
             LIMIT 1",
            status_predicate(contract::Status::Waiting),
        );
        Ok(self
            .query_opt(&sql, &[&dorm_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Undecided(from_row(&row))))
    }
}

impl<C>
    Database<Select<By<read::contract::list::Page, read::contract::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::contract::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::contract::list::Page, read::contract::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::list::Selector {
            arguments,
            filter:
                read::contract::list::Filter { dorm_id, party_id, status },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;
        let offset = i64::try_from(arguments.offset()).unwrap();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit, &offset];

        let dorm_idx = dorm_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });
        let party_idx = party_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });

        let sql = format!(
            "SELECT id, dorm_id, landlord_id, tenant_id, \
                    landlord_status, tenant_status, \
                    created_at, deleted_at \
             FROM contracts \
             WHERE deleted_at IS NULL \
                   {dorm_filtering} \
                   {party_filtering} \
                   {status_filtering} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1::INT4 OFFSET $2::INT8",
            dorm_filtering = dorm_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND dorm_id = ${idx}::UUID"))
            }),
            party_filtering =
                party_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND (landlord_id = ${idx}::UUID \
                         OR tenant_id = ${idx}::UUID)"
                    ))
                }),
            status_filtering = status.map(status_predicate).unwrap_or(""),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::contract::list::Page::new(
            &arguments,
            rows.iter().map(from_row),
        ))
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Contract>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(contract)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contract): Update<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            dorm_id,
            landlord_id,
            tenant_id,
            landlord_status,
            tenant_status,
            created_at,
            deleted_at,
        } = contract;

        const SQL: &str = "\
            INSERT INTO contracts (\
                id, dorm_id, landlord_id, tenant_id, \
                landlord_status, tenant_status, \
                created_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::INT2, $6::INT2, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET dorm_id = EXCLUDED.dorm_id, \
                landlord_id = EXCLUDED.landlord_id, \
                tenant_id = EXCLUDED.tenant_id, \
                landlord_status = EXCLUDED.landlord_status, \
                tenant_status = EXCLUDED.tenant_status, \
                created_at = EXCLUDED.created_at, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &dorm_id,
                &landlord_id,
                &tenant_id,
                &landlord_status,
                &tenant_status,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Contract, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: contract::Id = by.into_inner();

        const SQL: &str = "\
            UPDATE contracts \
            SET deleted_at = now() \
            WHERE id = $1::UUID AND deleted_at IS NULL";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Contract, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: contract::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id FROM contracts \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
