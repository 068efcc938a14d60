//! [`LeasingHistory`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{dorm, leasing_history, LeasingHistory},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{self, leasing_history::Open},
};

/// Constructs a [`LeasingHistory`] from the provided [`Row`].
fn from_row(row: &Row) -> LeasingHistory {
    LeasingHistory {
        id: row.get("id"),
        dorm_id: row.get("dorm_id"),
        tenant_id: row.get("tenant_id"),
        started_at: row.get("started_at"),
        ended_at: row.get("ended_at"),
    }
}

impl<C> Database<Select<By<Option<LeasingHistory>, leasing_history::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<LeasingHistory>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<LeasingHistory>, leasing_history::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: leasing_history::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, dorm_id, tenant_id, started_at, ended_at \
            FROM leasing_histories \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| from_row(&row)))
    }
}

impl<C> Database<Select<By<Option<Open<LeasingHistory>>, dorm::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Open<LeasingHistory>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Open<LeasingHistory>>, dorm::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let dorm_id: dorm::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, dorm_id, tenant_id, started_at, ended_at \
            FROM leasing_histories \
            WHERE dorm_id = $1::UUID AND ended_at IS NULL \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&dorm_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Open(from_row(&row))))
    }
}

impl<C>
    Database<
        Select<
            By<
                read::leasing_history::list::Page,
                read::leasing_history::list::Selector,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::leasing_history::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::leasing_history::list::Page,
                read::leasing_history::list::Selector,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::leasing_history::list::Selector {
            arguments,
            filter: read::leasing_history::list::Filter { dorm_id, tenant_id },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;
        let offset = i64::try_from(arguments.offset()).unwrap();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit, &offset];

        let dorm_idx = dorm_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });
        let tenant_idx = tenant_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });

        let sql = format!(
            "SELECT id, dorm_id, tenant_id, started_at, ended_at \
             FROM leasing_histories \
             WHERE true \
                   {dorm_filtering} \
                   {tenant_filtering} \
             ORDER BY started_at DESC, id DESC \
             LIMIT $1::INT4 OFFSET $2::INT8",
            dorm_filtering = dorm_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND dorm_id = ${idx}::UUID"))
            }),
            tenant_filtering =
                tenant_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND tenant_id = ${idx}::UUID"))
                }),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::leasing_history::list::Page::new(
            &arguments,
            rows.iter().map(from_row),
        ))
    }
}

impl<C> Database<Insert<LeasingHistory>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<LeasingHistory>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(history): Insert<LeasingHistory>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(history)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<LeasingHistory>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(history): Update<LeasingHistory>,
    ) -> Result<Self::Ok, Self::Err> {
        let LeasingHistory { id, dorm_id, tenant_id, started_at, ended_at } =
            history;

        const SQL: &str = "\
            INSERT INTO leasing_histories (\
                id, dorm_id, tenant_id, started_at, ended_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::TIMESTAMPTZ, $5::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET dorm_id = EXCLUDED.dorm_id, \
                tenant_id = EXCLUDED.tenant_id, \
                started_at = EXCLUDED.started_at, \
                ended_at = EXCLUDED.ended_at";
        self.exec(SQL, &[&id, &dorm_id, &tenant_id, &started_at, &ended_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
