//! [`LeasingRequest`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{dorm, leasing_request, user, LeasingRequest},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{self, leasing_request::Pending},
};

/// Constructs a [`LeasingRequest`] from the provided [`Row`].
fn from_row(row: &Row) -> LeasingRequest {
    LeasingRequest {
        id: row.get("id"),
        dorm_id: row.get("dorm_id"),
        tenant_id: row.get("tenant_id"),
        landlord_id: row.get("landlord_id"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        ended_at: row.get("ended_at"),
    }
}

impl<C> Database<Select<By<Option<LeasingRequest>, leasing_request::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<LeasingRequest>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<LeasingRequest>, leasing_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: leasing_request::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, dorm_id, tenant_id, landlord_id, status, \
                   created_at, ended_at \
            FROM leasing_requests \
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
        Select<By<Option<Pending<LeasingRequest>>, (dorm::Id, user::Id)>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Pending<LeasingRequest>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Pending<LeasingRequest>>, (dorm::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (dorm_id, tenant_id) = by.into_inner();

        const SQL: &str = "\
            SELECT id, dorm_id, tenant_id, landlord_id, status, \
                   created_at, ended_at \
            FROM leasing_requests \
            WHERE dorm_id = $1::UUID AND tenant_id = $2::UUID \
                  AND status = 1 \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&dorm_id, &tenant_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Pending(from_row(&row))))
    }
}

impl<C>
    Database<
        Select<
            By<
                read::leasing_request::list::Page,
                read::leasing_request::list::Selector,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::leasing_request::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::leasing_request::list::Page,
                read::leasing_request::list::Selector,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::leasing_request::list::Selector {
            arguments,
            filter:
                read::leasing_request::list::Filter {
                    dorm_id,
                    tenant_id,
                    landlord_id,
                    status,
                },
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
        let landlord_idx = landlord_id.as_ref().map(|id| {
            ps.push(id);
            ps.len()
        });
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });

        let sql = format!(
            "SELECT id, dorm_id, tenant_id, landlord_id, status, \
                    created_at, ended_at \
             FROM leasing_requests \
             WHERE true \
                   {dorm_filtering} \
                   {tenant_filtering} \
                   {landlord_filtering} \
                   {status_filtering} \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1::INT4 OFFSET $2::INT8",
            dorm_filtering = dorm_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND dorm_id = ${idx}::UUID"))
            }),
            tenant_filtering =
                tenant_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND tenant_id = ${idx}::UUID"))
                }),
            landlord_filtering =
                landlord_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND landlord_id = ${idx}::UUID"))
                }),
            status_filtering =
                status_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND status = ${idx}::INT2"))
                }),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::leasing_request::list::Page::new(
            &arguments,
            rows.iter().map(from_row),
        ))
    }
}

impl<C> Database<Insert<LeasingRequest>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Update<LeasingRequest>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(request): Insert<LeasingRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(request)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<LeasingRequest>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(request): Update<LeasingRequest>,
    ) -> Result<Self::Ok, Self::Err> {
        let LeasingRequest {
            id,
            dorm_id,
            tenant_id,
            landlord_id,
            status,
            created_at,
            ended_at,
        } = request;

        const SQL: &str = "\
            INSERT INTO leasing_requests (\
                id, dorm_id, tenant_id, landlord_id, status, \
                created_at, ended_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, $5::INT2, \
                $6::TIMESTAMPTZ, $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET dorm_id = EXCLUDED.dorm_id, \
                tenant_id = EXCLUDED.tenant_id, \
                landlord_id = EXCLUDED.landlord_id, \
                status = EXCLUDED.status, \
                created_at = EXCLUDED.created_at, \
                ended_at = EXCLUDED.ended_at";
        self.exec(
            SQL,
            &[
                &id,
                &dorm_id,
                &tenant_id,
                &landlord_id,
                &status,
                &created_at,
                &ended_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<LeasingRequest, leasing_request::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<LeasingRequest, leasing_request::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: leasing_request::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id FROM leasing_requests \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
