//! [`Dorm`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::{dorm, Dorm},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Dorm>, dorm::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Dorm>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Dorm>, dorm::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: dorm::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, owner_id, \
                   monthly_price_amount, monthly_price_currency, \
                   insurance_price_amount, insurance_price_currency, \
                   created_at, deleted_at \
            FROM dorms \
            WHERE id = $1::UUID AND deleted_at IS NULL \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Dorm {
                id: row.get("id"),
                name: row.get("name"),
                owner_id: row.get("owner_id"),
                monthly_price: Money {
                    amount: row.get("monthly_price_amount"),
                    currency: row.get("monthly_price_currency"),
                },
                insurance_price: Money {
                    amount: row.get("insurance_price_amount"),
                    currency: row.get("insurance_price_currency"),
                },
                created_at: row.get("created_at"),
                deleted_at: row.get("deleted_at"),
            }))
    }
}

impl<C> Database<Insert<Dorm>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Dorm>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(dorm): Insert<Dorm>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(dorm)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Dorm>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(dorm): Update<Dorm>,
    ) -> Result<Self::Ok, Self::Err> {
        let Dorm {
            id,
            name,
            owner_id,
            monthly_price,
            insurance_price,
            created_at,
            deleted_at,
        } = dorm;

        const SQL: &str = "\
            INSERT INTO dorms (\
                id, name, owner_id, \
                monthly_price_amount, monthly_price_currency, \
                insurance_price_amount, insurance_price_currency, \
                created_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, \
                $4::INT8, $5::INT2, \
                $6::INT8, $7::INT2, \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                owner_id = EXCLUDED.owner_id, \
                monthly_price_amount = EXCLUDED.monthly_price_amount, \
                monthly_price_currency = EXCLUDED.monthly_price_currency, \
                insurance_price_amount = EXCLUDED.insurance_price_amount, \
                insurance_price_currency = EXCLUDED.insurance_price_currency, \
                created_at = EXCLUDED.created_at, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &owner_id,
                &monthly_price.amount,
                &monthly_price.currency,
                &insurance_price.amount,
                &insurance_price.currency,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Dorm, dorm::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Dorm, dorm::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: dorm::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id FROM dorms \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
