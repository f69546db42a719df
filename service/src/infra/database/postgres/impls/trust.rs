//! [`trust::Increment`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{agreement, trust},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<trust::Increment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    /// Records the provided [`trust::Increment`] and bumps the counter of its
    /// [`User`] in a single statement, unless it has been recorded already.
    ///
    /// [`User`]: crate::domain::User
    async fn execute(
        &self,
        Insert(increment): Insert<trust::Increment>,
    ) -> Result<Self::Ok, Self::Err> {
        let trust::Increment {
            agreement_id,
            user_id,
            counter,
        } = increment;

        // Data-modifying `WITH` clauses are always executed to completion,
        // even if not referenced by the primary query.
        const SQL: &str = "\
            WITH applied AS (\
                INSERT INTO trust_increments (agreement_id, user_id, counter) \
                VALUES ($1::UUID, $2::UUID, $3::INT2) \
                ON CONFLICT DO NOTHING \
                RETURNING user_id\
            ), incremented AS (\
                UPDATE users \
                SET completed_agreements = completed_agreements \
                        + (CASE WHEN $3::INT2 = $4::INT2 THEN 1 ELSE 0 END), \
                    completed_stays = completed_stays \
                        + (CASE WHEN $3::INT2 = $5::INT2 THEN 1 ELSE 0 END) \
                WHERE id IN (SELECT user_id FROM applied) \
                RETURNING id\
            ) \
            SELECT EXISTS (SELECT 1 FROM applied) AS applied";
        Ok(self
            .query_opt(
                SQL,
                &[
                    &agreement_id,
                    &user_id,
                    &counter,
                    &trust::Counter::CompletedAgreements,
                    &trust::Counter::CompletedStays,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .is_some_and(|row| row.get("applied")))
    }
}

impl<C> Database<Select<By<Vec<trust::Increment>, trust::Missing>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<trust::Increment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<trust::Increment>, trust::Missing>>,
    ) -> Result<Self::Ok, Self::Err> {
        let trust::Missing {
            modified_before,
            limit,
        } = by.into_inner();
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT a.id AS agreement_id, \
                   p.user_id AS user_id, \
                   c.counter AS counter \
            FROM agreements AS a \
            CROSS JOIN LATERAL (\
                VALUES (a.host_id), (a.guest_id)\
            ) AS p (user_id) \
            CROSS JOIN LATERAL (\
                SELECT $2::INT2 AS counter WHERE a.hash IS NOT NULL \
                UNION ALL \
                SELECT $3::INT2 WHERE a.status = $4::INT2\
            ) AS c \
            WHERE a.updated_at < $1::TIMESTAMPTZ \
              AND NOT EXISTS (\
                  SELECT 1 FROM trust_increments AS t \
                  WHERE t.agreement_id = a.id \
                    AND t.user_id = p.user_id \
                    AND t.counter = c.counter\
              ) \
            LIMIT $5::INT4";
        Ok(self
            .query(
                SQL,
                &[
                    &modified_before,
                    &trust::Counter::CompletedAgreements,
                    &trust::Counter::CompletedStays,
                    &agreement::Status::Completed,
                    &limit,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| trust::Increment {
                agreement_id: row.get("agreement_id"),
                user_id: row.get("user_id"),
                counter: row.get("counter"),
            })
            .collect())
    }
}
