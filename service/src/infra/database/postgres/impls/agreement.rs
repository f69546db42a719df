//! [`Agreement`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::{Json, ToSql};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        agreement::{self, seal, Content, Role, Seal, Signature},
        Agreement,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `agreements` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, listing_id, host_id, guest_id, \
    preamble, clauses, country_code, start_date, end_date, \
    status, signatures, hash, finalized_at, \
    version, created_at, updated_at";

/// Builds an [`Agreement`] out of the provided `agreements` table [`Row`].
fn from_row(row: &Row) -> Agreement {
    let hash: Option<seal::Hash> = row.get("hash");
    let finalized_at: Option<seal::FinalizationDateTime> =
        row.get("finalized_at");

    Agreement {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        host_id: row.get("host_id"),
        guest_id: row.get("guest_id"),
        content: Content {
            preamble: row.get("preamble"),
            clauses: row.get::<_, Json<_>>("clauses").0,
            country_code: row.get("country_code"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
        },
        status: row.get("status"),
        signatures: row.get::<_, Json<Vec<Signature>>>("signatures").0,
        seal: hash
            .zip(finalized_at)
            .map(|(hash, finalized_at)| Seal { hash, finalized_at }),
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Agreement>, agreement::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Agreement>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Agreement>, agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: agreement::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM agreements \
             WHERE id = $1::UUID",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<Agreement>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(agreement): Insert<Agreement>,
    ) -> Result<Self::Ok, Self::Err> {
        let Agreement {
            id,
            listing_id,
            host_id,
            guest_id,
            content:
                Content {
                    preamble,
                    clauses,
                    country_code,
                    start_date,
                    end_date,
                },
            status,
            signatures,
            seal,
            version,
            created_at,
            updated_at,
        } = agreement;
        let (hash, finalized_at) =
            seal.map(|s| (s.hash, s.finalized_at)).unzip();

        const SQL: &str = "\
            INSERT INTO agreements (\
                id, listing_id, host_id, guest_id, \
                preamble, clauses, country_code, start_date, end_date, \
                status, signatures, hash, finalized_at, \
                version, created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::TEXT, $6::JSONB, $7::CHAR(2), \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ, \
                $10::INT2, $11::JSONB, $12::CHAR(64), $13::TIMESTAMPTZ, \
                $14::INT4, $15::TIMESTAMPTZ, $16::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &listing_id,
                &host_id,
                &guest_id,
                &preamble,
                &Json(&clauses),
                &country_code,
                &start_date,
                &end_date,
                &status,
                &Json(&signatures),
                &hash,
                &finalized_at,
                &version,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Agreement>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    /// Persists the lifecycle fields of the provided [`Agreement`], only if
    /// the stored one has the directly preceding [`agreement::Version`].
    ///
    /// [`Content`] is never updated.
    async fn execute(
        &self,
        Update(agreement): Update<Agreement>,
    ) -> Result<Self::Ok, Self::Err> {
        let Agreement {
            id,
            status,
            signatures,
            seal,
            version,
            updated_at,
            ..
        } = agreement;
        let (hash, finalized_at) =
            seal.map(|s| (s.hash, s.finalized_at)).unzip();

        const SQL: &str = "\
            UPDATE agreements \
            SET status = $2::INT2, \
                signatures = $3::JSONB, \
                hash = $4::CHAR(64), \
                finalized_at = $5::TIMESTAMPTZ, \
                version = $6::INT4, \
                updated_at = $7::TIMESTAMPTZ \
            WHERE id = $1::UUID \
              AND version = $6::INT4 - 1";
        self.exec(
            SQL,
            &[
                &id,
                &status,
                &Json(&signatures),
                &hash,
                &finalized_at,
                &version,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|updated| updated == 1)
    }
}

impl<C> Database<Delete<By<Agreement, agreement::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Agreement, agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: agreement::Id = by.into_inner();

        // Lock row goes along, being held by the deleting transaction.
        const SQL: &str = "\
            WITH lock AS ( \
                DELETE FROM agreements_lock \
                WHERE id = $1::UUID \
            ) \
            DELETE FROM agreements \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Agreement, agreement::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Agreement, agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: agreement::Id = by.into_inner();

        // `DO UPDATE` locks the row even if it exists already, blocking
        // concurrent transactions until this one ends.
        const SQL: &str = "\
            INSERT INTO agreements_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<
        Select<
            By<read::agreement::list::Page, read::agreement::list::Selector>,
        >,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::agreement::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::agreement::list::Page, read::agreement::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::agreement::list::Selector {
            arguments,
            filter:
                read::agreement::list::Filter {
                    party,
                    role,
                    status,
                },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit())
            .unwrap_or(i32::MAX)
            .saturating_add(1);
        let order = arguments.kind().order(read::agreement::list::ORDER);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit, &party];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM agreements \
             WHERE {party} \
                   {status_filtering} \
                   {cursor} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            party = match role {
                Some(Role::Host) => "host_id = $2::UUID",
                Some(Role::Guest) => "guest_id = $2::UUID",
                None => "(host_id = $2::UUID OR guest_id = $2::UUID)",
            },
            status_filtering =
                status_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND status = ${idx}::INT2"))
                }),
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = order.operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            order = order.sql(),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let mut edges = rows
            .iter()
            .take(arguments.limit())
            .map(from_row)
            .map(|a| (a.id, a))
            .collect::<Vec<_>>();
        if arguments.kind() == common::pagination::Kind::Backward {
            edges.reverse();
        }

        Ok(read::agreement::list::Page::new(&arguments, edges, has_more))
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Commit, Delete, Lock, Transact};

    use crate::{
        domain::{agreement, Agreement},
        infra::{
            database::postgres::{self, Connection as _},
            Database as _, Postgres,
        },
    };

    postgres::embed_migrations!("../migrations");

    #[tokio::test]
    #[ignore = "requires a running Postgres"]
    async fn deletes_lock_along_with_agreement() {
        let mut db = Postgres::new(&postgres::Config {
            host: Some("127.0.0.1".into()),
            user: Some("postgres".into()),
            password: Some("postgres".into()),
            dbname: Some("postgres".into()),
            ..postgres::Config::default()
        })
        .expect("valid config");
        _ = migrations::runner()
            .run_async(&mut db)
            .await
            .expect("migrations applied");
        let id = agreement::Id::new();

        let tx = db.execute(Transact).await.expect("tx started");
        tx.execute(Lock(By::<Agreement, _>::new(id)))
            .await
            .expect("locked");
        tx.execute(Delete(By::<Agreement, _>::new(id)))
            .await
            .expect("deleted");
        tx.execute(Commit).await.expect("committed");

        let lock = db
            .query_opt(
                "SELECT id FROM agreements_lock WHERE id = $1::UUID",
                &[&id],
            )
            .await
            .expect("queried");
        assert!(lock.is_none());
    }
}
