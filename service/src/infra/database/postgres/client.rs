//! Postgres database clients, connecting lazily on their first statement.

use std::{future::Future, sync::Arc};

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Lazily initialized raw [`Connection`] shared between client clones.
#[derive(Debug)]
struct Slot<C>(RwLock<Option<C>>);

impl<C> Slot<C> {
    /// Creates a new empty [`Slot`].
    fn empty() -> Self {
        Self(RwLock::new(None))
    }

    /// Returns the [`Connection`] of this [`Slot`], initializing it with the
    /// provided function if there is none yet.
    async fn get_or_try_init<F, Fut>(
        &self,
        init: F,
    ) -> Result<RwLockReadGuard<'_, C>, Traced<database::Error>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, Traced<database::Error>>>,
    {
        let slot = self.0.read().await;
        let guard = if slot.is_some() {
            slot
        } else {
            drop(slot);

            let mut slot = self.0.write().await;
            // Someone may have initialized it while the lock was released.
            if slot.is_none() {
                *slot = Some(init().await.map_err(tracerr::wrap!())?);
            }
            slot.downgrade()
        };

        Ok(RwLockReadGuard::map(guard, |conn| {
            conn.as_ref()
                .expect("connection cannot be dropped while guard is alive")
        }))
    }

    /// Takes the [`Connection`] out of this [`Slot`], if any.
    async fn take(&self) -> Option<C> {
        self.0.write().await.take()
    }
}

/// Implements [`Connection`] for a client by delegating to the raw
/// [`Connection`] returned from its `connection()` method.
macro_rules! impl_connection {
    ($ty:ty) => {
        impl Connection for $ty {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    };
}

impl_connection!(NonTx);
impl_connection!(Tx);

/// Non-transactional Postgres database client.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to take [`Connection`]s from.
    pub(crate) pool: connection::Pool,

    /// [`Connection`] used by all the clones of this client.
    connection: Arc<Slot<connection::NonTx>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client taking its [`Connection`]s from the
    /// provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Arc::new(Slot::empty()),
        }
    }

    /// Returns the [`Connection`] of this [`NonTx`] client, taking one from
    /// the [`connection::Pool`] if needed.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        self.connection
            .get_or_try_init(|| async {
                self.pool
                    .get()
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            })
            .await
    }
}

/// Transactional Postgres database client.
///
/// The transaction begins on the first executed statement and ends on
/// [`Tx::commit()`]. Dropping all the clones of an uncommitted [`Tx`] client
/// rolls the transaction back.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to take a [`Connection`] from, if the origin
    /// [`NonTx`] client has none.
    pool: connection::Pool,

    /// [`NonTx`] client this [`Tx`] client was created from, until its
    /// [`Connection`] is reused for the transaction.
    origin: Arc<Mutex<Option<NonTx>>>,

    /// Ongoing transaction.
    tx: Arc<Slot<connection::Tx>>,
}

impl Tx {
    /// Creates a new [`Tx`] client out of the provided [`NonTx`] one.
    #[must_use]
    pub fn new(origin: NonTx) -> Self {
        Self {
            pool: origin.pool.clone(),
            origin: Arc::new(Mutex::new(Some(origin))),
            tx: Arc::new(Slot::empty()),
        }
    }

    /// Returns the transactional [`Connection`] of this [`Tx`] client,
    /// beginning the transaction if needed.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        self.tx
            .get_or_try_init(|| async {
                let idle = match self.origin.lock().await.take() {
                    Some(origin) => origin.connection.take().await,
                    None => None,
                };
                let conn = match idle {
                    Some(conn) => conn,
                    None => self
                        .pool
                        .get()
                        .await
                        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                        .map_err(tracerr::map_from)?,
                };
                connection::Tx::begin(conn).await.map_err(tracerr::wrap!())
            })
            .await
    }

    /// Commits the transaction of this [`Tx`] client.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        match self.tx.take().await {
            Some(tx) => tx.commit().await.map_err(tracerr::wrap!()),
            // No statement was executed, so there is nothing to commit.
            None => Ok(()),
        }
    }
}
