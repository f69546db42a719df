//! In-memory [`Database`] implementation.
//!
//! Keeps the whole state behind a single lock and serializes transactions, so
//! it provides the same isolation guarantees as the [`Postgres`] one, though
//! without any concurrency between transactions.
//!
//! [`Postgres`]: crate::infra::Postgres

mod impls;

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracerr::Traced;

#[cfg(doc)]
use crate::infra::Database;
use crate::{
    domain::{
        agreement, listing, trust, user, Agreement, Listing, Notification,
        User,
    },
    infra::database,
};

/// In-memory [`Database`] client.
#[derive(Clone, Debug)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self(NonTx {
            storage: Arc::default(),
        })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Client> Memory<T> {
    /// Modifies the committed [`State`] of this [`Memory`] database with the
    /// provided function, bypassing any transactions.
    ///
    /// Intended for seeding the data owned by external collaborators (like
    /// [`User`]s and [`Listing`]s) and for inspecting the results.
    pub async fn seed<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let storage = self.0.storage();
        let _serialized = storage.tx_lock.lock().await;
        f(&mut storage.committed())
    }

    /// Returns a copy of the committed [`State`] of this [`Memory`] database.
    #[must_use]
    pub fn snapshot(&self) -> State {
        self.0.storage().committed().clone()
    }

    /// Makes the provided [`Table`] reject (or accept again) any writes,
    /// simulating its unavailability.
    pub fn set_unavailable(&self, table: Table, unavailable: bool) {
        let mut unavailable_tables = self
            .0
            .storage()
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if unavailable {
            _ = unavailable_tables.insert(table);
        } else {
            _ = unavailable_tables.remove(&table);
        }
    }
}

/// Whole data stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// [`User`]s by their IDs.
    pub users: HashMap<user::Id, User>,

    /// [`Listing`]s by their IDs.
    pub listings: HashMap<listing::Id, Listing>,

    /// [`Agreement`]s by their IDs, in the creation order.
    pub agreements: BTreeMap<agreement::Id, Agreement>,

    /// Applied [`trust::Increment`]s.
    pub trust_increments: HashSet<trust::Increment>,

    /// Outbox of [`Notification`]s.
    pub notifications: Vec<Notification>,
}

/// Table of a [`Memory`] database.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Table {
    /// [`Notification`]s outbox.
    Notifications,

    /// Applied [`trust::Increment`]s.
    TrustIncrements,
}

/// Shared storage of a [`Memory`] database.
#[derive(Debug, Default)]
pub struct Storage {
    /// Committed [`State`].
    state: Mutex<State>,

    /// Lock serializing transactions and non-transactional writes.
    tx_lock: Arc<AsyncMutex<()>>,

    /// [`Table`]s currently rejecting writes.
    unavailable: Mutex<HashSet<Table>>,
}

impl Storage {
    /// Returns the committed [`State`].
    fn committed(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks whether the provided [`Table`] accepts writes.
    fn check_available(&self, table: Table) -> Result<(), Error> {
        let unavailable = self
            .unavailable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&table);
        if unavailable {
            Err(Error::Unavailable(table))
        } else {
            Ok(())
        }
    }
}

/// Client of a [`Memory`] database.
pub trait Client {
    /// Returns the [`Storage`] this [`Client`] operates on.
    fn storage(&self) -> &Storage;

    /// Reads the [`State`] visible to this [`Client`].
    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R;

    /// Modifies the [`State`] visible to this [`Client`].
    fn write<R>(
        &self,
        table: Option<Table>,
        f: impl FnOnce(&mut State) -> R,
    ) -> impl std::future::Future<Output = Result<R, Traced<database::Error>>>;
}

/// Non-transactional [`Memory`] database client.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// Shared [`Storage`].
    storage: Arc<Storage>,
}

impl Client for NonTx {
    fn storage(&self) -> &Storage {
        &self.storage
    }

    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&self.storage.committed())
    }

    async fn write<R>(
        &self,
        table: Option<Table>,
        f: impl FnOnce(&mut State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        if let Some(table) = table {
            self.storage
                .check_available(table)
                .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        }
        // Await running transactions, so their commit won't overwrite this
        // write.
        let _serialized = self.storage.tx_lock.lock().await;
        Ok(f(&mut self.storage.committed()))
    }
}

/// Transactional [`Memory`] database client.
///
/// Holds the transaction lock until committed or dropped. Dropping without
/// committing discards all the changes.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Shared [`Storage`].
    storage: Arc<Storage>,

    /// Pending transaction, if not committed yet.
    pending: Arc<Mutex<Option<Pending>>>,
}

/// Pending transaction of a [`Tx`] client.
#[derive(Debug)]
struct Pending {
    /// Copy of the [`State`] being modified by the transaction.
    state: State,

    /// Guard of the [`Storage`] transaction lock.
    _guard: OwnedMutexGuard<()>,
}

impl Tx {
    /// Starts a new [`Tx`] in the provided [`Storage`].
    ///
    /// Waits for all other transactions to finish.
    async fn begin(storage: Arc<Storage>) -> Self {
        let guard = Arc::clone(&storage.tx_lock).lock_owned().await;
        let state = storage.committed().clone();
        Self {
            storage,
            pending: Arc::new(Mutex::new(Some(Pending {
                state,
                _guard: guard,
            }))),
        }
    }

    /// Returns the pending transaction of this [`Tx`].
    fn pending(&self) -> Result<MutexGuard<'_, Option<Pending>>, Error> {
        let pending =
            self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.is_some() {
            Ok(pending)
        } else {
            Err(Error::AlreadyCommitted)
        }
    }

    /// Commits this [`Tx`], making its changes visible to everyone.
    fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Pending { state, _guard } = self
            .pending()
            .map_err(tracerr::from_and_wrap!(=> database::Error))?
            .take()
            .ok_or(Error::AlreadyCommitted)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        *self.storage.committed() = state;
        Ok(())
    }
}

impl Client for Tx {
    fn storage(&self) -> &Storage {
        &self.storage
    }

    fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        let pending =
            self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.as_ref() {
            Some(p) => f(&p.state),
            None => f(&self.storage.committed()),
        }
    }

    async fn write<R>(
        &self,
        table: Option<Table>,
        f: impl FnOnce(&mut State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        if let Some(table) = table {
            self.storage
                .check_available(table)
                .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        }
        let mut pending = self
            .pending()
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        pending
            .as_mut()
            .map(|p| f(&mut p.state))
            .ok_or(Error::AlreadyCommitted)
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

/// [`Memory`] database [`Error`].
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Tx`] has been committed already.
    #[display("Transaction has been committed already")]
    AlreadyCommitted,

    /// [`Table`] is unavailable for writes.
    #[display("`{_0}` table is unavailable")]
    Unavailable(#[error(not(source))] Table),
}
