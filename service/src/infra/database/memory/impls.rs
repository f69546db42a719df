//! [`Database`] implementations.

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Update,
    },
    pagination::{Kind, Order},
};
use tracerr::Traced;

use crate::{
    domain::{
        agreement, listing, trust, user, Agreement, Listing, Notification,
        User,
    },
    infra::{database, Database},
    read,
};

use super::{Client, Memory, NonTx, Table, Tx};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::begin(self.0.storage.clone()).await))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.0.commit().map_err(tracerr::wrap!())
    }
}

impl<C: Client> Database<Select<By<Option<User>, user::Id>>> for Memory<C> {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| {
            s.users.get(&id).filter(|u| u.deleted_at.is_none()).cloned()
        }))
    }
}

impl<C: Client> Database<Select<By<Option<Listing>, listing::Id>>>
    for Memory<C>
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.listings.get(&id).cloned()))
    }
}

impl<C: Client> Database<Select<By<Option<Agreement>, agreement::Id>>>
    for Memory<C>
{
    type Ok = Option<Agreement>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Agreement>, agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read(|s| s.agreements.get(&id).cloned()))
    }
}

impl<C: Client> Database<Insert<Agreement>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(agreement): Insert<Agreement>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(None, |s| {
                drop(s.agreements.insert(agreement.id, agreement));
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Client> Database<Update<Agreement>> for Memory<C> {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(agreement): Update<Agreement>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(None, |s| {
                let Some(stored) = s.agreements.get_mut(&agreement.id) else {
                    return false;
                };
                if stored.version.next() != agreement.version {
                    return false;
                }
                *stored = agreement;
                true
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Client> Database<Delete<By<Agreement, agreement::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Agreement, agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .write(None, |s| drop(s.agreements.remove(&id)))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Client> Database<Lock<By<Agreement, agreement::Id>>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Agreement, agreement::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Transactions are serialized already.
        Ok(())
    }
}

impl<C: Client>
    Database<
        Select<
            By<read::agreement::list::Page, read::agreement::list::Selector>,
        >,
    > for Memory<C>
{
    type Ok = read::agreement::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::agreement::list::Page, read::agreement::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::agreement::list::Selector { arguments, filter } =
            by.into_inner();
        let limit = arguments.limit();
        let cursor = arguments.cursor().copied();
        let order = arguments.kind().order(read::agreement::list::ORDER);

        let mut nodes = self.0.read(|s| {
            let all: Box<dyn Iterator<Item = &Agreement>> = match order {
                Order::Ascending => Box::new(s.agreements.values()),
                Order::Descending => Box::new(s.agreements.values().rev()),
            };
            all.filter(|a| {
                cursor.map_or(true, |c| match order {
                    Order::Ascending => a.id > c,
                    Order::Descending => a.id < c,
                })
            })
            .filter(|a| filter.matches(a))
            .take(limit + 1)
            .cloned()
            .collect::<Vec<_>>()
        });

        let has_more = nodes.len() > limit;
        nodes.truncate(limit);
        if arguments.kind() == Kind::Backward {
            nodes.reverse();
        }

        Ok(read::agreement::list::Page::new(
            &arguments,
            nodes.into_iter().map(|a| (a.id, a)),
            has_more,
        ))
    }
}

impl<C: Client> Database<Insert<trust::Increment>> for Memory<C> {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(increment): Insert<trust::Increment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Some(Table::TrustIncrements), |s| {
                if !s.trust_increments.insert(increment) {
                    return false;
                }
                if let Some(u) = s.users.get_mut(&increment.user_id) {
                    *u.trust.get_mut(increment.counter) += 1;
                }
                true
            })
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C: Client> Database<Select<By<Vec<trust::Increment>, trust::Missing>>>
    for Memory<C>
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

        Ok(self.0.read(|s| {
            s.agreements
                .values()
                .filter(|a| a.updated_at < modified_before)
                .flat_map(trust::Increment::implied_by)
                .filter(|i| !s.trust_increments.contains(i))
                .take(limit)
                .collect()
        }))
    }
}

impl<C: Client> Database<Insert<Notification>> for Memory<C> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(notification): Insert<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .write(Some(Table::Notifications), |s| {
                s.notifications.push(notification);
            })
            .await
            .map_err(tracerr::wrap!())
    }
}
