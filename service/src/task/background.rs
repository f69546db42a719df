//! [`Background`] environment for running [`Task`]s.

use std::{
    error::Error as StdError,
    future::{Future, IntoFuture},
    iter,
};

use derive_more::{Display, Error};
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Environment running the spawned [`Task`]s on the current thread until the
/// first of them fails.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned into.
    set: task::LocalSet,

    /// Handles of the spawned [`Task`]s, along with their names.
    handles: Vec<(&'static str, Handle)>,
}

/// [`task::JoinHandle`] of a [`Task`] spawned into a [`Background`].
type Handle = task::JoinHandle<Result<(), Box<dyn StdError>>>;

impl Background {
    /// Spawns a new [`Task`] with the provided name inside this [`Background`]
    /// environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: StdError + 'static,
    {
        log::debug!("spawning `{name}` background task");

        let handle = self
            .set
            .spawn_local(future.map_err(Box::<dyn StdError>::from));
        self.handles.push((name, handle));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Failure>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;

        let tasks = handles.into_iter().map(|(task, handle)| {
            handle
                .map(move |res| match res {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(source)) => Err(Failure::Errored { task, source }),
                    Err(source) => Err(Failure::Aborted { task, source }),
                })
                .boxed_local()
        });

        let set = iter::once(set.map(Ok).boxed_local());
        future::try_join_all(set.chain(tasks))
            .map_ok(drop)
            .boxed_local()
    }
}

/// Failure of a [`Task`] running in a [`Background`] environment.
#[derive(Debug, Display, Error)]
pub enum Failure {
    /// [`Task`] returned an error.
    #[display("`{task}` task failed: {source}")]
    Errored {
        /// Name of the failed [`Task`].
        task: &'static str,

        /// Error returned by the [`Task`].
        #[error(not(source))]
        source: Box<dyn StdError>,
    },

    /// [`Task`] panicked or was cancelled.
    #[display("`{task}` task aborted: {source}")]
    Aborted {
        /// Name of the aborted [`Task`].
        task: &'static str,

        /// Reason of the abortion.
        source: task::JoinError,
    },
}

#[cfg(test)]
mod spec {
    use std::io;

    use super::Background;

    #[tokio::test]
    async fn completes_with_all_tasks() {
        let mut bg = Background::default();
        bg.spawn("first", async { Ok::<_, io::Error>(()) });
        bg.spawn("second", async { Ok::<_, io::Error>(()) });

        bg.await.expect("no task fails");
    }

    #[tokio::test]
    async fn names_failed_task() {
        let mut bg = Background::default();
        bg.spawn("healthy", async { Ok::<_, io::Error>(()) });
        bg.spawn("broken", async { Err(io::Error::other("boom")) });

        let err = bg.await.expect_err("`broken` task fails");

        assert_eq!(err.to_string(), "`broken` task failed: boom");
    }
}
