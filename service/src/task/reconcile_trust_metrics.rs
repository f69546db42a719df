//! [`ReconcileTrustMetrics`] [`Task`].

use std::{convert::Infallible, error::Error as StdError, time};

use common::operations::{By, Perform, Select, Start};
use derive_more::{Display, Error, From};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::{Agreement, User};
use crate::{
    command::{apply_trust_increment, ApplyTrustIncrement, Command},
    domain::{agreement, trust},
    infra::{database, Database},
    Service,
};

use super::Task;

/// Configuration for [`ReconcileTrustMetrics`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between reconciliations.
    #[default(time::Duration::from_secs(60))]
    pub interval: time::Duration,

    /// Time an [`Agreement`] must stay unmodified before being reconciled,
    /// so the increments applied inline are not raced with.
    #[default(time::Duration::from_secs(5 * 60))]
    pub grace_period: time::Duration,

    /// Maximum number of [`trust::Increment`]s applied per reconciliation.
    #[default(100)]
    pub batch_size: usize,
}

/// [`Task`] for applying [`trust::Increment`]s implied by [`Agreement`]s, but
/// missed because of failures.
#[derive(Clone, Copy, Debug)]
pub struct ReconcileTrustMetrics<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<S> ReconcileTrustMetrics<S> {
    /// Creates a new [`ReconcileTrustMetrics`] [`Task`] for the provided
    /// [`Service`].
    #[must_use]
    pub const fn new(config: Config, service: S) -> Self {
        Self { config, service }
    }
}

impl<Db> Task<Start<By<ReconcileTrustMetrics<Self>, Config>>> for Service<Db>
where
    ReconcileTrustMetrics<Service<Db>>:
        Task<Perform<()>, Ok = usize, Err: StdError> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ReconcileTrustMetrics<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ReconcileTrustMetrics::new(config, self.clone());

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::info!("applied {n} missing trust increments"),
                Err(e) => {
                    log::error!("`task::ReconcileTrustMetrics` failed: {e}");
                }
            }
        }
    }
}

impl<Db> Task<Perform<()>> for ReconcileTrustMetrics<Service<Db>>
where
    Db: Database<
        Select<By<Vec<trust::Increment>, trust::Missing>>,
        Ok = Vec<trust::Increment>,
        Err = Traced<database::Error>,
    >,
    Service<Db>: Command<
        ApplyTrustIncrement,
        Ok = bool,
        Err = Traced<apply_trust_increment::ExecutionError>,
    >,
{
    /// Number of actually applied [`trust::Increment`]s.
    type Ok = usize;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let modified_before =
            agreement::ModificationDateTime::now() - self.config.grace_period;
        let missing = self
            .service
            .database()
            .execute(Select(By::new(trust::Missing {
                modified_before,
                limit: self.config.batch_size,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;

        let mut applied = 0;
        for increment in missing {
            if self
                .service
                .execute(ApplyTrustIncrement(increment))
                .await
                .map_err(tracerr::map_from_and_wrap!())?
            {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

/// Error of [`ReconcileTrustMetrics`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`ApplyTrustIncrement`] failed.
    #[display("Failed to apply `trust::Increment`: {_0}")]
    Apply(apply_trust_increment::ExecutionError),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}
