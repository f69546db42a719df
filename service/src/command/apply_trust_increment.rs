//! [`Command`] for applying a [`trust::Increment`].

use common::operations::Insert;
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::trust,
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for applying a [`trust::Increment`] to a [`User`]'s
/// [`trust::Metrics`].
///
/// Idempotent: an already applied [`trust::Increment`] is skipped.
#[derive(Clone, Copy, Debug, From)]
pub struct ApplyTrustIncrement(pub trust::Increment);

impl<Db> Command<ApplyTrustIncrement> for Service<Db>
where
    Db: Database<
        Insert<trust::Increment>,
        Ok = bool,
        Err = Traced<database::Error>,
    >,
{
    /// Indicates whether the [`trust::Increment`] has been applied by this
    /// execution.
    type Ok = bool;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ApplyTrustIncrement(increment): ApplyTrustIncrement,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Insert(increment))
            .await
            .map_err(tracerr::map_from_and_wrap!())
    }
}

/// Error of [`ApplyTrustIncrement`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}
