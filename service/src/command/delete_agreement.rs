//! [`Command`] for deleting a draft [`Agreement`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        agreement::{self, Status},
        user, Agreement,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting an [`Agreement`] by its host, while it's still a
/// [`Status::Draft`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteAgreement {
    /// ID of the [`Agreement`] to be deleted.
    pub agreement_id: agreement::Id,

    /// ID of the [`User`] deleting the [`Agreement`].
    ///
    /// [`User`]: crate::domain::User
    pub initiator_id: user::Id,
}

impl<Db> Command<DeleteAgreement> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Agreement, agreement::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Agreement>, agreement::Id>>,
            Ok = Option<Agreement>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Agreement, agreement::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Agreement;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteAgreement,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteAgreement {
            agreement_id,
            initiator_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid deleting an `Agreement` being signed right now.
        tx.execute(Lock(By::new(agreement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let agreement = tx
            .execute(Select(By::<Option<Agreement>, _>::new(agreement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::AgreementNotExists(agreement_id))
            .map_err(tracerr::wrap!())?;
        if agreement.host_id != initiator_id {
            return Err(tracerr::new!(E::NotHost(initiator_id)));
        }
        if agreement.status != Status::Draft {
            return Err(tracerr::new!(E::NotDraft(agreement.status)));
        }

        tx.execute(Delete(By::<Agreement, _>::new(agreement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(agreement)
    }
}

/// Error of [`DeleteAgreement`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Agreement`] with the provided ID does not exist.
    #[display("`Agreement(id: {_0})` does not exist")]
    AgreementNotExists(#[error(not(source))] agreement::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Agreement`] is not a [`Status::Draft`] anymore.
    #[display("`Agreement` in `{_0}` status cannot be deleted")]
    NotDraft(#[error(not(source))] Status),

    /// Initiator is not the host of the [`Agreement`].
    #[display("`User(id: {_0})` is not the host of the `Agreement`")]
    NotHost(#[error(not(source))] user::Id),
}
