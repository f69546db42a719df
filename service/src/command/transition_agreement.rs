//! [`Command`] for explicitly changing [`Status`] of an [`Agreement`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        agreement::{self, transition::IllegalTransition, Status},
        trust, user, Agreement,
    },
    infra::{database, Database},
    Service,
};

use super::{
    apply_trust_increment::{self, ApplyTrustIncrement},
    Command,
};

/// [`Command`] for explicitly moving an [`Agreement`] to another [`Status`]
/// by one of its parties.
#[derive(Clone, Copy, Debug)]
pub struct TransitionAgreement {
    /// ID of the [`Agreement`] to be moved.
    pub agreement_id: agreement::Id,

    /// ID of the [`User`] requesting the transition.
    ///
    /// [`User`]: crate::domain::User
    pub initiator_id: user::Id,

    /// [`Status`] to move the [`Agreement`] to.
    pub status: Status,
}

impl<Db> Command<TransitionAgreement> for Service<Db>
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
            Update<Agreement>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
    Self: Command<
        ApplyTrustIncrement,
        Err = Traced<apply_trust_increment::ExecutionError>,
    >,
{
    type Ok = Agreement;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: TransitionAgreement,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let TransitionAgreement {
            agreement_id,
            initiator_id,
            status,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with concurrent signatures.
        tx.execute(Lock(By::new(agreement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut agreement = tx
            .execute(Select(By::<Option<Agreement>, _>::new(agreement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::AgreementNotExists(agreement_id))
            .map_err(tracerr::wrap!())?;
        if !agreement.is_party(initiator_id) {
            return Err(tracerr::new!(E::NotAParty(initiator_id)));
        }

        agreement.status = agreement
            .transition(status)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        agreement.touch();

        let updated = tx
            .execute(Update(agreement.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !updated {
            return Err(tracerr::new!(E::ConcurrentModification(agreement_id)));
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if agreement.status == Status::Completed {
            for increment in trust::Increment::for_parties(
                &agreement,
                trust::Counter::CompletedStays,
            ) {
                if let Err(e) =
                    self.execute(ApplyTrustIncrement(increment)).await
                {
                    log::warn!(
                        "failed to apply `{}` trust increment to \
                         `User(id: {})`: {e}",
                        increment.counter,
                        increment.user_id,
                    );
                }
            }
        }

        Ok(agreement)
    }
}

/// Error of [`TransitionAgreement`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Agreement`] with the provided ID does not exist.
    #[display("`Agreement(id: {_0})` does not exist")]
    #[from(ignore)]
    AgreementNotExists(#[error(not(source))] agreement::Id),

    /// [`Agreement`] has been modified concurrently.
    #[display("`Agreement(id: {_0})` has been modified concurrently")]
    #[from(ignore)]
    ConcurrentModification(#[error(not(source))] agreement::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Transition is not allowed.
    #[display("{_0}")]
    IllegalTransition(#[error(not(source))] IllegalTransition),

    /// Initiator is neither the host nor the guest.
    #[display("`User(id: {_0})` is not a party of the `Agreement`")]
    #[from(ignore)]
    NotAParty(#[error(not(source))] user::Id),
}
