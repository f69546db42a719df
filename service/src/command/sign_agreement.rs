//! [`Command`] for signing an [`Agreement`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        agreement::{
            self,
            signature::{self, Audit, SignerName},
            Status,
        },
        notification, trust, user, Agreement, User,
    },
    infra::{database, Database},
    Service,
};

use super::{
    apply_trust_increment::{self, ApplyTrustIncrement},
    notify_parties::{self, Notice, NotifyParties},
    Command,
};

/// [`Command`] for signing an [`Agreement`] by one of its parties.
///
/// Seals the [`Agreement`] once both parties have signed it.
#[derive(Clone, Debug)]
pub struct SignAgreement {
    /// ID of the [`Agreement`] to be signed.
    pub agreement_id: agreement::Id,

    /// ID of the [`User`] signing the [`Agreement`].
    pub signer_id: user::Id,

    /// [`Audit`] details of the request the [`Agreement`] is signed with.
    pub audit: Audit,
}

impl<Db> Command<SignAgreement> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
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
        > + Command<
            NotifyParties,
            Err = Traced<notify_parties::ExecutionError>,
        >,
{
    type Ok = Agreement;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SignAgreement) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SignAgreement {
            agreement_id,
            signer_id,
            audit,
        } = cmd;

        let signer = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(signer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(signer_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent modifications of the same `Agreement`, so
        // simultaneous signatures are both kept.
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

        let signed = agreement
            .add_signature(
                signer.id,
                SignerName::new(signer.name.as_ref()),
                audit,
            )
            .map_err(tracerr::from_and_wrap!(=> E))?;
        agreement.apply(signed);

        // Checked under the lock, so the `Agreement` is sealed exactly once.
        let sealed = agreement.finalize();
        let just_sealed = sealed.is_some();
        if let Some(seal) = sealed {
            agreement.seal = Some(seal);
        }
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

        if just_sealed {
            for increment in trust::Increment::for_parties(
                &agreement,
                trust::Counter::CompletedAgreements,
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

        let notices = notices_of_signing(&agreement, signer.id);
        let notified = self
            .execute(NotifyParties {
                agreement: agreement.clone(),
                notices,
            })
            .await;
        if let Err(e) = notified {
            log::warn!(
                "failed to notify about `Agreement(id: {})` signing: {e}",
                agreement.id,
            );
        }

        Ok(agreement)
    }
}

/// Returns [`Notice`]s to be sent once the provided signer has signed the
/// provided [`Agreement`].
///
/// The counterparty is always notified, while the signer is notified only
/// once the [`Agreement`] becomes [`Status::FullySigned`], naming the
/// counterparty as the other signer.
fn notices_of_signing(
    agreement: &Agreement,
    signer_id: user::Id,
) -> Vec<Notice> {
    let Some(counterparty_id) = agreement.counterparty_of(signer_id) else {
        return vec![];
    };

    if agreement.status == Status::FullySigned {
        // Each party is told about the other one's signature.
        [(counterparty_id, signer_id), (signer_id, counterparty_id)]
            .into_iter()
            .map(|(recipient_id, other_id)| Notice {
                kind: notification::Kind::AgreementFullySigned,
                recipient_id,
                signer_id: Some(other_id),
            })
            .collect()
    } else {
        vec![Notice {
            kind: notification::Kind::AgreementSigned,
            recipient_id: counterparty_id,
            signer_id: Some(signer_id),
        }]
    }
}

/// Error of [`SignAgreement`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Agreement`] with the provided ID does not exist.
    #[display("`Agreement(id: {_0})` does not exist")]
    AgreementNotExists(#[error(not(source))] agreement::Id),

    /// Signer has signed the [`Agreement`] already.
    #[display("`User(id: {_0})` has already signed the `Agreement`")]
    AlreadySigned(#[error(not(source))] user::Id),

    /// [`Agreement`] has been modified concurrently.
    #[display("`Agreement(id: {_0})` has been modified concurrently")]
    ConcurrentModification(#[error(not(source))] agreement::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Signer is neither the host nor the guest.
    #[display("`User(id: {_0})` is not a party of the `Agreement`")]
    NotAParty(#[error(not(source))] user::Id),

    /// [`Agreement`] doesn't accept signatures in its current [`Status`].
    #[display("`Agreement` cannot be signed in `{_0}` status")]
    NotSignable(#[error(not(source))] Status),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

impl From<signature::Error> for ExecutionError {
    fn from(e: signature::Error) -> Self {
        match e {
            signature::Error::NotAParty(id) => Self::NotAParty(id),
            signature::Error::AlreadySigned(id) => Self::AlreadySigned(id),
            signature::Error::NotSignable(status) => Self::NotSignable(status),
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::{
        agreement::{spec::agreement, Status},
        notification::Kind,
        user,
    };

    use super::notices_of_signing;

    #[test]
    fn notifies_counterparty_only_until_fully_signed() {
        let a = agreement(Status::PendingGuest);

        let notices = notices_of_signing(&a, a.host_id);

        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, Kind::AgreementSigned);
        assert_eq!(notices[0].recipient_id, a.guest_id);
        assert_eq!(notices[0].signer_id, Some(a.host_id));
    }

    #[test]
    fn notifies_both_parties_once_fully_signed() {
        let a = agreement(Status::FullySigned);

        let notices = notices_of_signing(&a, a.guest_id);

        let pairs = notices
            .iter()
            .map(|n| (n.recipient_id, n.signer_id))
            .collect::<Vec<_>>();
        assert_eq!(
            pairs,
            [
                (a.host_id, Some(a.guest_id)),
                (a.guest_id, Some(a.host_id)),
            ],
        );
        assert!(notices
            .iter()
            .all(|n| n.kind == Kind::AgreementFullySigned));
    }

    #[test]
    fn notifies_nobody_about_stranger() {
        let a = agreement(Status::PendingHost);

        assert!(notices_of_signing(&a, user::Id::new()).is_empty());
    }
}
