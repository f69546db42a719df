//! [`Command`] for requesting a new [`Agreement`] by a guest.

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        agreement::{self, Content},
        listing, notification, user, Agreement, Listing, User,
    },
    infra::{database, Database},
    Service,
};

use super::{
    notify_parties::{self, Notice, NotifyParties},
    Command,
};

/// [`Command`] for requesting a new [`Agreement`] upon an existing
/// [`Listing`] by a guest.
///
/// The host is the owner of the [`Listing`], and is expected to sign first.
#[derive(Clone, Debug)]
pub struct RequestAgreement {
    /// ID of the guest [`User`] requesting the [`Agreement`].
    pub guest_id: user::Id,

    /// ID of the [`Listing`] the [`Agreement`] concerns.
    pub listing_id: listing::Id,

    /// [`Content`] of the [`Agreement`].
    pub content: Content,
}

impl<Db> Command<RequestAgreement> for Service<Db>
where
    Db: Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Agreement>, Err = Traced<database::Error>>,
    Self: Command<
        NotifyParties,
        Err = Traced<notify_parties::ExecutionError>,
    >,
{
    type Ok = Agreement;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RequestAgreement,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RequestAgreement {
            guest_id,
            listing_id,
            content,
        } = cmd;

        let listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;
        let host_id = listing.owner_id;
        if host_id == guest_id {
            return Err(tracerr::new!(E::SelfAgreement(guest_id)));
        }

        for id in [guest_id, host_id] {
            drop(
                self.database()
                    .execute(Select(By::<Option<User>, _>::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::UserNotExists(id))
                    .map_err(tracerr::wrap!())?,
            );
        }

        let agreement = Agreement::new(
            listing.id,
            host_id,
            guest_id,
            content,
            agreement::Status::PendingHost,
        );
        self.database()
            .execute(Insert(agreement.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let notified = self
            .execute(NotifyParties {
                agreement: agreement.clone(),
                notices: vec![Notice {
                    kind: notification::Kind::AgreementRequested,
                    recipient_id: host_id,
                    signer_id: None,
                }],
            })
            .await;
        if let Err(e) = notified {
            log::warn!(
                "failed to notify about `Agreement(id: {})` request: {e}",
                agreement.id,
            );
        }

        Ok(agreement)
    }
}

/// Error of [`RequestAgreement`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// Guest owns the [`Listing`] itself.
    #[display("`User(id: {_0})` cannot make an `Agreement` with themselves")]
    SelfAgreement(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
