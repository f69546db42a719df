//! [`Command`] for notifying parties of an [`Agreement`].

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        listing,
        notification::{self, Snapshot},
        user, Agreement, Listing, Notification, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for writing [`Notification`]s about an [`Agreement`] event to
/// the outbox.
#[derive(Clone, Debug)]
pub struct NotifyParties {
    /// [`Agreement`] to notify about, as it has been persisted.
    pub agreement: Agreement,

    /// [`Notice`]s to be written.
    pub notices: Vec<Notice>,
}

/// Single [`Notification`] to be written by the [`NotifyParties`]
/// [`Command`].
#[derive(Clone, Copy, Debug)]
pub struct Notice {
    /// [`notification::Kind`] of the [`Notification`].
    pub kind: notification::Kind,

    /// ID of the party to be notified.
    pub recipient_id: user::Id,

    /// ID of the party who has just signed the [`Agreement`], if any.
    pub signer_id: Option<user::Id>,
}

impl<Db> Command<NotifyParties> for Service<Db>
where
    Db: Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<Notification>, Err = Traced<database::Error>>,
{
    type Ok = Vec<Notification>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: NotifyParties,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let NotifyParties { agreement, notices } = cmd;

        let listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(
                agreement.listing_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(agreement.listing_id))
            .map_err(tracerr::wrap!())?;

        let host = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(agreement.host_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(agreement.host_id))
            .map_err(tracerr::wrap!())?;
        let guest = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(agreement.guest_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(agreement.guest_id))
            .map_err(tracerr::wrap!())?;

        let snapshot = Snapshot {
            agreement: &agreement,
            listing_title: &listing.title,
            host: &host,
            guest: &guest,
        };

        let mut notifications = Vec::with_capacity(notices.len());
        for Notice {
            kind,
            recipient_id,
            signer_id,
        } in notices
        {
            let recipient = snapshot
                .party(recipient_id)
                .ok_or(E::NotAParty(recipient_id))
                .map_err(tracerr::wrap!())?;
            // Signer is named as in the ledger, not as of now.
            let signer_name = signer_id.and_then(|id| {
                agreement
                    .signatures
                    .iter()
                    .find(|s| s.user_id == id)
                    .map(|s| s.name.clone())
            });

            let notification = snapshot.notify(kind, recipient, signer_name);
            self.database()
                .execute(Insert(notification.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            notifications.push(notification);
        }

        Ok(notifications)
    }
}

/// Error of [`NotifyParties`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// Recipient is not a party of the [`Agreement`].
    #[display("`User(id: {_0})` is not a party of the `Agreement`")]
    NotAParty(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
