//! [`Notification`] definitions.

use common::{define_kind, unit, DateTime, DateTimeOf};
use derive_more::{Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Listing;
use crate::domain::{
    agreement::{self, signature::SignerName},
    listing, user, Agreement, User,
};

/// Notification about an [`Agreement`] event, awaiting delivery to its
/// recipient.
///
/// Holds a snapshot of everything needed to render it, so delivery doesn't
/// depend on the later state of the [`Agreement`].
#[derive(Clone, Debug)]
pub struct Notification {
    /// ID of this [`Notification`].
    pub id: Id,

    /// [`Kind`] of this [`Notification`].
    pub kind: Kind,

    /// ID of the [`Agreement`] this [`Notification`] is about.
    pub agreement_id: agreement::Id,

    /// ID of the [`User`] to deliver this [`Notification`] to.
    pub recipient_id: user::Id,

    /// [`user::Email`] of the recipient, if known.
    pub recipient_email: Option<user::Email>,

    /// [`listing::Title`] of the [`Listing`] the [`Agreement`] concerns.
    pub listing_title: listing::Title,

    /// Display name of the host.
    pub host_name: SignerName,

    /// Display name of the guest.
    pub guest_name: SignerName,

    /// Display name of the party who has just signed, if any.
    pub signer_name: Option<SignerName>,

    /// [`DateTime`] when this [`Notification`] was created.
    pub created_at: CreationDateTime,
}

/// Parties and [`Listing`] of an [`Agreement`], as they are at the moment of
/// notifying.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    /// [`Agreement`] to notify about.
    pub agreement: &'a Agreement,

    /// [`listing::Title`] of the [`Agreement`]'s [`Listing`].
    pub listing_title: &'a listing::Title,

    /// Host of the [`Agreement`].
    pub host: &'a User,

    /// Guest of the [`Agreement`].
    pub guest: &'a User,
}

impl Snapshot<'_> {
    /// Creates a new [`Notification`] of the provided [`Kind`] addressed to
    /// the provided recipient.
    #[must_use]
    pub fn notify(
        &self,
        kind: Kind,
        recipient: &User,
        signer_name: Option<SignerName>,
    ) -> Notification {
        Notification {
            id: Id::new(),
            kind,
            agreement_id: self.agreement.id,
            recipient_id: recipient.id,
            recipient_email: recipient.email.clone(),
            listing_title: self.listing_title.clone(),
            host_name: SignerName::new(self.host.name.as_ref()),
            guest_name: SignerName::new(self.guest.name.as_ref()),
            signer_name,
            created_at: DateTime::now().coerce(),
        }
    }

    /// Returns the party of the [`Agreement`] having the provided ID.
    #[must_use]
    pub fn party(&self, id: user::Id) -> Option<&User> {
        [self.host, self.guest].into_iter().find(|u| u.id == id)
    }
}

/// ID of a [`Notification`].
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, From, Hash, Into, PartialEq,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Kind of a [`Notification`]."]
    enum Kind {
        #[doc = "Host has drafted an [`Agreement`] for the guest."]
        AgreementCreated = 1,

        #[doc = "Guest has requested an [`Agreement`] from the host."]
        AgreementRequested = 2,

        #[doc = "Counterparty has signed an [`Agreement`]."]
        AgreementSigned = 3,

        #[doc = "[`Agreement`] has been signed by both parties."]
        AgreementFullySigned = 4,
    }
}

/// [`DateTime`] when a [`Notification`] was created.
pub type CreationDateTime = DateTimeOf<(Notification, unit::Creation)>;
