//! [`Signature`] ledger definitions.

use common::{unit, DateTime, DateTimeOf};
use derive_more::{AsRef, Display, Error as StdError};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

use super::{Agreement, Role, Status};

/// Signature of an [`Agreement`] by one of its parties.
///
/// Never modified or removed once added to an [`Agreement`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    /// ID of the signed [`User`].
    pub user_id: user::Id,

    /// [`SignerName`] of the [`User`] at the moment of signing.
    pub name: SignerName,

    /// [`DateTime`] when this [`Signature`] was made.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub signed_at: SigningDateTime,

    /// [`IpAddress`] the [`Signature`] was made from.
    pub ip_address: IpAddress,

    /// [`UserAgent`] the [`Signature`] was made with.
    pub user_agent: UserAgent,
}

/// Display name of a signer, as it was at the moment of signing.
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[serde(transparent)]
pub struct SignerName(String);

impl SignerName {
    /// [`SignerName`] of a [`User`] having no name.
    pub const ANONYMOUS: &'static str = "Anonymous";

    /// Creates a new [`SignerName`] out of the optional [`user::Name`].
    #[must_use]
    pub fn new(name: Option<&user::Name>) -> Self {
        Self(name.map_or_else(|| Self::ANONYMOUS.into(), ToString::to_string))
    }
}

/// Best-effort audit information about a signing request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Audit {
    /// [`IpAddress`] the request came from.
    pub ip_address: IpAddress,

    /// [`UserAgent`] the request was made with.
    pub user_agent: UserAgent,
}

/// Placeholder for audit information being unavailable.
const UNKNOWN: &str = "unknown";

/// IP address captured for audit purposes, or `unknown`.
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[serde(transparent)]
pub struct IpAddress(String);

impl IpAddress {
    /// Creates a new [`IpAddress`], falling back to `unknown` if the provided
    /// `addr` is missing or blank.
    #[must_use]
    pub fn new(addr: Option<impl Into<String>>) -> Self {
        Self(known_or_unknown(addr))
    }
}

impl Default for IpAddress {
    fn default() -> Self {
        Self(UNKNOWN.into())
    }
}

/// User agent captured for audit purposes, or `unknown`.
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[serde(transparent)]
pub struct UserAgent(String);

impl UserAgent {
    /// Maximum stored length of a [`UserAgent`] in characters.
    pub const MAX_LEN: usize = 512;

    /// Creates a new [`UserAgent`], falling back to `unknown` if the provided
    /// `agent` is missing or blank.
    ///
    /// Overlong values are truncated to [`UserAgent::MAX_LEN`].
    #[must_use]
    pub fn new(agent: Option<impl Into<String>>) -> Self {
        let agent = known_or_unknown(agent);
        Self(agent.chars().take(Self::MAX_LEN).collect())
    }
}

impl Default for UserAgent {
    fn default() -> Self {
        Self(UNKNOWN.into())
    }
}

/// Trims the provided `value`, falling back to [`UNKNOWN`] if it's missing or
/// blank.
fn known_or_unknown(value: Option<impl Into<String>>) -> String {
    value
        .map(Into::into)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.into())
}

/// Outcome of adding a [`Signature`] to an [`Agreement`].
#[derive(Clone, Debug)]
pub struct Signed {
    /// Updated ledger of [`Signature`]s.
    pub signatures: Vec<Signature>,

    /// [`Status`] derived from the updated ledger.
    pub status: Status,
}

/// Error of adding a [`Signature`] to an [`Agreement`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// Signer is neither the host nor the guest.
    #[display("`User(id: {_0})` is not a party of the `Agreement`")]
    NotAParty(#[error(not(source))] user::Id),

    /// Signer has signed the [`Agreement`] already.
    #[display("`User(id: {_0})` has already signed the `Agreement`")]
    AlreadySigned(#[error(not(source))] user::Id),

    /// [`Agreement`] doesn't accept [`Signature`]s in its current [`Status`].
    #[display("`Agreement` cannot be signed in `{_0}` status")]
    NotSignable(#[error(not(source))] Status),
}

impl Agreement {
    /// Adds a [`Signature`] of the provided signer to the ledger of this
    /// [`Agreement`], deriving its next [`Status`].
    ///
    /// Doesn't modify this [`Agreement`]: the returned [`Signed`] outcome is
    /// expected to be applied and persisted by the caller.
    ///
    /// # Errors
    ///
    /// - [`Error::NotAParty`] if the signer is neither the host nor the guest;
    /// - [`Error::NotSignable`] if the current [`Status`] doesn't accept
    ///   [`Signature`]s;
    /// - [`Error::AlreadySigned`] if the signer has signed already.
    pub fn add_signature(
        &self,
        signer_id: user::Id,
        name: SignerName,
        audit: Audit,
    ) -> Result<Signed, Error> {
        let role = self.role_of(signer_id).ok_or(Error::NotAParty(signer_id))?;
        if !self.status.is_signable() {
            return Err(Error::NotSignable(self.status));
        }
        if self.is_signed_by(signer_id) {
            return Err(Error::AlreadySigned(signer_id));
        }

        let Audit {
            ip_address,
            user_agent,
        } = audit;
        let mut signatures = self.signatures.clone();
        signatures.push(Signature {
            user_id: signer_id,
            name,
            signed_at: DateTime::now().coerce(),
            ip_address,
            user_agent,
        });

        let signed_by =
            |id: user::Id| signatures.iter().any(|s| s.user_id == id);
        let status = if signed_by(self.host_id) && signed_by(self.guest_id) {
            Status::FullySigned
        } else {
            // Whoever signed last, the other party is expected next.
            match role {
                Role::Host => Status::PendingGuest,
                Role::Guest => Status::PendingHost,
            }
        };

        Ok(Signed { signatures, status })
    }

    /// Applies the provided [`Signed`] outcome to this [`Agreement`].
    pub fn apply(&mut self, signed: Signed) {
        let Signed { signatures, status } = signed;
        self.signatures = signatures;
        self.status = status;
    }
}

/// [`DateTime`] when a [`Signature`] was made.
pub type SigningDateTime = DateTimeOf<(Signature, unit::Signing)>;

#[cfg(test)]
mod spec {
    use std::collections::HashSet;

    use crate::domain::{
        agreement::{spec::agreement, Status},
        user,
    };

    use super::{Audit, Error, IpAddress, SignerName, UserAgent};

    fn anonymous() -> SignerName {
        SignerName::new(None)
    }

    #[test]
    fn host_first_then_guest() {
        let mut a = agreement(Status::PendingHost);

        let signed = a
            .add_signature(a.host_id, anonymous(), Audit::default())
            .expect("host signs");
        assert_eq!(signed.status, Status::PendingGuest);
        a.apply(signed);
        assert_eq!(a.signatures.len(), 1);

        let signed = a
            .add_signature(a.guest_id, anonymous(), Audit::default())
            .expect("guest signs");
        assert_eq!(signed.status, Status::FullySigned);
        a.apply(signed);
        assert_eq!(a.signatures.len(), 2);
    }

    #[test]
    fn guest_first_in_draft() {
        let a = agreement(Status::Draft);

        let signed = a
            .add_signature(a.guest_id, anonymous(), Audit::default())
            .expect("guest signs");

        assert_eq!(signed.status, Status::PendingHost);
    }

    #[test]
    fn rejects_double_signing() {
        let mut a = agreement(Status::PendingHost);
        let signed = a
            .add_signature(a.host_id, anonymous(), Audit::default())
            .expect("host signs");
        a.apply(signed);

        let err = a
            .add_signature(a.host_id, anonymous(), Audit::default())
            .expect_err("signed already");

        assert_eq!(err, Error::AlreadySigned(a.host_id));
        assert_eq!(a.signatures.len(), 1);
    }

    #[test]
    fn rejects_strangers() {
        let a = agreement(Status::Draft);
        let stranger = user::Id::new();

        assert_eq!(
            a.add_signature(stranger, anonymous(), Audit::default())
                .expect_err("not a party"),
            Error::NotAParty(stranger),
        );
    }

    #[test]
    fn rejects_non_signable_statuses() {
        for status in Status::ALL.iter().copied() {
            let a = agreement(status);
            let res = a.add_signature(a.host_id, anonymous(), Audit::default());

            if status.is_signable() {
                assert!(res.is_ok(), "{status}");
            } else {
                assert_eq!(
                    res.expect_err("not signable"),
                    Error::NotSignable(status),
                );
            }
        }
    }

    #[test]
    fn ledger_never_holds_duplicates() {
        let mut a = agreement(Status::Draft);
        for signer in [a.guest_id, a.guest_id, a.host_id, a.host_id] {
            if let Ok(signed) =
                a.add_signature(signer, anonymous(), Audit::default())
            {
                a.apply(signed);
            }
        }

        let signers =
            a.signatures.iter().map(|s| s.user_id).collect::<HashSet<_>>();
        assert_eq!(signers.len(), a.signatures.len());
        assert_eq!(a.status, Status::FullySigned);
    }

    #[test]
    fn audit_defaults_to_unknown() {
        assert_eq!(IpAddress::new(None::<String>).as_ref(), "unknown");
        assert_eq!(IpAddress::new(Some("  ")).as_ref(), "unknown");
        assert_eq!(IpAddress::new(Some("10.0.0.1")).as_ref(), "10.0.0.1");
        assert_eq!(UserAgent::default().as_ref(), "unknown");
        assert_eq!(
            UserAgent::new(Some("x".repeat(1000))).as_ref().len(),
            UserAgent::MAX_LEN,
        );
    }

    #[test]
    fn anonymous_signer_name() {
        assert_eq!(anonymous().as_ref(), "Anonymous");

        let name = user::Name::new("Anna").expect("valid");
        assert_eq!(SignerName::new(Some(&name)).as_ref(), "Anna");
    }

    #[test]
    fn serializes_as_camel_case() {
        let a = agreement(Status::Draft);
        let signed = a
            .add_signature(a.host_id, anonymous(), Audit::default())
            .expect("host signs");

        let json = serde_json::to_value(&signed.signatures).expect("valid");
        let sig = &json[0];
        assert!(sig.get("userId").is_some());
        assert!(sig.get("signedAt").is_some_and(|v| v.is_string()));
        assert_eq!(sig["ipAddress"], "unknown");

        let back: Vec<super::Signature> =
            serde_json::from_value(json).expect("deserializable");
        assert_eq!(back, signed.signatures);
    }
}
