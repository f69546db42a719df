//! [`Seal`] definitions.

use common::{unit, DateTime, DateTimeOf};
use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::Serialize;
use sha2::{Digest as _, Sha256};

use crate::domain::{listing, user};

#[cfg(doc)]
use super::Content;
use super::{Agreement, Clause, Status};

/// Tamper-evidence seal of an [`Agreement`] [`Content`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Seal {
    /// [`Hash`] of the sealed [`Content`].
    pub hash: Hash,

    /// [`DateTime`] when the [`Agreement`] was finalized.
    pub finalized_at: FinalizationDateTime,
}

/// Hex-encoded SHA-256 digest of an [`Agreement`] canonical content.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Hash(String);

impl Hash {
    /// Computes the [`Hash`] of the provided [`Agreement`] terms.
    ///
    /// Covers the [`Content`] along with the parties and the listing, but none
    /// of the lifecycle fields, so later [`Status`] changes keep it valid.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn of(agreement: &Agreement) -> Self {
        let canonical = serde_json::to_vec(&Canonical::of(agreement))
            .expect("`Canonical` is always serializable");
        Self(hex::encode(Sha256::digest(canonical)))
    }
}

/// Canonical representation of the sealed [`Agreement`] fields.
///
/// Fields are serialized in the declaration order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Canonical<'a> {
    preamble: &'a str,
    clauses: &'a [Clause],
    country_code: &'a str,
    host_id: user::Id,
    guest_id: user::Id,
    listing_id: listing::Id,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl<'a> Canonical<'a> {
    fn of(agreement: &'a Agreement) -> Self {
        let content = &agreement.content;
        Self {
            preamble: content.preamble.as_ref(),
            clauses: content.clauses.as_ref(),
            country_code: content.country_code.as_ref(),
            host_id: agreement.host_id,
            guest_id: agreement.guest_id,
            listing_id: agreement.listing_id,
            start_date: content.start_date.map(|d| d.to_rfc3339()),
            end_date: content.end_date.map(|d| d.to_rfc3339()),
        }
    }
}

impl Agreement {
    /// Computes a new [`Seal`] for this [`Agreement`], if it's due.
    ///
    /// A [`Seal`] is due only when this [`Agreement`] is
    /// [`Status::FullySigned`] and hasn't been sealed yet, so calling this
    /// repeatedly never replaces an existing [`Seal`].
    #[must_use]
    pub fn finalize(&self) -> Option<Seal> {
        (self.status == Status::FullySigned && self.seal.is_none())
            .then(|| Seal {
                hash: Hash::of(self),
                finalized_at: DateTime::now().coerce(),
            })
    }

    /// Indicates whether the [`Seal`] of this [`Agreement`] still matches its
    /// current terms.
    ///
    /// [`None`] is returned if this [`Agreement`] is not sealed.
    #[must_use]
    pub fn verify_seal(&self) -> Option<bool> {
        self.seal.as_ref().map(|s| s.hash == Hash::of(self))
    }
}

/// [`DateTime`] when an [`Agreement`] was finalized.
pub type FinalizationDateTime = DateTimeOf<(Agreement, unit::Finalization)>;

#[cfg(test)]
mod spec {
    use common::DateTime;
    use proptest::prelude::*;

    use crate::domain::agreement::{
        spec::agreement, Clause, Clauses, Content, Preamble, Status,
    };

    use super::Hash;

    #[test]
    fn seals_only_fully_signed() {
        for status in Status::ALL.iter().copied() {
            let sealed = agreement(status).finalize().is_some();
            assert_eq!(sealed, status == Status::FullySigned, "{status}");
        }
    }

    #[test]
    fn finalization_is_idempotent() {
        let mut a = agreement(Status::FullySigned);
        a.seal = a.finalize();
        let first = a.seal.clone();

        assert!(a.finalize().is_none());
        assert_eq!(a.seal, first);
    }

    #[test]
    fn hash_is_hex_sha256() {
        let hash = Hash::of(&agreement(Status::FullySigned));

        assert_eq!(hash.as_ref().len(), 64);
        assert!(hash.as_ref().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn seal_survives_status_changes() {
        let mut a = agreement(Status::FullySigned);
        a.seal = a.finalize();
        a.status = Status::Completed;

        assert_eq!(a.verify_seal(), Some(true));
    }

    #[test]
    fn detects_tampering() {
        let mut a = agreement(Status::FullySigned);
        assert_eq!(a.verify_seal(), None);

        a.seal = a.finalize();
        a.content.end_date = Some(
            DateTime::from_rfc3339("2030-01-01T00:00:00Z")
                .expect("valid")
                .coerce(),
        );

        assert_eq!(a.verify_seal(), Some(false));
    }

    proptest! {
        #[test]
        fn hash_is_deterministic_and_sensitive(
            preamble in "[a-zA-Z0-9 ]{1,64}",
            other in "[a-zA-Z0-9 ]{1,64}",
            title in "[a-z]{1,16}",
            days in 0i64..20_000,
        ) {
            prop_assume!(!preamble.trim().is_empty());
            prop_assume!(!other.trim().is_empty() && other != preamble);

            let mut a = agreement(Status::FullySigned);
            a.content = Content {
                preamble: Preamble::new(preamble).expect("valid"),
                clauses: Clauses::new(vec![
                    Clause::new(title, "text", 1).expect("valid"),
                ])
                .expect("valid"),
                ..a.content
            };
            let hash = Hash::of(&a);
            prop_assert_eq!(&hash, &Hash::of(&a.clone()));

            let mut changed = a.clone();
            changed.content.preamble = Preamble::new(other).expect("valid");
            prop_assert_ne!(&hash, &Hash::of(&changed));

            let mut changed = a.clone();
            changed.content.end_date = DateTime::from_unix_timestamp(
                days * 86_400,
            )
            .map(DateTime::coerce);
            prop_assert_ne!(&hash, &Hash::of(&changed));

            let mut changed = a;
            std::mem::swap(&mut changed.host_id, &mut changed.guest_id);
            prop_assert_ne!(&hash, &Hash::of(&changed));
        }
    }
}
