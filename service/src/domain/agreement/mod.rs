//! [`Agreement`] definitions.

pub mod seal;
pub mod signature;
mod template;
pub mod transition;

use common::{define_kind, unit, DateTime, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Listing, User};
use crate::domain::{listing, user};

pub use self::{seal::Seal, signature::Signature};

/// Agreement between a host and a guest upon a [`Listing`].
#[derive(Clone, Debug)]
pub struct Agreement {
    /// ID of this [`Agreement`].
    pub id: Id,

    /// ID of the [`Listing`] this [`Agreement`] concerns.
    pub listing_id: listing::Id,

    /// ID of the [`User`] hosting (owning the [`Listing`]).
    pub host_id: user::Id,

    /// ID of the [`User`] being the guest.
    pub guest_id: user::Id,

    /// Terms of this [`Agreement`].
    ///
    /// Frozen once this [`Agreement`] is [`Seal`]ed.
    pub content: Content,

    /// Current [`Status`] of this [`Agreement`].
    pub status: Status,

    /// Ledger of [`Signature`]s collected for this [`Agreement`].
    ///
    /// Append-only and never contains two [`Signature`]s of the same [`User`].
    pub signatures: Vec<Signature>,

    /// [`Seal`] of the [`Content`], set once this [`Agreement`] is fully
    /// signed.
    pub seal: Option<Seal>,

    /// [`Version`] of this [`Agreement`].
    pub version: Version,

    /// [`DateTime`] when this [`Agreement`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Agreement`] was modified last time.
    pub updated_at: ModificationDateTime,
}

impl Agreement {
    /// Creates a new [`Agreement`] with the provided [`Status`], having no
    /// [`Signature`]s yet.
    #[must_use]
    pub fn new(
        listing_id: listing::Id,
        host_id: user::Id,
        guest_id: user::Id,
        content: Content,
        status: Status,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: Id::new(),
            listing_id,
            host_id,
            guest_id,
            content,
            status,
            signatures: vec![],
            seal: None,
            version: Version::INITIAL,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    /// Returns [`Role`] the [`User`] with the provided ID plays in this
    /// [`Agreement`], if any.
    #[must_use]
    pub fn role_of(&self, user_id: user::Id) -> Option<Role> {
        if user_id == self.host_id {
            Some(Role::Host)
        } else if user_id == self.guest_id {
            Some(Role::Guest)
        } else {
            None
        }
    }

    /// Indicates whether the [`User`] with the provided ID is a party of this
    /// [`Agreement`].
    #[must_use]
    pub fn is_party(&self, user_id: user::Id) -> bool {
        self.role_of(user_id).is_some()
    }

    /// Returns ID of the other party of this [`Agreement`], if the provided
    /// [`User`] is a party at all.
    #[must_use]
    pub fn counterparty_of(&self, user_id: user::Id) -> Option<user::Id> {
        self.role_of(user_id).map(|role| match role {
            Role::Host => self.guest_id,
            Role::Guest => self.host_id,
        })
    }

    /// Indicates whether the [`User`] with the provided ID has signed this
    /// [`Agreement`] already.
    #[must_use]
    pub fn is_signed_by(&self, user_id: user::Id) -> bool {
        self.signatures.iter().any(|s| s.user_id == user_id)
    }

    /// Indicates whether the [`User`] with the provided ID is still expected
    /// to sign this [`Agreement`].
    #[must_use]
    pub fn needs_signature_of(&self, user_id: user::Id) -> bool {
        self.is_party(user_id)
            && self.status.is_signable()
            && !self.is_signed_by(user_id)
    }

    /// Bumps the [`Version`] of this [`Agreement`] and its modification
    /// [`DateTime`].
    ///
    /// Must be called exactly once before persisting a modified
    /// [`Agreement`].
    pub fn touch(&mut self) {
        self.version = self.version.next();
        self.updated_at = DateTime::now().coerce();
    }
}

/// ID of an [`Agreement`].
///
/// Time-ordered, so ordering by [`Id`] is ordering by creation.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new unique [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

/// Terms of an [`Agreement`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Content {
    /// [`Preamble`] of the terms.
    pub preamble: Preamble,

    /// [`Clauses`] of the terms.
    pub clauses: Clauses,

    /// [`CountryCode`] of the jurisdiction the terms are governed by.
    pub country_code: CountryCode,

    /// [`DateTime`] when the [`Agreement`] period starts, if specified.
    pub start_date: Option<StartDateTime>,

    /// [`DateTime`] when the [`Agreement`] period ends, if specified.
    pub end_date: Option<EndDateTime>,
}

impl Content {
    /// Creates new [`Content`] if the provided period is valid.
    ///
    /// [`None`] is returned if both period bounds are specified and the
    /// `start_date` is later than the `end_date`.
    #[must_use]
    pub fn new(
        preamble: Preamble,
        clauses: Clauses,
        country_code: CountryCode,
        start_date: Option<StartDateTime>,
        end_date: Option<EndDateTime>,
    ) -> Option<Self> {
        if let Some((start, end)) = start_date.zip(end_date) {
            if start.coerce::<()>() > end.coerce() {
                return None;
            }
        }
        Some(Self {
            preamble,
            clauses,
            country_code,
            start_date,
            end_date,
        })
    }
}

/// Preamble of an [`Agreement`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Preamble(String);

impl Preamble {
    /// Maximum length of a [`Preamble`] in characters.
    pub const MAX_LEN: usize = 20_000;

    /// Creates a new [`Preamble`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Preamble`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        !text.trim().is_empty() && text.chars().count() <= Self::MAX_LEN
    }
}

impl FromStr for Preamble {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Preamble`")
    }
}

/// Single clause of an [`Agreement`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Clause {
    /// Title of this [`Clause`].
    pub title: String,

    /// Text of this [`Clause`].
    pub content: String,

    /// Position of this [`Clause`] among the others.
    pub order: i32,
}

impl Clause {
    /// Creates a new [`Clause`] if the provided `title` and `content` are not
    /// blank.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        order: i32,
    ) -> Option<Self> {
        let (title, content) = (title.into(), content.into());
        (!title.trim().is_empty() && !content.trim().is_empty()).then_some(
            Self {
                title,
                content,
                order,
            },
        )
    }
}

/// Non-empty list of [`Clause`]s.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "Vec<Clause>", into = "Vec<Clause>")]
pub struct Clauses(Vec<Clause>);

impl Clauses {
    /// Creates new [`Clauses`] if the given list is not empty.
    ///
    /// [`Clause`]s are kept in the provided order.
    #[must_use]
    pub fn new(clauses: Vec<Clause>) -> Option<Self> {
        (!clauses.is_empty()).then_some(Self(clauses))
    }

    /// Returns an iterator over these [`Clauses`].
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Clause> {
        self.0.iter()
    }
}

impl AsRef<[Clause]> for Clauses {
    fn as_ref(&self) -> &[Clause] {
        &self.0
    }
}

impl TryFrom<Vec<Clause>> for Clauses {
    type Error = &'static str;

    fn try_from(clauses: Vec<Clause>) -> Result<Self, Self::Error> {
        Self::new(clauses).ok_or("`Clauses` cannot be empty")
    }
}

impl From<Clauses> for Vec<Clause> {
    fn from(clauses: Clauses) -> Self {
        clauses.0
    }
}

/// ISO 3166-1 alpha-2 code of a country.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct CountryCode(String);

impl CountryCode {
    /// Creates a new [`CountryCode`] if the given `code` is valid.
    ///
    /// Lowercase input is accepted and normalized.
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        let code = code.as_ref().trim().to_ascii_uppercase();
        (code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase()))
            .then_some(Self(code))
    }
}

impl Default for CountryCode {
    fn default() -> Self {
        Self("AT".into())
    }
}

impl FromStr for CountryCode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `CountryCode`")
    }
}

define_kind! {
    #[doc = "Status of an [`Agreement`]."]
    enum Status {
        #[doc = "Terms are being drafted by the host."]
        Draft = 1,

        #[doc = "Waiting for the host to sign."]
        PendingHost = 2,

        #[doc = "Waiting for the guest to sign."]
        PendingGuest = 3,

        #[doc = "Both parties have signed and the terms are sealed."]
        FullySigned = 4,

        #[doc = "The agreed stay or job is in progress."]
        Active = 5,

        #[doc = "The agreed stay or job has been completed."]
        Completed = 6,

        #[doc = "The [`Agreement`] has been cancelled."]
        Cancelled = 7,

        #[doc = "The parties are in a dispute."]
        Disputed = 8,
    }
}

impl Status {
    /// Indicates whether [`Signature`]s are accepted in this [`Status`].
    #[must_use]
    pub const fn is_signable(self) -> bool {
        matches!(self, Self::Draft | Self::PendingHost | Self::PendingGuest)
    }

    /// Indicates whether no explicit transitions are possible out of this
    /// [`Status`].
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

/// Role of a [`User`] in an [`Agreement`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Role {
    /// [`User`] owning the [`Listing`].
    #[display("host")]
    Host,

    /// [`User`] staying or working at the [`Listing`].
    #[display("guest")]
    Guest,
}

/// Version of an [`Agreement`], incremented on every modification.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Version(i32);

impl Version {
    /// [`Version`] of a newly created [`Agreement`].
    pub const INITIAL: Self = Self(1);

    /// Returns the [`Version`] following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// [`DateTime`] when an [`Agreement`] was created.
pub type CreationDateTime = DateTimeOf<(Agreement, unit::Creation)>;

/// [`DateTime`] when an [`Agreement`] was modified.
pub type ModificationDateTime = DateTimeOf<(Agreement, unit::Modification)>;

/// Marker type indicating the start of an [`Agreement`] period.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type indicating the end of an [`Agreement`] period.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// [`DateTime`] when an [`Agreement`] period starts.
pub type StartDateTime = DateTimeOf<(Agreement, Start)>;

/// [`DateTime`] when an [`Agreement`] period ends.
pub type EndDateTime = DateTimeOf<(Agreement, End)>;

#[cfg(test)]
pub(crate) mod spec {
    use common::DateTime;

    use crate::domain::{listing, user};

    use super::{
        Agreement, Clause, Clauses, Content, CountryCode, Preamble, Role,
        Status, Version,
    };

    pub(crate) fn content() -> Content {
        Content::new(
            Preamble::new("P").expect("valid"),
            Clauses::new(vec![Clause::new("c1", "text", 1).expect("valid")])
                .expect("valid"),
            CountryCode::default(),
            None,
            None,
        )
        .expect("valid")
    }

    pub(crate) fn agreement(status: Status) -> Agreement {
        Agreement::new(
            listing::Id::new(),
            user::Id::new(),
            user::Id::new(),
            content(),
            status,
        )
    }

    #[test]
    fn resolves_roles() {
        let a = agreement(Status::Draft);

        assert_eq!(a.role_of(a.host_id), Some(Role::Host));
        assert_eq!(a.role_of(a.guest_id), Some(Role::Guest));
        assert_eq!(a.role_of(user::Id::new()), None);
        assert_eq!(a.counterparty_of(a.host_id), Some(a.guest_id));
        assert_eq!(a.counterparty_of(a.guest_id), Some(a.host_id));
    }

    #[test]
    fn touch_bumps_version() {
        let mut a = agreement(Status::Draft);
        let before = a.updated_at;

        a.touch();

        assert_eq!(a.version, Version::INITIAL.next());
        assert!(a.updated_at >= before);
    }

    #[test]
    fn rejects_blank_terms() {
        assert!(Preamble::new("  \n").is_none());
        assert!(Preamble::new("x".repeat(Preamble::MAX_LEN + 1)).is_none());
        assert!(Clauses::new(vec![]).is_none());
        assert!(Clause::new("", "text", 1).is_none());
        assert!(Clause::new("title", " ", 1).is_none());
    }

    #[test]
    fn normalizes_country_code() {
        assert_eq!(
            CountryCode::new("de").map(|c| c.to_string()),
            Some("DE".into()),
        );
        assert_eq!(CountryCode::default().as_ref(), "AT");
        assert!(CountryCode::new("DEU").is_none());
        assert!(CountryCode::new("1A").is_none());
    }

    #[test]
    fn rejects_inverted_period() {
        let start = DateTime::from_rfc3339("2024-07-01T00:00:00Z")
            .expect("valid");
        let end = DateTime::from_rfc3339("2024-06-01T00:00:00Z")
            .expect("valid");
        let c = content();

        assert!(Content::new(
            c.preamble.clone(),
            c.clauses.clone(),
            c.country_code.clone(),
            Some(start.coerce()),
            Some(end.coerce()),
        )
        .is_none());
        assert!(Content::new(
            c.preamble,
            c.clauses,
            c.country_code,
            Some(end.coerce()),
            Some(start.coerce()),
        )
        .is_some());
    }

    #[test]
    fn clauses_deserialization_rejects_empty_list() {
        assert!(serde_json::from_str::<Clauses>("[]").is_err());
        assert!(serde_json::from_str::<Clauses>(
            r#"[{"title":"t","content":"c","order":1}]"#,
        )
        .is_ok());
    }

    #[test]
    fn needs_signature_only_while_signable() {
        let a = agreement(Status::PendingHost);
        assert!(a.needs_signature_of(a.host_id));
        assert!(!a.needs_signature_of(user::Id::new()));

        let a = agreement(Status::Active);
        assert!(!a.needs_signature_of(a.host_id));
    }
}
