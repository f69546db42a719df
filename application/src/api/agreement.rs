//! [`Agreement`]-related definitions.

use common::DateTime;
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::domain::{self, agreement};
use uuid::Uuid;

use crate::{api, define_error, Context, Error};

/// An agreement between a host and a guest.
#[derive(Clone, Debug, From, Into)]
pub struct Agreement(domain::Agreement);

/// An agreement between the host of a `Listing` and a guest staying or
/// working there.
#[graphql_object(context = Context)]
impl Agreement {
    /// Unique identifier of this `Agreement`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Agreement.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Current status of this `Agreement`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Agreement.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// `Listing` this `Agreement` concerns.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Agreement.listing",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn listing(&self) -> api::Listing {
        #[expect(unsafe_code, reason = "`Agreement` references `Listing`")]
        let listing =
            unsafe { api::Listing::new_unchecked(self.0.listing_id) };
        listing
    }

    /// Host of this `Agreement`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Agreement.host",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn host(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Agreement` references its parties")]
        let host = unsafe { api::User::new_unchecked(self.0.host_id) };
        host
    }

    /// Guest of this `Agreement`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Agreement.guest",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn guest(&self) -> api::User {
        #[expect(unsafe_code, reason = "`Agreement` references its parties")]
        let guest = unsafe { api::User::new_unchecked(self.0.guest_id) };
        guest
    }

    /// Role the authenticated `User` plays in this `Agreement`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Agreement.myRole",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn my_role(
        &self,
        ctx: &Context,
    ) -> Result<Option<Role>, Error> {
        let my_id = ctx.current_session().await?.user_id;
        Ok(self.0.role_of(my_id.into()).map(Into::into))
    }

    /// Preamble of the terms.
    pub fn preamble(&self) -> &str {
        self.0.content.preamble.as_ref()
    }

    /// Clauses of the terms, in their original order.
    pub fn clauses(&self) -> Vec<Clause> {
        self.0.content.clauses.iter().cloned().map(Into::into).collect()
    }

    /// ISO 3166-1 alpha-2 code of the country governing the terms.
    pub fn country_code(&self) -> &str {
        self.0.content.country_code.as_ref()
    }

    /// `DateTime` when the agreed period starts, if specified.
    pub fn start_date(&self) -> Option<DateTime> {
        self.0.content.start_date.map(|d| d.coerce())
    }

    /// `DateTime` when the agreed period ends, if specified.
    pub fn end_date(&self) -> Option<DateTime> {
        self.0.content.end_date.map(|d| d.coerce())
    }

    /// Signatures of this `Agreement`, in the order they were made.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Agreement.signatures",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn signatures(&self) -> Vec<Signature> {
        self.0.signatures.iter().cloned().map(Into::into).collect()
    }

    /// Indicator whether the authenticated `User` is expected to sign this
    /// `Agreement`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Agreement.needsMySignature",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn needs_my_signature(
        &self,
        ctx: &Context,
    ) -> Result<bool, Error> {
        let my_id = ctx.current_session().await?.user_id;
        Ok(self.0.needs_signature_of(my_id.into()))
    }

    /// Hex-encoded SHA-256 hash the terms were sealed with once both parties
    /// have signed.
    pub fn seal_hash(&self) -> Option<&str> {
        self.0.seal.as_ref().map(|s| s.hash.as_ref())
    }

    /// `DateTime` when this `Agreement` was sealed.
    pub fn finalized_at(&self) -> Option<DateTime> {
        self.0.seal.as_ref().map(|s| s.finalized_at.coerce())
    }

    /// Indicator whether the sealed terms are left untouched.
    ///
    /// `null` if this `Agreement` is not sealed yet.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Agreement.sealIntact",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn seal_intact(&self) -> Option<bool> {
        self.0.verify_seal()
    }

    /// Version of this `Agreement`, incremented on every modification.
    pub fn version(&self) -> i32 {
        self.0.version.into()
    }

    /// `DateTime` when this `Agreement` was created.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Agreement` was modified last time.
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Signature of an [`Agreement`].
#[derive(Clone, Debug, From, Into)]
pub struct Signature(agreement::Signature);

/// Signature of an `Agreement` by one of its parties.
#[graphql_object(name = "AgreementSignature", context = Context)]
impl Signature {
    /// `User` who made this signature.
    pub fn user(&self) -> api::User {
        #[expect(unsafe_code, reason = "only parties sign `Agreement`s")]
        let user = unsafe { api::User::new_unchecked(self.0.user_id) };
        user
    }

    /// Name of the signer at the moment of signing.
    pub fn name(&self) -> &str {
        self.0.name.as_ref()
    }

    /// `DateTime` when this signature was made.
    pub fn signed_at(&self) -> DateTime {
        self.0.signed_at.coerce()
    }

    /// IP address this signature was made from, or `unknown`.
    pub fn ip_address(&self) -> &str {
        self.0.ip_address.as_ref()
    }

    /// User agent this signature was made with, or `unknown`.
    pub fn user_agent(&self) -> &str {
        self.0.user_agent.as_ref()
    }
}

/// Clause of an [`Agreement`].
#[derive(Clone, Debug, From, Into)]
pub struct Clause(agreement::Clause);

/// Single clause of the `Agreement` terms.
#[graphql_object(name = "AgreementClause", context = Context)]
impl Clause {
    /// Title of this clause.
    pub fn title(&self) -> &str {
        &self.0.title
    }

    /// Text of this clause.
    pub fn content(&self) -> &str {
        &self.0.content
    }

    /// Position of this clause among the others.
    pub fn order(&self) -> i32 {
        self.0.order
    }
}

/// Default terms of an [`Agreement`].
#[derive(Clone, Debug, From, Into)]
pub struct Template(agreement::Content);

/// Default terms drafted for an `Agreement` upon a `Listing`, to be adjusted
/// by the parties before proposing them.
#[graphql_object(name = "AgreementTemplate", context = Context)]
impl Template {
    /// Preamble of the terms, signed off by the `Listing` owner.
    pub fn preamble(&self) -> &str {
        self.0.preamble.as_ref()
    }

    /// Clauses of the terms, depending on the `Listing` kind.
    pub fn clauses(&self) -> Vec<Clause> {
        self.0.clauses.iter().cloned().map(Into::into).collect()
    }

    /// ISO 3166-1 alpha-2 code of the country governing the terms.
    pub fn country_code(&self) -> &str {
        self.0.country_code.as_ref()
    }
}

/// Unique identifier of an `Agreement`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(agreement::Id)]
#[into(agreement::Id)]
#[graphql(name = "AgreementId", transparent)]
pub struct Id(Uuid);

/// Status of an `Agreement`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "AgreementStatus")]
pub enum Status {
    /// Terms are being drafted by the host.
    Draft,

    /// Waiting for the host to sign.
    PendingHost,

    /// Waiting for the guest to sign.
    PendingGuest,

    /// Both parties have signed and the terms are sealed.
    FullySigned,

    /// The agreed stay or job is in progress.
    Active,

    /// The agreed stay or job has been completed.
    Completed,

    /// The `Agreement` has been cancelled.
    Cancelled,

    /// The parties are in a dispute.
    Disputed,
}

impl From<agreement::Status> for Status {
    fn from(status: agreement::Status) -> Self {
        use agreement::Status as S;
        match status {
            S::Draft => Self::Draft,
            S::PendingHost => Self::PendingHost,
            S::PendingGuest => Self::PendingGuest,
            S::FullySigned => Self::FullySigned,
            S::Active => Self::Active,
            S::Completed => Self::Completed,
            S::Cancelled => Self::Cancelled,
            S::Disputed => Self::Disputed,
        }
    }
}

impl From<Status> for agreement::Status {
    fn from(status: Status) -> Self {
        use Status as S;
        match status {
            S::Draft => Self::Draft,
            S::PendingHost => Self::PendingHost,
            S::PendingGuest => Self::PendingGuest,
            S::FullySigned => Self::FullySigned,
            S::Active => Self::Active,
            S::Completed => Self::Completed,
            S::Cancelled => Self::Cancelled,
            S::Disputed => Self::Disputed,
        }
    }
}

/// Role of a `User` in an `Agreement`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "AgreementRole")]
pub enum Role {
    /// `User` owning the `Listing`.
    Host,

    /// `User` staying or working at the `Listing`.
    Guest,
}

impl From<agreement::Role> for Role {
    fn from(role: agreement::Role) -> Self {
        match role {
            agreement::Role::Host => Self::Host,
            agreement::Role::Guest => Self::Guest,
        }
    }
}

impl From<Role> for agreement::Role {
    fn from(role: Role) -> Self {
        match role {
            Role::Host => Self::Host,
            Role::Guest => Self::Guest,
        }
    }
}

/// Terms of a new `Agreement`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "AgreementContentInput")]
pub struct ContentInput {
    /// Preamble of the terms. Must not be blank, nor exceed 20000
    /// characters.
    pub preamble: String,

    /// Clauses of the terms. At least one is required.
    pub clauses: Vec<ClauseInput>,

    /// ISO 3166-1 alpha-2 code of the country governing the terms.
    ///
    /// `AT` if not specified.
    pub country_code: Option<String>,

    /// `DateTime` when the agreed period starts.
    pub start_date: Option<DateTime>,

    /// `DateTime` when the agreed period ends.
    ///
    /// Must not precede the `startDate`.
    pub end_date: Option<DateTime>,
}

/// Single clause of new `Agreement` terms.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "AgreementClauseInput")]
pub struct ClauseInput {
    /// Title of the clause. Must not be blank.
    pub title: String,

    /// Text of the clause. Must not be blank.
    pub content: String,

    /// Position of the clause among the others.
    pub order: i32,
}

impl TryFrom<ContentInput> for agreement::Content {
    type Error = Error;

    fn try_from(input: ContentInput) -> Result<Self, Self::Error> {
        let ContentInput {
            preamble,
            clauses,
            country_code,
            start_date,
            end_date,
        } = input;

        if preamble.chars().count() > agreement::Preamble::MAX_LEN {
            return Err(ValidationError::PreambleTooLong.into());
        }
        let preamble = agreement::Preamble::new(preamble)
            .ok_or(ValidationError::EmptyPreamble)?;
        let clauses = clauses
            .into_iter()
            .map(|c| agreement::Clause::new(c.title, c.content, c.order))
            .collect::<Option<Vec<_>>>()
            .ok_or(ValidationError::InvalidClause)?;
        let clauses = agreement::Clauses::new(clauses)
            .ok_or(ValidationError::EmptyClauses)?;
        let country_code = country_code
            .map(|c| {
                agreement::CountryCode::new(c)
                    .ok_or(ValidationError::InvalidCountryCode)
            })
            .transpose()?
            .unwrap_or_default();

        Self::new(
            preamble,
            clauses,
            country_code,
            start_date.map(DateTime::coerce),
            end_date.map(DateTime::coerce),
        )
        .ok_or_else(|| ValidationError::InvalidPeriod.into())
    }
}

define_error! {
    enum ValidationError {
        #[code = "EMPTY_PREAMBLE"]
        #[status = BAD_REQUEST]
        #[message = "`Agreement` preamble must not be blank"]
        EmptyPreamble,

        #[code = "PREAMBLE_TOO_LONG"]
        #[status = BAD_REQUEST]
        #[message = "`Agreement` preamble must not exceed 20000 characters"]
        PreambleTooLong,

        #[code = "EMPTY_CLAUSES"]
        #[status = BAD_REQUEST]
        #[message = "`Agreement` must have at least one clause"]
        EmptyClauses,

        #[code = "INVALID_CLAUSE"]
        #[status = BAD_REQUEST]
        #[message = "`Agreement` clause title and content must not be blank"]
        InvalidClause,

        #[code = "INVALID_COUNTRY_CODE"]
        #[status = BAD_REQUEST]
        #[message = "Country code must be an ISO 3166-1 alpha-2 code"]
        InvalidCountryCode,

        #[code = "INVALID_PERIOD"]
        #[status = BAD_REQUEST]
        #[message = "`startDate` must not be later than `endDate`"]
        InvalidPeriod,
    }
}

pub mod list {
    //! Definitions related to [`Agreement`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::read;

    use crate::{api::scalar, Context};

    use super::{Agreement, Id};

    /// Cursor for the `Agreement` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::agreement::list::Cursor)]
    #[graphql(
        name = "AgreementListCursor",
        with = scalar::Via::<read::agreement::list::Cursor>,
    )]
    pub struct Cursor(pub read::agreement::list::Cursor);

    /// Edge in the [`Agreement`] list.
    #[derive(Clone, Debug, From, Into)]
    pub struct Edge(read::agreement::list::Edge);

    /// Edge in the `Agreement` list.
    #[graphql_object(name = "AgreementListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `AgreementListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `AgreementListEdge`.
        #[must_use]
        pub fn node(&self) -> Agreement {
            self.0.node.clone().into()
        }
    }

    /// Connection of the [`Agreement`] list.
    #[derive(Clone, Debug, From, Into)]
    pub struct Connection(read::agreement::list::Connection);

    /// Connection of the `Agreement` list.
    #[graphql_object(name = "AgreementListConnection", context = Context)]
    impl Connection {
        /// Edges in this `AgreementListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.0.edges.iter().cloned().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            self.0.page_info().into()
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Copy, Debug, From)]
    pub struct PageInfo(read::agreement::list::PageInfo);

    /// Information about an `AgreementListConnection` page.
    #[graphql_object(name = "AgreementListPageInfo", context = Context)]
    impl PageInfo {
        /// Indicator whether there is a next page.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.0.has_next_page
        }

        /// Indicator whether there is a previous page.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.0.has_previous_page
        }

        /// Start cursor of the page.
        #[must_use]
        pub fn start_cursor(&self) -> Option<Cursor> {
            self.0.start_cursor.map(Into::into)
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> Option<Cursor> {
            self.0.end_cursor.map(Into::into)
        }
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use service::domain::agreement;

    use super::{ClauseInput, ContentInput};

    fn input() -> ContentInput {
        ContentInput {
            preamble: "Summer season at the lake.".into(),
            clauses: vec![ClauseInput {
                title: "Quiet hours".into(),
                content: "No noise after 22:00.".into(),
                order: 1,
            }],
            country_code: None,
            start_date: None,
            end_date: None,
        }
    }

    fn code_of(input: ContentInput) -> &'static str {
        agreement::Content::try_from(input)
            .expect_err("invalid content")
            .code
    }

    #[test]
    fn defaults_country_code() {
        let content =
            agreement::Content::try_from(input()).expect("valid content");

        assert_eq!(content.country_code.as_ref(), "AT");
        assert_eq!(content.clauses.iter().len(), 1);
    }

    #[test]
    fn normalizes_country_code() {
        let content = agreement::Content::try_from(ContentInput {
            country_code: Some("de".into()),
            ..input()
        })
        .expect("valid content");

        assert_eq!(content.country_code.as_ref(), "DE");
    }

    #[test]
    fn rejects_invalid_terms() {
        assert_eq!(
            code_of(ContentInput {
                preamble: "  ".into(),
                ..input()
            }),
            "EMPTY_PREAMBLE",
        );
        assert_eq!(
            code_of(ContentInput {
                preamble: "x".repeat(agreement::Preamble::MAX_LEN + 1),
                ..input()
            }),
            "PREAMBLE_TOO_LONG",
        );
        assert_eq!(
            code_of(ContentInput {
                clauses: vec![],
                ..input()
            }),
            "EMPTY_CLAUSES",
        );
        assert_eq!(
            code_of(ContentInput {
                clauses: vec![ClauseInput {
                    title: "Deposit".into(),
                    content: String::new(),
                    order: 1,
                }],
                ..input()
            }),
            "INVALID_CLAUSE",
        );
        assert_eq!(
            code_of(ContentInput {
                country_code: Some("AUT".into()),
                ..input()
            }),
            "INVALID_COUNTRY_CODE",
        );
    }

    #[test]
    fn rejects_inverted_period() {
        let now = DateTime::now();

        assert_eq!(
            code_of(ContentInput {
                start_date: Some(now + std::time::Duration::from_secs(60)),
                end_date: Some(now),
                ..input()
            }),
            "INVALID_PERIOD",
        );
    }
}
