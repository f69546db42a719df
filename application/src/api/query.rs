//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::user::ById::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Agreement` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AGREEMENT_NOT_EXISTS` - the `Agreement` with the specified ID does
    ///                            not exist;
    /// - `NOT_AGREEMENT_PARTY` - the authenticated `User` is neither the host
    ///                           nor the guest of the `Agreement`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "agreement",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn agreement(
        id: api::agreement::Id,
        ctx: &Context,
    ) -> Result<api::Agreement, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(query::GetAgreement {
                agreement_id: id.into(),
                requester_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Agreement`s of the authenticated `User`, the
    /// newest first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "agreements",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            role = ?role,
            status = ?status,
        ),
    )]
    pub async fn agreements(
        first: Option<i32>,
        after: Option<api::agreement::list::Cursor>,
        last: Option<i32>,
        before: Option<api::agreement::list::Cursor>,
        role: Option<api::agreement::Role>,
        status: Option<api::agreement::Status>,
        ctx: &Context,
    ) -> Result<api::agreement::list::Connection, Error> {
        const DEFAULT_PAGE_SIZE: usize = 10;
        const MAX_PAGE_SIZE: usize = 100;

        let arguments = read::agreement::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            DEFAULT_PAGE_SIZE,
            MAX_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;

        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(query::agreements::List::by(
                read::agreement::list::Selector {
                    arguments,
                    filter: read::agreement::list::Filter {
                        party: my_id.into(),
                        role: role.map(Into::into),
                        status: status.map(Into::into),
                    },
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for query::agreement::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AgreementNotExists(_) => {
                Some(AgreementError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::NotAParty(_) => Some(AgreementError::NotAParty.into()),
        }
    }
}

define_error! {
    enum AgreementError {
        #[code = "AGREEMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Agreement` with the specified ID does not exist"]
        NotExists,

        #[code = "NOT_AGREEMENT_PARTY"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` is not a party to the `Agreement`"]
        NotAParty,

        #[code = "CONCURRENT_MODIFICATION"]
        #[status = CONFLICT]
        #[message = "`Agreement` was modified concurrently, retry the request"]
        ConcurrentModification,
    }
}

define_error! {
    enum ListingError {
        #[code = "LISTING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Listing` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}

#[cfg(test)]
mod spec {
    use service::{
        domain::{agreement, user},
        query,
    };

    use crate::AsError as _;

    #[test]
    fn maps_agreement_errors() {
        use query::agreement::ExecutionError as E;

        let err = E::AgreementNotExists(agreement::Id::new())
            .try_as_error()
            .expect("client error");
        assert_eq!(err.code, "AGREEMENT_NOT_EXISTS");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);

        let err = E::NotAParty(user::Id::new())
            .try_as_error()
            .expect("client error");
        assert_eq!(err.code, "NOT_AGREEMENT_PARTY");
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);
    }
}
