//! GraphQL [`Mutation`]s definitions.

use juniper::graphql_object;
use service::{command, domain::agreement, Command as _};

use crate::{
    api::{
        self,
        query::{AgreementError, ListingError},
    },
    define_error, AsError, Context, Error,
};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Drafts a new `Agreement` for the `Listing` of the authenticated
    /// `User` with the specified guest.
    ///
    /// The guest is notified about the draft.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LISTING_NOT_EXISTS` - the `Listing` with the specified ID does not
    ///                          exist;
    /// - `NOT_LISTING_OWNER` - the authenticated `User` doesn't own the
    ///                         `Listing`;
    /// - `SELF_AGREEMENT` - the guest is the authenticated `User`;
    /// - `USER_NOT_EXISTS` - the guest does not exist;
    /// - `EMPTY_PREAMBLE`, `PREAMBLE_TOO_LONG`, `EMPTY_CLAUSES`,
    ///   `INVALID_CLAUSE`, `INVALID_COUNTRY_CODE`, `INVALID_PERIOD` - the
    ///   terms are invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createAgreement",
            guest_id = %guest_id,
            listing_id = %listing_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_agreement(
        listing_id: api::listing::Id,
        guest_id: api::user::Id,
        content: api::agreement::ContentInput,
        ctx: &Context,
    ) -> Result<api::Agreement, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let content = agreement::Content::try_from(content)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateAgreement {
                initiator_id: my_id.into(),
                listing_id: listing_id.into(),
                guest_id: guest_id.into(),
                content,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Requests a new `Agreement` for the specified `Listing` as its guest.
    ///
    /// The `Agreement` awaits the signature of the `Listing` owner, who is
    /// notified about the request.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LISTING_NOT_EXISTS` - the `Listing` with the specified ID does not
    ///                          exist;
    /// - `SELF_AGREEMENT` - the authenticated `User` owns the `Listing`;
    /// - `USER_NOT_EXISTS` - the `Listing` owner does not exist;
    /// - `EMPTY_PREAMBLE`, `PREAMBLE_TOO_LONG`, `EMPTY_CLAUSES`,
    ///   `INVALID_CLAUSE`, `INVALID_COUNTRY_CODE`, `INVALID_PERIOD` - the
    ///   terms are invalid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "requestAgreement",
            listing_id = %listing_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn request_agreement(
        listing_id: api::listing::Id,
        content: api::agreement::ContentInput,
        ctx: &Context,
    ) -> Result<api::Agreement, Error> {
        let my_id = ctx.current_session().await?.user_id;
        let content = agreement::Content::try_from(content)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::RequestAgreement {
                guest_id: my_id.into(),
                listing_id: listing_id.into(),
                content,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Signs the specified `Agreement` as the authenticated `User`.
    ///
    /// Once both parties have signed, the terms are sealed.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AGREEMENT_NOT_EXISTS` - the `Agreement` with the specified ID does
    ///                            not exist;
    /// - `NOT_AGREEMENT_PARTY` - the authenticated `User` is neither the host
    ///                           nor the guest of the `Agreement`;
    /// - `ALREADY_SIGNED` - the authenticated `User` has signed already;
    /// - `AGREEMENT_NOT_SIGNABLE` - the `Agreement` doesn't accept signatures
    ///                              in its current status;
    /// - `CONCURRENT_MODIFICATION` - the `Agreement` was modified
    ///                               concurrently.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "signAgreement",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn sign_agreement(
        id: api::agreement::Id,
        ctx: &Context,
    ) -> Result<api::Agreement, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::SignAgreement {
                agreement_id: id.into(),
                signer_id: my_id.into(),
                audit: ctx.audit(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the specified `Agreement` into the specified status.
    ///
    /// `FULLY_SIGNED` status is reachable by signing only.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AGREEMENT_NOT_EXISTS` - the `Agreement` with the specified ID does
    ///                            not exist;
    /// - `NOT_AGREEMENT_PARTY` - the authenticated `User` is neither the host
    ///                           nor the guest of the `Agreement`;
    /// - `ILLEGAL_TRANSITION` - the `Agreement` cannot be moved into the
    ///                          specified status from its current one;
    /// - `CONCURRENT_MODIFICATION` - the `Agreement` was modified
    ///                               concurrently.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "transitionAgreement",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn transition_agreement(
        id: api::agreement::Id,
        status: api::agreement::Status,
        ctx: &Context,
    ) -> Result<api::Agreement, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::TransitionAgreement {
                agreement_id: id.into(),
                initiator_id: my_id.into(),
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the specified `DRAFT` `Agreement` of the authenticated host.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AGREEMENT_NOT_EXISTS` - the `Agreement` with the specified ID does
    ///                            not exist;
    /// - `NOT_AGREEMENT_HOST` - the authenticated `User` is not the host of
    ///                          the `Agreement`;
    /// - `NOT_DRAFT` - the `Agreement` is not a `DRAFT` anymore.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteAgreement",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_agreement(
        id: api::agreement::Id,
        ctx: &Context,
    ) -> Result<api::Agreement, Error> {
        let my_id = ctx.current_session().await?.user_id;

        ctx.service()
            .execute(command::DeleteAgreement {
                agreement_id: id.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum PartiesError {
        #[code = "NOT_LISTING_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` doesn't own the `Listing`"]
        NotListingOwner,

        #[code = "SELF_AGREEMENT"]
        #[status = BAD_REQUEST]
        #[message = "Host and guest of an `Agreement` must differ"]
        SelfAgreement,

        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        UserNotExists,
    }
}

impl AsError for command::create_agreement::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ListingNotExists(_) => Some(ListingError::NotExists.into()),
            Self::NotListingOwner(_) => {
                Some(PartiesError::NotListingOwner.into())
            }
            Self::SelfAgreement(_) => Some(PartiesError::SelfAgreement.into()),
            Self::UserNotExists(_) => Some(PartiesError::UserNotExists.into()),
        }
    }
}

impl AsError for command::request_agreement::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ListingNotExists(_) => Some(ListingError::NotExists.into()),
            Self::SelfAgreement(_) => Some(PartiesError::SelfAgreement.into()),
            Self::UserNotExists(_) => Some(PartiesError::UserNotExists.into()),
        }
    }
}

impl AsError for command::sign_agreement::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ALREADY_SIGNED"]
                #[status = CONFLICT]
                #[message = "Authenticated `User` has signed the `Agreement` \
                             already"]
                AlreadySigned,

                #[code = "AGREEMENT_NOT_SIGNABLE"]
                #[status = CONFLICT]
                #[message = "`Agreement` doesn't accept signatures in its \
                             current status"]
                NotSignable,
            }
        }

        match self {
            Self::AgreementNotExists(_) => {
                Some(AgreementError::NotExists.into())
            }
            Self::AlreadySigned(_) => Some(Error::AlreadySigned.into()),
            Self::ConcurrentModification(_) => {
                Some(AgreementError::ConcurrentModification.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::NotAParty(_) => Some(AgreementError::NotAParty.into()),
            Self::NotSignable(_) => Some(Error::NotSignable.into()),
            // Signer is authenticated, so must exist.
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::transition_agreement::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ILLEGAL_TRANSITION"]
                #[status = CONFLICT]
                #[message = "`Agreement` cannot be moved into the specified \
                             status from its current one"]
                IllegalTransition,
            }
        }

        match self {
            Self::AgreementNotExists(_) => {
                Some(AgreementError::NotExists.into())
            }
            Self::ConcurrentModification(_) => {
                Some(AgreementError::ConcurrentModification.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::IllegalTransition(_) => Some(Error::IllegalTransition.into()),
            Self::NotAParty(_) => Some(AgreementError::NotAParty.into()),
        }
    }
}

impl AsError for command::delete_agreement::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NOT_AGREEMENT_HOST"]
                #[status = FORBIDDEN]
                #[message = "Authenticated `User` is not the host of the \
                             `Agreement`"]
                NotHost,

                #[code = "NOT_DRAFT"]
                #[status = CONFLICT]
                #[message = "Only `DRAFT` `Agreement`s can be deleted"]
                NotDraft,
            }
        }

        match self {
            Self::AgreementNotExists(_) => {
                Some(AgreementError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::NotDraft(_) => Some(Error::NotDraft.into()),
            Self::NotHost(_) => Some(Error::NotHost.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use juniper::{EmptySubscription, Variables};
    use service::{
        command::{
            create_agreement, delete_agreement, request_agreement,
            sign_agreement, transition_agreement,
        },
        domain::{
            agreement::{self, transition::IllegalTransition, Status},
            listing, user,
        },
    };

    use crate::{api, context, AsError, Context};

    fn code_and_status(err: &impl AsError) -> (&'static str, u16) {
        let err = err.try_as_error().expect("client error");
        (err.code, err.status_code.as_u16())
    }

    async fn run_mutation(ctx: &Context, mutation: &str) -> Vec<String> {
        let schema = api::Schema::new(
            api::Query,
            api::Mutation,
            EmptySubscription::new(),
        );
        let (_, errors) =
            juniper::execute(mutation, None, &schema, &Variables::new(), ctx)
                .await
                .expect("valid GraphQL document");
        errors
            .iter()
            .filter_map(|e| {
                e.error()
                    .extensions()
                    .as_object_value()?
                    .get_field_value("code")?
                    .as_string_value()
                    .map(str::to_owned)
            })
            .collect()
    }

    #[tokio::test]
    async fn authenticates_before_validating_new_terms() {
        for mutation in [
            r#"mutation {
                createAgreement(
                    listingId: "6a2f41a0-7b6f-4b0c-9d3e-8a1f2b3c4d5e"
                    guestId: "0f8e7d6c-5b4a-4392-8170-6f5e4d3c2b1a"
                    content: { preamble: "  ", clauses: [] }
                ) { id }
            }"#,
            r#"mutation {
                requestAgreement(
                    listingId: "6a2f41a0-7b6f-4b0c-9d3e-8a1f2b3c4d5e"
                    content: { preamble: "  ", clauses: [] }
                ) { id }
            }"#,
        ] {
            let ctx = context::spec::anonymous().await;

            let codes = run_mutation(&ctx, mutation).await;

            assert_eq!(codes, ["AUTHORIZATION_REQUIRED"]);
            assert_eq!(ctx.error_status_code(), http::StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn maps_creation_errors() {
        use create_agreement::ExecutionError as E;

        let user_id = user::Id::new();
        assert_eq!(
            code_and_status(&E::ListingNotExists(listing::Id::new())),
            ("LISTING_NOT_EXISTS", 404),
        );
        assert_eq!(
            code_and_status(&E::NotListingOwner(user_id)),
            ("NOT_LISTING_OWNER", 403),
        );
        assert_eq!(
            code_and_status(&E::SelfAgreement(user_id)),
            ("SELF_AGREEMENT", 400),
        );
        assert_eq!(
            code_and_status(&E::UserNotExists(user_id)),
            ("USER_NOT_EXISTS", 404),
        );
    }

    #[test]
    fn maps_request_errors() {
        use request_agreement::ExecutionError as E;

        let user_id = user::Id::new();
        assert_eq!(
            code_and_status(&E::ListingNotExists(listing::Id::new())),
            ("LISTING_NOT_EXISTS", 404),
        );
        assert_eq!(
            code_and_status(&E::SelfAgreement(user_id)),
            ("SELF_AGREEMENT", 400),
        );
        assert_eq!(
            code_and_status(&E::UserNotExists(user_id)),
            ("USER_NOT_EXISTS", 404),
        );
    }

    #[test]
    fn maps_signing_errors() {
        use sign_agreement::ExecutionError as E;

        let (id, user_id) = (agreement::Id::new(), user::Id::new());
        assert_eq!(
            code_and_status(&E::AgreementNotExists(id)),
            ("AGREEMENT_NOT_EXISTS", 404),
        );
        assert_eq!(
            code_and_status(&E::AlreadySigned(user_id)),
            ("ALREADY_SIGNED", 409),
        );
        assert_eq!(
            code_and_status(&E::ConcurrentModification(id)),
            ("CONCURRENT_MODIFICATION", 409),
        );
        assert_eq!(
            code_and_status(&E::NotAParty(user_id)),
            ("NOT_AGREEMENT_PARTY", 403),
        );
        assert_eq!(
            code_and_status(&E::NotSignable(Status::Active)),
            ("AGREEMENT_NOT_SIGNABLE", 409),
        );
        assert!(E::UserNotExists(user_id).try_as_error().is_none());
    }

    #[test]
    fn maps_transition_errors() {
        use transition_agreement::ExecutionError as E;

        let (id, user_id) = (agreement::Id::new(), user::Id::new());
        assert_eq!(
            code_and_status(&E::AgreementNotExists(id)),
            ("AGREEMENT_NOT_EXISTS", 404),
        );
        assert_eq!(
            code_and_status(&E::ConcurrentModification(id)),
            ("CONCURRENT_MODIFICATION", 409),
        );
        assert_eq!(
            code_and_status(&E::IllegalTransition(IllegalTransition {
                from: Status::Draft,
                to: Status::Completed,
            })),
            ("ILLEGAL_TRANSITION", 409),
        );
        assert_eq!(
            code_and_status(&E::NotAParty(user_id)),
            ("NOT_AGREEMENT_PARTY", 403),
        );
    }

    #[test]
    fn maps_deletion_errors() {
        use delete_agreement::ExecutionError as E;

        assert_eq!(
            code_and_status(&E::AgreementNotExists(agreement::Id::new())),
            ("AGREEMENT_NOT_EXISTS", 404),
        );
        assert_eq!(
            code_and_status(&E::NotDraft(Status::PendingHost)),
            ("NOT_DRAFT", 409),
        );
        assert_eq!(
            code_and_status(&E::NotHost(user::Id::new())),
            ("NOT_AGREEMENT_HOST", 403),
        );
    }
}
