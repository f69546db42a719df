//! [`Listing`]-related definitions.

use std::future;

use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A marketplace listing.
#[derive(Clone, Debug, From)]
pub struct Listing {
    /// ID of this [`Listing`].
    id: Id,

    /// Underlying [`domain::Listing`].
    listing: OnceCell<domain::Listing>,
}

impl From<domain::Listing> for Listing {
    fn from(listing: domain::Listing) -> Self {
        Self {
            id: listing.id.into(),
            listing: OnceCell::new_with(Some(listing)),
        }
    }
}

impl Listing {
    /// Creates a new [`Listing`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Listing`] with the provided ID exists,
    /// otherwise accessing this [`Listing`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            listing: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Listing`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Listing`] doesn't exist.
    async fn listing(&self, ctx: &Context) -> Result<&domain::Listing, Error> {
        let id = self.id.into();
        self.listing
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::listing::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|l| {
                        future::ready(l.ok_or_else(|| {
                            api::query::ListingError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A marketplace listing offering a seasonal stay or job.
#[graphql_object(context = Context)]
impl Listing {
    /// Unique identifier of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Title of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.title",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn title(&self, ctx: &Context) -> Result<Title, Error> {
        Ok(self.listing(ctx).await?.title.clone().into())
    }

    /// Kind of this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.kind",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn kind(&self, ctx: &Context) -> Result<Kind, Error> {
        Ok(self.listing(ctx).await?.kind.into())
    }

    /// City this `Listing` is located in, if specified.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.city",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn city(&self, ctx: &Context) -> Result<Option<String>, Error> {
        Ok(self.listing(ctx).await?.city.clone())
    }

    /// Region this `Listing` is located in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.region",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn region(&self, ctx: &Context) -> Result<String, Error> {
        Ok(self.listing(ctx).await?.region.clone())
    }

    /// Default `Agreement` terms for this `Listing`, signed off by its owner.
    ///
    /// Meant to be adjusted and passed to `createAgreement` or
    /// `requestAgreement`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.agreementTemplate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn agreement_template(
        &self,
        ctx: &Context,
    ) -> Result<api::agreement::Template, Error> {
        let listing = self.listing(ctx).await?;
        let owner = ctx
            .service()
            .execute(query::user::ById::by(listing.owner_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        let host_name = owner
            .as_ref()
            .and_then(|o| o.name.as_ref())
            .map(AsRef::<str>::as_ref);
        Ok(domain::agreement::Content::template(listing, host_name).into())
    }

    /// `User` owning this `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Listing.owner",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn owner(&self, ctx: &Context) -> Result<api::User, Error> {
        let owner_id = self.listing(ctx).await?.owner_id;

        #[expect(unsafe_code, reason = "`Listing` owner always exists")]
        let owner = unsafe { api::User::new_unchecked(owner_id) };
        Ok(owner)
    }
}

/// Unique identifier of a `Listing`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::listing::Id)]
#[into(domain::listing::Id)]
#[graphql(name = "ListingId", transparent)]
pub struct Id(Uuid);

/// Title of a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ListingTitle",
    with = scalar::Via::<domain::listing::Title>,
)]
pub struct Title(domain::listing::Title);

/// Kind of a `Listing`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "ListingKind")]
pub enum Kind {
    /// Seasonal accommodation.
    Stay,

    /// Seasonal job.
    Job,
}

impl From<domain::listing::Kind> for Kind {
    fn from(kind: domain::listing::Kind) -> Self {
        use domain::listing::Kind as K;
        match kind {
            K::Stay => Self::Stay,
            K::Job => Self::Job,
        }
    }
}
