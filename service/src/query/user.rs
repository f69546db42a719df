//! [`Query`] collection related to a single [`User`].

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::domain::{user, User};

use super::DatabaseQuery;

/// Queries a [`User`] by its [`user::Id`].
///
/// Deleted [`User`]s are never returned, so a party of an `Agreement` may
/// resolve to [`None`].
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;
