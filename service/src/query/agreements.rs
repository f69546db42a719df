//! [`Query`] collection related to multiple [`Agreement`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Agreement, Query};
use crate::read::agreement::list::{Page, Selector};

use super::DatabaseQuery;

/// Queries a [`Page`] of [`Agreement`]s the [`Selector`] matches.
///
/// Authorization is up to the caller: the [`Selector`] must be restricted to
/// the caller's own [`Agreement`]s.
pub type List = DatabaseQuery<By<Page, Selector>>;
