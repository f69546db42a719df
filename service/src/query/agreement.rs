//! [`Query`] collection related to a single [`Agreement`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::{agreement, user, Agreement},
    infra::{database, Database},
    Service,
};

use super::Query;

/// [`Query`] for an [`Agreement`] on behalf of one of its parties.
#[derive(Clone, Copy, Debug)]
pub struct GetAgreement {
    /// ID of the requested [`Agreement`].
    pub agreement_id: agreement::Id,

    /// ID of the [`User`] requesting the [`Agreement`].
    pub requester_id: user::Id,
}

impl<Db> Query<GetAgreement> for Service<Db>
where
    Db: Database<
        Select<By<Option<Agreement>, agreement::Id>>,
        Ok = Option<Agreement>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Agreement;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, q: GetAgreement) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let GetAgreement {
            agreement_id,
            requester_id,
        } = q;

        let agreement = self
            .database()
            .execute(Select(By::<Option<Agreement>, _>::new(agreement_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::AgreementNotExists(agreement_id))
            .map_err(tracerr::wrap!())?;
        if !agreement.is_party(requester_id) {
            return Err(tracerr::new!(E::NotAParty(requester_id)));
        }

        Ok(agreement)
    }
}

/// Error of [`GetAgreement`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Agreement`] with the provided ID does not exist.
    #[display("`Agreement(id: {_0})` does not exist")]
    AgreementNotExists(#[error(not(source))] agreement::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Requester is neither the host nor the guest.
    #[display("`User(id: {_0})` is not a party of the `Agreement`")]
    NotAParty(#[error(not(source))] user::Id),
}
