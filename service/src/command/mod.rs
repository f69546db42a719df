//! [`Command`] definition.

pub mod apply_trust_increment;
pub mod authorize_user_session;
pub mod create_agreement;
pub mod delete_agreement;
pub mod notify_parties;
pub mod request_agreement;
pub mod sign_agreement;
pub mod transition_agreement;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    apply_trust_increment::ApplyTrustIncrement,
    authorize_user_session::AuthorizeUserSession,
    create_agreement::CreateAgreement, delete_agreement::DeleteAgreement,
    notify_parties::NotifyParties, request_agreement::RequestAgreement,
    sign_agreement::SignAgreement,
    transition_agreement::TransitionAgreement,
};
