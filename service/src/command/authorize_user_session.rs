//! [`Command`] for authorizing a caller by their [`Session`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::{Algorithm, Validation};
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a caller by the [`session::Token`] issued to
/// them by the identity provider.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &validation,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        // Deleted `User`s are not selected at all.
        drop(
            self.database()
                .execute(Select(By::<Option<User>, _>::new(session.user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(session.user_id))
                .map_err(tracerr::wrap!())?,
        );

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`session::Token`] is malformed, expired or signed with a wrong key.
    #[display("Invalid `Session` token: {_0}")]
    InvalidToken(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        command::Command as _,
        domain::user::{self, session, Session},
        infra::Memory,
        task, Config, Service,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    const SECRET: &[u8] = b"secret";

    fn service() -> Service<Memory> {
        let config = Config {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(SECRET),
            reconcile_trust_metrics: task::reconcile_trust_metrics::Config {
                interval: Duration::from_secs(60),
                grace_period: Duration::from_secs(60),
                batch_size: 100,
            },
        };
        // Background `Task`s are never run here.
        let (svc, _bg) = Service::new(config, Memory::new());
        svc
    }

    #[expect(unsafe_code, reason = "test")]
    fn token(user_id: user::Id, secret: &[u8]) -> session::Token {
        let session = Session {
            user_id,
            expires_at: (DateTime::now() + Duration::from_secs(60)).coerce(),
        };
        let encoded = jsonwebtoken::encode(
            &Header::default(),
            &session,
            &EncodingKey::from_secret(secret),
        )
        .expect("encodable");
        // SAFETY: Produced by `jsonwebtoken::encode()` above.
        unsafe {
            session::Token::new_unchecked(encoded)
        }
    }

    #[tokio::test]
    async fn rejects_foreign_signature() {
        let svc = service();

        let err = svc
            .execute(AuthorizeUserSession {
                token: token(user::Id::new(), b"other"),
            })
            .await
            .expect_err("wrong key");

        assert!(matches!(err.as_ref(), ExecutionError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_user() {
        let svc = service();
        let id = user::Id::new();

        let err = svc
            .execute(AuthorizeUserSession {
                token: token(id, SECRET),
            })
            .await
            .expect_err("no such user");

        assert!(matches!(
            err.as_ref(),
            ExecutionError::UserNotExists(u) if *u == id,
        ));
    }
}
