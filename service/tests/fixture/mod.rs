//! Shared fixtures of integration tests.

#![allow(dead_code, reason = "not every test uses every fixture")]

use std::time::Duration;

use common::DateTime;
use service::{
    domain::{
        agreement::{
            signature::{Audit, IpAddress, UserAgent},
            Clause, Clauses, Content, CountryCode, Preamble,
        },
        listing, trust, user, Listing, User,
    },
    infra::Memory,
    task, Config, Service,
};

/// [`Service`] over a [`Memory`] database with a host, a guest and a
/// listing of the host.
pub struct World {
    pub service: Service<Memory>,
    pub db: Memory,
    pub host: User,
    pub guest: User,
    pub listing: Listing,
}

impl World {
    pub async fn new() -> Self {
        let db = Memory::new();
        let config = Config {
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(b"test"),
            reconcile_trust_metrics: task::reconcile_trust_metrics::Config {
                interval: Duration::from_secs(3600),
                grace_period: Duration::ZERO,
                batch_size: 100,
            },
        };
        // Background `Task`s are driven manually.
        let (service, _bg) = Service::new(config, db.clone());

        let host = user("Hannah Host", "host@example.com");
        let guest = user("Gustav Guest", "guest@example.com");
        let listing = Listing {
            id: listing::Id::new(),
            owner_id: host.id,
            title: listing::Title::new("Summer job at the lake").unwrap(),
            kind: listing::Kind::Job,
            city: Some("Zell am See".into()),
            region: "Salzburg".into(),
            description: "Helping out at the lakeside cafe.".into(),
            price: 1800.into(),
        };

        db.seed(|s| {
            for u in [&host, &guest] {
                drop(s.users.insert(u.id, u.clone()));
            }
            drop(s.listings.insert(listing.id, listing.clone()));
        })
        .await;

        Self {
            service,
            db,
            host,
            guest,
            listing,
        }
    }

    /// Adds a new [`User`] not involved in anything yet.
    pub async fn stranger(&self) -> User {
        let stranger = user("Stella Stranger", "stranger@example.com");
        let seeded = stranger.clone();
        self.db
            .seed(move |s| drop(s.users.insert(seeded.id, seeded)))
            .await;
        stranger
    }

    /// Returns the current [`trust::Metrics`] of the [`User`] with the
    /// provided ID.
    pub fn trust_of(&self, id: user::Id) -> trust::Metrics {
        self.db.snapshot().users[&id].trust
    }
}

pub fn user(name: &str, email: &str) -> User {
    User {
        id: user::Id::new(),
        name: user::Name::new(name),
        email: user::Email::new(email),
        trust: trust::Metrics::default(),
        created_at: DateTime::now().coerce(),
        deleted_at: None,
    }
}

pub fn content() -> Content {
    Content::new(
        Preamble::new("P").unwrap(),
        Clauses::new(vec![Clause::new("c1", "Guest keeps quiet hours.", 1)
            .unwrap()])
        .unwrap(),
        CountryCode::default(),
        None,
        None,
    )
    .unwrap()
}

pub fn audit() -> Audit {
    Audit {
        ip_address: IpAddress::new(Some("203.0.113.7")),
        user_agent: UserAgent::new(Some("integration-tests")),
    }
}
