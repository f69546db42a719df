//! Notifications and trust metrics accompanying `Agreement` changes.

mod fixture;

use std::time::Duration;

use common::operations::Perform;
use service::{
    command::{
        CreateAgreement, RequestAgreement, SignAgreement, TransitionAgreement,
    },
    domain::{
        agreement::{signature::SignerName, Status},
        notification::Kind,
        Agreement,
    },
    infra::{database::memory::Table, Memory},
    task::{self, ReconcileTrustMetrics},
    Command as _, Service, Task as _,
};

use self::fixture::{audit, content, World};

async fn request(world: &World) -> Agreement {
    world
        .service
        .execute(RequestAgreement {
            guest_id: world.guest.id,
            listing_id: world.listing.id,
            content: content(),
        })
        .await
        .expect("requested")
}

async fn sign_by_both(world: &World, agreement: &Agreement) -> Agreement {
    let mut last = None;
    for signer_id in [world.host.id, world.guest.id] {
        last = Some(
            world
                .service
                .execute(SignAgreement {
                    agreement_id: agreement.id,
                    signer_id,
                    audit: audit(),
                })
                .await
                .expect("signed"),
        );
    }
    last.expect("signed twice")
}

fn reconciliation(world: &World) -> ReconcileTrustMetrics<Service<Memory>> {
    ReconcileTrustMetrics::new(
        task::reconcile_trust_metrics::Config {
            interval: Duration::from_secs(3600),
            grace_period: Duration::ZERO,
            batch_size: 100,
        },
        world.service.clone(),
    )
}

#[tokio::test]
async fn notifies_counterparty_about_creation() {
    let world = World::new().await;

    let drafted = world
        .service
        .execute(CreateAgreement {
            initiator_id: world.host.id,
            listing_id: world.listing.id,
            guest_id: world.guest.id,
            content: content(),
        })
        .await
        .expect("created");
    let requested = request(&world).await;

    let outbox = world.db.snapshot().notifications;
    assert_eq!(outbox.len(), 2);

    let created = &outbox[0];
    assert_eq!(created.kind, Kind::AgreementCreated);
    assert_eq!(created.agreement_id, drafted.id);
    assert_eq!(created.recipient_id, world.guest.id);
    assert_eq!(created.recipient_email, world.guest.email);
    assert_eq!(created.listing_title, world.listing.title);
    assert_eq!(created.host_name.to_string(), "Hannah Host");
    assert_eq!(created.guest_name.to_string(), "Gustav Guest");
    assert_eq!(created.signer_name, None);

    let request = &outbox[1];
    assert_eq!(request.kind, Kind::AgreementRequested);
    assert_eq!(request.agreement_id, requested.id);
    assert_eq!(request.recipient_id, world.host.id);
}

#[tokio::test]
async fn notifies_about_signatures() {
    let world = World::new().await;
    let agreement = request(&world).await;

    drop(sign_by_both(&world, &agreement).await);

    let outbox = world
        .db
        .snapshot()
        .notifications
        .into_iter()
        .filter(|n| n.kind != Kind::AgreementRequested)
        .map(|n| (n.kind, n.recipient_id, n.signer_name))
        .collect::<Vec<_>>();
    let host = Some(SignerName::new(world.host.name.as_ref()));
    let guest = Some(SignerName::new(world.guest.name.as_ref()));
    assert_eq!(
        outbox,
        [
            (Kind::AgreementSigned, world.guest.id, host.clone()),
            (Kind::AgreementFullySigned, world.host.id, guest),
            (Kind::AgreementFullySigned, world.guest.id, host),
        ],
    );
}

#[tokio::test]
async fn tolerates_notification_failures() {
    let world = World::new().await;
    world.db.set_unavailable(Table::Notifications, true);

    let agreement = request(&world).await;
    let signed = sign_by_both(&world, &agreement).await;

    assert_eq!(signed.status, Status::FullySigned);
    let snapshot = world.db.snapshot();
    assert!(snapshot.notifications.is_empty());
    assert_eq!(snapshot.agreements[&agreement.id].seal, signed.seal);
}

#[tokio::test]
async fn reconciles_failed_trust_increments_once() {
    let world = World::new().await;
    let agreement = request(&world).await;

    world.db.set_unavailable(Table::TrustIncrements, true);
    let signed = sign_by_both(&world, &agreement).await;
    assert_eq!(signed.status, Status::FullySigned);
    assert!(signed.seal.is_some());
    for id in [world.host.id, world.guest.id] {
        assert_eq!(world.trust_of(id).completed_agreements, 0);
    }

    world.db.set_unavailable(Table::TrustIncrements, false);
    tokio::time::sleep(Duration::from_millis(5)).await;
    let task = reconciliation(&world);

    let applied = task.execute(Perform(())).await.expect("reconciled");
    assert_eq!(applied, 2);
    for id in [world.host.id, world.guest.id] {
        assert_eq!(world.trust_of(id).completed_agreements, 1);
    }

    let applied = task.execute(Perform(())).await.expect("reconciled");
    assert_eq!(applied, 0);
    for id in [world.host.id, world.guest.id] {
        assert_eq!(world.trust_of(id).completed_agreements, 1);
    }
}

#[tokio::test]
async fn reconciles_nothing_when_applied_inline() {
    let world = World::new().await;
    let agreement = request(&world).await;
    drop(sign_by_both(&world, &agreement).await);
    for status in [Status::Active, Status::Completed] {
        drop(
            world
                .service
                .execute(TransitionAgreement {
                    agreement_id: agreement.id,
                    initiator_id: world.guest.id,
                    status,
                })
                .await
                .expect("transitioned"),
        );
    }
    tokio::time::sleep(Duration::from_millis(5)).await;

    let applied = reconciliation(&world)
        .execute(Perform(()))
        .await
        .expect("reconciled");

    assert_eq!(applied, 0);
    assert_eq!(world.db.snapshot().trust_increments.len(), 4);
    for id in [world.host.id, world.guest.id] {
        let metrics = world.trust_of(id);
        assert_eq!(metrics.completed_agreements, 1);
        assert_eq!(metrics.completed_stays, 1);
    }
}
