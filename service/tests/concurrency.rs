//! Concurrent modifications of the same `Agreement`.

mod fixture;

use service::{
    command::{RequestAgreement, SignAgreement, TransitionAgreement},
    domain::agreement::Status,
    Command as _,
};

use self::fixture::{audit, content, World};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn keeps_both_simultaneous_signatures() {
    let world = World::new().await;
    let agreement = world
        .service
        .execute(RequestAgreement {
            guest_id: world.guest.id,
            listing_id: world.listing.id,
            content: content(),
        })
        .await
        .expect("requested");

    let (by_host, by_guest) = tokio::join!(
        world.service.execute(SignAgreement {
            agreement_id: agreement.id,
            signer_id: world.host.id,
            audit: audit(),
        }),
        world.service.execute(SignAgreement {
            agreement_id: agreement.id,
            signer_id: world.guest.id,
            audit: audit(),
        }),
    );
    let (by_host, by_guest) =
        (by_host.expect("host signed"), by_guest.expect("guest signed"));

    // Exactly one of them observed the other's signature.
    let last = if by_host.signatures.len() == 2 {
        assert_eq!(by_guest.signatures.len(), 1);
        by_host
    } else {
        assert_eq!(by_guest.signatures.len(), 2);
        by_guest
    };
    assert_eq!(last.status, Status::FullySigned);

    let stored = &world.db.snapshot().agreements[&agreement.id];
    assert_eq!(stored.status, Status::FullySigned);
    assert_eq!(stored.signatures.len(), 2);
    assert_eq!(stored.seal, last.seal);
    assert!(stored.seal.is_some());
    for id in [world.host.id, world.guest.id] {
        assert!(stored.is_signed_by(id));
        assert_eq!(world.trust_of(id).completed_agreements, 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn serializes_signature_and_cancellation() {
    let world = World::new().await;
    let agreement = world
        .service
        .execute(RequestAgreement {
            guest_id: world.guest.id,
            listing_id: world.listing.id,
            content: content(),
        })
        .await
        .expect("requested");

    let (signed, cancelled) = tokio::join!(
        world.service.execute(SignAgreement {
            agreement_id: agreement.id,
            signer_id: world.host.id,
            audit: audit(),
        }),
        world.service.execute(TransitionAgreement {
            agreement_id: agreement.id,
            initiator_id: world.guest.id,
            status: Status::Cancelled,
        }),
    );

    let stored = &world.db.snapshot().agreements[&agreement.id];
    assert_eq!(stored.status, Status::Cancelled);
    match signed {
        // Signed first, then cancelled from `PendingGuest`.
        Ok(_) => assert_eq!(stored.signatures.len(), 1),
        // Cancelled first, so signing was rejected.
        Err(_) => assert!(stored.signatures.is_empty()),
    }
    drop(cancelled.expect("cancellable from both pending statuses"));
}
