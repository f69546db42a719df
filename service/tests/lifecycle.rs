//! Lifecycle of an `Agreement` from drafting to completion.

mod fixture;

use service::{
    command::{
        create_agreement, delete_agreement, request_agreement, sign_agreement,
        transition_agreement, CreateAgreement, DeleteAgreement,
        RequestAgreement, SignAgreement, TransitionAgreement,
    },
    domain::{
        agreement::{transition::IllegalTransition, Status},
        Agreement,
    },
    query::{agreement as get_agreement, GetAgreement},
    Command as _, Query as _,
};

use self::fixture::{audit, content, World};

async fn draft(world: &World) -> Agreement {
    world
        .service
        .execute(CreateAgreement {
            initiator_id: world.host.id,
            listing_id: world.listing.id,
            guest_id: world.guest.id,
            content: content(),
        })
        .await
        .expect("created")
}

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

async fn sign(
    world: &World,
    agreement: &Agreement,
    signer: service::domain::user::Id,
) -> Result<Agreement, tracerr::Traced<sign_agreement::ExecutionError>> {
    world
        .service
        .execute(SignAgreement {
            agreement_id: agreement.id,
            signer_id: signer,
            audit: audit(),
        })
        .await
}

async fn transition(
    world: &World,
    agreement: &Agreement,
    status: Status,
) -> Result<Agreement, tracerr::Traced<transition_agreement::ExecutionError>>
{
    world
        .service
        .execute(TransitionAgreement {
            agreement_id: agreement.id,
            initiator_id: world.host.id,
            status,
        })
        .await
}

#[tokio::test]
async fn host_drafts_and_deletes() {
    let world = World::new().await;

    let agreement = draft(&world).await;
    assert_eq!(agreement.status, Status::Draft);
    assert_eq!(agreement.host_id, world.host.id);
    assert_eq!(agreement.guest_id, world.guest.id);
    assert!(agreement.signatures.is_empty());
    assert!(agreement.seal.is_none());

    let deleted = world
        .service
        .execute(DeleteAgreement {
            agreement_id: agreement.id,
            initiator_id: world.host.id,
        })
        .await
        .expect("deleted");
    assert_eq!(deleted.id, agreement.id);
    assert!(!world.db.snapshot().agreements.contains_key(&agreement.id));
}

#[tokio::test]
async fn guest_requests_from_listing_owner() {
    let world = World::new().await;

    let agreement = request(&world).await;

    assert_eq!(agreement.status, Status::PendingHost);
    assert_eq!(agreement.host_id, world.host.id);
    assert_eq!(agreement.guest_id, world.guest.id);
    assert_eq!(agreement.listing_id, world.listing.id);
}

#[tokio::test]
async fn both_signatures_seal_and_credit_trust() {
    let world = World::new().await;
    let agreement = request(&world).await;

    let signed = sign(&world, &agreement, world.host.id)
        .await
        .expect("host signed");
    assert_eq!(signed.status, Status::PendingGuest);
    assert_eq!(signed.signatures.len(), 1);
    assert!(signed.seal.is_none());
    assert_eq!(world.trust_of(world.host.id).completed_agreements, 0);

    let signed = sign(&world, &agreement, world.guest.id)
        .await
        .expect("guest signed");
    assert_eq!(signed.status, Status::FullySigned);
    assert_eq!(signed.signatures.len(), 2);
    let seal = signed.seal.as_ref().expect("sealed");
    assert_eq!(seal.hash.as_ref().len(), 64);
    assert!(seal.hash.as_ref().bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(signed.verify_seal(), Some(true));

    for id in [world.host.id, world.guest.id] {
        assert_eq!(world.trust_of(id).completed_agreements, 1);
        assert_eq!(world.trust_of(id).completed_stays, 0);
    }

    let stored = world
        .service
        .execute(GetAgreement {
            agreement_id: agreement.id,
            requester_id: world.guest.id,
        })
        .await
        .expect("readable by party");
    assert_eq!(stored.seal, signed.seal);
    assert_eq!(stored.signatures, signed.signatures);
}

#[tokio::test]
async fn signature_records_signer_and_audit() {
    let world = World::new().await;
    let agreement = request(&world).await;

    let signed = sign(&world, &agreement, world.host.id)
        .await
        .expect("host signed");

    let signature = &signed.signatures[0];
    assert_eq!(signature.user_id, world.host.id);
    assert_eq!(signature.name.as_ref(), "Hannah Host");
    assert_eq!(signature.ip_address.as_ref(), "203.0.113.7");
    assert_eq!(signature.user_agent.as_ref(), "integration-tests");
}

#[tokio::test]
async fn rejects_signing_twice() {
    let world = World::new().await;
    let agreement = request(&world).await;
    let signed = sign(&world, &agreement, world.host.id)
        .await
        .expect("host signed");

    let err = sign(&world, &agreement, world.host.id)
        .await
        .expect_err("signed already");

    assert!(matches!(
        err.as_ref(),
        sign_agreement::ExecutionError::AlreadySigned(id)
            if *id == world.host.id,
    ));
    let stored = &world.db.snapshot().agreements[&agreement.id];
    assert_eq!(stored.signatures, signed.signatures);
    assert_eq!(stored.version, signed.version);
}

#[tokio::test]
async fn moves_through_statuses_until_terminal() {
    let world = World::new().await;
    let agreement = request(&world).await;
    for signer in [world.host.id, world.guest.id] {
        drop(sign(&world, &agreement, signer).await.expect("signed"));
    }

    let active = transition(&world, &agreement, Status::Active)
        .await
        .expect("activated");
    assert_eq!(active.status, Status::Active);

    let completed = transition(&world, &agreement, Status::Completed)
        .await
        .expect("completed");
    assert_eq!(completed.status, Status::Completed);
    for id in [world.host.id, world.guest.id] {
        assert_eq!(world.trust_of(id).completed_stays, 1);
    }

    let err = transition(&world, &agreement, Status::PendingHost)
        .await
        .expect_err("terminal");
    assert!(matches!(
        err.as_ref(),
        transition_agreement::ExecutionError::IllegalTransition(
            IllegalTransition {
                from: Status::Completed,
                to: Status::PendingHost,
            }
        ),
    ));
    assert_eq!(
        world.db.snapshot().agreements[&agreement.id].status,
        Status::Completed,
    );
}

#[tokio::test]
async fn never_transitions_into_fully_signed() {
    let world = World::new().await;
    let agreement = draft(&world).await;

    let err = transition(&world, &agreement, Status::FullySigned)
        .await
        .expect_err("only by signing");

    assert!(matches!(
        err.as_ref(),
        transition_agreement::ExecutionError::IllegalTransition(_),
    ));
}

#[tokio::test]
async fn rejects_signing_cancelled() {
    let world = World::new().await;
    let agreement = draft(&world).await;
    drop(
        transition(&world, &agreement, Status::Cancelled)
            .await
            .expect("cancelled"),
    );

    let err = sign(&world, &agreement, world.guest.id)
        .await
        .expect_err("cancelled");

    assert!(matches!(
        err.as_ref(),
        sign_agreement::ExecutionError::NotSignable(Status::Cancelled),
    ));
}

#[tokio::test]
async fn rejects_strangers() {
    let world = World::new().await;
    let stranger = world.stranger().await;
    let agreement = draft(&world).await;

    let err = sign(&world, &agreement, stranger.id)
        .await
        .expect_err("not a party");
    assert!(matches!(
        err.as_ref(),
        sign_agreement::ExecutionError::NotAParty(id) if *id == stranger.id,
    ));

    let err = world
        .service
        .execute(GetAgreement {
            agreement_id: agreement.id,
            requester_id: stranger.id,
        })
        .await
        .expect_err("not a party");
    assert!(matches!(
        err.as_ref(),
        get_agreement::ExecutionError::NotAParty(_),
    ));

    let err = world
        .service
        .execute(TransitionAgreement {
            agreement_id: agreement.id,
            initiator_id: stranger.id,
            status: Status::Cancelled,
        })
        .await
        .expect_err("not a party");
    assert!(matches!(
        err.as_ref(),
        transition_agreement::ExecutionError::NotAParty(_),
    ));
}

#[tokio::test]
async fn only_host_deletes_only_drafts() {
    let world = World::new().await;
    let drafted = draft(&world).await;
    let requested = request(&world).await;

    let err = world
        .service
        .execute(DeleteAgreement {
            agreement_id: drafted.id,
            initiator_id: world.guest.id,
        })
        .await
        .expect_err("guest");
    assert!(matches!(
        err.as_ref(),
        delete_agreement::ExecutionError::NotHost(_),
    ));

    let err = world
        .service
        .execute(DeleteAgreement {
            agreement_id: requested.id,
            initiator_id: world.host.id,
        })
        .await
        .expect_err("not a draft");
    assert!(matches!(
        err.as_ref(),
        delete_agreement::ExecutionError::NotDraft(Status::PendingHost),
    ));

    let snapshot = world.db.snapshot();
    assert!(snapshot.agreements.contains_key(&drafted.id));
    assert!(snapshot.agreements.contains_key(&requested.id));
}

#[tokio::test]
async fn validates_creation_parties() {
    let world = World::new().await;
    let stranger = world.stranger().await;

    let err = world
        .service
        .execute(CreateAgreement {
            initiator_id: stranger.id,
            listing_id: world.listing.id,
            guest_id: world.guest.id,
            content: content(),
        })
        .await
        .expect_err("not an owner");
    assert!(matches!(
        err.as_ref(),
        create_agreement::ExecutionError::NotListingOwner(_),
    ));

    let err = world
        .service
        .execute(CreateAgreement {
            initiator_id: world.host.id,
            listing_id: world.listing.id,
            guest_id: world.host.id,
            content: content(),
        })
        .await
        .expect_err("self");
    assert!(matches!(
        err.as_ref(),
        create_agreement::ExecutionError::SelfAgreement(_),
    ));

    let err = world
        .service
        .execute(RequestAgreement {
            guest_id: world.host.id,
            listing_id: world.listing.id,
            content: content(),
        })
        .await
        .expect_err("own listing");
    assert!(matches!(
        err.as_ref(),
        request_agreement::ExecutionError::SelfAgreement(_),
    ));

    let err = world
        .service
        .execute(CreateAgreement {
            initiator_id: world.host.id,
            listing_id: world.listing.id,
            guest_id: service::domain::user::Id::new(),
            content: content(),
        })
        .await
        .expect_err("no such guest");
    assert!(matches!(
        err.as_ref(),
        create_agreement::ExecutionError::UserNotExists(_),
    ));

    assert!(world.db.snapshot().agreements.is_empty());
}
