//! Listing `Agreement`s of a party.

mod fixture;

use std::collections::HashSet;

use service::{
    command::{CreateAgreement, RequestAgreement},
    domain::{
        agreement::{self, Role, Status},
        user,
    },
    query,
    read::agreement::list::{Arguments, Filter, Page, Selector},
    Command as _, Query as _,
};

use self::fixture::{content, World};

/// Creates `drafts` drafted by the host and `requests` requested by the
/// guest.
async fn populate(world: &World, drafts: usize, requests: usize) {
    for _ in 0..drafts {
        drop(
            world
                .service
                .execute(CreateAgreement {
                    initiator_id: world.host.id,
                    listing_id: world.listing.id,
                    guest_id: world.guest.id,
                    content: content(),
                })
                .await
                .expect("created"),
        );
    }
    for _ in 0..requests {
        drop(
            world
                .service
                .execute(RequestAgreement {
                    guest_id: world.guest.id,
                    listing_id: world.listing.id,
                    content: content(),
                })
                .await
                .expect("requested"),
        );
    }
}

async fn list(
    world: &World,
    arguments: Arguments,
    party: user::Id,
    role: Option<Role>,
    status: Option<Status>,
) -> Page {
    world
        .service
        .execute(query::agreements::List::by(Selector {
            arguments,
            filter: Filter {
                party,
                role,
                status,
            },
        }))
        .await
        .expect("listed")
}

fn first(n: usize, after: Option<agreement::Id>) -> Arguments {
    Arguments::new(Some(n), after, None, None, 10, 50).expect("valid")
}

fn ids(page: &Page) -> Vec<agreement::Id> {
    page.edges.iter().map(|e| e.node.id).collect()
}

#[tokio::test]
async fn pages_forward_newest_first() {
    let world = World::new().await;
    populate(&world, 3, 2).await;

    let page1 = list(&world, first(2, None), world.host.id, None, None).await;
    let info1 = page1.page_info();
    assert_eq!(page1.edges.len(), 2);
    assert!(info1.has_next_page);
    assert!(!info1.has_previous_page);

    let page2 =
        list(&world, first(2, info1.end_cursor), world.host.id, None, None)
            .await;
    let info2 = page2.page_info();
    assert_eq!(page2.edges.len(), 2);
    assert!(info2.has_next_page);

    let page3 =
        list(&world, first(2, info2.end_cursor), world.host.id, None, None)
            .await;
    assert_eq!(page3.edges.len(), 1);
    assert!(!page3.page_info().has_next_page);

    let seen = [&page1, &page2, &page3]
        .into_iter()
        .flat_map(ids)
        .collect::<Vec<_>>();
    let mut sorted = seen.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(seen, sorted, "newest first, without overlaps");
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 5);
}

#[tokio::test]
async fn pages_backward() {
    let world = World::new().await;
    populate(&world, 2, 2).await;

    let all = list(&world, first(10, None), world.guest.id, None, None).await;
    let all = ids(&all);

    let args = Arguments::new(None, None, Some(3_usize), Some(all[3]), 10, 50)
        .expect("valid");
    let page = list(&world, args, world.guest.id, None, None).await;

    assert_eq!(ids(&page), all[..3]);
    assert!(!page.page_info().has_previous_page);
}

#[tokio::test]
async fn filters_by_role_and_status() {
    let world = World::new().await;
    populate(&world, 2, 3).await;

    let drafts = list(
        &world,
        first(10, None),
        world.guest.id,
        Some(Role::Guest),
        Some(Status::Draft),
    )
    .await;
    assert_eq!(drafts.edges.len(), 2);
    assert!(drafts.edges.iter().all(|e| e.node.status == Status::Draft));

    let pending = list(
        &world,
        first(10, None),
        world.host.id,
        None,
        Some(Status::PendingHost),
    )
    .await;
    assert_eq!(pending.edges.len(), 3);

    let as_guest =
        list(&world, first(10, None), world.host.id, Some(Role::Guest), None)
            .await;
    assert!(as_guest.edges.is_empty());
    assert!(!as_guest.page_info().has_next_page);
}

#[tokio::test]
async fn lists_nothing_for_strangers() {
    let world = World::new().await;
    populate(&world, 1, 1).await;
    let stranger = world.stranger().await;

    let page = list(&world, first(10, None), stranger.id, None, None).await;

    assert!(page.edges.is_empty());
}
