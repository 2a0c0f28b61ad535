/// Integration tests for the visibility filters: public attachment views
/// return only approved rows, while owner and admin views are unfiltered.
/// Also covers the owner-or-admin rule for photo deletion.
mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use wellspring::middleware::ClientCtx;
use wellspring::moderation::ModerationStatus;
use wellspring::orm::users::Role;
use wellspring::user::Profile;
use wellspring::{photo, review};

fn profile_for(user: &TestUser, role: Role) -> Profile {
    Profile {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role,
        bio: None,
        avatar_url: None,
        created_at: chrono::Utc::now().naive_utc(),
    }
}

#[actix_rt::test]
#[serial]
async fn test_photo_listings_by_source_and_review_are_approved_only() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "uploader", "password123")
        .await
        .expect("Failed to create user");
    let source = create_test_source(&db, Some(user.id), "Fountain", 40.0, -3.0, ModerationStatus::Approved)
        .await
        .expect("Failed to create source");
    let rev = create_test_review(&db, source.id, user.id, 4, ModerationStatus::Approved)
        .await
        .expect("Failed to create review");

    let approved_on_source =
        create_test_photo(&db, user.id, Some(source.id), None, ModerationStatus::Approved)
            .await
            .expect("Failed to create photo");
    create_test_photo(&db, user.id, Some(source.id), None, ModerationStatus::Pending)
        .await
        .expect("Failed to create photo");
    create_test_photo(&db, user.id, Some(source.id), None, ModerationStatus::Rejected)
        .await
        .expect("Failed to create photo");

    let approved_on_review =
        create_test_photo(&db, user.id, None, Some(rev.id), ModerationStatus::Approved)
            .await
            .expect("Failed to create photo");
    create_test_photo(&db, user.id, None, Some(rev.id), ModerationStatus::Pending)
        .await
        .expect("Failed to create photo");

    let by_source = photo::approved_for_source(&db, source.id)
        .await
        .expect("approved_for_source failed");
    assert_eq!(by_source.len(), 1);
    assert_eq!(by_source[0].id, approved_on_source.id);

    let by_review = photo::approved_for_review(&db, rev.id)
        .await
        .expect("approved_for_review failed");
    assert_eq!(by_review.len(), 1);
    assert_eq!(by_review[0].id, approved_on_review.id);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_own_photos_are_visible_in_every_status() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "uploader", "password123")
        .await
        .expect("Failed to create user");
    let other = create_test_user(&db, "other", "password123")
        .await
        .expect("Failed to create user");

    create_test_photo(&db, user.id, None, None, ModerationStatus::Pending)
        .await
        .expect("Failed to create photo");
    create_test_photo(&db, user.id, None, None, ModerationStatus::Approved)
        .await
        .expect("Failed to create photo");
    create_test_photo(&db, user.id, None, None, ModerationStatus::Rejected)
        .await
        .expect("Failed to create photo");
    create_test_photo(&db, other.id, None, None, ModerationStatus::Approved)
        .await
        .expect("Failed to create photo");

    // Own uploads: all three statuses, nobody else's.
    let mine = photo::find_for_user(&db, user.id)
        .await
        .expect("find_for_user failed");
    assert_eq!(mine.len(), 3);
    assert!(mine.iter().all(|p| p.user_id == Some(user.id)));

    // The admin listing sees everything.
    let all = photo::find_all(&db).await.expect("find_all failed");
    assert_eq!(all.len(), 4);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_review_listing_is_approved_only() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "reviewer", "password123")
        .await
        .expect("Failed to create user");
    let source = create_test_source(&db, Some(user.id), "Fountain", 40.0, -3.0, ModerationStatus::Approved)
        .await
        .expect("Failed to create source");

    let approved = create_test_review(&db, source.id, user.id, 5, ModerationStatus::Approved)
        .await
        .expect("Failed to create review");
    create_test_review(&db, source.id, user.id, 1, ModerationStatus::Pending)
        .await
        .expect("Failed to create review");
    create_test_review(&db, source.id, user.id, 2, ModerationStatus::Rejected)
        .await
        .expect("Failed to create review");

    let listed = review::approved_for_source(&db, source.id)
        .await
        .expect("approved_for_source failed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, approved.id);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_pending_queues_contain_only_pending_rows() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "submitter", "password123")
        .await
        .expect("Failed to create user");
    let pending_source =
        create_test_source(&db, Some(user.id), "Pending", 40.0, -3.0, ModerationStatus::Pending)
            .await
            .expect("Failed to create source");
    create_test_source(&db, Some(user.id), "Approved", 41.0, -3.0, ModerationStatus::Approved)
        .await
        .expect("Failed to create source");

    let queue = wellspring::water_source::find_pending(&db)
        .await
        .expect("find_pending failed");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, pending_source.id);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_only_owner_or_admin_may_remove_a_photo() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let owner = create_test_user(&db, "owner", "password123")
        .await
        .expect("Failed to create user");
    let stranger = create_test_user(&db, "stranger", "password123")
        .await
        .expect("Failed to create user");
    let admin = create_admin_user(&db, "admin", "password123")
        .await
        .expect("Failed to create admin");

    let photo = create_test_photo(&db, owner.id, None, None, ModerationStatus::Pending)
        .await
        .expect("Failed to create photo");

    // Authorization is decided by the client context rule the delete
    // handler applies before touching the row.
    let stranger_ctx = ClientCtx::with_client(Some(profile_for(&stranger, Role::User)));
    assert!(!stranger_ctx.can_modify(photo.user_id));

    let owner_ctx = ClientCtx::with_client(Some(profile_for(&owner, Role::User)));
    assert!(owner_ctx.can_modify(photo.user_id));

    let admin_ctx = ClientCtx::with_client(Some(profile_for(&admin, Role::Admin)));
    assert!(admin_ctx.can_modify(photo.user_id));

    // The record is untouched by a refused attempt; only an authorized
    // delete removes it.
    assert!(photo::find_by_id(&db, photo.id)
        .await
        .expect("find_by_id failed")
        .is_some());

    photo::delete(&db, photo.id).await.expect("delete failed");
    assert!(photo::find_by_id(&db, photo.id)
        .await
        .expect("find_by_id failed")
        .is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
