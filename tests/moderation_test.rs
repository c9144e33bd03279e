mod common;

use common::{MemoryMediaStore, insert_product, png_file, setup_db};
use review_image_backend::models::{
    ApprovalStatus, ModeratorClaims, ReviewCreated, ReviewSettings,
};
use review_image_backend::services::attachments;
use review_image_backend::services::gallery::GalleryService;
use review_image_backend::services::moderation::ModerationService;
use review_image_backend::services::upload::{SubmitOutcome, UploadWorkflow};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

struct Fixture {
    db: SqlitePool,
    media: Arc<MemoryMediaStore>,
    moderation: ModerationService,
    gallery: GalleryService,
}

const MODERATOR: ModeratorClaims = ModeratorClaims { can_moderate: true };
const VISITOR: ModeratorClaims = ModeratorClaims {
    can_moderate: false,
};

/// Seeds one review with three images through the real workflow.
async fn fixture_with_review(review_id: &str) -> (Fixture, Vec<String>) {
    let db = setup_db().await;
    insert_product(&db, "prod-1").await;
    let media = Arc::new(MemoryMediaStore::default());

    let workflow = UploadWorkflow::new(db.clone(), media.clone());
    let event = ReviewCreated {
        review_id: review_id.to_string(),
        subject_id: "prod-1".to_string(),
        is_logged_in: true,
        files: vec![
            png_file("a.png", 1000),
            png_file("b.png", 2000),
            png_file("c.png", 3000),
        ],
    };
    let outcome = workflow
        .submit_review_images(event, &ReviewSettings::default())
        .await
        .unwrap();
    let SubmitOutcome::Attached(attachment) = outcome else {
        panic!("expected attachment");
    };

    let fixture = Fixture {
        moderation: ModerationService::new(db.clone(), media.clone()),
        gallery: GalleryService::new(db.clone(), media.clone()),
        db,
        media,
    };
    (fixture, attachment.attachment_ids)
}

#[tokio::test]
async fn approve_is_idempotent() {
    let (f, _ids) = fixture_with_review("r1").await;

    f.moderation.approve(&MODERATOR, "r1", true).await.unwrap();
    let once = attachments::load(&f.db, "r1").await.unwrap().unwrap();
    assert_eq!(once.approval_status, ApprovalStatus::Approved);

    f.moderation.approve(&MODERATOR, "r1", true).await.unwrap();
    let twice = attachments::load(&f.db, "r1").await.unwrap().unwrap();
    assert_eq!(twice.approval_status, ApprovalStatus::Approved);
    assert_eq!(once.attachment_ids, twice.attachment_ids);
}

#[tokio::test]
async fn approve_without_capability_is_a_noop() {
    let (f, _ids) = fixture_with_review("r1").await;

    f.moderation.approve(&VISITOR, "r1", true).await.unwrap();
    let record = attachments::load(&f.db, "r1").await.unwrap().unwrap();
    assert_eq!(record.approval_status, ApprovalStatus::Pending);
}

#[tokio::test]
async fn remove_without_capability_is_a_noop() {
    let (f, ids) = fixture_with_review("r1").await;

    let all: HashSet<String> = ids.iter().cloned().collect();
    f.moderation
        .remove_images(&VISITOR, "r1", &all)
        .await
        .unwrap();

    let record = attachments::load(&f.db, "r1").await.unwrap().unwrap();
    assert_eq!(record.attachment_ids, ids);
    assert_eq!(f.media.files.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn remove_deletes_media_and_preserves_survivor_order() {
    let (f, ids) = fixture_with_review("r1").await;

    let middle: HashSet<String> = [ids[1].clone()].into();
    f.moderation
        .remove_images(&MODERATOR, "r1", &middle)
        .await
        .unwrap();

    let record = attachments::load(&f.db, "r1").await.unwrap().unwrap();
    assert_eq!(record.attachment_ids, vec![ids[0].clone(), ids[2].clone()]);
    assert!(!f.media.files.lock().unwrap().contains_key(&ids[1]));

    // A removed identifier never reappears.
    f.moderation.approve(&MODERATOR, "r1", true).await.unwrap();
    let visible = f
        .gallery
        .visible_images("r1", &ReviewSettings::default())
        .await
        .unwrap();
    assert!(visible.iter().all(|img| img.id != ids[1]));
}

#[tokio::test]
async fn removing_the_last_image_deletes_the_record() {
    let (f, ids) = fixture_with_review("r1").await;

    let all: HashSet<String> = ids.into_iter().collect();
    f.moderation
        .remove_images(&MODERATOR, "r1", &all)
        .await
        .unwrap();

    assert!(attachments::load(&f.db, "r1").await.unwrap().is_none());
    assert!(f.media.files.lock().unwrap().is_empty());
}

#[tokio::test]
async fn remove_ignores_ids_not_attached_to_the_review() {
    let (f, ids) = fixture_with_review("r1").await;

    let unrelated: HashSet<String> = ["someone-elses-image".to_string()].into();
    f.moderation
        .remove_images(&MODERATOR, "r1", &unrelated)
        .await
        .unwrap();

    let record = attachments::load(&f.db, "r1").await.unwrap().unwrap();
    assert_eq!(record.attachment_ids, ids);
}

#[tokio::test]
async fn pending_batch_is_hidden_only_while_approval_is_required() {
    let (f, _ids) = fixture_with_review("r1").await;

    // Pending + approval required: hidden.
    let visible = f
        .gallery
        .visible_images("r1", &ReviewSettings::default())
        .await
        .unwrap();
    assert!(visible.is_empty());

    // Same stored status, approval no longer required: visible. The read
    // path re-derives from live config rather than the frozen default.
    let relaxed = ReviewSettings {
        require_image_approval: false,
        ..ReviewSettings::default()
    };
    let visible = f.gallery.visible_images("r1", &relaxed).await.unwrap();
    assert_eq!(visible.len(), 3);
}

#[tokio::test]
async fn unresolvable_identifiers_are_skipped() {
    let (f, ids) = fixture_with_review("r1").await;
    f.moderation.approve(&MODERATOR, "r1", true).await.unwrap();

    // Simulate the underlying file vanishing out of band.
    f.media.forget(&ids[0]);

    let visible = f
        .gallery
        .visible_images("r1", &ReviewSettings::default())
        .await
        .unwrap();
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|img| img.id != ids[0]));
}

#[tokio::test]
async fn gallery_navigation_wraps_cyclically() {
    let (f, _ids) = fixture_with_review("r1").await;
    f.moderation.approve(&MODERATOR, "r1", true).await.unwrap();

    let gallery = f
        .gallery
        .gallery("r1", &ReviewSettings::default())
        .await
        .unwrap();

    assert_eq!(gallery.count, 3);
    assert_eq!(gallery.items[0].prev, 2);
    assert_eq!(gallery.items[0].next, 1);
    assert_eq!(gallery.items[2].prev, 1);
    assert_eq!(gallery.items[2].next, 0);
}

#[tokio::test]
async fn gallery_is_empty_for_unknown_review() {
    let (f, _ids) = fixture_with_review("r1").await;

    let gallery = f
        .gallery
        .gallery("no-such-review", &ReviewSettings::default())
        .await
        .unwrap();
    assert_eq!(gallery.count, 0);
    assert!(gallery.items.is_empty());
}
