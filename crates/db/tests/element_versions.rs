//! Integration tests for element version allocation.

use assert_matches::assert_matches;
use sqlx::PgPool;

use vidnova_db::models::element::CreateElement;
use vidnova_db::models::element_version::{CreateElementVersion, ElementVersion, VersionInsert};
use vidnova_db::repositories::{ElementRepo, ElementVersionRepo};

fn version_input() -> CreateElementVersion {
    CreateElementVersion {
        parent_version_id: None,
        source: "generate".to_string(),
        prompt: Some("a red fox".to_string()),
        attributes: serde_json::json!({}),
        asset_id: None,
        created_by: Some("user-1".to_string()),
    }
}

async fn make_element(pool: &PgPool) -> i64 {
    let element = ElementRepo::create(
        pool,
        "user-1",
        &CreateElement {
            kind: "character".to_string(),
            name: "fox".to_string(),
            summary: None,
            tags: None,
        },
    )
    .await
    .unwrap();
    element.id
}

async fn create_version(
    pool: &PgPool,
    element_id: i64,
    input: &CreateElementVersion,
) -> ElementVersion {
    match ElementVersionRepo::create(pool, element_id, input).await.unwrap() {
        VersionInsert::Created(version) => version,
        other => panic!("expected created version, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn versions_number_sequentially(pool: PgPool) {
    let element_id = make_element(&pool).await;

    let v1 = create_version(&pool, element_id, &version_input()).await;
    let v2 = create_version(&pool, element_id, &version_input()).await;

    assert_eq!(v1.version_number, 1);
    assert_eq!(v2.version_number, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn create_advances_latest_pointer(pool: PgPool) {
    let element_id = make_element(&pool).await;

    let v1 = create_version(&pool, element_id, &version_input()).await;
    let element = ElementRepo::find_by_id(&pool, element_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(element.latest_version_id, Some(v1.id));

    let v2 = create_version(&pool, element_id, &version_input()).await;
    let element = ElementRepo::find_by_id(&pool, element_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(element.latest_version_id, Some(v2.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_writers_get_distinct_numbers(pool: PgPool) {
    let element_id = make_element(&pool).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            ElementVersionRepo::create(&pool, element_id, &version_input()).await
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            VersionInsert::Created(version) => numbers.push(version.version_number),
            other => panic!("expected created version, got {other:?}"),
        }
    }

    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
}

#[sqlx::test(migrations = "./migrations")]
async fn numbering_is_per_element(pool: PgPool) {
    let a = make_element(&pool).await;
    let b = make_element(&pool).await;

    create_version(&pool, a, &version_input()).await;
    let vb = create_version(&pool, b, &version_input()).await;

    assert_eq!(vb.version_number, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn parent_links_within_element(pool: PgPool) {
    let element_id = make_element(&pool).await;

    let v1 = create_version(&pool, element_id, &version_input()).await;
    let mut input = version_input();
    input.parent_version_id = Some(v1.id);
    input.source = "edit".to_string();
    let v2 = create_version(&pool, element_id, &input).await;

    assert_eq!(v2.parent_version_id, Some(v1.id));
    let listed = ElementVersionRepo::list_by_element(&pool, element_id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, v2.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn parent_from_another_element_is_rejected(pool: PgPool) {
    let a = make_element(&pool).await;
    let b = make_element(&pool).await;
    let va = create_version(&pool, a, &version_input()).await;

    let mut input = version_input();
    input.parent_version_id = Some(va.id);
    let insert = ElementVersionRepo::create(&pool, b, &input).await.unwrap();
    assert_matches!(insert, VersionInsert::InvalidParent(id) if id == va.id);

    // Nothing was written for the other element.
    let listed = ElementVersionRepo::list_by_element(&pool, b).await.unwrap();
    assert!(listed.is_empty());
    let element = ElementRepo::find_by_id(&pool, b).await.unwrap().unwrap();
    assert_eq!(element.latest_version_id, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn unknown_parent_is_rejected(pool: PgPool) {
    let element_id = make_element(&pool).await;

    let mut input = version_input();
    input.parent_version_id = Some(4242);
    let insert = ElementVersionRepo::create(&pool, element_id, &input)
        .await
        .unwrap();
    assert_matches!(insert, VersionInsert::InvalidParent(4242));
}
