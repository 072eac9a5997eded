//! Integration tests for master-data CRUD and the list envelope.

mod common;

use std::collections::BTreeSet;

use foundry_db::entities::{banks, departments, machine_revisions, machines};
use foundry_db::repositories::{MasterError, MasterRepository, UserRepository};
use foundry_shared::types::{ListQuery, SortDir};
use rstest::rstest;
use sea_orm::DatabaseConnection;

async fn seed_departments(db: &DatabaseConnection, names: &[(&str, &str)]) -> Vec<i32> {
    let repo = MasterRepository::<departments::Entity>::new(db.clone());
    let mut ids = Vec::new();
    for (code, name) in names {
        let row = repo
            .create(
                departments::Input {
                    code: (*code).to_string(),
                    name: (*name).to_string(),
                },
                1,
            )
            .await
            .expect("Failed to create department");
        ids.push(row.id);
    }
    ids
}

#[tokio::test]
async fn test_pages_form_a_permutation() {
    let db = common::setup().await;
    let created = seed_departments(
        &db,
        &[
            ("D1", "One"),
            ("D2", "Two"),
            ("D3", "Three"),
            ("D4", "Four"),
            ("D5", "Five"),
            ("D6", "Six"),
            ("D7", "Seven"),
        ],
    )
    .await;
    let repo = MasterRepository::<departments::Entity>::new(db.clone());

    let mut seen = Vec::new();
    let mut offset = 0;
    loop {
        let page = repo
            .list(&ListQuery {
                offset,
                limit: 3,
                sort: Some("name".into()),
                ..ListQuery::default()
            })
            .await
            .expect("Failed to list");
        assert_eq!(page.total, 7);
        if page.items.is_empty() {
            break;
        }
        seen.extend(page.items.iter().map(|d| d.id));
        offset += 3;
    }

    assert_eq!(seen.len(), created.len());
    let unique: BTreeSet<i32> = seen.iter().copied().collect();
    assert_eq!(unique, created.into_iter().collect());
}

#[tokio::test]
async fn test_search_and_sort() {
    let db = common::setup().await;
    seed_departments(
        &db,
        &[("ENG", "Engineering"), ("FIN", "Finance"), ("PRD", "Production")],
    )
    .await;
    let repo = MasterRepository::<departments::Entity>::new(db.clone());

    let found = repo
        .list(&ListQuery {
            search: Some("  engin ".into()),
            ..ListQuery::default()
        })
        .await
        .expect("search");
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].code, "ENG");

    let sorted = repo
        .list(&ListQuery {
            sort: Some("code".into()),
            dir: SortDir::Desc,
            ..ListQuery::default()
        })
        .await
        .expect("sort");
    let codes: Vec<&str> = sorted.items.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["PRD", "FIN", "ENG"]);

    // Unknown sort column falls back to insertion order.
    let fallback = repo
        .list(&ListQuery {
            sort: Some("no_such_column".into()),
            ..ListQuery::default()
        })
        .await
        .expect("fallback");
    let codes: Vec<&str> = fallback.items.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["ENG", "FIN", "PRD"]);
}

#[rstest]
#[case::percent("%", &["YLD"])]
#[case::underscore("_", &["LN2"])]
#[case::backslash("\\", &[])]
#[case::percent_in_word("50%", &["YLD"])]
#[case::plain("ly", &["ASM"])]
#[tokio::test]
async fn test_search_matches_wildcards_literally(#[case] term: &str, #[case] expected: &[&str]) {
    let db = common::setup().await;
    seed_departments(
        &db,
        &[("ASM", "Assembly"), ("YLD", "50% Yield"), ("LN2", "Line_2 Packing")],
    )
    .await;

    let page = MasterRepository::<departments::Entity>::new(db.clone())
        .list(&ListQuery {
            search: Some(term.into()),
            sort: Some("code".into()),
            ..ListQuery::default()
        })
        .await
        .expect("search");
    let codes: Vec<&str> = page.items.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, expected);
    assert_eq!(page.total, expected.len() as u64);
}

#[tokio::test]
async fn test_duplicate_code_is_conflict() {
    let db = common::setup().await;
    let repo = MasterRepository::<banks::Entity>::new(db.clone());
    let input = || banks::Input {
        code: "BCA".into(),
        name: "Bank Central".into(),
        swift_code: None,
    };

    repo.create(input(), 1).await.expect("first insert");
    let err = repo.create(input(), 1).await.unwrap_err();
    assert!(matches!(err, MasterError::Conflict(_)));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn test_update_and_delete_missing_rows() {
    let db = common::setup().await;
    let ids = seed_departments(&db, &[("OPS", "Operations")]).await;
    let repo = MasterRepository::<departments::Entity>::new(db.clone());

    let updated = repo
        .update(
            ids[0],
            departments::Input {
                code: "OPS".into(),
                name: "Plant Operations".into(),
            },
            7,
        )
        .await
        .expect("update");
    assert_eq!(updated.name, "Plant Operations");
    assert_eq!(updated.updated_by, Some(7));
    assert_eq!(updated.created_by, Some(1));

    repo.delete(ids[0]).await.expect("delete");
    assert!(matches!(
        repo.find(ids[0]).await,
        Err(MasterError::NotFound { table: "departments", .. })
    ));
    assert!(matches!(
        repo.delete(ids[0]).await,
        Err(MasterError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_machine_revision_belongs_to_machine() {
    let db = common::setup().await;
    let machine = MasterRepository::<machines::Entity>::new(db.clone())
        .create(
            machines::Input {
                code: "MC-01".into(),
                name: "Press".into(),
                building_id: None,
            },
            1,
        )
        .await
        .expect("machine");

    let revision = MasterRepository::<machine_revisions::Entity>::new(db.clone())
        .create(
            machine_revisions::Input {
                machine_id: machine.id,
                revision: "R1".into(),
                notes: Some("Overhaul".into()),
            },
            1,
        )
        .await
        .expect("revision");
    assert_eq!(revision.machine_id, machine.id);
    assert_eq!(revision.status, "active");
}

#[tokio::test]
async fn test_user_crud_and_search() {
    let db = common::setup().await;
    let repo = UserRepository::new(db.clone());

    let created = common::create_user(&db, "carol").await;
    let duplicate = repo
        .create(common::user_input("carol"), "hash".into(), 1)
        .await;
    assert!(matches!(duplicate, Err(MasterError::Conflict(_))));

    let mut input = common::user_input("carol");
    input.is_active = false;
    let updated = repo
        .update(created.id, input, None, 1)
        .await
        .expect("update");
    assert!(!updated.user.is_active);
    assert_eq!(updated.user.password, "$argon2id$test_hash");

    let page = repo
        .list(&ListQuery {
            search: Some("CAROL".into()),
            ..ListQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(page.total, 1);

    repo.delete(created.id).await.expect("delete");
    assert!(repo.find_by_id(created.id).await.expect("query").is_none());
}

#[rstest]
#[case::password("password")]
#[case::otp_secret("otp_secret")]
#[case::refresh_token("refresh_token")]
#[case::session_id("session_id")]
#[tokio::test]
async fn test_users_never_sort_by_credentials(#[case] column: &str) {
    let db = common::setup().await;
    let repo = UserRepository::new(db.clone());
    repo.create(common::user_input("amy"), "zzz".into(), 1)
        .await
        .expect("amy");
    repo.create(common::user_input("zed"), "aaa".into(), 1)
        .await
        .expect("zed");

    let page = repo
        .list(&ListQuery {
            sort: Some(column.into()),
            ..ListQuery::default()
        })
        .await
        .expect("list");
    let names: Vec<&str> = page.items.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["amy", "zed"]);

    let by_name = repo
        .list(&ListQuery {
            sort: Some("username".into()),
            dir: SortDir::Desc,
            ..ListQuery::default()
        })
        .await
        .expect("list");
    let names: Vec<&str> = by_name.items.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["zed", "amy"]);
}
