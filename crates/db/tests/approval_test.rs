//! Integration tests for the approval runtime.

mod common;

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

use foundry_core::approval::{ApprovalError, LevelDraft, Outcome};
use foundry_db::entities::{approval_histories, departments, users};
use foundry_db::repositories::{ActInput, ApprovalRepository, MasterRepository};

const PATH: &str = "/master/department";

struct Fixture {
    db: DatabaseConnection,
    approvals: ApprovalRepository,
    departments: MasterRepository<departments::Entity>,
    a: users::Model,
    b: users::Model,
}

fn draft(level: i32, status: &str, approvers: Vec<i32>) -> LevelDraft {
    LevelDraft {
        action: "create".into(),
        level,
        status: status.into(),
        count: 1,
        approvers,
    }
}

fn act(ref_id: i32) -> ActInput {
    ActInput {
        ref_table: "departments".into(),
        ref_id,
        action: "create".into(),
        level: None,
        message: None,
    }
}

/// Menu `/master/department` with chain [L1(A, review), L2(B, approved)].
async fn fixture() -> Fixture {
    let db = common::setup().await;
    common::create_menu(&db, "Department", PATH, 0).await;
    let a = common::create_user(&db, "approver_a").await;
    let b = common::create_user(&db, "approver_b").await;

    let approvals = ApprovalRepository::new(db.clone());
    approvals
        .replace_chain(
            PATH,
            vec![draft(1, "review", vec![a.id]), draft(2, "approved", vec![b.id])],
            a.id,
        )
        .await
        .expect("Failed to store chain");

    Fixture {
        departments: MasterRepository::new(db.clone()),
        approvals,
        db,
        a,
        b,
    }
}

async fn new_department(f: &Fixture, code: &str) -> departments::Model {
    f.departments
        .create(
            departments::Input {
                code: code.into(),
                name: format!("Department {code}"),
            },
            f.a.id,
        )
        .await
        .expect("Failed to create department")
}

async fn history_rows(db: &DatabaseConnection) -> u64 {
    approval_histories::Entity::find()
        .count(db)
        .await
        .expect("count")
}

#[tokio::test]
async fn test_two_level_chain_advances_then_closes() {
    let f = fixture().await;
    let record = new_department(&f, "PRD").await;
    assert_eq!(record.status, "pending");

    let first = f.approvals.act(act(record.id), f.a.id).await.expect("level 1");
    assert_eq!(first.status, "review");
    assert!(matches!(first.outcome, Outcome::Advanced { level: 1, closed: false, .. }));
    assert_eq!(history_rows(&f.db).await, 1);

    let second = f.approvals.act(act(record.id), f.b.id).await.expect("level 2");
    assert_eq!(second.status, "approved");
    assert!(matches!(second.outcome, Outcome::Advanced { level: 2, closed: true, .. }));
    assert_eq!(history_rows(&f.db).await, 2);

    let again = f.approvals.act(act(record.id), f.b.id).await;
    assert!(matches!(again, Err(ApprovalError::AlreadyClosed)));
    assert_eq!(history_rows(&f.db).await, 2);

    let stored = f.departments.find(record.id).await.expect("record");
    assert_eq!(stored.status, "approved");
    assert_eq!(stored.updated_by, Some(f.b.id));

    let history = f
        .approvals
        .history("departments", record.id)
        .await
        .expect("history");
    let levels: Vec<Option<i32>> = history.iter().map(|h| h.level).collect();
    assert_eq!(levels, vec![Some(1), Some(2)]);
    assert_eq!(history[0].created_by, f.a.id);
}

#[tokio::test]
async fn test_closed_record_stays_closed_after_chain_replacement() {
    let f = fixture().await;
    let record = new_department(&f, "ENG").await;
    f.approvals.act(act(record.id), f.a.id).await.expect("level 1");
    f.approvals.act(act(record.id), f.b.id).await.expect("level 2");

    f.approvals
        .replace_chain(
            PATH,
            vec![draft(1, "review", vec![f.a.id]), draft(2, "approved", vec![f.b.id])],
            f.a.id,
        )
        .await
        .expect("Failed to replace chain");

    let reopened = f.approvals.act(act(record.id), f.a.id).await;
    assert!(matches!(reopened, Err(ApprovalError::AlreadyClosed)));
    assert_eq!(history_rows(&f.db).await, 2);

    let stored = f.departments.find(record.id).await.expect("record");
    assert_eq!(stored.status, "approved");
}

#[tokio::test]
async fn test_out_of_order_and_outsider_rejected() {
    let f = fixture().await;
    let record = new_department(&f, "QA").await;
    let outsider = common::create_user(&f.db, "outsider").await;

    let early = f.approvals.act(act(record.id), f.b.id).await;
    assert!(matches!(
        early,
        Err(ApprovalError::OutOfOrder {
            expected: 1,
            requested: 2
        })
    ));

    let stranger = f.approvals.act(act(record.id), outsider.id).await;
    assert!(matches!(stranger, Err(ApprovalError::NotApprover(_))));

    let pinned = f
        .approvals
        .act(
            ActInput {
                level: Some(2),
                ..act(record.id)
            },
            f.a.id,
        )
        .await;
    assert!(matches!(pinned, Err(ApprovalError::OutOfOrder { .. })));

    assert_eq!(history_rows(&f.db).await, 0);
    let stored = f.departments.find(record.id).await.expect("record");
    assert_eq!(stored.status, "pending");
}

#[tokio::test]
async fn test_act_on_unknown_targets() {
    let f = fixture().await;

    let missing = f.approvals.act(act(404), f.a.id).await;
    assert!(matches!(missing, Err(ApprovalError::RecordNotFound { id: 404, .. })));

    let table = f
        .approvals
        .act(
            ActInput {
                ref_table: "users".into(),
                ..act(1)
            },
            f.a.id,
        )
        .await;
    assert!(matches!(table, Err(ApprovalError::UnknownTable(_))));

    let record = new_department(&f, "OPS").await;
    let no_chain = f
        .approvals
        .act(
            ActInput {
                action: "deactivate".into(),
                ..act(record.id)
            },
            f.a.id,
        )
        .await;
    assert!(matches!(no_chain, Err(ApprovalError::NoChain { .. })));
}

#[tokio::test]
async fn test_notifications_follow_the_next_level() {
    let f = fixture().await;
    let record = new_department(&f, "ENG").await;

    let for_a = f.approvals.notifications(f.a.id).await.expect("a");
    assert_eq!(for_a.len(), 1);
    assert_eq!(for_a[0].ref_id, record.id);
    assert_eq!(for_a[0].step.next_level, 1);
    assert!(f.approvals.notifications(f.b.id).await.expect("b").is_empty());

    f.approvals.act(act(record.id), f.a.id).await.expect("level 1");

    assert!(f.approvals.notifications(f.a.id).await.expect("a").is_empty());
    let for_b = f.approvals.notifications(f.b.id).await.expect("b");
    assert_eq!(for_b.len(), 1);
    assert_eq!(for_b[0].status, "review");
    assert_eq!(for_b[0].step.current_status.as_deref(), Some("review"));
}

#[tokio::test]
async fn test_structure_marks_involvement() {
    let f = fixture().await;

    let levels = f.approvals.structure(f.b.id, PATH).await.expect("structure");
    assert_eq!(levels.len(), 2);
    assert!(!levels[0].involved);
    assert!(levels[1].involved);
    assert_eq!(levels[1].approvers[0].username, "approver_b");

    let unknown = f.approvals.structure(f.b.id, "/nowhere").await;
    assert!(matches!(unknown, Err(ApprovalError::MenuNotFound(_))));
}

#[tokio::test]
async fn test_chain_validation_and_renumbering() {
    let f = fixture().await;

    let gap = f
        .approvals
        .replace_chain(
            PATH,
            vec![draft(1, "review", vec![f.a.id]), draft(3, "approved", vec![f.b.id])],
            f.a.id,
        )
        .await;
    assert!(matches!(gap, Err(ApprovalError::InvalidChain(_))));

    let ghost = f
        .approvals
        .replace_chain(PATH, vec![draft(1, "review", vec![9999])], f.a.id)
        .await;
    assert!(matches!(ghost, Err(ApprovalError::InvalidChain(_))));

    let chain = f
        .approvals
        .replace_chain(
            PATH,
            vec![
                draft(1, "checked", vec![f.a.id]),
                draft(2, "review", vec![f.b.id]),
                draft(3, "approved", vec![f.a.id, f.b.id]),
            ],
            f.a.id,
        )
        .await
        .expect("replace");
    assert_eq!(chain.len(), 3);

    f.approvals
        .delete_definition(chain[0].id)
        .await
        .expect("delete level 1");

    let remaining = f.approvals.list_chains(Some(PATH)).await.expect("list");
    let levels: Vec<(i32, &str)> = remaining
        .iter()
        .map(|c| (c.level, c.status.as_str()))
        .collect();
    assert_eq!(levels, vec![(1, "review"), (2, "approved")]);

    let approvers = f.approvals.approvers(remaining[1].id).await.expect("approvers");
    assert_eq!(approvers.len(), 2);

    let missing = f.approvals.delete_definition(chain[0].id).await;
    assert!(matches!(missing, Err(ApprovalError::DefinitionNotFound(_))));
}

#[tokio::test]
async fn test_records_start_active_without_create_chain() {
    let db = common::setup().await;
    common::create_menu(&db, "Department", PATH, 0).await;
    let actor = common::create_user(&db, "admin").await;

    let record = MasterRepository::<departments::Entity>::new(db.clone())
        .create(
            departments::Input {
                code: "FIN".into(),
                name: "Finance".into(),
            },
            actor.id,
        )
        .await
        .expect("create");
    assert_eq!(record.status, "active");
    assert_eq!(record.created_by, Some(actor.id));
}
