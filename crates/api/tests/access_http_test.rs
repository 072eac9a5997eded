//! Permission gates, master CRUD, menus and the approval flow over HTTP.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{ALL, PASSWORD, VIEW};
use foundry_core::access::PermissionBits;
use foundry_shared::erp::RemoteEmployee;

#[tokio::test]
async fn test_gate_follows_role_bits() {
    let app = common::app().await;
    let user = common::create_user(&app.db, "clerk").await;
    let bank_menu = common::create_menu(&app.db, "/master/bank").await;
    let token = app.login("clerk", PASSWORD).await;

    let hidden = app.get("/master/bank", &token).await;
    assert_eq!(hidden.status, StatusCode::FORBIDDEN);
    assert_eq!(hidden.body["error"], "forbidden");

    common::grant(&app.db, user.id, &[(&bank_menu, VIEW)]).await;
    assert_eq!(app.get("/master/bank", &token).await.status, StatusCode::OK);

    let body = json!({ "code": "BCA", "name": "Bank Central Asia" });
    let denied = app.post("/master/bank", Some(&token), body.clone()).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    common::grant(
        &app.db,
        user.id,
        &[(&bank_menu, PermissionBits::new(true, false, false))],
    )
    .await;
    let created = app.post("/master/bank", Some(&token), body.clone()).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["status"], "active");
    assert_eq!(created.body["created_by"], user.id);

    let duplicate = app.post("/master/bank", Some(&token), body).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let id = created.body["id"].as_i64().unwrap();
    let delete = app.delete(&format!("/master/bank/{id}"), &token).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_master_list_envelope() {
    let app = common::app().await;
    let admin = common::create_user(&app.db, "admin").await;
    let menu = common::create_menu(&app.db, "/master/currency").await;
    common::grant(&app.db, admin.id, &[(&menu, ALL)]).await;
    let token = app.login("admin", PASSWORD).await;

    for (code, name) in [("IDR", "Rupiah"), ("USD", "US Dollar"), ("EUR", "Euro")] {
        let reply = app
            .post(
                "/master/currency",
                Some(&token),
                json!({ "code": code, "name": name }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    }

    let page = app
        .get("/master/currency?sort=code&dir=desc&limit=2", &token)
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["total"], 3);
    let codes: Vec<&str> = page.body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["USD", "IDR"]);

    let search = app.get("/master/currency?search=dollar", &token).await;
    assert_eq!(search.body["total"], 1);

    let too_big = app.get("/master/currency?limit=500", &token).await;
    assert_eq!(too_big.status, StatusCode::BAD_REQUEST);
    assert_eq!(too_big.body["error"], "validation");

    let missing = app.get("/master/currency/999", &token).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_tree_hides_deleted_menus() {
    let app = common::app().await;
    let admin = common::create_user(&app.db, "admin").await;
    let menu_menu = common::create_menu(&app.db, "/master/menu").await;
    let bank = common::create_menu(&app.db, "/master/bank").await;
    common::grant(&app.db, admin.id, &[(&menu_menu, ALL), (&bank, VIEW)]).await;
    let token = app.login("admin", PASSWORD).await;

    let tree = app.get("/master/tree-menu/user", &token).await;
    assert_eq!(tree.status, StatusCode::OK);
    assert_eq!(tree.body.as_array().unwrap().len(), 2);

    let deleted = app
        .delete(&format!("/master/menu/{}", bank.id), &token)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let tree = app.get("/master/tree-menu/user", &token).await;
    let paths: Vec<&str> = tree
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["/master/menu"]);

    let cycle = app
        .put(
            &format!("/master/menu/{}", menu_menu.id),
            &token,
            json!({ "label": "Menu", "path": "/master/menu", "parent_id": menu_menu.id }),
        )
        .await;
    assert_eq!(cycle.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_bodies_are_validation_errors() {
    let app = common::app().await;
    let admin = common::create_user(&app.db, "admin").await;
    let editor = common::create_menu(&app.db, "/role-permission").await;
    let bank = common::create_menu(&app.db, "/master/bank").await;
    common::grant(&app.db, admin.id, &[(&editor, ALL), (&bank, ALL)]).await;
    let token = app.login("admin", PASSWORD).await;

    let permission = app
        .post("/role-permission", Some(&token), json!({ "role_id": "x" }))
        .await;
    assert_eq!(permission.status, StatusCode::BAD_REQUEST);
    assert_eq!(permission.body["error"], "validation");

    let master = app
        .post("/master/bank", Some(&token), json!({ "code": 1 }))
        .await;
    assert_eq!(master.status, StatusCode::BAD_REQUEST);
    assert_eq!(master.body["error"], "validation");

    let two_fa = app
        .put(&format!("/{}/two-fa", admin.id), &token, json!({ "enabled": "on" }))
        .await;
    assert_eq!(two_fa.status, StatusCode::BAD_REQUEST);
    assert_eq!(two_fa.body["error"], "validation");

    let log = app.post("/log", Some(&token), json!({ "action": 7 })).await;
    assert_eq!(log.status, StatusCode::BAD_REQUEST);
    assert_eq!(log.body["error"], "validation");
}

#[tokio::test]
async fn test_role_permission_editor() {
    let app = common::app().await;
    let admin = common::create_user(&app.db, "admin").await;
    let editor = common::create_menu(&app.db, "/role-permission").await;
    let roles = common::create_menu(&app.db, "/master/role").await;
    common::grant(&app.db, admin.id, &[(&editor, ALL), (&roles, ALL)]).await;
    let token = app.login("admin", PASSWORD).await;

    let role = app
        .post(
            "/master/role",
            Some(&token),
            json!({ "name": "operator", "menu_ids": [roles.id] }),
        )
        .await;
    assert_eq!(role.status, StatusCode::CREATED);
    let role_id = role.body["id"].as_i64().unwrap();

    let upsert = app
        .post(
            "/role-permission",
            Some(&token),
            json!({ "role_id": role_id, "menu_id": roles.id, "is_update": true }),
        )
        .await;
    assert_eq!(upsert.status, StatusCode::OK);
    assert_eq!(upsert.body["is_update"], true);

    let tree = app.get(&format!("/role-permission/{role_id}"), &token).await;
    assert_eq!(tree.status, StatusCode::OK);
    assert_eq!(tree.body[0]["permission"]["is_update"], true);
    assert_eq!(tree.body[0]["permission"]["is_create"], false);

    let cleared = app
        .post(
            "/role-permission",
            Some(&token),
            json!({ "role_id": role_id, "menu_id": roles.id }),
        )
        .await;
    assert_eq!(cleared.status, StatusCode::OK);
    assert!(cleared.body.is_null());

    let gone = app
        .delete(&format!("/role-permission/{role_id}/{}", roles.id), &token)
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_approval_flow() {
    let app = common::app().await;
    let admin = common::create_user(&app.db, "admin").await;
    let approver = common::create_user(&app.db, "approver").await;
    let approval_menu = common::create_menu(&app.db, "/approval").await;
    let department = common::create_menu(&app.db, "/master/department").await;
    common::grant(
        &app.db,
        admin.id,
        &[(&approval_menu, ALL), (&department, ALL)],
    )
    .await;
    common::grant(&app.db, approver.id, &[(&department, VIEW)]).await;

    let admin_token = app.login("admin", PASSWORD).await;
    let approver_token = app.login("approver", PASSWORD).await;

    let chain = app
        .post(
            "/approval",
            Some(&admin_token),
            json!({
                "path": "/master/department",
                "levels": [
                    { "action": "create", "level": 1, "status": "approved", "count": 1, "approvers": [approver.id] }
                ]
            }),
        )
        .await;
    assert_eq!(chain.status, StatusCode::CREATED, "{}", chain.body);
    let definition_id = chain.body[0]["id"].as_i64().unwrap();

    let created = app
        .post(
            "/master/department",
            Some(&admin_token),
            json!({ "code": "QA", "name": "Quality" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["status"], "pending");
    let ref_id = created.body["id"].as_i64().unwrap();

    let inbox = app.get("/approval/notification", &approver_token).await;
    assert_eq!(inbox.status, StatusCode::OK);
    assert_eq!(inbox.body.as_array().unwrap().len(), 1);
    assert_eq!(inbox.body[0]["ref_id"], ref_id);
    assert_eq!(inbox.body[0]["next_level"], 1);

    let structure = app
        .get("/approval-structure?path=/master/department", &approver_token)
        .await;
    assert_eq!(structure.status, StatusCode::OK);
    assert_eq!(structure.body[0]["involved"], true);

    let approvers = app
        .get(
            &format!("/approval-user?definition_id={definition_id}"),
            &admin_token,
        )
        .await;
    assert_eq!(approvers.body[0]["username"], "approver");

    let body = json!({ "ref_table": "departments", "ref_id": ref_id, "message": "ok" });
    let outsider = app
        .post("/approval/action", Some(&admin_token), body.clone())
        .await;
    assert_eq!(outsider.status, StatusCode::FORBIDDEN);

    let approved = app
        .post("/approval/action", Some(&approver_token), body.clone())
        .await;
    assert_eq!(approved.status, StatusCode::OK, "{}", approved.body);
    assert_eq!(approved.body["status"], "approved");

    let again = app
        .post("/approval/action", Some(&approver_token), body)
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"], "already_closed");

    let history = app
        .get(
            &format!("/approval-history?ref_table=departments&ref_id={ref_id}"),
            &approver_token,
        )
        .await;
    assert_eq!(history.status, StatusCode::OK);
    assert_eq!(history.body.as_array().unwrap().len(), 1);
    assert_eq!(history.body[0]["message"], "ok");

    let inbox = app.get("/approval/notification", &approver_token).await;
    assert!(inbox.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_approval_action_requires_visible_menu() {
    let app = common::app().await;
    let admin = common::create_user(&app.db, "admin").await;
    let approver = common::create_user(&app.db, "blind_approver").await;
    let approval_menu = common::create_menu(&app.db, "/approval").await;
    let department = common::create_menu(&app.db, "/master/department").await;
    common::grant(
        &app.db,
        admin.id,
        &[(&approval_menu, ALL), (&department, ALL)],
    )
    .await;

    let admin_token = app.login("admin", PASSWORD).await;
    let approver_token = app.login("blind_approver", PASSWORD).await;

    let chain = app
        .post(
            "/approval",
            Some(&admin_token),
            json!({
                "path": "/master/department",
                "levels": [
                    { "action": "create", "level": 1, "status": "approved", "count": 1, "approvers": [approver.id] }
                ]
            }),
        )
        .await;
    assert_eq!(chain.status, StatusCode::CREATED, "{}", chain.body);

    let created = app
        .post(
            "/master/department",
            Some(&admin_token),
            json!({ "code": "PPC", "name": "Planning" }),
        )
        .await;
    let ref_id = created.body["id"].as_i64().unwrap();

    let body = json!({ "ref_table": "departments", "ref_id": ref_id });
    let denied = app
        .post("/approval/action", Some(&approver_token), body.clone())
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["error"], "forbidden");

    let record = app
        .get(&format!("/master/department/{ref_id}"), &admin_token)
        .await;
    assert_eq!(record.body["status"], "pending");

    common::grant(&app.db, approver.id, &[(&department, VIEW)]).await;
    let approved = app
        .post("/approval/action", Some(&approver_token), body)
        .await;
    assert_eq!(approved.status, StatusCode::OK, "{}", approved.body);
    assert_eq!(approved.body["status"], "approved");
}

#[tokio::test]
async fn test_manual_employee_sync() {
    let roster = vec![
        RemoteEmployee {
            employee_number: "E1".into(),
            name: "Ana".into(),
            email: None,
            department_code: Some("QA".into()),
            position: None,
        },
        RemoteEmployee {
            employee_number: "E2".into(),
            name: "Budi".into(),
            email: None,
            department_code: None,
            position: Some("Operator".into()),
        },
    ];
    let app = common::app_with_roster(roster).await;
    let admin = common::create_user(&app.db, "admin").await;
    let menu = common::create_menu(&app.db, "/master/employee").await;
    let token = app.login("admin", PASSWORD).await;

    let denied = app.post("/master/employee/sync", Some(&token), json!({})).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    common::grant(&app.db, admin.id, &[(&menu, ALL)]).await;
    let report = app.post("/master/employee/sync", Some(&token), json!({})).await;
    assert_eq!(report.status, StatusCode::OK);
    assert_eq!(report.body["inserted"], 2);

    let listed = app.get("/master/employee", &token).await;
    assert_eq!(listed.body["total"], 2);
}
