mod common;

use serde_json::Value;

#[tokio::test]
async fn user_listing_is_admin_gated_and_paginated() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "ul_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_, user_token, _) = common::signup_user(&app, "ul_user").await;

    let resp = app
        .client
        .get(app.url("/users"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(app.url("/users?pageNumber=1"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.len() <= 10);
    // Hash columns never serialize.
    assert!(items[0].get("password_hash").is_none());
}

#[tokio::test]
async fn admin_creates_user_with_generated_credentials() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "cu_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let resp = app
        .client
        .post(app.url("/users"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "name": "Made By Admin",
            "email": "made_by_admin@test.com"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"], "user");
    assert_eq!(body["data"]["is_active"], true);

    // Duplicate email conflicts.
    let resp = app
        .client
        .post(app.url("/users"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "name": "Again",
            "email": "made_by_admin@test.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn admin_rejects_unknown_role() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "role_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let resp = app
        .client
        .post(app.url("/users"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "name": "Strange Role",
            "email": "strange_role@test.com",
            "role": "wizard"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn deactivating_a_user_locks_them_out() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "lock_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (target_id, _, email) = common::signup_user(&app, "lock_target").await;
    common::set_password(&app.db, target_id, "still_valid_pw").await;

    let resp = app
        .client
        .put(app.url(&format!("/users/{}", target_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "isActive": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["is_active"], false);

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": "still_valid_pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn delete_user_removes_the_account() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "rm_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (target_id, _, _) = common::signup_user(&app, "rm_target").await;

    let resp = app
        .client
        .delete(app.url(&format!("/users/{}", target_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/users/{}", target_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn admin_endpoints_require_superadmin() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "sa_gate_admin").await;
    common::make_admin(&app.db, admin_id).await;

    // A plain admin is not enough for the admins surface.
    let resp = app
        .client
        .get(app.url("/users/admins"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .post(app.url("/users/admins"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "name": "Wannabe",
            "email": "wannabe_admin@test.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn superadmin_creates_and_lists_admins() {
    let app = common::spawn_app().await;
    let (sa_id, sa_token, _) = common::signup_user(&app, "sa_boss").await;
    common::make_superadmin(&app.db, sa_id).await;

    let resp = app
        .client
        .post(app.url("/users/admins"))
        .bearer_auth(&sa_token)
        .json(&serde_json::json!({
            "name": "Fresh Admin",
            "email": "fresh_admin@test.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["role"], "admin");
    let new_admin_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .get(app.url("/users/admins"))
        .bearer_auth(&sa_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let admins = body["data"].as_array().unwrap();
    assert!(admins
        .iter()
        .any(|a| a["id"].as_i64() == Some(new_admin_id)));
    // Superadmins appear in the listing too.
    assert!(admins
        .iter()
        .any(|a| a["id"].as_i64() == Some(sa_id as i64)));
}
