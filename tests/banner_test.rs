mod common;

use serde_json::Value;

async fn create_banner(app: &common::TestApp, admin_token: &str, body: serde_json::Value) -> i32 {
    let resp = app
        .client
        .post(app.url("/banners"))
        .bearer_auth(admin_token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap() as i32
}

async fn listed_banner_ids(app: &common::TestApp) -> Vec<i32> {
    let resp = app.client.get(app.url("/banners")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap() as i32)
        .collect()
}

#[tokio::test]
async fn banner_writes_are_admin_gated() {
    let app = common::spawn_app().await;
    let (_, user_token, _) = common::signup_user(&app, "ban_user").await;

    let resp = app
        .client
        .post(app.url("/banners"))
        .bearer_auth(&user_token)
        .json(&serde_json::json!({ "title": "Nope", "content": "denied" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn windowless_active_banner_is_listed() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "ban_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let id = create_banner(
        &app,
        &admin_token,
        serde_json::json!({ "title": "Always on", "content": "hello" }),
    )
    .await;

    assert!(listed_banner_ids(&app).await.contains(&id));
}

#[tokio::test]
async fn deactivated_banner_is_not_listed() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "off_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let id = create_banner(
        &app,
        &admin_token,
        serde_json::json!({ "title": "Soon off", "content": "bye" }),
    )
    .await;

    let resp = app
        .client
        .put(app.url(&format!("/banners/{}", id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "isActive": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert!(!listed_banner_ids(&app).await.contains(&id));
}

#[tokio::test]
async fn banner_window_bounds_are_honored() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "win_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let now = chrono::Utc::now().naive_utc();
    let fmt = "%Y-%m-%dT%H:%M:%S";
    let yesterday = (now - chrono::Duration::days(1)).format(fmt).to_string();
    let tomorrow = (now + chrono::Duration::days(1)).format(fmt).to_string();

    // Inside its window: listed.
    let current = create_banner(
        &app,
        &admin_token,
        serde_json::json!({
            "title": "Current",
            "content": "on now",
            "visibleFrom": yesterday,
            "visibleTo": tomorrow
        }),
    )
    .await;

    // Starts tomorrow: not listed.
    let upcoming = create_banner(
        &app,
        &admin_token,
        serde_json::json!({
            "title": "Upcoming",
            "content": "not yet",
            "visibleFrom": tomorrow
        }),
    )
    .await;

    // Ended yesterday: not listed.
    let expired = create_banner(
        &app,
        &admin_token,
        serde_json::json!({
            "title": "Expired",
            "content": "too late",
            "visibleTo": yesterday
        }),
    )
    .await;

    // Open-ended start, still running: listed.
    let open_start = create_banner(
        &app,
        &admin_token,
        serde_json::json!({
            "title": "Open start",
            "content": "running",
            "visibleTo": tomorrow
        }),
    )
    .await;

    let ids = listed_banner_ids(&app).await;
    assert!(ids.contains(&current));
    assert!(!ids.contains(&upcoming));
    assert!(!ids.contains(&expired));
    assert!(ids.contains(&open_start));
}

#[tokio::test]
async fn banner_delete_removes_it() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "delban_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let id = create_banner(
        &app,
        &admin_token,
        serde_json::json!({ "title": "Short lived", "content": "x" }),
    )
    .await;

    let resp = app
        .client
        .delete(app.url(&format!("/banners/{}", id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    assert!(!listed_banner_ids(&app).await.contains(&id));
}
