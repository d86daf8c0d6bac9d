mod common;

use serde_json::Value;

#[tokio::test]
async fn submit_contact_stores_message() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/contact"))
        .json(&serde_json::json!({
            "name": "Visitor",
            "email": "visitor@test.com",
            "subject": "Question",
            "message": "How do I reset my password?"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "open");
    assert!(body["data"]["reply_message"].is_null());
}

#[tokio::test]
async fn submit_contact_requires_all_fields() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/contact"))
        .json(&serde_json::json!({
            "name": "Visitor",
            "email": "visitor@test.com",
            "subject": "",
            "message": "body"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Please provide all fields");
}

#[tokio::test]
async fn contact_listing_is_admin_gated() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "ct_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_, user_token, _) = common::signup_user(&app, "ct_user").await;

    let resp = app
        .client
        .get(app.url("/contact"))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .get(app.url("/contact"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn reply_marks_message_replied() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "reply_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let resp = app
        .client
        .post(app.url("/contact"))
        .json(&serde_json::json!({
            "name": "Replyee",
            "email": "replyee@test.com",
            "subject": "Ping",
            "message": "Anyone there?"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/contact/{}/reply", id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "message": "Pong." }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url("/contact"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let replied = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["id"].as_i64() == Some(id))
        .expect("message missing from listing");
    assert_eq!(replied["status"], "replied");
    assert_eq!(replied["reply_message"], "Pong.");
    assert!(replied["replied_at"].as_str().is_some());
}

#[tokio::test]
async fn reply_requires_a_message() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "noreply_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let resp = app
        .client
        .post(app.url("/contact"))
        .json(&serde_json::json!({
            "name": "Quiet",
            "email": "quiet@test.com",
            "subject": "Silence",
            "message": "..."
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/contact/{}/reply", id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "message": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn delete_contact_message() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "delct_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let resp = app
        .client
        .post(app.url("/contact"))
        .json(&serde_json::json!({
            "name": "Gone",
            "email": "gone@test.com",
            "subject": "Remove me",
            "message": "please"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .delete(app.url(&format!("/contact/{}", id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .delete(app.url(&format!("/contact/{}", id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
