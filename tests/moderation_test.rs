mod common;

use serde_json::Value;

#[tokio::test]
async fn approve_publishes_and_audits() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "appr_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_, author_token, _) = common::signup_user(&app, "appr_author").await;
    let category_id = common::create_category(&app, &admin_token).await;
    let post_id = common::create_post(&app, &author_token, category_id, "Approve me").await;

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/approve", post_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "published");
    assert!(body["data"]["published_at"].as_str().is_some());
    assert!(body["data"]["reject_reason"].is_null());

    assert_eq!(
        common::count_audit_rows(&app.db, "approve_post", post_id).await,
        1
    );
}

#[tokio::test]
async fn reject_records_reason_and_audits() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "rej_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_, author_token, _) = common::signup_user(&app, "rej_author").await;
    let category_id = common::create_category(&app, &admin_token).await;
    let post_id = common::create_post(&app, &author_token, category_id, "Reject me").await;

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/reject", post_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "reason": "too short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Only the author (or a moderator) can still see it.
    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&author_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "rejected");
    assert_eq!(body["data"]["reject_reason"], "too short");

    assert_eq!(
        common::count_audit_rows(&app.db, "reject_post", post_id).await,
        1
    );
}

#[tokio::test]
async fn reject_requires_a_reason() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "rsn_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_, author_token, _) = common::signup_user(&app, "rsn_author").await;
    let category_id = common::create_category(&app, &admin_token).await;
    let post_id = common::create_post(&app, &author_token, category_id, "No reason").await;

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/reject", post_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "reason": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn moderation_is_admin_only() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "gate_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_, author_token, _) = common::signup_user(&app, "gate_author").await;
    let category_id = common::create_category(&app, &admin_token).await;
    let post_id = common::create_post(&app, &author_token, category_id, "Gated").await;

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/approve", post_id)))
        .bearer_auth(&author_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/reject", post_id)))
        .bearer_auth(&author_token)
        .json(&serde_json::json!({ "reason": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn approve_is_defined_only_from_pending() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "state_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_, author_token, _) = common::signup_user(&app, "state_author").await;
    let category_id = common::create_category(&app, &admin_token).await;
    let post_id =
        common::create_published_post(&app, &author_token, &admin_token, category_id, "Done")
            .await;

    // Approving again is a no-transition.
    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/approve", post_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // So is rejecting a published post.
    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/reject", post_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "reason": "late" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn moderating_missing_post_is_not_found() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "missing_admin").await;
    common::make_admin(&app.db, admin_id).await;

    let resp = app
        .client
        .post(app.url("/posts/999999/approve"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn author_edit_of_rejected_post_returns_it_to_pending() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "resub_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_, author_token, _) = common::signup_user(&app, "resub_author").await;
    let category_id = common::create_category(&app, &admin_token).await;
    let post_id = common::create_post(&app, &author_token, category_id, "First draft").await;

    app.client
        .post(app.url(&format!("/posts/{}/reject", post_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "reason": "needs work" }))
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&author_token)
        .json(&serde_json::json!({ "content": "Second draft, much better" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "pending");
    assert!(body["data"]["reject_reason"].is_null());
}

#[tokio::test]
async fn resubmitted_post_can_be_approved() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token, _) = common::signup_user(&app, "cycle_admin").await;
    common::make_admin(&app.db, admin_id).await;
    let (_, author_token, _) = common::signup_user(&app, "cycle_author").await;
    let category_id = common::create_category(&app, &admin_token).await;
    let post_id = common::create_post(&app, &author_token, category_id, "Cycle").await;

    // reject → edit → approve, the full loop
    app.client
        .post(app.url(&format!("/posts/{}/reject", post_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "reason": "not yet" }))
        .send()
        .await
        .unwrap();

    app.client
        .put(app.url(&format!("/posts/{}", post_id)))
        .bearer_auth(&author_token)
        .json(&serde_json::json!({ "content": "revised" }))
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/posts/{}/approve", post_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "published");
}
