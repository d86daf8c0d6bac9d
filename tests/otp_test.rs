mod common;

use serde_json::Value;

#[tokio::test]
async fn forgot_password_unknown_email_is_not_found() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/forgot"))
        .json(&serde_json::json!({ "email": "ghost@test.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn forgot_password_creates_an_otp_row() {
    let app = common::spawn_app().await;
    let (user_id, _, email) = common::signup_user(&app, "forgot").await;

    let resp = app
        .client
        .post(app.url("/auth/forgot"))
        .json(&serde_json::json!({ "email": email }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let row = sea_orm::ConnectionTrait::query_one(
        &app.db,
        sea_orm::Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT COUNT(*) FROM otps WHERE user_id = $1 AND used = FALSE",
            vec![user_id.into()],
        ),
    )
    .await
    .unwrap()
    .unwrap();
    let count: i64 = row.try_get_by_index(0).unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn verify_otp_without_any_code_is_bad_request() {
    let app = common::spawn_app().await;
    let (_, _, email) = common::signup_user(&app, "no_otp").await;

    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": "123456" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid or expired OTP");
}

#[tokio::test]
async fn verify_otp_unknown_email_is_not_found() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": "ghost@test.com", "otp": "123456" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn verify_otp_with_valid_code_resets_password() {
    let app = common::spawn_app().await;
    let (user_id, _, email) = common::signup_user(&app, "verify_ok").await;
    common::set_password(&app.db, user_id, "before_reset_pw").await;
    common::insert_otp(&app.db, user_id, "271828", 10, false).await;

    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": "271828" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["data"]["message"],
        "Password reset successful. Check email for new password."
    );

    // The old password no longer works.
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": "before_reset_pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn verify_otp_wrong_code_is_bad_request() {
    let app = common::spawn_app().await;
    let (user_id, _, email) = common::signup_user(&app, "verify_wrong").await;
    common::insert_otp(&app.db, user_id, "314159", 10, false).await;

    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": "999999" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid OTP");
}

#[tokio::test]
async fn used_otp_is_never_revalidated() {
    let app = common::spawn_app().await;
    let (user_id, _, email) = common::signup_user(&app, "single_use").await;
    common::insert_otp(&app.db, user_id, "161803", 10, false).await;

    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": "161803" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Second use of the same code fails.
    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": "161803" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid or expired OTP");
}

#[tokio::test]
async fn expired_otp_is_rejected() {
    let app = common::spawn_app().await;
    let (user_id, _, email) = common::signup_user(&app, "expired").await;
    // Expired five minutes ago.
    common::insert_otp(&app.db, user_id, "141421", -5, false).await;

    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": "141421" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid or expired OTP");
}

#[tokio::test]
async fn newest_unused_otp_supersedes_older_ones() {
    let app = common::spawn_app().await;
    let (user_id, _, email) = common::signup_user(&app, "supersede").await;

    common::insert_otp(&app.db, user_id, "111111", 10, false).await;
    // Ensure a strictly later created_at for the second code.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    common::insert_otp(&app.db, user_id, "222222", 10, false).await;

    // The superseded code no longer verifies.
    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": "111111" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // The newest one does.
    let resp = app
        .client
        .post(app.url("/auth/verify-otp"))
        .json(&serde_json::json!({ "email": email, "otp": "222222" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
