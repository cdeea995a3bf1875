//! Registration, login and session tests over HTTP

mod common;

use common::{spawn_app, TEST_PASSWORD};
use serde_json::{json, Value};

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_201_without_password_material() {
    let app = spawn_app();

    let response = app.register("/students", "ada@example.com").await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["role"], "student");
    assert_eq!(body["account_status"], "active");
    assert_eq!(body["email_verified"], false);
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn register_returns_409_for_duplicate_email() {
    let app = spawn_app();
    assert_eq!(201, app.register("/students", "a@b.com").await.status().as_u16());

    let response = app.register("/students", "a@b.com").await;

    assert_eq!(409, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "DUPLICATE_EMAIL");

    let list: Value = app
        .client
        .get(app.url("/students"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["total_count"], 1);
}

#[tokio::test]
async fn same_email_may_exist_in_different_roles() {
    let app = spawn_app();

    assert_eq!(201, app.register("/students", "a@b.com").await.status().as_u16());
    assert_eq!(201, app.register("/instructors", "a@b.com").await.status().as_u16());
}

#[tokio::test]
async fn register_returns_400_for_invalid_input() {
    let app = spawn_app();
    let test_cases = vec![
        (json!({"first_name": "A", "last_name": "B", "email": "a@b.com", "password": "Ab1!"}), "short password"),
        (json!({"first_name": "A", "last_name": "B", "email": "a@b.com", "password": "Abcdefg!"}), "no digit"),
        (json!({"first_name": "A", "last_name": "B", "email": "a@b.com", "password": "1234567!"}), "no letter"),
        (json!({"first_name": "A", "last_name": "B", "email": "a@b.com", "password": "Abcdefg1"}), "no special"),
        (json!({"first_name": "A", "last_name": "B", "email": "a@b.com", "password": ""}), "empty password"),
        (json!({"first_name": "A", "last_name": "B", "email": "not-an-email", "password": TEST_PASSWORD}), "bad email"),
        (json!({"first_name": " ", "last_name": "B", "email": "a@b.com", "password": TEST_PASSWORD}), "blank name"),
    ];

    for (body, description) in test_cases {
        let response = app.post_json("/students/register", &body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn register_rejects_field_the_role_does_not_carry() {
    let app = spawn_app();

    let response = app
        .post_json(
            "/admins/register",
            &json!({
                "first_name": "A",
                "last_name": "B",
                "email": "a@b.com",
                "password": TEST_PASSWORD,
                "future_goal": "world domination"
            }),
        )
        .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn instructor_registration_keeps_role_fields() {
    let app = spawn_app();

    let response = app
        .post_json(
            "/instructors/register",
            &json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@example.com",
                "password": TEST_PASSWORD,
                "qualification": "PhD",
                "year_of_experience": 30,
                "account_status": "pending"
            }),
        )
        .await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["qualification"], "PhD");
    assert_eq!(body["year_of_experience"], 30);
    assert_eq!(body["account_status"], "pending");
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_token_and_public_profile() {
    let app = spawn_app();
    app.register("/students", "ada@example.com").await;

    let response = app.login("/students", "ada@example.com", TEST_PASSWORD).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["role"], "student");
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_fail_identically() {
    let app = spawn_app();
    app.register("/students", "ada@example.com").await;

    let wrong_password = app.login("/students", "ada@example.com", "Wrong123!").await;
    let unknown_email = app.login("/students", "nobody@example.com", TEST_PASSWORD).await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_email.json().await.unwrap();
    assert_eq!(a["code"], "INVALID_CREDENTIALS");
    assert_eq!(a["code"], b["code"]);
    assert_eq!(a["message"], b["message"]);
}

#[tokio::test]
async fn login_is_scoped_to_the_role() {
    let app = spawn_app();
    app.register("/students", "ada@example.com").await;

    let response = app.login("/instructors", "ada@example.com", TEST_PASSWORD).await;

    assert_eq!(401, response.status().as_u16());
}

// --- Session Tests ---

#[tokio::test]
async fn me_returns_the_token_owner() {
    let app = spawn_app();
    let token = app.token_for("/students", "ada@example.com").await;

    let response = app
        .client
        .get(app.url("/students/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "ada@example.com");
    assert!(body["last_login"].is_string());
}

#[tokio::test]
async fn me_requires_a_token() {
    let app = spawn_app();

    let response = app.client.get(app.url("/students/me")).send().await.unwrap();

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn me_rejects_a_garbage_token() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/students/me"))
        .bearer_auth("not.a.token")
        .send()
        .await
        .unwrap();

    assert_eq!(401, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn token_of_another_role_is_forbidden() {
    let app = spawn_app();
    let token = app.token_for("/students", "ada@example.com").await;

    let response = app
        .client
        .get(app.url("/admins/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn patch_me_changes_only_supplied_fields() {
    let app = spawn_app();
    let token = app.token_for("/students", "ada@example.com").await;

    let response = app
        .client
        .patch(app.url("/students/me"))
        .bearer_auth(&token)
        .json(&json!({ "bio": "Analytical engine enthusiast", "password": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["bio"], "Analytical engine enthusiast");
    assert_eq!(body["first_name"], "Ada");
    assert_eq!(body["email"], "ada@example.com");
    assert!(body["password_last_change"].is_null());

    // Empty password left the old one in place
    let login = app.login("/students", "ada@example.com", TEST_PASSWORD).await;
    assert_eq!(200, login.status().as_u16());
}

#[tokio::test]
async fn patch_me_with_new_password_replaces_the_old_one() {
    let app = spawn_app();
    let token = app.token_for("/instructors", "grace@example.com").await;

    let response = app
        .client
        .patch(app.url("/instructors/me"))
        .bearer_auth(&token)
        .json(&json!({ "password": "Newpass9?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["password_last_change"].is_string());

    let old = app.login("/instructors", "grace@example.com", TEST_PASSWORD).await;
    let new = app.login("/instructors", "grace@example.com", "Newpass9?").await;
    assert_eq!(401, old.status().as_u16());
    assert_eq!(200, new.status().as_u16());
}

#[tokio::test]
async fn patch_me_to_a_taken_email_conflicts() {
    let app = spawn_app();
    app.register("/students", "taken@example.com").await;
    let token = app.token_for("/students", "ada@example.com").await;

    let response = app
        .client
        .patch(app.url("/students/me"))
        .bearer_auth(&token)
        .json(&json!({ "email": "taken@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(409, response.status().as_u16());
}

// --- Listing Tests ---

#[tokio::test]
async fn list_pages_sorts_and_searches() {
    let app = spawn_app();
    for email in ["carol@x.io", "alice@x.io", "bob@y.io"] {
        assert_eq!(201, app.register("/admins", email).await.status().as_u16());
    }

    let body: Value = app
        .client
        .get(app.url("/admins?sort_field=email&sort_order=desc&per_page=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["total_count"], 3);
    assert_eq!(body["filtered_count"], 3);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["email"], "carol@x.io");
    assert_eq!(body["items"][1]["email"], "bob@y.io");

    let body: Value = app
        .client
        .get(app.url("/admins?search=X.IO&sort_field=%3B%20DROP%20TABLE"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["total_count"], 3);
    assert_eq!(body["filtered_count"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["items"][0]["email"], "carol@x.io");
}

#[tokio::test]
async fn get_by_id() {
    let app = spawn_app();
    let created: Value = app
        .register("/instructors", "grace@example.com")
        .await
        .json()
        .await
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let found = app
        .client
        .get(app.url(&format!("/instructors/{}", id)))
        .send()
        .await
        .unwrap();
    let missing = app
        .client
        .get(app.url("/instructors/9999"))
        .send()
        .await
        .unwrap();

    assert_eq!(200, found.status().as_u16());
    assert_eq!(404, missing.status().as_u16());
}
