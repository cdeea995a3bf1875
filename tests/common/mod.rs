use std::net::TcpListener;
use std::sync::Arc;

use coursehub::configuration::JwtSettings;
use coursehub::startup::{run, Services};
use coursehub::store::InMemoryStore;
use serde_json::{json, Value};

pub const TEST_PASSWORD: &str = "Abcdef1!";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

/// Spawns the server on a random port, backed by a fresh in-memory store.
pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let store = Arc::new(InMemoryStore::new());
    let jwt = JwtSettings {
        secret: "integration-test-secret-integration-test".to_string(),
        session_ttl_seconds: 3600,
    };
    let services = Services::new(store.clone(), store, &jwt, 4);

    let server = run(listener, services).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, scope: &str, email: &str) -> reqwest::Response {
        self.post_json(
            &format!("{}/register", scope),
            &json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": email,
                "password": TEST_PASSWORD
            }),
        )
        .await
    }

    pub async fn login(&self, scope: &str, email: &str, password: &str) -> reqwest::Response {
        self.post_json(
            &format!("{}/login", scope),
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Registers an account and returns a bearer token for it.
    pub async fn token_for(&self, scope: &str, email: &str) -> String {
        assert_eq!(201, self.register(scope, email).await.status().as_u16());
        let body: Value = self
            .login(scope, email, TEST_PASSWORD)
            .await
            .json()
            .await
            .expect("Failed to parse response");
        body["token"].as_str().expect("missing token").to_string()
    }
}
