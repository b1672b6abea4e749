use axum::{
    body::Body,
    http::{header, Method, Request},
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use super::assertions::ResponseAssertion;
use super::setup::{TestSetup, TestUser, TEST_PASSWORD};

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Send a request through the full router and capture the response
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> ResponseAssertion {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        ResponseAssertion::from_response(response).await
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    pub async fn get(&self, user: &TestUser, uri: &str) -> ResponseAssertion {
        self.send(Method::GET, uri, Some(user.access.as_str()), None).await
    }

    pub async fn post(&self, user: &TestUser, uri: &str, body: Value) -> ResponseAssertion {
        self.send(Method::POST, uri, Some(user.access.as_str()), Some(body))
            .await
    }

    pub async fn put(&self, user: &TestUser, uri: &str, body: Value) -> ResponseAssertion {
        self.send(Method::PUT, uri, Some(user.access.as_str()), Some(body))
            .await
    }

    pub async fn patch(&self, user: &TestUser, uri: &str, body: Value) -> ResponseAssertion {
        self.send(Method::PATCH, uri, Some(user.access.as_str()), Some(body))
            .await
    }

    pub async fn delete(&self, user: &TestUser, uri: &str) -> ResponseAssertion {
        self.send(Method::DELETE, uri, Some(user.access.as_str()), None).await
    }

    /// Register an account and obtain its token pair
    pub async fn register_and_login(&self, username: &str) -> TestUser {
        let credentials = json!({ "username": username, "password": TEST_PASSWORD });

        let account = self
            .send(Method::POST, "/api/register", None, Some(credentials.clone()))
            .await
            .has_status(201)
            .json();
        let pair = self
            .send(Method::POST, "/api/token", None, Some(credentials))
            .await
            .has_status(200)
            .json();

        TestUser {
            id: account["id"].as_i64().unwrap(),
            username: username.to_string(),
            access: pair["access"].as_str().unwrap().to_string(),
            refresh: pair["refresh"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_profile(&self, user: &TestUser) -> Value {
        self.post(
            user,
            "/api/profiles",
            json!({
                "email": format!("{}@example.com", user.username),
                "full_name": user.username,
            }),
        )
        .await
        .has_status(201)
        .json()
    }

    /// Create a skill owned by the user's profile and return its id
    pub async fn create_skill(&self, user: &TestUser, name: &str) -> String {
        let skill = self
            .post(
                user,
                "/api/skills",
                json!({ "profile": user.id, "skill_name": name, "proficiency": "advanced" }),
            )
            .await
            .has_status(201)
            .json();
        skill["id"].as_str().unwrap().to_string()
    }
}
