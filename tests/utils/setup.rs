use axum::Router;
use std::sync::Arc;

use blitz::{
    auth::{repository::InMemoryAccountRepository, TokenConfig},
    build_router,
    store::InMemoryStore,
    AppState,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const TEST_PASSWORD: &str = "yourpassword123";

/// A registered account with a live access token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub access: String,
    pub refresh: String,
}

pub struct TestSetup {
    pub app: Router,
    pub store: Arc<InMemoryStore>,
    pub users: Vec<TestUser>,
}

pub struct TestSetupBuilder {
    usernames: Vec<String>,
    with_profiles: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            usernames: vec![],
            with_profiles: false,
        }
    }

    pub fn with_users(mut self, usernames: Vec<&str>) -> Self {
        self.usernames = usernames.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_users(self) -> Self {
        self.with_users(vec!["alice", "bob"])
    }

    /// Every user also gets a profile
    pub fn with_profiles(mut self) -> Self {
        self.with_profiles = true;
        self
    }

    pub async fn build(self) -> TestSetup {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(
            store.clone(),
            Arc::new(InMemoryAccountRepository::new()),
            TokenConfig::new("integration-secret".to_string(), 5, 1),
        );

        let mut setup = TestSetup {
            app: build_router(state),
            store,
            users: vec![],
        };

        for username in &self.usernames {
            let user = setup.register_and_login(username).await;
            if self.with_profiles {
                setup.create_profile(&user).await;
            }
            setup.users.push(user);
        }

        setup
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSetup {
    pub fn user(&self, username: &str) -> &TestUser {
        self.users
            .iter()
            .find(|u| u.username == username)
            .unwrap_or_else(|| panic!("no test user named {}", username))
    }
}
