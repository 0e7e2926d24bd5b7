//! Common test utilities for the API tests
//!
//! - An in-memory store with one provisioned shelter and its owner
//! - JWT token generation
//! - Request builders and response helpers

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use serde_json::Value;
use shelterhub_api::app::{build_router, AppState};
use shelterhub_api::config::Config;
use shelterhub_shared::auth::jwt::{create_token, Claims, TokenType};
use shelterhub_shared::models::shelter::Shelter;
use shelterhub_shared::models::shelter_module::{ModuleKey, ShelterModule};
use shelterhub_shared::models::user::{CreateUser, User};
use shelterhub_shared::models::user_shelter::{CreateUserShelter, ShelterRole};
use shelterhub_shared::models::volunteer::Volunteer;
use shelterhub_shared::modules::provisioning::{create_shelter, enroll_volunteer, NewShelter};
use shelterhub_shared::store::{InMemoryTenantStore, TenantStore};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "api-test-secret-at-least-32-bytes-long";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<InMemoryTenantStore>,
    pub state: AppState,
    pub app: axum::Router,
    pub owner: User,
    pub shelter: Shelter,
    pub modules: Vec<ShelterModule>,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryTenantStore::new());
        let owner = create_user(&store, "owner").await;
        let provisioned = create_shelter(
            store.as_ref(),
            owner.id,
            NewShelter {
                name: "Riverside Shelter".to_string(),
            },
        )
        .await
        .expect("create shelter");

        let state = AppState::new(store.clone(), Config::for_testing(JWT_SECRET));
        let app = build_router(state.clone());

        Self {
            store,
            state,
            app,
            owner,
            shelter: provisioned.shelter,
            modules: provisioned.modules,
        }
    }

    pub fn module(&self, key: ModuleKey) -> &ShelterModule {
        self.modules
            .iter()
            .find(|m| m.module_key == key.as_str())
            .expect("module provisioned")
    }

    pub async fn volunteer(&self, label: &str) -> (User, Volunteer) {
        let user = create_user(&self.store, label).await;
        let volunteer = enroll_volunteer(self.store.as_ref(), self.shelter.id, user.id)
            .await
            .expect("enroll volunteer");
        (user, volunteer)
    }

    pub async fn admin(&self, label: &str) -> User {
        let user = create_user(&self.store, label).await;
        self.store
            .create_user_shelter(CreateUserShelter {
                user_id: user.id,
                shelter_id: self.shelter.id,
                role: ShelterRole::Admin,
            })
            .await
            .expect("admin role");
        user
    }

    /// A second shelter with its own owner
    pub async fn other_shelter(&self) -> Shelter {
        let owner = create_user(&self.store, "other-owner").await;
        create_shelter(
            self.store.as_ref(),
            owner.id,
            NewShelter {
                name: "Hillside Shelter".to_string(),
            },
        )
        .await
        .expect("create other shelter")
        .shelter
    }

    pub async fn stranger(&self) -> User {
        create_user(&self.store, "stranger").await
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.expect("router call")
    }
}

pub async fn create_user(store: &InMemoryTenantStore, label: &str) -> User {
    store
        .create_user(CreateUser {
            email: format!("{}-{}@example.com", label, Uuid::new_v4()),
            name: label.to_string(),
        })
        .await
        .expect("create user")
}

pub fn token_for(user: &User) -> String {
    create_token(&Claims::new(user.id, TokenType::Access), JWT_SECRET).expect("create token")
}

/// Request with an optional bearer token for `user`
pub fn request(method: Method, uri: &str, user: Option<&User>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)));
    }
    builder
}

pub fn json_request(method: Method, uri: &str, user: Option<&User>, body: Value) -> Request<Body> {
    request(method, uri, user)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn empty_request(method: Method, uri: &str, user: Option<&User>) -> Request<Body> {
    request(method, uri, user)
        .body(Body::empty())
        .expect("build request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
