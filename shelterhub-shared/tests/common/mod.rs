//! Shared fixtures for the in-memory integration tests
//!
//! - A fresh `InMemoryTenantStore` per test
//! - A provisioned shelter with its owner
//! - Helpers to add admins, volunteers and unrelated users

#![allow(dead_code)]

use shelterhub_shared::models::shelter::Shelter;
use shelterhub_shared::models::shelter_module::{ModuleKey, ShelterModule};
use shelterhub_shared::models::user::{CreateUser, User};
use shelterhub_shared::models::user_shelter::{CreateUserShelter, ShelterRole};
use shelterhub_shared::models::volunteer::Volunteer;
use shelterhub_shared::modules::provisioning::{create_shelter, enroll_volunteer, NewShelter};
use shelterhub_shared::store::{InMemoryTenantStore, TenantStore};
use uuid::Uuid;

pub struct Fixture {
    pub store: InMemoryTenantStore,
    pub owner: User,
    pub shelter: Shelter,
    pub modules: Vec<ShelterModule>,
}

impl Fixture {
    /// Creates a store with one owner and one provisioned shelter
    pub async fn new() -> Self {
        let store = InMemoryTenantStore::new();
        let owner = create_user(&store, "owner").await;
        let provisioned = create_shelter(
            &store,
            owner.id,
            NewShelter {
                name: "Riverside Shelter".to_string(),
            },
        )
        .await
        .expect("create shelter");

        Self {
            store,
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

    /// A user enrolled as volunteer of this shelter
    pub async fn volunteer(&self, label: &str) -> (User, Volunteer) {
        let user = create_user(&self.store, label).await;
        let volunteer = enroll_volunteer(&self.store, self.shelter.id, user.id)
            .await
            .expect("enroll volunteer");
        (user, volunteer)
    }

    /// A user holding the admin role in this shelter
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
            &self.store,
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

    pub async fn associated(&self, key: ModuleKey) -> Vec<Uuid> {
        self.store
            .list_module_volunteer_ids(self.module(key).id)
            .await
            .expect("list associations")
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
