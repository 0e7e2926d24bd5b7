/// Database models for ShelterHub
///
/// Each model owns its table and exposes static CRUD functions over a
/// `PgPool`. Higher layers go through the `store::TenantStore` trait rather
/// than calling these directly.
///
/// # Models
///
/// - `user`: User identities
/// - `shelter`: Shelters (tenants)
/// - `user_shelter`: Per-shelter roles (owner/admin/volunteer)
/// - `volunteer`: Volunteer membership of a shelter
/// - `shelter_module`: Named functional areas of a shelter
/// - `module_volunteer`: Volunteer associations with modules
/// - `record`: Animals, resources and sheltered people
///
/// # Example
///
/// ```no_run
/// use shelterhub_shared::models::shelter::{Shelter, CreateShelter};
/// use shelterhub_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let shelter = Shelter::create(&pool, CreateShelter {
///     name: "Abrigo Central".to_string(),
///     owner_id,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod module_volunteer;
pub mod record;
pub mod shelter;
pub mod shelter_module;
pub mod user;
pub mod user_shelter;
pub mod volunteer;
