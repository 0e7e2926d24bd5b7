/// API route handlers
///
/// - `health`: Health check endpoint
/// - `shelters`: shelter creation and role lookup
/// - `modules`: module listing, updates and activation
/// - `volunteers`: volunteer enrollment and lookup
/// - `records`: animals, resources and sheltered people
/// - `policy`: the authorization rule of every guarded operation

pub mod health;
pub mod modules;
pub mod policy;
pub mod records;
pub mod shelters;
pub mod volunteers;
