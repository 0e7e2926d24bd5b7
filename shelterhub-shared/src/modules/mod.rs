/// Shelter module management
///
/// - `coordinator`: module reads, updates, activation toggle and the
///   responsibility invariant
/// - `provisioning`: shelter creation defaults and volunteer enrollment
/// - `repair`: operator procedures for drifted data

pub mod coordinator;
pub mod provisioning;
pub mod repair;
