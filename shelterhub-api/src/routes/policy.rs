/// Route authorization table
///
/// Every guarded operation the API exposes is listed here with its access
/// rule. The router looks the rule up when it mounts a handler, so the full
/// policy can be read (and tested) in one place.

use shelterhub_shared::auth::gate::RouteRequirement;
use shelterhub_shared::models::record::RecordFamily;
use shelterhub_shared::models::shelter_module::ModuleKey;

/// How a route is guarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Module capability check through the gate
    Module(RouteRequirement),

    /// Owners and admins of the shelter only
    ShelterAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListModules,
    GetModule,
    UpdateModule,
    ToggleModule,
    EnrollVolunteer,
    GetVolunteer,
    ListRecords(RecordFamily),
    GetRecord(RecordFamily),
    CreateRecord(RecordFamily),
    DeleteRecord(RecordFamily),
}

impl Operation {
    pub fn access(&self) -> Access {
        match self {
            Operation::ListModules | Operation::GetModule => Access::Module(RouteRequirement::read()),
            Operation::UpdateModule => Access::Module(RouteRequirement::manage()),
            Operation::ToggleModule => Access::ShelterAdmin,
            Operation::EnrollVolunteer => {
                Access::Module(RouteRequirement::write().in_module(ModuleKey::Volunteers))
            }
            Operation::GetVolunteer => {
                Access::Module(RouteRequirement::read().in_module(ModuleKey::Volunteers))
            }
            Operation::ListRecords(family) | Operation::GetRecord(family) => {
                Access::Module(RouteRequirement::read().in_module(family.module_key()))
            }
            Operation::CreateRecord(family) | Operation::DeleteRecord(family) => {
                Access::Module(RouteRequirement::write().in_module(family.module_key()))
            }
        }
    }
}
