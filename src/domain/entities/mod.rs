//! Domain entities - Plain records with identity, no behaviour

mod activity;
mod classification;
mod ecosystem;
mod location;
mod organization;
mod record;

pub use activity::{Event, EventFields, Project, ProjectFields};
pub use classification::{RoleFields, SectorFields, StageFields};
pub use ecosystem::{Ecosystem, EcosystemFields};
pub use location::LocationFields;
pub use organization::{Organization, OrganizationFields};
pub use record::{EntityFields, LinkInfo, Linked, Record};
