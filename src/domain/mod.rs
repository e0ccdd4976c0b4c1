//! Domain layer - Core records with no infrastructure dependencies
//!
//! This layer contains:
//! - Entities: Organization, Location, Ecosystem, Event, Project, Stage, Sector, Role
//! - Value Objects: typed identifiers, event admission, ecosystem link status

pub mod entities;
pub mod value_objects;
