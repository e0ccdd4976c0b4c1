//! Stage, Sector and Role - lookup entities used to classify organizations

use serde::{Deserialize, Serialize};

use super::EntityFields;
use crate::domain::value_objects::{RoleId, SectorId, StageId};

/// Growth stage (idea, early, growth, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl EntityFields for StageFields {
    type Id = StageId;
    const ENTITY: &'static str = "Stage";
}

/// Industry sector. The organization-specific description lives on the link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl EntityFields for SectorFields {
    type Id = SectorId;
    const ENTITY: &'static str = "Sector";
}

/// Part an organization plays in the ecosystem (funder, incubator, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl EntityFields for RoleFields {
    type Id = RoleId;
    const ENTITY: &'static str = "Role";
}

macro_rules! named {
    ($fields:ident) => {
        #[cfg(test)]
        impl $fields {
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    name: name.into(),
                    description: None,
                }
            }
        }
    };
}

named!(StageFields);
named!(SectorFields);
named!(RoleFields);
