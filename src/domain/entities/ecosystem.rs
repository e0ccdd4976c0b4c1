//! Ecosystem entity - a community that organizations are members of

use serde::{Deserialize, Serialize};

use super::{EntityFields, Record};
use crate::domain::value_objects::EcosystemId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcosystemFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
impl EcosystemFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

impl EntityFields for EcosystemFields {
    type Id = EcosystemId;
    const ENTITY: &'static str = "Ecosystem";
}

pub type Ecosystem = Record<EcosystemId, EcosystemFields>;
