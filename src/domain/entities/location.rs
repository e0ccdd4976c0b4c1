//! Location entity - a physical address an organization operates from

use serde::{Deserialize, Serialize};

use super::EntityFields;
use crate::domain::value_objects::LocationId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFields {
    pub address: String,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
}

#[cfg(test)]
impl LocationFields {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            longitude: None,
            latitude: None,
        }
    }

    pub fn with_coordinates(mut self, longitude: f64, latitude: f64) -> Self {
        self.longitude = Some(longitude);
        self.latitude = Some(latitude);
        self
    }
}

impl EntityFields for LocationFields {
    type Id = LocationId;
    const ENTITY: &'static str = "Location";
}
