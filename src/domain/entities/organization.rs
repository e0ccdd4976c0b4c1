//! Organization entity - the hub every association hangs off

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{EntityFields, Record};
use crate::domain::value_objects::OrganizationId;

/// Attributes of an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationFields {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    /// Who the organization serves (e.g. "students", "smallholder farmers")
    #[serde(default)]
    pub target_group: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date_founded: Option<NaiveDate>,
    #[serde(default)]
    pub date_registered: Option<NaiveDate>,
    /// Tax identification number
    #[serde(default)]
    pub tin_number: Option<String>,
}

#[cfg(test)]
impl OrganizationFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: None,
            target_group: None,
            description: None,
            date_founded: None,
            date_registered: None,
            tin_number: None,
        }
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn with_date_founded(mut self, date: NaiveDate) -> Self {
        self.date_founded = Some(date);
        self
    }
}

impl EntityFields for OrganizationFields {
    type Id = OrganizationId;
    const ENTITY: &'static str = "Organization";
}

pub type Organization = Record<OrganizationId, OrganizationFields>;
