//! Event and Project entities - dated activities run by organizations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{EntityFields, Record};
use crate::domain::value_objects::{Admission, EventId, ProjectId};

/// A one-off gathering (meetup, hackathon, demo day)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub free_or_paid: Option<Admission>,
}

#[cfg(test)]
impl EventFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            start_date: None,
            end_date: None,
            free_or_paid: None,
        }
    }

    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_admission(mut self, admission: Admission) -> Self {
        self.free_or_paid = Some(admission);
        self
    }
}

impl EntityFields for EventFields {
    type Id = EventId;
    const ENTITY: &'static str = "Event";
}

pub type Event = Record<EventId, EventFields>;

/// A longer running undertaking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFields {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
impl ProjectFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl EntityFields for ProjectFields {
    type Id = ProjectId;
    const ENTITY: &'static str = "Project";
}

pub type Project = Record<ProjectId, ProjectFields>;
