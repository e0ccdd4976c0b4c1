//! Application services - Use case implementations
//!
//! The organization service owns the transactional aggregate writes; every
//! other entity goes through the generic record service.

mod organization_service;
mod record_service;
mod service_error;

pub use organization_service::{
    CreateOrganizationRequest, OrganizationLink, OrganizationService, OrganizationServiceImpl,
};
pub use record_service::RecordService;
pub use service_error::ServiceError;
