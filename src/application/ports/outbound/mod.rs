//! Outbound ports - Interfaces that the application requires from external systems

mod repository_port;
mod unit_of_work_port;

pub use repository_port::{RecordRepositoryPort, StoreError, Visibility};
pub use unit_of_work_port::{LinkWork, OrganizationWork, RecordWork, UnitOfWork, UnitOfWorkPort};
