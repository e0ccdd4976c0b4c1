//! Value objects - Immutable objects defined by their attributes

mod admission;
mod ids;
mod link_status;

pub use admission::Admission;
pub use ids::*;
pub use link_status::LinkStatus;
