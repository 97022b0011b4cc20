pub mod pagination;
pub mod views;

pub use pagination::{PaginationInfo, PaginationParams};
pub use views::{appointment_view, appointment_views, AppointmentView, IdentityWithStats, PartySummary};
