//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod equipment_repo;
pub mod maintenance_plan_repo;
pub mod running_hours_repo;
pub mod vessel_repo;
pub mod work_order_repo;

pub use equipment_repo::EquipmentRepo;
pub use maintenance_plan_repo::MaintenancePlanRepo;
pub use running_hours_repo::RunningHoursRepo;
pub use vessel_repo::VesselRepo;
pub use work_order_repo::WorkOrderRepo;
