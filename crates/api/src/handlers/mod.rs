//! HTTP request handlers, grouped by resource.

pub mod equipment;
pub mod plans;
pub mod running_hours;
pub mod vessels;
pub mod work_orders;
