pub mod mission_forms;
pub mod mission_orders;
pub mod rate_settings;
pub mod unit_locations;
