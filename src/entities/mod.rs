mod calendar_date;
mod coordinates;
mod cost;
mod destination;
mod mission_form;
mod mission_order;
mod numeric;
mod rate_setting;
mod route;
mod unit_location;

pub use calendar_date::CalendarDate;
pub use coordinates::Coordinates;
pub use cost::compute_final_cost;
pub use destination::{Destination, Destinations};
pub use mission_form::{MissionForm, RateStatus, RouteRequest};
pub use mission_order::{MissionDetails, MissionOrder};
pub use rate_setting::{RateSetting, RateSettingParams};
pub use route::{RouteComputation, RouteLeg, RouteSummary};
pub use unit_location::{default_unit, UnitLocation, UnitLocationParams};

pub(crate) use numeric::value_to_f64;
pub(crate) use route::round2;
