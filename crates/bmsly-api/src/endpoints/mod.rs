// Feature endpoint modules, implemented as inherent methods on
// `ApiClient`. Each call issues one HTTP request through the
// authenticated pipeline, normalizes the envelope, and returns a typed
// payload -- no caching, no batching, pagination passed straight
// through to the server.

pub mod auth;
pub mod dashboard;
pub mod devices;
pub mod reports;
pub mod temperature;

pub use auth::UserProfile;
pub use dashboard::DashboardOverview;
pub use devices::{DeviceLogPage, DeviceLogQuery, PageMeta, SeriesPoint, Slave};
pub use reports::{DateWiseReport, MonthWiseReport, StationSeries};
