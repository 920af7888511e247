// bmsly-api: Async Rust client for the Vyntar BMS telemetry API
//
// The interesting part of this crate is the authenticated access layer:
// local JWT expiry decisions, serialized token refresh, a single
// retry-on-401 per request, and envelope normalization across the
// API's inconsistent response shapes. Endpoint modules are thin.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod normalize;
pub mod session;
pub mod token;
pub mod transport;

pub use client::ApiClient;
pub use endpoints::{
    DashboardOverview, DateWiseReport, DeviceLogPage, DeviceLogQuery, MonthWiseReport, PageMeta,
    SeriesPoint, Slave, StationSeries, UserProfile,
};
pub use error::Error;
pub use normalize::{Payload, field_num, normalize, num_or_zero};
pub use session::{FileSessionStore, MemorySessionStore, SessionKey, SessionStore};
pub use token::{TokenManager, TokenPair, decode_exp, is_expired};
pub use transport::TransportConfig;

/// Default API root when no profile or environment override is set.
pub const DEFAULT_BASE_URL: &str = "https://bms.api.v1.vyntar.in/api";
