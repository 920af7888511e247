// Dashboard overview endpoint.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::ApiClient;
use crate::error::Error;
use crate::normalize::{normalize, num_or_zero};

/// Fleet-wide summary for the landing dashboard: device counts, energy
/// consumption, and carbon footprint. All numeric fields are coerced --
/// a missing or garbled value renders as `0`, never NaN.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardOverview {
    pub total_devices: f64,
    pub online_devices: f64,
    pub offline_devices: f64,
    pub energy_consumption_kwh: f64,
    pub carbon_footprint_kg: f64,
    /// The full normalized payload, for views that chart fields we
    /// don't model.
    pub raw: Map<String, Value>,
}

impl ApiClient {
    /// GET `/dashboards/overview/`
    pub async fn dashboard_overview(&self) -> Result<DashboardOverview, Error> {
        let body = self.get("dashboards/overview/", &[]).await?;
        let map = normalize(&body, None)?
            .into_object()
            .ok_or(Error::UnexpectedShape { body })?;

        Ok(DashboardOverview {
            total_devices: pick_num(&map, &["total_devices", "totalDevices", "device_count"]),
            online_devices: pick_num(&map, &["online_devices", "onlineDevices", "online"]),
            offline_devices: pick_num(&map, &["offline_devices", "offlineDevices", "offline"]),
            energy_consumption_kwh: pick_num(
                &map,
                &["energy_consumption", "energyConsumption", "total_consumption"],
            ),
            carbon_footprint_kg: pick_num(&map, &["carbon_footprint", "carbonFootprint"]),
            raw: map,
        })
    }
}

/// First present key wins; the value is numerically coerced.
fn pick_num(map: &Map<String, Value>, keys: &[&str]) -> f64 {
    keys.iter()
        .find_map(|key| map.get(*key))
        .map_or(0.0, num_or_zero)
}
