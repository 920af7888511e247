// Device (slave) endpoints: inventory, weekly consumption chart data,
// and paginated raw telemetry logs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::client::ApiClient;
use crate::error::Error;
use crate::normalize::{normalize, num_or_zero};

/// A monitored device/meter (Modbus-style "slave").
///
/// Identifiers arrive as numbers on some deployments and numeric
/// strings on others; `lenient_id` accepts both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slave {
    #[serde(default, alias = "slave_id", deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default, alias = "slave_name")]
    pub name: Option<String>,
    #[serde(default, alias = "station_name")]
    pub station: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One point in a consumption series. The value is coerced to a finite
/// float so charts never receive NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Pagination metadata echoed back by the device-logs endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

/// Query parameters for the device-logs endpoint. `limit`/`offset` are
/// passed straight through to the server -- no client-side pagination.
#[derive(Debug, Clone)]
pub struct DeviceLogQuery {
    pub slave_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: u32,
    pub offset: u32,
}

/// One page of raw telemetry records plus pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceLogPage {
    pub records: Vec<Value>,
    pub meta: PageMeta,
}

impl ApiClient {
    /// GET `/admin/slaves/` -- the device inventory. The envelope
    /// varies by deployment; the named array field is `slaves`.
    pub async fn slave_list(&self) -> Result<Vec<Slave>, Error> {
        let body = self.get("admin/slaves/", &[]).await?;
        parse_slaves(&body)
    }

    /// GET `/admin/charts/slave/acte-im-consumption-7days/` -- the
    /// last-7-days consumption series for one device.
    pub async fn weekly_consumption(&self, slave_id: i64) -> Result<Vec<SeriesPoint>, Error> {
        let body = self
            .get(
                "admin/charts/slave/acte-im-consumption-7days/",
                &[("slave_id", slave_id.to_string())],
            )
            .await?;

        let items = normalize(&body, Some("series"))?
            .into_array()
            .ok_or(Error::UnexpectedShape { body })?;

        Ok(items.iter().map(series_point).collect())
    }

    /// GET `/admin/device-logs/` -- paginated raw telemetry for one
    /// device over a time range.
    pub async fn device_logs(&self, query: &DeviceLogQuery) -> Result<DeviceLogPage, Error> {
        let params = [
            ("slave_id", query.slave_id.to_string()),
            ("start_datetime", format_datetime(query.start)),
            ("end_datetime", format_datetime(query.end)),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        let body = self.get("admin/device-logs/", &params).await?;

        let records = normalize(&body, None)?.into_array().unwrap_or_default();
        let meta = body
            .get("meta")
            .and_then(|meta| serde_json::from_value(meta.clone()).ok())
            .unwrap_or_default();

        Ok(DeviceLogPage { records, meta })
    }
}

pub(crate) fn parse_slaves(body: &Value) -> Result<Vec<Slave>, Error> {
    let items = normalize(body, Some("slaves"))?
        .into_array()
        .ok_or_else(|| Error::UnexpectedShape { body: body.clone() })?;

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item.clone()).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: item.to_string(),
            })
        })
        .collect()
}

pub(crate) fn series_point(point: &Value) -> SeriesPoint {
    let label = ["date", "day", "label"]
        .iter()
        .find_map(|key| point.get(*key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    let value = ["value", "consumption", "total"]
        .iter()
        .find_map(|key| point.get(*key))
        .map_or(0.0, num_or_zero);
    SeriesPoint { label, value }
}

pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}
