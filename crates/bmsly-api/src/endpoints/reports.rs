// Reporting endpoints: date-wise and month-wise aggregates, keyed by
// station name. Values are numerically coerced on the way out.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::Error;
use crate::normalize::{Payload, normalize, num_or_zero};

/// Report families available per-day within a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWiseReport {
    Consumption,
    Reading,
    ConsumptionCost,
}

impl DateWiseReport {
    fn path(self) -> &'static str {
        match self {
            Self::Consumption => "reports/date-wise/consumption",
            Self::Reading => "reports/date-wise/reading",
            Self::ConsumptionCost => "reports/date-wise/consumption-cost",
        }
    }
}

/// Report families available per-month within a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthWiseReport {
    Consumption,
    ConsumptionCost,
}

impl MonthWiseReport {
    fn path(self) -> &'static str {
        match self {
            Self::Consumption => "reports/month-wise/consumption",
            Self::ConsumptionCost => "reports/month-wise/consumption-cost",
        }
    }
}

/// Aggregates keyed by station name; one coerced value per bucket
/// (day or month).
pub type StationSeries = BTreeMap<String, Vec<f64>>;

impl ApiClient {
    /// GET `/reports/date-wise/{consumption|reading|consumption-cost}`
    pub async fn date_wise_report(
        &self,
        kind: DateWiseReport,
        month: u32,
        year: i32,
    ) -> Result<StationSeries, Error> {
        let params = [("month", month.to_string()), ("year", year.to_string())];
        let body = self.get(kind.path(), &params).await?;
        station_series(&body)
    }

    /// GET `/reports/month-wise/{consumption|consumption-cost}`
    pub async fn month_wise_report(
        &self,
        kind: MonthWiseReport,
        year: i32,
    ) -> Result<StationSeries, Error> {
        let params = [("year", year.to_string())];
        let body = self.get(kind.path(), &params).await?;
        station_series(&body)
    }
}

/// Fold a report payload into per-station value series.
///
/// Object payloads map station -> values directly; array payloads are
/// lists of records carrying a station field.
pub(crate) fn station_series(body: &Value) -> Result<StationSeries, Error> {
    match normalize(body, None)? {
        Payload::Object(map) => Ok(map
            .into_iter()
            .map(|(station, values)| (station, coerce_values(&values)))
            .collect()),
        Payload::Array(records) => {
            let mut series = StationSeries::new();
            for record in &records {
                let station = ["station", "station_name", "name"]
                    .iter()
                    .find_map(|key| record.get(*key))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_owned();
                let values = ["values", "data", "value", "consumption", "cost", "reading"]
                    .iter()
                    .find_map(|key| record.get(*key))
                    .map_or_else(Vec::new, |v| coerce_values(v));
                series.entry(station).or_default().extend(values);
            }
            Ok(series)
        }
    }
}

fn coerce_values(value: &Value) -> Vec<f64> {
    match value {
        Value::Array(items) => items.iter().map(num_or_zero).collect(),
        other => vec![num_or_zero(other)],
    }
}
