// Temperature-domain endpoints. Same access layer, different feature
// area -- the temperature app has its own device inventory and a
// multi-parameter analytics series.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::client::ApiClient;
use crate::endpoints::devices::{Slave, format_datetime, parse_slaves};
use crate::error::Error;
use crate::normalize::normalize;

impl ApiClient {
    /// GET `/applications/temperature/slaves/`
    pub async fn temperature_slaves(&self) -> Result<Vec<Slave>, Error> {
        let body = self.get("applications/temperature/slaves/", &[]).await?;
        parse_slaves(&body)
    }

    /// GET `/applications/temperature/analytics/`
    ///
    /// `parameters` selects which sensor channels to include and is
    /// sent comma-joined. Records are returned raw -- the set of fields
    /// depends on the requested parameters.
    pub async fn temperature_analytics(
        &self,
        slave_id: i64,
        parameters: &[String],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Value>, Error> {
        let params = [
            ("slave_id", slave_id.to_string()),
            ("parameters", parameters.join(",")),
            ("from_datetime", format_datetime(from)),
            ("to_datetime", format_datetime(to)),
        ];
        let body = self
            .get("applications/temperature/analytics/", &params)
            .await?;

        normalize(&body, Some("series"))?
            .into_array()
            .ok_or(Error::UnexpectedShape { body })
    }
}
