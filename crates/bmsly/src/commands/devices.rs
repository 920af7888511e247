//! Device command handlers.

use tabled::Tabled;

use bmsly_api::{SeriesPoint, Slave};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::config::ApiContext;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct SlaveRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Station")]
    station: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Slave> for SlaveRow {
    fn from(s: &Slave) -> Self {
        Self {
            id: s.id.map(|id| id.to_string()).unwrap_or_default(),
            name: s.name.clone().unwrap_or_default(),
            station: s.station.clone().unwrap_or_default(),
            status: s.status.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "Date")]
    label: String,
    #[tabled(rename = "kWh")]
    value: f64,
}

/// Identifier used for `--output plain` device listings.
pub(crate) fn slave_id(s: &Slave) -> String {
    s.id.map_or_else(|| s.name.clone().unwrap_or_default(), |id| id.to_string())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &ApiContext, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let slaves = ctx.client.slave_list().await.map_err(|e| ctx.map_err(e))?;
            let out = output::render_list(&global.output, &slaves, |s| SlaveRow::from(s), slave_id);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Consumption { slave_id } => {
            let series = ctx
                .client
                .weekly_consumption(slave_id)
                .await
                .map_err(|e| ctx.map_err(e))?;
            let out = output::render_list(
                &global.output,
                &series,
                |p: &SeriesPoint| PointRow {
                    label: p.label.clone(),
                    value: p.value,
                },
                |p| p.value.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
