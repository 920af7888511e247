//! Report command handlers: date-wise and month-wise station reports.

use tabled::Tabled;

use bmsly_api::{DateWiseReport, MonthWiseReport};

use crate::cli::{DateWiseKind, GlobalOpts, MonthWiseKind, ReportsArgs, ReportsCommand};
use crate::config::ApiContext;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StationRow {
    #[tabled(rename = "Station")]
    station: String,
    #[tabled(rename = "Buckets")]
    buckets: usize,
    #[tabled(rename = "Total")]
    total: f64,
    #[tabled(rename = "Values")]
    values: String,
}

fn station_row((station, values): &(String, Vec<f64>)) -> StationRow {
    StationRow {
        station: station.clone(),
        buckets: values.len(),
        total: values.iter().sum(),
        values: values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &ApiContext, args: ReportsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let series = match args.command {
        ReportsCommand::DateWise { kind, month, year } => {
            if !(1..=12).contains(&month) {
                return Err(CliError::Validation {
                    field: "month".into(),
                    reason: "must be between 1 and 12".into(),
                });
            }
            ctx.client
                .date_wise_report(date_wise_kind(kind), month, year)
                .await
                .map_err(|e| ctx.map_err(e))?
        }

        ReportsCommand::MonthWise { kind, year } => ctx
            .client
            .month_wise_report(month_wise_kind(kind), year)
            .await
            .map_err(|e| ctx.map_err(e))?,
    };

    let rows: Vec<(String, Vec<f64>)> = series.into_iter().collect();
    let out = output::render_list(&global.output, &rows, station_row, |(station, _)| {
        station.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

fn date_wise_kind(kind: DateWiseKind) -> DateWiseReport {
    match kind {
        DateWiseKind::Consumption => DateWiseReport::Consumption,
        DateWiseKind::Reading => DateWiseReport::Reading,
        DateWiseKind::ConsumptionCost => DateWiseReport::ConsumptionCost,
    }
}

fn month_wise_kind(kind: MonthWiseKind) -> MonthWiseReport {
    match kind {
        MonthWiseKind::Consumption => MonthWiseReport::Consumption,
        MonthWiseKind::ConsumptionCost => MonthWiseReport::ConsumptionCost,
    }
}
