//! Temperature command handlers.

use crate::cli::{GlobalOpts, TempArgs, TempCommand};
use crate::config::ApiContext;
use crate::error::CliError;
use crate::output;

use super::devices::{SlaveRow, slave_id};

pub async fn handle(ctx: &ApiContext, args: TempArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        TempCommand::Devices => {
            let slaves = ctx
                .client
                .temperature_slaves()
                .await
                .map_err(|e| ctx.map_err(e))?;
            let out = output::render_list(&global.output, &slaves, |s| SlaveRow::from(s), slave_id);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TempCommand::Analytics {
            slave_id,
            parameters,
            from,
            to,
        } => {
            if to <= from {
                return Err(CliError::Validation {
                    field: "to".into(),
                    reason: "--to must be after --from".into(),
                });
            }

            let records = ctx
                .client
                .temperature_analytics(slave_id, &parameters, from, to)
                .await
                .map_err(|e| ctx.map_err(e))?;

            // Analytics records vary with the requested parameters, so
            // every format falls back to JSON lines.
            let out = output::render_list(
                &global.output,
                &records,
                |r: &serde_json::Value| AnalyticsRow {
                    record: r.to_string(),
                },
                ToString::to_string,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[derive(tabled::Tabled)]
struct AnalyticsRow {
    #[tabled(rename = "Record")]
    record: String,
}
