//! Device log command handler.

use tabled::Tabled;

use bmsly_api::DeviceLogQuery;

use crate::cli::{GlobalOpts, LogsArgs};
use crate::config::ApiContext;
use crate::error::CliError;
use crate::output;

// Log records are deployment-specific, so the table view shows each
// record as compact JSON rather than guessing at columns.
#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Record")]
    record: String,
}

pub async fn handle(ctx: &ApiContext, args: LogsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.end <= args.start {
        return Err(CliError::Validation {
            field: "end".into(),
            reason: "--end must be after --start".into(),
        });
    }

    let page = ctx
        .client
        .device_logs(&DeviceLogQuery {
            slave_id: args.slave_id,
            start: args.start,
            end: args.end,
            limit: args.limit,
            offset: args.offset,
        })
        .await
        .map_err(|e| ctx.map_err(e))?;

    let indexed: Vec<(usize, serde_json::Value)> = page
        .records
        .iter()
        .enumerate()
        .map(|(i, r)| (args.offset as usize + i, r.clone()))
        .collect();

    let out = output::render_list(
        &global.output,
        &indexed,
        |(index, record)| RecordRow {
            index: *index,
            record: record.to_string(),
        },
        |(_, record)| record.to_string(),
    );
    output::print_output(&out, global.quiet);

    if !global.quiet {
        if let Some(total) = page.meta.total {
            eprintln!(
                "{} of {total} records (offset {})",
                page.records.len(),
                args.offset
            );
        }
    }
    Ok(())
}
