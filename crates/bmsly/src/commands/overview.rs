//! Dashboard overview command handler.

use crate::cli::GlobalOpts;
use crate::config::ApiContext;
use crate::error::CliError;
use crate::output;

pub async fn handle(ctx: &ApiContext, global: &GlobalOpts) -> Result<(), CliError> {
    let overview = ctx
        .client
        .dashboard_overview()
        .await
        .map_err(|e| ctx.map_err(e))?;

    let out = output::render_single(
        &global.output,
        &overview,
        |o| {
            [
                format!("Devices:          {} total", o.total_devices),
                format!("  online:         {}", o.online_devices),
                format!("  offline:        {}", o.offline_devices),
                format!("Consumption:      {} kWh", o.energy_consumption_kwh),
                format!("Carbon footprint: {} kg", o.carbon_footprint_kg),
            ]
            .join("\n")
        },
        |o| o.energy_consumption_kwh.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
