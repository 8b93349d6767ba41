//! Device subcommand handlers.

use aosom_api::Session;

use crate::cli::{DeviceArgs, DeviceCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(session: &mut Session, args: DeviceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DeviceCommand::Approve { device_key, location } => {
            let device = session.device(&device_key).await?;
            if !device.item().exists() {
                return Err(CliError::item_not_found("Devices", &device_key));
            }

            let pool = session.approved_pool()?;
            let color = output::should_color(global.color);
            let line = if device.approve(location.as_deref(), &pool).await? {
                output::status(&format!("{device_key} approved"), true, color)
            } else {
                let state = device.state().unwrap_or("unknown");
                output::status(&format!("{device_key} not quarantined ({state}), left as is"), false, color)
            };
            output::print_output(&line, global.quiet);
            Ok(())
        }
    }
}
