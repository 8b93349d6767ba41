//! `resources`: the registry table. Needs no server.

use serde::Serialize;
use tabled::Tabled;

use aosom_api::ResourceKind;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, Serialize, Tabled)]
struct ResourceRow {
    #[tabled(rename = "Resource")]
    name: String,
    #[tabled(rename = "Path")]
    uri: String,
    #[tabled(rename = "Name field")]
    display_name: String,
    #[tabled(rename = "ID field")]
    unique_id: String,
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let rows: Vec<ResourceRow> = ResourceKind::all()
        .map(|kind| {
            let spec = kind.spec();
            ResourceRow {
                name: kind.to_string(),
                uri: spec.uri,
                display_name: spec.display_name,
                unique_id: spec.unique_id,
            }
        })
        .collect();

    let out = output::render_list(global.format(), &rows, ResourceRow::clone, |r| {
        r.name.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
