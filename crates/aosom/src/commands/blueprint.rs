//! Blueprint subcommand handlers.

use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;

use aosom_api::{Blueprint, Session};

use crate::cli::{BlueprintArgs, BlueprintCommand, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, Serialize, Tabled)]
struct SlotRow {
    #[tabled(rename = "Slot")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
}

#[derive(Debug, Clone, Serialize, Tabled)]
struct LinkRow {
    #[tabled(rename = "Link")]
    name: String,
    #[tabled(rename = "Node")]
    left: String,
    #[tabled(rename = "Interface")]
    left_intf: String,
    #[tabled(rename = "Peer")]
    right: String,
    #[tabled(rename = "Peer interface")]
    right_intf: String,
}

impl LinkRow {
    fn from_flat(row: Vec<String>) -> Self {
        let mut cells = row.into_iter();
        let mut next = || cells.next().unwrap_or_default();
        Self {
            name: next(),
            left: next(),
            left_intf: next(),
            right: next(),
            right_intf: next(),
        }
    }
}

async fn existing(session: &mut Session, name: &str) -> Result<Blueprint, CliError> {
    let bp = session.blueprint(name).await?;
    if bp.exists() {
        Ok(bp)
    } else {
        Err(CliError::item_not_found("Blueprints", name))
    }
}

pub async fn handle(
    session: &mut Session,
    args: BlueprintArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match args.command {
        BlueprintCommand::Ready { name, timeout_ms } => {
            let bp = existing(session, &name).await?;
            if !bp.await_build_ready(Duration::from_millis(timeout_ms)).await {
                return Err(CliError::NotReady {
                    what: format!("Blueprint '{name}'"),
                    millis: timeout_ms,
                });
            }
            output::print_output(&output::status("ready", true, color), global.quiet);
            Ok(())
        }

        BlueprintCommand::Errors { name } => {
            let bp = existing(session, &name).await?;
            match bp.build_errors().await? {
                Some(errors) => {
                    let out = output::render_single(
                        global.format(),
                        &errors,
                        output::render_json_pretty,
                        |_| output::status("errors", false, color),
                    );
                    output::print_output(&out, global.quiet);
                }
                None => output::print_output(&output::status("no build errors", true, color), global.quiet),
            }
            Ok(())
        }

        BlueprintCommand::Slots { name } => {
            let bp = existing(session, &name).await?;
            let params = bp.params().await?;
            let rows: Vec<SlotRow> = params
                .iter()
                .map(|slot| SlotRow {
                    name: slot.name().to_owned(),
                    kind: util::text_of(slot.info(), "type"),
                })
                .collect();

            let out = output::render_list(global.format(), &rows, SlotRow::clone, |r| r.name.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BlueprintCommand::Cabling { name } => {
            let bp = existing(session, &name).await?;
            let rows: Vec<LinkRow> = bp
                .cabling()
                .await?
                .flat_list()?
                .into_iter()
                .map(LinkRow::from_flat)
                .collect();

            let out = output::render_list(global.format(), &rows, LinkRow::clone, |r| r.name.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
