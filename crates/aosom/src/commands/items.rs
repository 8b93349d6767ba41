//! Collection commands: list, show, create, delete, export.

use serde_json::Value;
use tabled::Tabled;

use aosom_api::{Record, ResourceSpec, Session};

use crate::cli::{CreateArgs, ExportArgs, GlobalOpts, ItemArgs, ListArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl ItemRow {
    fn from_record(record: &Record, spec: &ResourceSpec) -> Self {
        Self {
            name: util::text_of(record, &spec.display_name),
            id: util::text_of(record, &spec.unique_id),
        }
    }
}

pub async fn list(session: &mut Session, args: ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let collection = session.resource(&args.resource)?;
    let spec = collection.spec().clone();
    let records = collection.cache().await?.records().to_vec();

    let out = output::render_list(
        global.format(),
        &records,
        |r| ItemRow::from_record(r, &spec),
        |r| util::text_of(r, &spec.display_name),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn show(session: &mut Session, args: ItemArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut item = session.resource(&args.resource)?.get(&args.name).await?;
    if !item.exists() {
        return Err(CliError::item_not_found(&args.resource, &args.name));
    }
    item.read().await?;

    let out = output::render_single(
        global.format(),
        item.value(),
        |_| item.to_string(),
        |_| item.id().unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn create(
    session: &mut Session,
    args: CreateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut value = util::read_json_record(&args.from_file)?;

    let collection = session.resource(&args.resource)?;
    let name_field = collection.spec().display_name.clone();
    value
        .entry(name_field)
        .or_insert_with(|| Value::String(args.name.clone()));

    let mut item = collection.get(&args.name).await?;
    item.create(value).await?;

    if !global.quiet {
        eprintln!(
            "✓ Created {} '{}' (id {})",
            args.resource,
            args.name,
            item.id().unwrap_or_default()
        );
    }
    Ok(())
}

pub async fn delete(session: &mut Session, args: ItemArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut item = session.resource(&args.resource)?.get(&args.name).await?;
    if !item.exists() {
        return Err(CliError::item_not_found(&args.resource, &args.name));
    }

    let prompt = format!("Delete {} '{}'?", args.resource, args.name);
    if !util::confirm(&prompt, "delete", global.yes)? {
        return Ok(());
    }

    item.delete().await?;
    if !global.quiet {
        eprintln!("✓ Deleted {} '{}'", args.resource, args.name);
    }
    Ok(())
}

pub async fn export(
    session: &mut Session,
    args: ExportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut item = session.resource(&args.resource)?.get(&args.name).await?;
    if !item.exists() {
        return Err(CliError::item_not_found(&args.resource, &args.name));
    }
    item.read().await?;

    let path = item.jsonfile_save(args.dir.as_deref(), args.filename.as_deref(), args.indent)?;
    output::print_output(&path.display().to_string(), global.quiet);
    Ok(())
}
