use lims_db::repos::entity::EntityView;
use serde::Serialize;

use crate::cli::{GlobalFlags, OutputFormat};
use crate::cli::root_commands::EntityArgs;
use crate::context::AppContext;
use crate::output::output;

/// One field per table row.
#[derive(Debug, Serialize)]
struct FieldRow {
    field: &'static str,
    value: String,
}

fn field_rows(view: &EntityView) -> Vec<FieldRow> {
    let mut rows: Vec<FieldRow> = view
        .fields
        .iter()
        .map(|field| FieldRow {
            field: field.field,
            value: field.value.summary(),
        })
        .collect();
    rows.push(FieldRow {
        field: "tags",
        value: view.tags.join(", "),
    });
    rows.push(FieldRow {
        field: "attachments",
        value: view
            .attachments
            .iter()
            .map(|attachment| attachment.filename.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    });
    rows
}

/// Handle `lims get`.
pub async fn handle(args: &EntityArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let view = ctx.service.view(&ctx.actor, args.entity, &args.name).await?;
    match flags.format {
        OutputFormat::Table => output(&field_rows(&view), flags.format),
        OutputFormat::Json | OutputFormat::Raw => output(&view, flags.format),
    }
}
