use lims_schema::SchemaRegistry;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct SchemaListResponse {
    schemas: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct SchemaCheckResponse {
    id: String,
    schemas: Vec<&'static str>,
    valid: bool,
}

/// Handle `lims schema [NAME]`; needs no store.
pub fn show(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let registry = SchemaRegistry::new();
    match &args.name {
        Some(name) => {
            let schema = registry.get(name).ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown schema '{name}' (known: {})",
                    registry.list().join(", ")
                )
            })?;
            output(schema, flags.format)
        }
        None => output(
            &SchemaListResponse {
                schemas: registry.list(),
            },
            flags.format,
        ),
    }
}

/// Handle `lims schema --check ID`.
pub async fn check(args: &SchemaArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let Some(id) = &args.check else {
        return show(args, flags);
    };
    let doc = ctx.service.raw_document(&ctx.actor, id).await?;
    ctx.service.schema().validate_document(&doc)?;
    output(
        &SchemaCheckResponse {
            id: doc.id,
            schemas: vec!["document", doc.entity.as_str()],
            valid: true,
        },
        flags.format,
    )
}
