use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CreateArgs;
use crate::commands::shared::values::request_values;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct CreateResponse {
    id: String,
    name: Option<String>,
    revision: Option<String>,
    url: Option<String>,
}

/// Handle `lims create`.
pub async fn handle(args: &CreateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let doc = ctx
        .service
        .create(&ctx.actor, args.entity, request_values(&args.values))
        .await?;
    let url = doc
        .name()
        .map(|name| ctx.service.site().entity_url(args.entity, name));
    output(
        &CreateResponse {
            id: doc.id.clone(),
            name: doc.name().map(str::to_string),
            revision: doc.revision,
            url,
        },
        flags.format,
    )
}
