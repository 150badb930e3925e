use lims_db::repos::entity::UpdateRequest;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::UpdateArgs;
use crate::commands::shared::upload::read_upload;
use crate::commands::shared::values::request_values;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct UpdateResponse {
    id: String,
    revision: Option<String>,
    /// Action of each committed step, in order.
    steps: Vec<String>,
}

/// Handle `lims update`.
pub async fn handle(args: &UpdateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut request = UpdateRequest::new(request_values(&args.values));
    if let Some(revision) = &args.revision {
        request = request.at_revision(revision);
    }
    if let Some(path) = &args.attach {
        request = request.with_upload(read_upload(path, None, args.content_type.as_deref(), None)?);
    }

    let outcome = ctx
        .service
        .update(&ctx.actor, args.entity, &args.name, request)
        .await?;
    if outcome.log.is_empty() {
        tracing::info!(entity = %args.entity, name = %args.name, "nothing to change");
    }
    output(
        &UpdateResponse {
            id: outcome.document.id,
            revision: outcome.document.revision,
            steps: outcome.log.into_iter().map(|record| record.action).collect(),
        },
        flags.format,
    )
}
