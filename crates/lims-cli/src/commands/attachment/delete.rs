use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DeleteResponse<'a> {
    deleted: &'a str,
    revision: Option<String>,
}

pub async fn run(
    id: &str,
    filename: &str,
    comment: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let location = ctx.service.locate(&ctx.actor, id).await?;
    let (doc, _) = ctx
        .service
        .attachment_delete(&ctx.actor, location.entity, &location.name, filename, comment)
        .await?;
    output(
        &DeleteResponse {
            deleted: filename,
            revision: doc.revision,
        },
        flags.format,
    )
}
