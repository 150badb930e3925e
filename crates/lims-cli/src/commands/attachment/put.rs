use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::shared::upload::read_upload;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct AttachmentResponse {
    filename: String,
    url: String,
    revision: Option<String>,
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    id: &str,
    path: &str,
    filename: Option<&str>,
    content_type: Option<&str>,
    encoding: Option<&str>,
    comment: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let upload = read_upload(path, filename, content_type, encoding)?;
    let location = ctx.service.locate(&ctx.actor, id).await?;
    let (doc, _) = ctx
        .service
        .attachment_put(&ctx.actor, location.entity, &location.name, &upload, comment)
        .await?;
    output(
        &AttachmentResponse {
            url: ctx
                .service
                .site()
                .attachment_url(location.entity, &location.name, &upload.filename),
            filename: upload.filename,
            revision: doc.revision,
        },
        flags.format,
    )
}
