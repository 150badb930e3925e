use std::io::Write;

use anyhow::Context;

use crate::context::AppContext;

/// Write the attachment content to `output`, or to stdout.
pub async fn run(
    id: &str,
    filename: &str,
    output: Option<&str>,
    ctx: &AppContext,
) -> anyhow::Result<()> {
    let location = ctx.service.locate(&ctx.actor, id).await?;
    let attachment = ctx
        .service
        .attachment_get(&ctx.actor, location.entity, &location.name, filename)
        .await?;
    match output {
        Some(path) => std::fs::write(path, &attachment.content)
            .with_context(|| format!("failed to write {path}"))?,
        None => std::io::stdout()
            .write_all(&attachment.content)
            .context("failed to write attachment to stdout")?,
    }
    tracing::debug!(
        filename = %attachment.filename,
        content_type = %attachment.content_type,
        bytes = attachment.content.len(),
        "attachment written"
    );
    Ok(())
}
