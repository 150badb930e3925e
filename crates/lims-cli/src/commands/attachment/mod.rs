mod delete;
mod get;
mod put;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AttachmentCommands;
use crate::context::AppContext;

/// Handle `lims attachment`.
pub async fn handle(
    action: &AttachmentCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        AttachmentCommands::Get {
            id,
            filename,
            output,
        } => get::run(id, filename, output.as_deref(), ctx).await,
        AttachmentCommands::Put {
            id,
            path,
            filename,
            content_type,
            encoding,
            comment,
        } => {
            put::run(
                id,
                path,
                filename.as_deref(),
                content_type.as_deref(),
                encoding.as_deref(),
                comment.as_deref(),
                ctx,
                flags,
            )
            .await
        }
        AttachmentCommands::Delete {
            id,
            filename,
            comment,
        } => delete::run(id, filename, comment.as_deref(), ctx, flags).await,
    }
}
