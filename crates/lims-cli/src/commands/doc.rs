use crate::cli::GlobalFlags;
use crate::cli::root_commands::IdArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims doc`.
pub async fn handle(args: &IdArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let doc = ctx.service.raw_document(&ctx.actor, &args.id).await?;
    output(&doc, flags.format)
}
