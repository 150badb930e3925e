use crate::cli::GlobalFlags;
use crate::cli::root_commands::FormArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims form`.
pub async fn handle(args: &FormArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let form = match &args.name {
        Some(name) => {
            ctx.service
                .edit_form(&ctx.actor, args.entity, name, args.field.as_deref())
                .await?
        }
        None => ctx.service.create_form(&ctx.actor, args.entity).await?,
    };
    output(&form, flags.format)
}
