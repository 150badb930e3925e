use lims_db::repos::entity::ListItem;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ListArgs;
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ListResponse {
    items: Vec<ListItem>,
}

/// Handle `lims list`.
pub async fn handle(args: &ListArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let limit = effective_limit(flags.limit, ctx.config.general.default_limit);
    let items = ctx
        .service
        .list(&ctx.actor, args.entity, args.operator.as_deref(), limit)
        .await?;
    output(&ListResponse { items }, flags.format)
}
