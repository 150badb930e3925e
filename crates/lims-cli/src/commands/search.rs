use lims_db::repos::search::SearchHit;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SearchArgs;
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
}

/// Handle `lims search`.
pub async fn handle(args: &SearchArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut hits = ctx.service.search(&ctx.actor, &args.key).await?;
    hits.truncate(effective_limit(flags.limit, ctx.config.general.default_limit));
    output(&SearchResponse { hits }, flags.format)
}
