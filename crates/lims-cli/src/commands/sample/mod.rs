mod add;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SampleCommands;
use crate::context::AppContext;

/// Handle `lims sample`.
pub async fn handle(action: &SampleCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        SampleCommands::Add {
            project,
            names,
            json,
        } => add::run(project, names, json.as_deref(), ctx, flags).await,
    }
}
