use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Create(args) => commands::create::handle(&args, ctx, flags).await,
        Commands::Get(args) => commands::get::handle(&args, ctx, flags).await,
        Commands::Update(args) => commands::update::handle(&args, ctx, flags).await,
        Commands::List(args) => commands::list::handle(&args, ctx, flags).await,
        Commands::Log(args) => commands::log::handle(&args, ctx, flags).await,
        Commands::Search(args) => commands::search::handle(&args, ctx, flags).await,
        Commands::Form(args) => commands::form::handle(&args, ctx, flags).await,
        Commands::Attachment { action } => commands::attachment::handle(&action, ctx, flags).await,
        Commands::Sample { action } => commands::sample::handle(&action, ctx, flags).await,
        Commands::Doc(args) => commands::doc::handle(&args, ctx, flags).await,
        Commands::Locate(args) => commands::locate::handle(&args, ctx, flags).await,
        Commands::Schema(args) => commands::schema::check(&args, ctx, flags).await,
        Commands::Init(_) => unreachable!("init is pre-dispatched in main"),
    }
}
