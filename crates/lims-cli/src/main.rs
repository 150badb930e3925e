use clap::Parser;

mod bootstrap;
mod cli;
mod commands;
mod context;
mod output;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("lims error: {}", describe(&error));
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();

    match &cli.command {
        cli::Commands::Init(args) => return commands::init::handle(args, &flags).await,
        cli::Commands::Schema(args) if args.check.is_none() => {
            return commands::schema::show(args, &flags);
        }
        _ => {}
    }

    let project_root = bootstrap::resolve_project_root(flags.project.as_deref())?;
    let config = bootstrap::load_config(&project_root)?;
    let ctx = context::AppContext::init(&project_root, config, &flags).await?;

    commands::dispatch::dispatch(cli.command, &ctx, &flags).await
}

/// Error chain, with the status code of a rejected request in front.
fn describe(error: &anyhow::Error) -> String {
    let core = error
        .downcast_ref::<lims_db::error::DatabaseError>()
        .and_then(lims_db::error::DatabaseError::as_core)
        .or_else(|| error.downcast_ref::<lims_core::errors::CoreError>());
    match core {
        Some(core) => format!("[{}] {error:#}", core.status_code()),
        None => format!("{error:#}"),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("LIMS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use lims_core::errors::CoreError;
    use lims_db::error::DatabaseError;

    use super::describe;

    #[test]
    fn rejected_requests_carry_their_status() {
        let error = anyhow::Error::from(DatabaseError::from(CoreError::not_found("sample", "s9")));
        assert!(describe(&error).starts_with("[404] "));

        let error = anyhow::Error::from(CoreError::BadRequest("no".into()));
        assert!(describe(&error).starts_with("[400] "));
    }

    #[test]
    fn other_errors_print_the_chain() {
        let error = anyhow::anyhow!("inner").context("outer");
        assert_eq!(describe(&error), "outer: inner");
    }
}
