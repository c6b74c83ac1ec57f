use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gazette::app::AppContext;
use gazette::cli::commands::{self, CollectOverrides};
use gazette::cli::{Cli, Commands};
use gazette::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout may carry the page.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Collect {
            output,
            window,
            channels,
            dump_dir,
        } => {
            CollectOverrides {
                window,
                channels,
                dump_dir,
            }
            .apply(&mut config);
            let ctx = AppContext::new(config)?;
            commands::collect(&ctx, output.as_deref()).await?;
        }
        Commands::Resolve { handle } => {
            let ctx = AppContext::new(config)?;
            commands::resolve(&ctx, &handle).await?;
        }
    }

    Ok(())
}
