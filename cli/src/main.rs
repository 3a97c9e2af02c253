use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod util;

#[derive(Parser)]
#[command(
    name = "brick",
    version,
    about = "Brick CLI: talk to the action server or run actions locally"
)]
struct Cli {
    /// Action server base URL
    #[arg(long, env = "BRICK_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health {
        /// Skip pretty-printing (raw JSON for piping)
        #[arg(long)]
        raw: bool,
    },
    /// List the actions the server can run
    Actions {
        /// Skip pretty-printing (raw JSON for piping)
        #[arg(long)]
        raw: bool,
    },
    /// Send one turn to the server's webhook
    Send(commands::turn::TurnArgs),
    /// Run one turn in-process against the standard actions
    Run {
        #[command(flatten)]
        turn: commands::turn::TurnArgs,
        /// Timezone for time-dependent actions (IANA name)
        #[arg(long, env = "BRICK_TIMEZONE", default_value = "UTC")]
        timezone: Tz,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Diagnostics go to stderr so stdout stays pipeable JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Health { raw } => commands::health::run(&cli.api_url, raw).await,
        Commands::Actions { raw } => commands::actions::run(&cli.api_url, raw).await,
        Commands::Send(turn) => commands::turn::send(&cli.api_url, turn).await,
        Commands::Run { turn, timezone } => {
            tracing::debug!(action = %turn.action, %timezone, "running turn locally");
            commands::turn::run_local(turn, timezone)
        }
    };

    std::process::exit(code);
}
