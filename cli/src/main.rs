use clap::{Parser, Subcommand};
use pvmeter_cli::CliContext;
use pvmeter_cli::commands;
use pvmeter_cli::readline;
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let ctx = CliContext::new().map_err(|e| e.to_string())?;

    // Resume tailing the configured log file
    let configured = ctx.settings.read().await.log_path.clone();
    if let Some(path) = configured {
        commands::tail(&path.to_string_lossy(), &ctx).await;
    }

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "combat scoreboard cli")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a full log file through the parser.
    ParseFile {
        #[arg(short, long)]
        path: String,
    },
    /// Follow a growing log file.
    Tail {
        #[arg(short, long)]
        path: String,
    },
    /// Persist the log file path and start tailing it.
    SetFile {
        #[arg(short, long)]
        path: String,
    },
    /// Pin a participant to a scoreboard position.
    SetOrder {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        position: u32,
    },
    Stats,
    Config,
    Reset,
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "pvmeter".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::ParseFile { path }) => commands::parse_file(path, ctx).await,
        Some(Commands::Tail { path }) => commands::tail(path, ctx).await,
        Some(Commands::SetFile { path }) => commands::set_file(path, ctx).await,
        Some(Commands::SetOrder { name, position }) => {
            commands::set_order(name, *position, ctx).await
        }
        Some(Commands::Stats) => commands::show_stats(ctx).await,
        Some(Commands::Config) => commands::show_settings(ctx).await,
        Some(Commands::Reset) => commands::reset(ctx).await,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
