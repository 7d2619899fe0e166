mod commands;
mod context;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use vigil_core::RecurrenceKind;
use vigil_core::config::VigilConfig;

use crate::context::Context;

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Keep track of recurring services and their reminders")]
struct Cli {
    /// Log more (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a schedule from a preset and schedule its reminders
    Init {
        /// parish, monastery or commuter
        #[arg(short, long, default_value = "parish")]
        preset: String,

        /// Name shown in reminders (e.g. "St. Anne Parish")
        #[arg(short, long)]
        owner: Option<String>,

        /// Replace an existing schedule
        #[arg(long)]
        force: bool,
    },
    /// Show the available presets
    Presets,
    /// Show every rule in the schedule with its next occurrence
    List,
    /// Show the next service
    Next {
        /// Only consider weekly or daily rules
        #[arg(short, long)]
        kind: Option<KindFilter>,

        /// How many upcoming services to show
        #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
        count: u16,

        /// Print a JSON snapshot instead
        #[arg(long)]
        json: bool,
    },
    /// Add a rule
    Add {
        #[command(subcommand)]
        rule: AddRule,
    },
    /// Change a rule's time, weekday or label
    Edit {
        /// Rule id or unique id prefix
        id: String,

        /// New time of day (HH:MM or HH:MM:SS)
        #[arg(long)]
        at: Option<String>,

        /// New weekday (makes a daily rule weekly)
        #[arg(long)]
        weekday: Option<String>,

        /// New label (empty to clear)
        #[arg(long)]
        label: Option<String>,
    },
    /// Remove a rule
    Remove {
        /// Rule id or unique id prefix
        id: String,
    },
    /// Reschedule every reminder from the current schedule
    Sync,
    /// Show pending reminders
    Reminders,
    /// Ask for permission to deliver reminders
    Authorize,
    /// Delete the schedule and all of its reminders
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show configuration paths and settings
    Config,
}

#[derive(Subcommand)]
pub enum AddRule {
    /// A service once a week
    Weekly {
        /// Day of the week (e.g. sunday, sun, 1)
        #[arg(short, long)]
        weekday: String,

        /// Time of day (HH:MM or HH:MM:SS)
        #[arg(long)]
        at: String,

        #[arg(short, long)]
        label: Option<String>,
    },
    /// A prayer every day
    Daily {
        /// Time of day (HH:MM or HH:MM:SS)
        #[arg(long)]
        at: String,

        #[arg(short, long)]
        label: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindFilter {
    Weekly,
    Daily,
}

impl KindFilter {
    pub fn matches(self, kind: &RecurrenceKind) -> bool {
        matches!(
            (self, kind),
            (KindFilter::Weekly, RecurrenceKind::Weekly { .. })
                | (KindFilter::Daily, RecurrenceKind::Daily { .. })
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = VigilConfig::load()?;
    init_logging(&config.log_level, cli.verbose);

    if let Commands::Config = cli.command {
        return commands::config::run(&config);
    }
    if let Commands::Presets = cli.command {
        return commands::presets::run();
    }

    let ctx = Context::new(config)?;

    match cli.command {
        Commands::Init {
            preset,
            owner,
            force,
        } => commands::init::run(&ctx, &preset, owner, force).await,
        Commands::List => commands::list::run(&ctx),
        Commands::Next { kind, count, json } => commands::next::run(&ctx, kind, count.into(), json),
        Commands::Add { rule } => commands::add::run(&ctx, rule).await,
        Commands::Edit {
            id,
            at,
            weekday,
            label,
        } => commands::edit::run(&ctx, &id, at, weekday, label).await,
        Commands::Remove { id } => commands::remove::run(&ctx, &id).await,
        Commands::Sync => commands::sync::run(&ctx).await,
        Commands::Reminders => commands::reminders::run(&ctx).await,
        Commands::Authorize => commands::authorize::run(&ctx).await,
        Commands::Clear { yes } => commands::clear::run(&ctx, yes).await,
        Commands::Config | Commands::Presets => Ok(()),
    }
}

/// `RUST_LOG` wins, then `-v` flags, then the configured level.
fn init_logging(config_level: &str, verbose: u8) {
    let fallback = match verbose {
        0 => config_level,
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_count(args: &[&str]) -> Result<u16, clap::Error> {
        let cli = Cli::try_parse_from(args)?;
        match cli.command {
            Commands::Next { count, .. } => Ok(count),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_next_count_is_bounded() {
        assert_eq!(next_count(&["vigil", "next"]).unwrap(), 1);
        assert_eq!(next_count(&["vigil", "next", "-n", "5"]).unwrap(), 5);
        assert!(next_count(&["vigil", "next", "-n", "0"]).is_err());
        assert!(next_count(&["vigil", "next", "-n", "18446744073709551615"]).is_err());
    }
}
