use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

const DEFAULT_LOG_DIRECTIVES: &str = "warn";
const VERBOSE_LOG_DIRECTIVES: &str = "warn,studyplan_core=debug,studyplan=debug";

#[derive(Parser)]
#[command(name = "studyplan", version, about = "Study schedule planner")]
struct Cli {
    /// Log planner decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a study plan from a calendar and preferences
    Plan {
        #[command(flatten)]
        args: commands::plan::PlanArgs,
        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a study plan and write it as an iCalendar file
    Export {
        #[command(flatten)]
        args: commands::plan::PlanArgs,
        /// Output file; stdout when omitted
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// List the subjects found in a calendar
    Subjects {
        #[command(flatten)]
        source: commands::plan::CalendarArgs,
        #[arg(long)]
        json: bool,
    },
    /// List the study techniques
    Techniques {
        #[arg(long)]
        json: bool,
    },
    /// Print improvement tips for preferences and a technique
    Tips {
        #[arg(long)]
        prefs: String,
        #[arg(long)]
        technique: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_logging(verbose: bool) {
    let directives = if verbose {
        VERBOSE_LOG_DIRECTIVES
    } else {
        DEFAULT_LOG_DIRECTIVES
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Plan { args, json } => commands::plan::run(args, json).await,
        Commands::Export { args, out } => commands::export::run(args, out).await,
        Commands::Subjects { source, json } => commands::subjects::run(source, json).await,
        Commands::Techniques { json } => commands::techniques::run(json),
        Commands::Tips { prefs, technique } => commands::tips::run(&prefs, technique.as_deref()),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "studyplan", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
