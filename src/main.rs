use clap::Parser;
use minidbms::config::{Config, DEFAULT_DATABASE, DEFAULT_DATA_DIR};
use minidbms::repl::console::Console;
use minidbms::{errors, repl, session};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "minidbms",
    version = VERSION,
    about = "Tiny file-backed table store."
)]
struct Cli {
    /// Execute a single statement and exit.
    #[arg(short, long)]
    command: Option<String>,

    /// Database to open.
    #[arg(short, long, env = "MINIDBMS_DATABASE", default_value = DEFAULT_DATABASE)]
    database: String,

    /// Directory holding one subdirectory per database.
    #[arg(long, env = "MINIDBMS_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config {
        data_dir: cli.data_dir,
        database: cli.database,
    };

    let result = match cli.command {
        Some(statement) => run_once(config, &statement),
        None => repl::start(config),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_once(config: Config, statement: &str) -> Result<(), errors::Error> {
    let mut session = session::Session::open(config)?;
    let stdin = io::stdin();
    Console::new(&mut session, stdin.lock(), io::stdout()).run_command(statement)?;
    session.close()
}
