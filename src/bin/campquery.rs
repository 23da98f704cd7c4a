use std::path::PathBuf;

use campquery::cli::{self as prog_cli, OutputMode};
use campquery::utils::logger;
use campquery::{Resource, ResultsConfig};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "campquery", version, about = "Bootcamp directory listing queries", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). If omitted, CAMPQUERY_CONFIG or ./campquery.toml is used.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Directory for log files; overrides CAMPQUERY_LOG_DIR")]
    log_dir: Option<PathBuf>,
    #[arg(long, help = "Log level: error|warn|info|debug|trace")]
    log_level: Option<String>,
    #[arg(long, help = "Print single-line JSON instead of pretty JSON")]
    compact: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Run a listing request against a JSON fixture and print the result envelope")]
    Query {
        #[arg(long, help = "JSON file mapping collection names to arrays of documents")]
        data: PathBuf,
        #[arg(long, help = "Resource to list: bootcamps|courses|reviews|users")]
        resource: Resource,
        #[arg(short = 'p', long = "param", help = "Query-string pair key=value (repeatable)")]
        params: Vec<String>,
    },
    #[command(about = "Show the translated filter, projection, sort and page without reading data")]
    Explain {
        #[arg(long, help = "Resource to list: bootcamps|courses|reviews|users")]
        resource: Resource,
        #[arg(short = 'p', long = "param", help = "Query-string pair key=value (repeatable)")]
        params: Vec<String>,
    },
    #[command(about = "List resources with their default page size, fields and populated paths")]
    Resources,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let logging = if cli.log_dir.is_some() || cli.log_level.is_some() {
        logger::configure_logging(cli.log_dir.as_deref(), cli.log_level.as_deref(), None, false)
    } else {
        logger::configure_from_env()
    };
    if let Err(e) = logging {
        eprintln!("warning: logging disabled: {e}");
    }
    let cfg = match ResultsConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };
    let mode = if cli.compact { OutputMode::Compact } else { OutputMode::Pretty };
    let cmd = match cli.command {
        Commands::Query { data, resource, params } => prog_cli::Command::Query { data, resource, params },
        Commands::Explain { resource, params } => prog_cli::Command::Explain { resource, params },
        Commands::Resources => prog_cli::Command::Resources,
    };
    match prog_cli::run(cmd, &cfg, mode).await {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
