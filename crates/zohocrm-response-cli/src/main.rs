//! zohocrm-inspect — normalize captured Zoho CRM responses from the command line.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use zohocrm_response::{classify, load};
use zohocrm_response_cli::config::{resolve_log_level, resolve_parse_options};
use zohocrm_response_cli::inspect::{inspect, read_document, render_error, EXIT_API_ERROR, EXIT_BAD_DOCUMENT};

#[derive(Parser)]
#[command(
    name = "zohocrm-inspect",
    about = "Normalize captured Zoho CRM XML responses",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). Also reads ZOHOCRM_LOG.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a response document and print the normalized result as JSON.
    Parse {
        /// Response document; omit or pass "-" to read stdin.
        file: Option<String>,

        /// Module the request targeted (e.g. Leads).
        #[arg(short, long)]
        module: String,

        /// API method that produced the response (e.g. getRecords).
        #[arg(long)]
        method: String,

        /// Minimum digit run treated as a record id in deletion messages.
        /// Also reads ZOHOCRM_MIN_ID_DIGITS.
        #[arg(long)]
        min_id_digits: Option<usize>,

        /// Print single-line JSON.
        #[arg(long)]
        compact: bool,

        /// Include the raw document in the output.
        #[arg(long)]
        with_xml: bool,
    },

    /// Print which response shape a document matches.
    Classify {
        /// Response document; omit or pass "-" to read stdin.
        file: Option<String>,

        #[arg(short, long)]
        module: String,

        #[arg(long)]
        method: String,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(resolve_log_level(cli.log_level.as_deref()))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Parse {
            file,
            module,
            method,
            min_id_digits,
            compact,
            with_xml,
        } => {
            let raw = read_document(file.as_deref())?;
            let options = resolve_parse_options(min_id_digits);
            let outcome = inspect(&raw, &module, &method, options, !compact, with_xml)?;
            println!("{}", outcome.output);
            if outcome.exit_code != 0 {
                std::process::exit(outcome.exit_code);
            }
        }

        Commands::Classify {
            file,
            module,
            method,
        } => {
            let raw = read_document(file.as_deref())?;
            match load(&raw).and_then(|doc| classify(&doc, &module, &method)) {
                Ok(shape) => println!("{shape}"),
                Err(err) => {
                    println!("{}", render_error(&err));
                    let code = if err.is_api_error() {
                        EXIT_API_ERROR
                    } else {
                        EXIT_BAD_DOCUMENT
                    };
                    std::process::exit(code);
                }
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "zohocrm-inspect", &mut std::io::stdout());
        }
    }

    Ok(())
}
