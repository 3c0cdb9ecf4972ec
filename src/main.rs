use std::io::{self, Read};

use clap::{Parser as ClapParser, Subcommand};
use esql_parser::ParserConfig;
use esql_parser::cli::{self, CheckOptions, CheckResult, CliError};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(ClapParser)]
#[command(name = "esql")]
#[command(about = "esql - Parse, validate and format ES|QL pipe queries")]
#[command(version)]
struct Cli {
    /// Log parser activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Accept grammar that is still in development
    #[arg(long, global = true, env = "ESQL_EXPERIMENTAL")]
    experimental: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a query
    Check {
        /// The query, or '-' to read it from stdin
        query: String,

        /// Print the parsed AST as JSON
        #[arg(long)]
        json: bool,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print a query in canonical form
    Fmt {
        /// The query, or '-' to read it from stdin
        query: String,

        /// One pipeline stage per line
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print a name the way it must be written in a query
    Quote {
        name: String,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'esql docs' to list categories)
        category: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::TRACE } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("could not install logger: {e}");
    }

    let config = ParserConfig {
        experimental: cli.experimental,
        ..ParserConfig::default()
    };

    let result = match cli.command {
        Commands::Check {
            query,
            json,
            pretty,
        } => run_check(query, cli.experimental, json, pretty),
        Commands::Fmt { query, pretty } => read_query(query)
            .and_then(|query| cli::format_query(&query, &config, pretty))
            .map(|text| println!("{text}")),
        Commands::Quote { name } => {
            println!("{}", cli::quote_name(&name));
            Ok(())
        }
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => {
            cli::get_doc_category(&category).map(|content| print!("{content}"))
        }
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run_check(query: String, experimental: bool, json: bool, pretty: bool) -> Result<(), CliError> {
    let options = CheckOptions {
        query: read_query(query)?,
        experimental,
        json,
        pretty,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid { commands } => {
            println!("Syntax is valid ({commands} commands)")
        }
        CheckResult::Json(json) => println!("{json}"),
    }
    Ok(())
}

// `-` means the query comes from a pipe.
fn read_query(query: String) -> Result<String, CliError> {
    if query != "-" {
        return Ok(query);
    }
    if atty::is(atty::Stream::Stdin) {
        return Err(CliError::NoInput);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}
