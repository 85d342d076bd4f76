//! jet-sql CLI
//!
//! Renders JSON query plans into Jet/Access SQL.

mod plan;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use jet_sql_core::RawSql;

use crate::plan::{Plan, format_statements, load_rules};

/// Render relational query plans as Jet/Access SQL.
#[derive(Parser)]
#[command(name = "jet-sql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dialect rules: `jet`, `odbc` or the path of a JSON rules file.
    #[arg(short, long, env = "JET_SQL_DIALECT", default_value = "jet")]
    dialect: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a JSON plan and print the SQL with its parameters.
    Render {
        /// Plan file.
        plan: PathBuf,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Check whether a raw SELECT can be used as a derived table.
    CheckRaw {
        /// Raw SQL text.
        sql: String,
    },

    /// Quote an identifier.
    Quote {
        /// Identifier to quote.
        identifier: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// SQL followed by `-- @name=value` declarations.
    Text,
    /// Statements as JSON.
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let rules = load_rules(&cli.dialect)?;
    debug!(dialect = %cli.dialect, "loaded dialect rules");

    match cli.command {
        Commands::Render { plan, format } => {
            let statements = Plan::load(&plan)?.render(&rules)?;
            info!(
                "Rendered {} statement(s) from {}",
                statements.len(),
                plan.display()
            );
            match format {
                Format::Text => println!("{}", format_statements(&statements, &rules)?),
                Format::Json => println!("{}", serde_json::to_string_pretty(&statements)?),
            }
        }

        Commands::CheckRaw { sql } => {
            let raw = RawSql::new(sql);
            let body = raw.composable_text()?;
            println!("composable: {body}");
        }

        Commands::Quote { identifier } => {
            println!("{}", rules.quote_identifier(&identifier));
        }
    }

    Ok(())
}
