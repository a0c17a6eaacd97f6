//! Command-line interface for timeql.
//!
//! # Usage
//!
//! ```bash
//! # Serve the endpoint on 0.0.0.0:8080/query
//! timeql serve
//!
//! # Check a schema against the resolver set
//! timeql check --schema schema.graphql
//!
//! # Run one query
//! timeql exec '{ today }'
//!
//! # Print the built-in schema
//! timeql schema
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use timeql_runtime::{BindIssue, Executor, Request};
use timeql_server::{bind_schema, Server, ServerConfig, SCHEMA};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "timeql")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the GraphQL endpoint
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Path of the GraphQL endpoint
        #[arg(long, default_value = "/query")]
        path: String,

        /// Schema file to serve instead of the built-in one
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Bind a schema against the resolver set and report problems
    Check {
        /// Schema file (defaults to the built-in schema)
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Execute one query and print the response
    Exec {
        /// Query document
        query: String,

        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,

        /// Operation to run
        #[arg(long)]
        operation_name: Option<String>,

        /// Schema file (defaults to the built-in schema)
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Print the built-in schema
    Schema,

    /// Print version information
    Version,
}

pub async fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Serve {
            host,
            port,
            path,
            schema,
        } => {
            let (name, sdl) = load_schema(schema.as_deref())?;
            let bound = match bind_schema(&sdl) {
                Ok(bound) => bound,
                Err(err) => {
                    error!("{err}");
                    report_issues(&name, &sdl, err.issues());
                    return Ok(1);
                }
            };
            let config = ServerConfig::new().host(host).port(port).path(path);
            Server::new(config, bound).run().await?;
            Ok(0)
        }
        Commands::Check { schema } => {
            let (name, sdl) = load_schema(schema.as_deref())?;
            Ok(check(&name, &sdl, cli.verbose))
        }
        Commands::Exec {
            query,
            variables,
            operation_name,
            schema,
        } => {
            let (name, sdl) = load_schema(schema.as_deref())?;
            let bound = match bind_schema(&sdl) {
                Ok(bound) => bound,
                Err(err) => {
                    report_issues(&name, &sdl, err.issues());
                    return Ok(1);
                }
            };
            let request = build_request(query, variables.as_deref(), operation_name)?;
            let response = Executor::new(bound).execute(request).await;
            println!("{}", serde_json::to_string_pretty(&response.to_json())?);
            Ok(i32::from(response.data.is_none()))
        }
        Commands::Schema => {
            print!("{SCHEMA}");
            Ok(0)
        }
        Commands::Version => {
            println!("timeql {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Reads a schema file, or returns the built-in schema.
fn load_schema(path: Option<&Path>) -> std::io::Result<(String, String)> {
    match path {
        Some(path) => Ok((path.display().to_string(), std::fs::read_to_string(path)?)),
        None => Ok(("schema.graphql".to_string(), SCHEMA.to_string())),
    }
}

fn build_request(
    query: String,
    variables: Option<&str>,
    operation_name: Option<String>,
) -> Result<Request, serde_json::Error> {
    let mut request = Request::new(query);
    request.operation_name = operation_name;
    if let Some(variables) = variables {
        request.variables = Some(serde_json::from_str(variables)?);
    }
    Ok(request)
}

fn check(name: &str, sdl: &str, verbose: bool) -> i32 {
    if verbose {
        println!("{} {}", "Checking".blue(), name);
    }
    match bind_schema(sdl) {
        Ok(bound) => {
            println!(
                "{} {} ({} root field(s) bound)",
                "OK".green().bold(),
                name,
                bound.schema().query_root().map_or(0, |root| root.fields.len())
            );
            0
        }
        Err(err) => {
            report_issues(name, sdl, err.issues());
            1
        }
    }
}

/// Prints bind issues. Syntax errors are rendered against the source.
fn report_issues(name: &str, sdl: &str, issues: &[BindIssue]) {
    eprintln!("{} {}", "Error".red().bold(), name);
    for issue in issues {
        match issue {
            BindIssue::Syntax { diagnostic, .. } => {
                eprintln!("{:?}", diagnostic.to_report(name, sdl));
            }
            other => eprintln!("  {} {}", "-->".blue(), other),
        }
    }
}
