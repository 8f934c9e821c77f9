//! Command line interface for the Claira Platform.

#![allow(clippy::print_stdout, reason = "CLI tool outputs to stdout")]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use claira_client::{format, BinaryStore, ClairaClient, FileUpload};
use claira_types::operation::AuthOperation;
use claira_types::{Credentials, Environment, Operation};

mod credential_file;
use credential_file::FileStore;

#[derive(Parser, Debug)]
#[command(name = "claira", author, version, about, long_about = None)]
struct Cli {
    /// Path to the credentials file
    #[arg(long, global = true, value_name = "PATH")]
    credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store credentials and verify them with a login
    Login {
        /// Account email address
        email: String,
        /// Account password
        #[arg(long)]
        password: String,
        /// Named environment: platform, stable, dev, or local
        #[arg(long, default_value = "platform")]
        environment: String,
        /// Override for the auth service base URL
        #[arg(long, value_name = "URL")]
        auth_url: Option<String>,
        /// Override for the document-analysis service base URL
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },
    /// Show the authenticated user's profile
    Whoami,
    /// Execute one or more operations described as JSON
    ///
    /// PARAMS is an operation object like
    /// '{"resource": "deals", "operation": "getAll", "returnAll": true}',
    /// or an array of such objects.
    Run {
        /// Operation(s) as JSON text, or `-` to read from stdin
        params: String,
        /// Attach a file to a named binary slot (repeatable)
        #[arg(long = "file", value_name = "SLOT=PATH")]
        files: Vec<String>,
        /// Render results as markdown where a rendering exists
        #[arg(long)]
        markdown: bool,
        /// Capture per-item failures as results instead of aborting the batch
        #[arg(long)]
        continue_on_fail: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let credentials_path = match cli.credentials {
        Some(path) => path,
        None => credential_file::default_path()?,
    };

    match cli.command {
        Commands::Login { email, password, environment, auth_url, api_url } => {
            let mut credentials = Credentials::new(email, password);
            credentials.environment = parse_environment(&environment)?;
            credentials.auth_base_url = auth_url;
            credentials.doc_analysis_base_url = api_url;

            let store = Arc::new(FileStore::create(&credentials_path, credentials)?);
            let client = ClairaClient::new(store)?;
            client.ensure_authenticated().await?;
            println!("Logged in. Credentials saved to {}", credentials_path.display());
        }
        Commands::Whoami => {
            let client = open_client(&credentials_path)?;
            let items = client
                .execute(&Operation::Auth(AuthOperation::GetUser), &BinaryStore::new())
                .await?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Commands::Run { params, files, markdown, continue_on_fail } => {
            let client = open_client(&credentials_path)?;
            let binary = load_binary_slots(&files)?;
            let operations = parse_operations(&params)?;

            if markdown {
                // Markdown rendering needs the operation kind per result set,
                // so render each item's results separately.
                for operation in &operations {
                    let items = client.execute(operation, &binary).await?;
                    match format::render_operation(operation, &items) {
                        Some(text) => println!("{text}"),
                        None => println!("{}", serde_json::to_string_pretty(&items)?),
                    }
                }
            } else {
                let items = client.execute_many(&operations, &binary, continue_on_fail).await?;
                println!("{}", serde_json::to_string_pretty(&items)?);
            }
        }
    }

    Ok(())
}

fn open_client(path: &std::path::Path) -> Result<ClairaClient> {
    let store = Arc::new(
        FileStore::open(path).with_context(|| "no stored credentials; run `claira login` first")?,
    );
    Ok(ClairaClient::new(store)?)
}

fn parse_environment(name: &str) -> Result<Environment> {
    match name {
        "platform" => Ok(Environment::Platform),
        "stable" => Ok(Environment::Stable),
        "dev" => Ok(Environment::Dev),
        "local" => Ok(Environment::Local),
        other => bail!("unknown environment {other:?} (expected platform, stable, dev, or local)"),
    }
}

/// Parse the run parameters: one operation object or an array of them.
fn parse_operations(params: &str) -> Result<Vec<Operation>> {
    let text = if params == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading operations from stdin")?
    } else {
        params.to_string()
    };

    let value: serde_json::Value =
        serde_json::from_str(&text).context("operation parameters are not valid JSON")?;
    let operations = if value.is_array() {
        serde_json::from_value(value).context("parsing operation array")?
    } else {
        vec![serde_json::from_value(value).context("parsing operation")?]
    };
    Ok(operations)
}

/// Read `SLOT=PATH` attachments into binary slots. The MIME type is guessed
/// from the file extension; uploads fall back to octet-stream otherwise.
fn load_binary_slots(files: &[String]) -> Result<BinaryStore> {
    let mut binary = BinaryStore::new();
    for entry in files {
        let (slot, path) = entry
            .split_once('=')
            .with_context(|| format!("--file {entry:?} must be SLOT=PATH"))?;
        let data =
            std::fs::read(path).with_context(|| format!("reading attachment {path}"))?;
        let file_name = std::path::Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let mime_type = mime_for(&file_name);
        binary.insert(slot, FileUpload::new(data, file_name, mime_type));
    }
    Ok(binary)
}

fn mime_for(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "pdf" => "application/pdf",
        Some(ext) if ext == "csv" => "text/csv",
        Some(ext) if ext == "txt" => "text/plain",
        Some(ext) if ext == "json" => "application/json",
        Some(ext) if ext == "xlsx" => {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        }
        Some(ext) if ext == "docx" => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_operation() {
        let ops = parse_operations(r#"{"resource": "auth", "operation": "getUser"}"#).unwrap();
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], Operation::Auth(AuthOperation::GetUser)));
    }

    #[test]
    fn test_parse_operation_array() {
        let ops = parse_operations(
            r#"[{"resource": "auth", "operation": "getUser"},
                {"resource": "deals", "operation": "getAll"}]"#,
        )
        .unwrap();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(parse_operations("not json").is_err());
    }

    #[test]
    fn test_mime_guessing() {
        assert_eq!(mime_for("report.PDF"), "application/pdf");
        assert_eq!(mime_for("data"), "application/octet-stream");
    }
}
