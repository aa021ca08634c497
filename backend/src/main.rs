//! Offersheet CLI - Convert offer spreadsheets to JSON
//!
//! # Main Commands
//!
//! ```bash
//! offersheet ofertas.xlsx                    # Write output.json
//! offersheet ofertas.xlsx -o o.json --sheet Ofertas
//! offersheet serve                           # Start offers API (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! offersheet columns ofertas.xlsx            # List sheet headers
//! offersheet schema                          # Print the active schema
//! ```

use clap::{Args, Parser, Subcommand};
use offersheet::api::logs::LOG_BROADCASTER;
use offersheet::server::{start_server, ServerConfig};
use offersheet::{
    build_document, convert, load, render_document, ConvertOptions, SchemaMap, SheetSelector,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "offersheet")]
#[command(about = "Convert offer spreadsheets to JSON, one object per row", long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(flatten)]
    convert: ConvertArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Arguments of the default (convert) mode
#[derive(Args)]
struct ConvertArgs {
    /// Input spreadsheet (.xlsx, .xls, .ods, .csv)
    #[arg(required = true)]
    input: Option<PathBuf>,

    /// Output JSON file
    #[arg(short, long, default_value = offersheet::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Sheet name or zero-based index (default: first sheet)
    #[arg(long)]
    sheet: Option<SheetSelector>,

    /// JSON schema file mapping output keys to column labels
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Print the JSON to stdout instead of writing a file
    #[arg(long)]
    stdout: bool,

    /// Only print the final summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the column labels of a sheet
    Columns {
        /// Input spreadsheet
        input: PathBuf,

        /// Sheet name or zero-based index (default: first sheet)
        #[arg(long)]
        sheet: Option<SheetSelector>,
    },

    /// Print the active schema as JSON
    Schema {
        /// JSON schema file (default: built-in offer schema)
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Start the offers HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value = "3000")]
        port: u16,

        /// JSON document to serve
        #[arg(long, env = "DATA_FILE", default_value = "./output.json")]
        data: PathBuf,

        /// Token signing secret
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,

        /// Accepted client id
        #[arg(long, env = "CLIENT_ID")]
        client_id: Option<String>,

        /// Accepted client secret
        #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        None => cmd_convert(cli.convert),

        Some(Commands::Columns { input, sheet }) => cmd_columns(&input, &sheet.unwrap_or_default()),

        Some(Commands::Schema { schema }) => cmd_schema(schema.as_deref()),

        Some(Commands::Serve {
            port,
            data,
            jwt_secret,
            client_id,
            client_secret,
        }) => {
            cmd_serve(ServerConfig {
                port,
                data_file: data,
                jwt_secret,
                client_id,
                client_secret,
            })
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_schema(path: Option<&Path>) -> Result<SchemaMap, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(p) => SchemaMap::from_file(p)?,
        None => SchemaMap::offers(),
    })
}

fn cmd_convert(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let input = args.input.ok_or("missing input spreadsheet")?;
    let sheet = args.sheet.unwrap_or_default();

    // Data goes to stdout in that mode, so keep the console clean
    if args.quiet || args.stdout {
        LOG_BROADCASTER.set_echo(false);
    }

    let schema = load_schema(args.schema.as_deref())?;

    if args.stdout {
        let document = build_document(&input, &sheet, &schema)?;
        println!("{}", render_document(&document.records)?);
        return Ok(());
    }

    let options = ConvertOptions {
        input,
        output: args.output,
        sheet,
        schema,
    };
    let report = convert(&options)?;

    println!(
        "OK: wrote {} with {} records.",
        report.output.display(),
        report.record_count
    );
    Ok(())
}

fn cmd_columns(input: &Path, sheet: &SheetSelector) -> Result<(), Box<dyn std::error::Error>> {
    let table = load(input, sheet)?;

    eprintln!("📄 Sheet '{}' ({} rows)", table.sheet_name, table.row_count());
    for (i, col) in table.headers.iter().enumerate() {
        println!("[{:2}] {}", i + 1, col);
    }
    Ok(())
}

fn cmd_schema(schema_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let schema = load_schema(schema_path)?;
    println!("{}", schema.to_json()?);
    Ok(())
}

async fn cmd_serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    start_server(config).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_input_converts() {
        let cli = Cli::try_parse_from(["offersheet", "ofertas.xlsx", "-o", "out.json", "--sheet", "1"])
            .unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.convert.input, Some(PathBuf::from("ofertas.xlsx")));
        assert_eq!(cli.convert.output, PathBuf::from("out.json"));
        assert_eq!(cli.convert.sheet, Some(SheetSelector::from("1")));
    }

    #[test]
    fn test_default_output() {
        let cli = Cli::try_parse_from(["offersheet", "ofertas.xlsx"]).unwrap();
        assert_eq!(cli.convert.output, PathBuf::from(offersheet::DEFAULT_OUTPUT));
        assert!(cli.convert.sheet.is_none());
    }

    #[test]
    fn test_subcommands_still_parse() {
        let cli = Cli::try_parse_from(["offersheet", "columns", "ofertas.xlsx"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Columns { .. })));

        let cli = Cli::try_parse_from(["offersheet", "schema"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Schema { schema: None })));
    }

    #[test]
    fn test_input_required_without_subcommand() {
        let err = Cli::try_parse_from(["offersheet"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
