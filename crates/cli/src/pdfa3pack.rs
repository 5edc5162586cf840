//! pdfa3pack - package an XML invoice into a PDF/A-3B document and
//! validate the result.

mod logging;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use logging::{LogFormat, init_tracing};
use memmap2::Mmap;
use pdfa3pack_core::{PackConfig, Packager, dump_structure, list_attachments, validate_heuristic};
use serde_json::json;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pdfa3pack")]
#[command(author, version, about = "PDF/A-3B packaging of XML invoices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format
    #[arg(long = "log-format", value_enum, default_value = "text", global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed an XML invoice into a copy of a PDF as PDF/A-3B
    Pack {
        /// Source PDF
        input: PathBuf,

        /// XML payload to embed
        invoice: PathBuf,

        /// Output file
        #[arg(short = 'o', long, default_value = "pdfa3-fresh-runner.pdf")]
        output: PathBuf,

        /// Attachment name (default: the invoice file name)
        #[arg(long)]
        name: Option<String>,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Document author
        #[arg(long)]
        author: Option<String>,

        /// Configuration file (default: $PDFA3PACK_CONFIG or built-in defaults)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Build the attachment without the attachment helper
        #[arg(long = "no-helper", action = ArgAction::SetTrue)]
        no_helper: bool,

        /// Print the structure dump of the output
        #[arg(long, action = ArgAction::SetTrue)]
        dump: bool,

        /// Run strict validation on the output
        #[arg(long, action = ArgAction::SetTrue)]
        strict: bool,
    },

    /// Validate a PDF/A-3B document and print the result as JSON
    Validate {
        file: PathBuf,

        #[arg(long, value_enum, default_value = "heuristic")]
        mode: Mode,

        /// Strict validation time limit in seconds (0 disables it)
        #[arg(long)]
        timeout: Option<u64>,

        /// Configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List embedded files as JSON
    Attachments { file: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Heuristic,
    Strict,
}

fn map_file(path: &Path) -> std::io::Result<Mmap> {
    let file = File::open(path)?;
    // SAFETY: the mapping is only read while this process holds it
    unsafe { Mmap::map(&file) }
}

fn load_config(path: Option<&Path>) -> pdfa3pack_core::PackResult<PackConfig> {
    match path {
        Some(path) => PackConfig::load_from(path),
        None => PackConfig::load(),
    }
}

fn main() -> core::result::Result<(), Box<dyn core::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match cli.command {
        Command::Pack {
            input,
            invoice,
            output,
            name,
            title,
            author,
            config,
            no_helper,
            dump,
            strict,
        } => {
            let source = map_file(&input)?;
            let payload = map_file(&invoice)?;
            let name = name.unwrap_or_else(|| {
                invoice
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });

            let mut packager = Packager::new().with_config(load_config(config.as_deref())?);
            if let Some(title) = &title {
                packager = packager.title(title);
            }
            if let Some(author) = &author {
                packager = packager.author(author);
            }
            if no_helper {
                packager = packager.without_helper();
            }

            let packed = packager.package_with_report(&source, &payload, &name)?;
            std::fs::write(&output, &packed.bytes)?;
            println!("Wrote: {}", output.display());
            tracing::debug!(report = ?packed.report, "pack finished");

            if dump {
                println!("{}", dump_structure(&packed.bytes)?);
            }
            if strict {
                let result = packager.validate_strict(&packed.bytes)?;
                println!("Strict: valid={}, errors={}", result.valid, result.errors.len());
                for error in &result.errors {
                    println!("{error}");
                }
            }
        }

        Command::Validate {
            file,
            mode,
            timeout,
            config,
        } => {
            let bytes = map_file(&file)?;
            let body = match mode {
                Mode::Heuristic => {
                    let result = validate_heuristic(&bytes);
                    json!({
                        "mode": "heuristic",
                        "isValid": result.valid,
                        "details": result.details,
                    })
                }
                Mode::Strict => {
                    let mut packager = Packager::new().with_config(load_config(config.as_deref())?);
                    if let Some(secs) = timeout {
                        packager = packager.strict_timeout((secs > 0).then(|| Duration::from_secs(secs)));
                    }
                    let result = packager.validate_strict(&bytes)?;
                    json!({
                        "mode": "strict",
                        "isValid": result.valid,
                        "errorCount": result.errors.len(),
                        "errors": result.errors,
                    })
                }
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Command::Attachments { file } => {
            let bytes = map_file(&file)?;
            let attachments = list_attachments(&bytes)?;
            let body = json!({
                "count": attachments.len(),
                "attachments": attachments,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }
    Ok(())
}
