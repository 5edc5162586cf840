//! dumppdfa - print the catalog, embedded files tree, `/AF` array and
//! stray `/EmbeddedFile` keys of PDF files.

mod logging;

use clap::{ArgAction, Parser};
use logging::{LogFormat, init_tracing};
use memmap2::Mmap;
use pdfa3pack_core::dump_structure;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dumppdfa")]
#[command(author, version, about = "Dump PDF/A-3 attachment structures", long_about = None)]
struct Args {
    /// PDF files to dump
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output file ("-" for stdout)
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Increase log verbosity
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    #[arg(long = "log-format", value_enum, default_value = "text")]
    log_format: LogFormat,
}

fn main() -> core::result::Result<(), Box<dyn core::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose, args.log_format);

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)?;
        Box::new(BufWriter::new(file))
    };

    for path in &args.files {
        if !path.exists() {
            eprintln!("Error: File not found: {}", path.display());
            std::process::exit(1);
        }
        let file = File::open(path)?;
        // SAFETY: the mapping is only read while this process holds it
        let mmap = unsafe { Mmap::map(&file) }?;

        if args.files.len() > 1 {
            writeln!(output, "### {}", path.display())?;
        }
        write!(output, "{}", dump_structure(&mmap)?)?;
    }

    output.flush()?;
    Ok(())
}
