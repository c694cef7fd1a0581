use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{crate_version, value_parser, Arg, ArgAction, Command};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use imscan::{Error, FileRecord};

const HEADERS: [&str; 5] = ["Name", "Resolution", "DPI", "Color depth", "Compression"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let matches = Command::new("imscan image analyzer")
        .version(crate_version!())
        .author("Vladimir Matveev <vladimir.matweev@gmail.com>")
        .about("Summarizes resolution, DPI, color depth and compression of images in a folder.")
        .arg_required_else_help(true)
        .arg(
            Arg::new("DIR")
                .help("Folder with image files")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print records as JSON instead of a table")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let dir = matches
        .get_one::<PathBuf>("DIR")
        .ok_or("folder argument is missing")?;
    debug!(dir = %dir.display(), "scanning folder");

    let records: Vec<FileRecord> = match imscan::scan_folder(dir) {
        Ok(scanned) => scanned.into_iter().map(|s| s.into_record()).collect(),
        Err(e @ Error::InvalidPath(_)) => {
            let _ = writeln!(&mut io::stderr(), "{}", e);
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if matches.get_flag("json") {
        serde_json::to_writer_pretty(&mut out, &records)?;
        writeln!(out)?;
    } else {
        print_table(&mut out, &records)?;
    }
    Ok(())
}

fn row(record: &FileRecord) -> [&str; 5] {
    [
        record.name(),
        record.resolution().unwrap_or(""),
        record.dpi().unwrap_or(""),
        record.color_depth().unwrap_or(""),
        record.compression().unwrap_or(""),
    ]
}

fn print_table<W: Write>(out: &mut W, records: &[FileRecord]) -> io::Result<()> {
    let mut widths = HEADERS.map(str::len);
    for record in records {
        for (width, cell) in widths.iter_mut().zip(row(record)) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let write_row = |out: &mut W, cells: [&str; 5]| -> io::Result<()> {
        let line = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(out, "{}", line.trim_end())
    };

    write_row(out, HEADERS)?;
    for record in records {
        write_row(out, row(record))?;
    }
    Ok(())
}
