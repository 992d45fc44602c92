//! Output formatting (JSON/text) for show and list.

use std::fmt::Display;
use std::io::{self, Write};

use serde::Serialize;
use tapctl::TapInfo;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Pretty print (for JSON).
    pub pretty: bool,
}

fn write_json<W: Write, T: Serialize + ?Sized>(
    w: &mut W,
    value: &T,
    opts: &OutputOptions,
) -> io::Result<()> {
    if opts.pretty {
        serde_json::to_writer_pretty(&mut *w, value)?;
    } else {
        serde_json::to_writer(&mut *w, value)?;
    }
    writeln!(w)
}

fn print_item<W: Write, T: Serialize + Display>(
    w: &mut W,
    item: &T,
    format: OutputFormat,
    opts: &OutputOptions,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => writeln!(w, "{}", item),
        OutputFormat::Json => write_json(w, item, opts),
    }
}

/// Print a single interface to stdout.
pub fn print_one(info: &TapInfo, format: OutputFormat, opts: &OutputOptions) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    print_item(&mut stdout, info, format, opts)
}

/// Print interfaces to stdout: one line each as text, or a JSON array.
pub fn print_all(devices: &[TapInfo], format: OutputFormat, opts: &OutputOptions) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Text => {
            for info in devices {
                print_item(&mut stdout, info, format, opts)?;
            }
            Ok(())
        }
        OutputFormat::Json => write_json(&mut stdout, devices, opts),
    }
}
