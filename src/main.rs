#![allow(unused_assignments)]

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jsonmap::{emit, translate, JsonMapError, OutputFormat, Value};

/// jsonmap - transform JSON documents with a small mapping language
///
/// Reads JSON from standard input, applies the program, and writes the
/// resulting JSON to standard output.
#[derive(Parser)]
#[command(name = "jsonmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Program file ('-' reads the program from standard input)
    program: PathBuf,

    /// Read the input JSON from a file instead of standard input
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write the output JSON to a file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,

    /// Parse the program and exit without reading input
    #[arg(long)]
    check: bool,
}

fn main() -> ExitCode {
    // Set up miette for nice error output
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let exit_code = match &e {
                JsonMapError::IoError { .. } => ExitCode::from(3),
                JsonMapError::InvalidInput { .. } => ExitCode::from(2),
                _ => ExitCode::from(1),
            };
            eprintln!("{:?}", miette::Report::new(e));
            exit_code
        }
    }
}

fn run(cli: Cli) -> Result<(), JsonMapError> {
    let program_from_stdin = cli.program.as_os_str() == "-";
    let program = if program_from_stdin {
        read_stdin()?
    } else {
        fs::read_to_string(&cli.program).map_err(|e| {
            JsonMapError::io_error(format!("cannot read {}: {}", cli.program.display(), e))
        })?
    };

    if cli.check {
        jsonmap::check(&program)?;
        eprintln!("OK");
        return Ok(());
    }

    let input_text = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| JsonMapError::io_error(format!("cannot read {}: {}", path.display(), e)))?,
        None => {
            if program_from_stdin {
                return Err(JsonMapError::io_error(
                    "reading the program from stdin requires --input for the JSON document",
                ));
            }
            read_stdin()?
        }
    };

    let input_json: serde_json::Value = serde_json::from_str(&input_text)
        .map_err(|e| JsonMapError::invalid_input(e.to_string()))?;
    let input = Value::from_serde_json(input_json);

    let output = translate(&program, input)?;

    let format = if cli.pretty {
        OutputFormat::JsonPretty
    } else {
        OutputFormat::Json
    };
    let mut text = emit(&output, format)?;
    text.push('\n');

    match &cli.output {
        Some(path) => fs::write(path, text).map_err(|e| {
            JsonMapError::io_error(format!("cannot write {}: {}", path.display(), e))
        })?,
        None => {
            io::stdout()
                .write_all(text.as_bytes())
                .map_err(|e| JsonMapError::io_error(e.to_string()))?;
        }
    }

    Ok(())
}

fn read_stdin() -> Result<String, JsonMapError> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| JsonMapError::io_error(e.to_string()))?;
    Ok(buffer)
}
