use clap::{Args, Parser, Subcommand};
use macro_optimizer::{derive_defines, Defines, Preprocessor, RequestHeaders, Scalar};
use macro_optimizer::errors::{PreprocessError, Result};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Strip `/* @if(...) */ ... /* @endif */` regions from a source file.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preprocess INPUT with explicitly given defines.
    Process {
        #[command(flatten)]
        io: IoArgs,
        /// Defines as a JSON object, e.g. '{"device.isMobile": true}'
        #[arg(long)]
        defines: Option<String>,
        /// Read defines from a JSON file (applied before --defines)
        #[arg(long)]
        defines_file: Option<PathBuf>,
        /// Single define override, `key=value`; value is parsed as JSON when possible
        #[arg(short = 'D', value_name = "KEY=VALUE")]
        define: Vec<String>,
    },
    /// Derive defines from request headers, then preprocess INPUT.
    Simulate {
        #[command(flatten)]
        io: IoArgs,
        /// Request header, `Name: value` (repeatable)
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct IoArgs {
    /// Source file, or `-` for stdin
    input: PathBuf,
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the effective defines as JSON to stderr
    #[arg(long)]
    print_defines: bool,
}

fn main() {
    // Parse CLI arguments.
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<()> {
    let (io, defines) = match command {
        Command::Process {
            io,
            defines,
            defines_file,
            define,
        } => (io, collect_defines(defines, defines_file, &define)?),
        Command::Simulate { io, headers } => {
            let mut request = RequestHeaders::new();
            for line in &headers {
                request.insert_line(line)?;
            }
            let defines = derive_defines(&request);
            info!(?defines, "derived defines from request headers");
            (io, defines)
        }
    };

    if io.print_defines {
        let json = serde_json::to_string_pretty(&defines)
            .map_err(|e| PreprocessError::Config(e.to_string()))?;
        eprintln!("{json}");
    }

    let source = read_input(&io.input)?;
    let out = Preprocessor::new(&defines).process(&source)?;

    match &io.output {
        Some(path) => {
            std::fs::write(path, out)?;
            info!(input = %io.input.display(), output = %path.display(), "processed");
        }
        None => std::io::stdout().write_all(out.as_bytes())?,
    }
    Ok(())
}

fn collect_defines(
    inline: Option<String>,
    file: Option<PathBuf>,
    overrides: &[String],
) -> Result<Defines> {
    let mut defines = Defines::new();
    if let Some(path) = file {
        let text = std::fs::read_to_string(&path)?;
        defines.extend_from(Defines::from_json_str(&text)?);
    }
    if let Some(json) = inline {
        defines.extend_from(Defines::from_json_str(&json)?);
    }
    for pair in overrides {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            PreprocessError::Config(format!("-D expects KEY=VALUE, got `{pair}`"))
        })?;
        defines.insert(key.trim(), Scalar::parse_loose(value));
    }
    Ok(defines)
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}
