use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: j2ir <Jar files> <Config file> <Output file>";

#[derive(Parser)]
#[command(name = "j2ir", version, about = "Translate a Java kernel method into flat C++")]
struct Cli {
    /// `;`-separated list of source directories and .jar/.zip archives
    archives: String,

    /// Kernel selector (.toml or .xml)
    config: PathBuf,

    /// Output base path; `.h` and `.cpp` are appended
    output: PathBuf,

    /// Raise the log level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => err.exit(),
        Err(_) => {
            eprintln!("{USAGE}");
            eprintln!("{}", Cli::command().render_help());
            std::process::exit(2);
        }
    };

    init_logging(cli.verbose);

    match j2ir::translate_files(&cli.archives, &cli.config, &cli.output) {
        Ok(translation) => {
            let (header, source) = j2ir::output_paths(&cli.output);
            eprintln!(
                "translated in {} iteration(s) \u{2192} {}, {}",
                translation.iterations,
                header.display(),
                source.display()
            );
        }
        Err(err) => {
            j2ir::diagnostics::render_error(&err);
            std::process::exit(1);
        }
    }
}
