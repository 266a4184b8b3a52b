mod app;
mod logger;
mod model;

use std::{fs::File, io::BufReader, path::PathBuf};

use app::App;
use clap::{Parser, ValueEnum};
use logger::{LogLevel, Logger};
use model::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// The plain line-by-line log and table summary
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "clubsim",
    version,
    about = "Replays a computer club event log and reports revenue per table."
)]
struct Cli {
    /// Event log: table count, working hours and price, then one event per line
    input: PathBuf,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[arg(long, value_enum, default_value_t = LogLevel::Warning)]
    log_level: LogLevel,

    /// Also append diagnostics to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Keep diagnostics off the terminal (the log file still gets them)
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut logger = match &cli.log_file {
        Some(path) => match Logger::with_file(cli.log_level, path) {
            Ok(logger) => logger,
            Err(err) => {
                eprintln!("Failed to open log file {}: {}", path.display(), err);
                std::process::exit(1);
            }
        },
        None => Logger::new(cli.log_level),
    };
    logger.set_console_output(!cli.quiet);

    if let Err(err) = run(&cli, &logger) {
        logger.error(&format!("Replay of {} failed: {}", cli.input.display(), err));
        std::process::exit(1);
    }
}

fn run(cli: &Cli, logger: &Logger) -> Result<(), Box<dyn std::error::Error>> {
    logger.info(&format!("Reading event log from {}", cli.input.display()));
    let file = File::open(&cli.input)?;

    let report = match App::new(BufReader::new(file), logger).process() {
        Ok(report) => report,
        Err(err) => {
            // nothing but the offending line reaches stdout
            if let Some(line) = err.offending_line() {
                println!("{}", line);
            }
            return Err(err.into());
        }
    };

    logger.info(&format!("Total revenue: {}", report.total_profit()));
    print!("{}", render(&report, cli.format)?);
    Ok(())
}

fn render(report: &Report, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(report.to_string()),
        OutputFormat::Json => report.to_json().map(|json| json + "\n"),
    }
}
