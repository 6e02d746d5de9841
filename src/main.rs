use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, metadata::LevelFilter, Level};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

mod config;
mod enrollment;
mod error;
mod history;
mod import;
mod ledger;
mod models;
mod report;
mod roster;
mod school;
mod shell;
mod waitlist;

use config::SchoolConfig;
use school::School;
use shell::Shell;

const LOG_ENV: &str = "SCHOOL_LOG";

#[derive(Parser)]
#[command(name = "school-roster")]
#[command(about = "In-memory school roster: enrolment, waitlist, grades and reports", long_about = None)]
struct Cli {
    /// Seats per automatically created class
    #[arg(long)]
    capacity: Option<usize>,
    /// Domain used for generated e-mail addresses
    #[arg(long)]
    email_domain: Option<String>,
    /// Log level written to stderr (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<Level>,
    /// Start the session with a demo roster
    #[arg(long)]
    seed: bool,
    /// Register teachers from a CSV file (id,name,department)
    #[arg(long)]
    teachers: Option<PathBuf>,
    /// Enroll students from a CSV file (id,name,grade_level)
    #[arg(long)]
    students: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session reading commands from stdin
    Shell,
    /// Execute the commands of a script file, then exit
    Run {
        #[arg(long)]
        script: PathBuf,
    },
}

fn init_logging(level: Option<Level>) {
    let level = level
        .or_else(|| std::env::var(LOG_ENV).ok()?.parse().ok())
        .unwrap_or(Level::WARN);

    let fmt = fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(fmt)
        .with(LevelFilter::from_level(level))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let config = SchoolConfig::from_env()
        .context("invalid school configuration")?
        .with_overrides(cli.capacity, cli.email_domain);
    info!(
        "session starting: {} seats per class, domain {}",
        config.class_capacity, config.email_domain
    );
    let mut school = School::new(config);

    if cli.seed {
        import::seed(&mut school).context("failed to load demo roster")?;
        println!("Demo roster loaded.");
    }
    if let Some(path) = &cli.teachers {
        let summary = import::import_teachers(&mut school, path)?;
        println!(
            "Registered {} teachers from {} ({} skipped).",
            summary.imported,
            path.display(),
            summary.skipped
        );
    }
    if let Some(path) = &cli.students {
        let summary = import::import_students(&mut school, path)?;
        println!(
            "Enrolled {} students from {} ({} skipped).",
            summary.imported,
            path.display(),
            summary.skipped
        );
    }

    let stdout = std::io::stdout();
    let mut shell = Shell::new(school, stdout.lock());

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            println!("Type 'help' for commands, 'quit' to leave. State is lost on exit.");
            let stdin = std::io::stdin();
            shell.run(stdin.lock(), true)?;
        }
        Commands::Run { script } => {
            shell.run_script(&script)?;
        }
    }

    let (school, _) = shell.into_parts();
    info!(
        "session ended: {} classes, {} students waiting, {} undoable changes discarded",
        school.roster.classes().len(),
        school.waitlist.len(),
        school.history.len()
    );
    Ok(())
}
