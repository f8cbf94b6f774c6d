use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{info, warn};

use freightdb::catalog;
use freightdb::config::{self, Config};
use freightdb::core::db::connection::{mask_connection_string, probe, PgExecutor};
use freightdb::core::Result;
use freightdb::report;
use freightdb::runner::{RunnerOptions, ScriptRunner};
use freightdb::script::Script;

const USAGE: &str = "Usage: freightdb [check] [OPTIONS]

Bootstraps and inspects the freight brokerage Postgres database.

Commands:
  (none)             run the schema script
  check              probe connectivity and report tables and row counts

Options:
  --seed             run the seed script after the schema script
  --reset            drop the manifest tables and views before the schema script
  --atomic           wrap each script in one transaction, rolling back on failure
  --json             additionally emit reports as JSON lines
  --config <path>    read configuration from <path> instead of freightdb.toml
  --schema <path>    override the schema script location
  --seed-file <path> override the seed script location
  -h, --help         print this help

The connection string comes from DATABASE_URL (a .env file is honored)
or from database.url in the config file.";

#[derive(Debug, Default)]
struct CliOptions {
    check: bool,
    seed: bool,
    reset: bool,
    atomic: bool,
    json: bool,
    config_path: Option<PathBuf>,
    schema_path: Option<PathBuf>,
    seed_path: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> std::result::Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "check" => options.check = true,
            "--seed" => options.seed = true,
            "--reset" => options.reset = true,
            "--atomic" => options.atomic = true,
            "--json" => options.json = true,
            "--config" => {
                options.config_path = Some(path_value(&mut iter, "--config")?);
            }
            "--schema" => {
                options.schema_path = Some(path_value(&mut iter, "--schema")?);
            }
            "--seed-file" => {
                options.seed_path = Some(path_value(&mut iter, "--seed-file")?);
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }

    Ok(options)
}

fn path_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> std::result::Result<PathBuf, String> {
    iter.next()
        .map(PathBuf::from)
        .ok_or_else(|| format!("{} requires a path argument", flag))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize the logging system using tracing subscriber
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match run(options).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(options: CliOptions) -> Result<bool> {
    let file = config::discover_config_file(options.config_path.as_deref())?;
    let mut cfg = config::resolve(file, std::env::var("DATABASE_URL").ok())?;
    if options.atomic {
        cfg.atomic = true;
    }
    if let Some(path) = &options.schema_path {
        cfg.schema_script = path.clone();
    }
    if let Some(path) = &options.seed_path {
        cfg.seed_script = path.clone();
    }

    info!("starting freightdb");
    println!(
        "Connecting to {}",
        mask_connection_string(&cfg.connection_string)
    );

    let mut executor = PgExecutor::connect(&cfg.connection_string).await?;
    let server = probe(&mut executor).await?;
    println!(
        "Connected, server time {} ({})",
        server.server_time,
        short_version(&server.version)
    );

    let ok = if options.check {
        check(&mut executor, &cfg, options.json).await?
    } else {
        migrate(&mut executor, &cfg, &options).await?
    };

    executor.close().await?;
    Ok(ok)
}

async fn migrate(executor: &mut PgExecutor, cfg: &Config, options: &CliOptions) -> Result<bool> {
    if options.reset {
        println!(
            "Dropping {} tables and {} views",
            cfg.manifest.tables.len(),
            cfg.manifest.views.len()
        );
        catalog::drop_objects(executor, &cfg.manifest).await?;
        println!("Schema objects dropped");
    }

    let runner = ScriptRunner::new(RunnerOptions {
        statement_timeout: cfg.statement_timeout,
        atomic: cfg.atomic,
    });

    let schema = Script::load(&cfg.schema_script)?;
    let schema_report = runner.run_script(executor, &schema).await?;
    print!("{}", report::render_run(&schema_report));
    if options.json {
        println!("{}", report::json_line("run_report", &schema_report)?);
    }
    if !schema_report.is_success() {
        return Ok(false);
    }

    // Verification is informational; a mismatch or a catalog query error
    // never fails the run.
    match catalog::verify_tables(executor, &cfg.manifest.tables).await {
        Ok(verify) => {
            print!("{}", report::render_verify(&verify));
            if !verify.is_complete() {
                warn!("missing tables: {}", verify.missing.join(", "));
            }
            if options.json {
                println!("{}", report::json_line("verify_report", &verify)?);
            }
        }
        Err(e) => warn!("table verification failed: {}", e),
    }

    if options.seed {
        let seed = Script::load(&cfg.seed_script)?;
        let seed_report = runner.run_script(executor, &seed).await?;
        print!("{}", report::render_run(&seed_report));
        if options.json {
            println!("{}", report::json_line("run_report", &seed_report)?);
        }
        if !seed_report.is_success() {
            return Ok(false);
        }
    }

    // Row counts assume the schema exists; a failure here is reported,
    // not fatal.
    match catalog::count_rows(executor, &cfg.manifest.tables).await {
        Ok(counts) => {
            print!("{}", report::render_counts(&counts));
            if options.json {
                println!("{}", report::json_line("row_counts", &counts)?);
            }
        }
        Err(e) => warn!("row count query failed: {}", e),
    }

    println!("Migration complete");
    if !options.seed {
        println!("Tip: run with --seed to load sample data");
    }
    Ok(true)
}

async fn check(executor: &mut PgExecutor, cfg: &Config, json: bool) -> Result<bool> {
    let verify = catalog::verify_tables(executor, &cfg.manifest.tables).await?;
    if verify.found.is_empty() {
        println!("No tables found. Run freightdb to create the schema.");
    } else {
        print!("{}", report::render_verify(&verify));
    }
    if json {
        println!("{}", report::json_line("verify_report", &verify)?);
    }

    match catalog::count_rows(executor, &cfg.manifest.tables).await {
        Ok(counts) => {
            print!("{}", report::render_counts(&counts));
            if json {
                println!("{}", report::json_line("row_counts", &counts)?);
            }
        }
        Err(_) => println!("Could not count rows (schema may not be created yet)"),
    }

    Ok(true)
}

/// First two words of `version()`, e.g. "PostgreSQL 16.2".
fn short_version(version: &str) -> String {
    version.split(' ').take(2).collect::<Vec<_>>().join(" ")
}
