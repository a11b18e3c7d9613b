use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use zt_cli::commands::entries::AddArgs;
use zt_cli::commands::{catalog, entries, export, report, serve, timer};
use zt_cli::{Cli, Commands, Config, Session};
use zt_core::timestamp;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(zt_db::Database, Config, Session)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let session = config.session()?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = zt_db::Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok((db, config, session))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config, session) = open_database(cli.config.as_deref())?;
    let now = timestamp::now();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Serve { bind } => {
            let address = bind.as_deref().unwrap_or(&config.bind_address);
            serve::run(db, &session, address)?;
        }
        Commands::Start {
            refs,
            description,
            is_break,
        } => timer::start(
            &mut out,
            &mut db,
            &session,
            refs,
            description.clone(),
            *is_break,
            now,
        )?,
        Commands::Stop { id, description } => timer::stop(
            &mut out,
            &mut db,
            &session,
            id.as_deref(),
            description.as_deref(),
            now,
        )?,
        Commands::Status => timer::status(&mut out, &db, &session, now)?,
        Commands::Add {
            start,
            end,
            refs,
            description,
            is_break,
        } => {
            let args = AddArgs {
                start,
                end,
                refs,
                description: description.clone(),
                is_break: *is_break,
            };
            entries::add(&mut out, &mut db, &session, args, now)?;
        }
        Commands::Edit(args) => entries::edit(&mut out, &mut db, &session, args, now)?,
        Commands::Rm { id } => entries::remove(&mut out, &mut db, &session, id)?,
        Commands::List { period, json } => {
            entries::list(&mut out, &db, &session, period, *json, now)?;
        }
        Commands::Report { period, json } => {
            report::run(&mut out, &db, &session, period, *json, now)?;
        }
        Commands::Export {
            period,
            format,
            output,
        } => {
            let target = match output {
                Some(path) if path.as_os_str() == "-" => None,
                Some(path) => Some(path.clone()),
                None => export::default_output(format, &session, now),
            };
            if let Some(path) = target {
                let file = File::create(&path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                let mut file = BufWriter::new(file);
                export::run(&mut file, &db, &session, period, format, now)?;
                file.flush()?;
                eprintln!("Wrote {}", path.display());
            } else {
                export::run(&mut out, &db, &session, period, format, now)?;
            }
        }
        Commands::Stats { json } => report::stats(&mut out, &db, &session, *json, now)?,
        Commands::Project { id, name, color } => {
            catalog::project(&mut out, &mut db, id, name, color.as_deref())?;
        }
        Commands::Task { id, title } => catalog::task(&mut out, &mut db, id, title)?,
    }

    out.flush()?;
    Ok(())
}
