#[cfg(not(feature = "cli"))]
compile_error!("The `smsdb` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Arc;

use palmsms::cli;
use palmsms::cli::app::{Cli, ColorMode, Commands};
use palmsms::util::audit::AuditLogger;
use palmsms::SmsError;

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, SmsError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| SmsError::Io(format!("Cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let audit_logger: Option<Arc<AuditLogger>> = match &cli.audit_log {
        Some(path) => {
            let logger = match AuditLogger::open(path) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            let args: Vec<String> = std::env::args().collect();
            let _ = logger.start_session(args);
            Some(Arc::new(logger))
        }
        None => None,
    };

    let result = match cli.command {
        Commands::Info { file, json } => {
            cli::info::execute(&cli::info::InfoOptions { file, json }, &mut writer)
        }

        Commands::List { file, folder, json } => cli::list::execute(
            &cli::list::ListOptions { file, folder, json },
            &mut writer,
        ),

        Commands::Show { file, record, json } => cli::show::execute(
            &cli::show::ShowOptions { file, record, json },
            &mut writer,
        ),

        Commands::Dump { file, record, raw } => cli::dump::execute(
            &cli::dump::DumpOptions { file, record, raw },
            &mut writer,
        ),

        Commands::Export {
            file,
            format,
            folder,
        } => cli::export::execute(
            &cli::export::ExportOptions {
                file,
                format,
                folder,
            },
            &mut writer,
        ),

        Commands::Verify {
            file,
            verbose,
            json,
        } => cli::verify::execute(
            &cli::verify::VerifyOptions {
                file,
                verbose,
                json,
            },
            &mut writer,
        ),

        Commands::Repack {
            file,
            out,
            no_backup,
            dry_run,
            force,
            json,
        } => cli::repack::execute(
            &cli::repack::RepackOptions {
                file,
                out,
                no_backup,
                dry_run,
                force,
                json,
                audit_logger: audit_logger.clone(),
            },
            &mut writer,
        ),

        Commands::Add {
            file,
            phone,
            text,
            name,
            first_name,
            folder,
            timestamp,
            no_backup,
            json,
        } => cli::add::execute(
            &cli::add::AddOptions {
                file,
                phone,
                text,
                name,
                first_name,
                folder,
                timestamp,
                no_backup,
                json,
                audit_logger: audit_logger.clone(),
            },
            &mut writer,
        ),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "smsdb", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Some(ref logger) = audit_logger {
        let _ = logger.end_session();
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
