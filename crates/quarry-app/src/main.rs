//! The binary entry point for the quarry importer.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use quarry_app::{EditSession, PlatformDirs, TerminalProgress, report, runner};
use quarry_config::{CliArgs, Config};
use quarry_import::{NoProgress, ProgressSink};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = match &args.config {
        Some(dir) => PlatformDirs::with_config_dir(dir),
        None => match PlatformDirs::resolve() {
            Ok(dirs) => dirs,
            Err(e) => {
                eprintln!("Failed to resolve platform directories: {e}");
                return ExitCode::FAILURE;
            }
        },
    };
    if let Err(e) = dirs.create_dirs() {
        eprintln!("Failed to create platform directories: {e}");
        return ExitCode::FAILURE;
    }

    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ignoring unreadable config in {}: {e}", dirs.config_dir.display());
            Config::default()
        }
    };
    config.apply_cli_overrides(&args);

    if let Some(path) = quarry_log::init_logging(Some(&dirs.log_dir), Some(&config)) {
        tracing::debug!(path = %path.display(), "writing JSON log");
    }

    let pipeline = runner::pipeline_for(&config, runner::interrupt_token());

    let mut terminal = TerminalProgress::new(std::io::stderr());
    let mut silent = NoProgress;
    let sink: &mut dyn ProgressSink = if config.import.show_progress {
        &mut terminal
    } else {
        &mut silent
    };

    let outcome = pipeline.run(&args.path, sink);
    terminal.finish();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            if !e.is_cancelled() {
                tracing::error!(error = %e, "import failed");
                eprintln!("error: {e}");
            }
            return ExitCode::from(runner::exit_status(&e));
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let printed = report::write_summary(&mut out, &result).and_then(|()| {
        if args.list_blocks {
            writeln!(out, "Block types:")?;
            report::write_block_list(&mut out, result.registry())?;
        }
        Ok(())
    });
    if let Err(e) = printed {
        tracing::warn!(error = %e, "failed to print import summary");
    }

    let mut session = EditSession::new();
    if let Err(e) = result.paste_into(&mut session) {
        tracing::error!(error = %e, "paste failed");
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
