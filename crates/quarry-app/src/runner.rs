//! Wiring between the command line and the import pipeline.

use quarry_config::Config;
use quarry_construction::ConstructionOpener;
use quarry_import::{CancelToken, DimensionPolicy, ImportError, ImportPipeline};

/// Exit status for a run the user aborted.
pub const EXIT_CANCELLED: u8 = 130;

/// Exit status for any other failed run.
pub const EXIT_FAILED: u8 = 1;

/// Builds the pipeline the configuration asks for, stopping early once
/// `cancel` is set.
pub fn pipeline_for(config: &Config, cancel: CancelToken) -> ImportPipeline<ConstructionOpener> {
    let policy = match &config.import.dimension {
        Some(name) => DimensionPolicy::Named(name.clone()),
        None => DimensionPolicy::First,
    };
    ImportPipeline::new(ConstructionOpener)
        .with_dimension_policy(policy)
        .with_cancel_token(cancel)
}

/// Returns a token that the first Ctrl-C cancels. A second Ctrl-C exits
/// immediately.
///
/// Can only be installed once per process; later calls still return a
/// token, which is then never cancelled.
pub fn interrupt_token() -> CancelToken {
    let token = CancelToken::new();
    let handle = token.clone();
    let installed = ctrlc::set_handler(move || {
        if handle.is_cancelled() {
            std::process::exit(i32::from(EXIT_CANCELLED));
        }
        handle.cancel();
    });
    if let Err(e) = installed {
        tracing::warn!(error = %e, "Ctrl-C handler not installed, import cannot be interrupted");
    }
    token
}

/// Process exit status for a failed run.
pub fn exit_status(err: &ImportError) -> u8 {
    if err.is_cancelled() {
        EXIT_CANCELLED
    } else {
        EXIT_FAILED
    }
}
