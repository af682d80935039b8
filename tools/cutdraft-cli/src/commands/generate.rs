//! Worker mode: one request in, one JSON response out.

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use cutdraft_common::cancel::CancelFlag;
use cutdraft_common::config::EngineConfig;
use cutdraft_common::error::{DraftError, DraftResult};
use cutdraft_draft_engine::{respond, DraftEngine, GenerationOutcome};
use cutdraft_project_model::request::DraftRequest;

/// Exit status for a request abandoned on Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

/// Generate from a request file, or stdin when `path` is `-`.
pub async fn run_file(config: EngineConfig, path: &Path) -> ExitCode {
    match read_request(path) {
        Ok(raw) => run(config, &raw).await,
        Err(err) => finish(Err(err)),
    }
}

/// Generate from raw request JSON.
pub async fn run(config: EngineConfig, raw: &str) -> ExitCode {
    let cancel = CancelFlag::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling generation");
                cancel.cancel();
            }
        }
    });

    let engine = DraftEngine::with_system_probe(config);
    let result = match DraftRequest::from_json(raw) {
        Ok(request) => engine.generate(&request, &cancel).await,
        Err(err) => Err(err),
    };
    watcher.abort();
    finish(result)
}

fn read_request(path: &Path) -> DraftResult<String> {
    let read = if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw).map(|_| raw)
    } else {
        std::fs::read_to_string(path)
    };
    read.map_err(|e| DraftError::request(format!("cannot read {}: {e}", path.display())))
}

fn finish(result: DraftResult<GenerationOutcome>) -> ExitCode {
    println!("{}", respond(&result).to_json());
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            if !err.is_user_correctable() {
                tracing::error!(error = ?err, "Generation aborted");
            }
            eprintln!("cutdraft: {}: {err}", err.error_kind());
            match err {
                DraftError::Cancelled { .. } => ExitCode::from(EXIT_CANCELLED),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
