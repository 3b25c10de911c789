use std::path::PathBuf;
use std::thread;

use hiro_system_kit::slog;

use crate::config::ValidationConfig;
use crate::errors::ValidatorError;
use crate::parser;
use crate::runner::{cleanup_terraform_artifacts, TerraformRunner};
use crate::types::{Submodule, ValidationFinding};
use crate::validation::findings::deduplicate_findings;
use crate::validation::module_validator::validate_module;
use crate::Context;

/// Validates the root module and every submodule under `<root>/modules`,
/// then deduplicates the combined findings.
///
/// Root failures are fatal. Submodule validation runs on a bounded worker
/// pool; a failing submodule logs a warning and contributes zero findings so
/// it can never suppress a sibling's results. Cancellation skips jobs that
/// have not started yet, findings already collected are still returned.
/// Terraform artifacts are cleaned up for every module before returning.
pub fn validate_project(
    ctx: &Context,
    config: &ValidationConfig,
    runner: &dyn TerraformRunner,
) -> Result<Vec<ValidationFinding>, ValidatorError> {
    let root: PathBuf = std::fs::canonicalize(&config.root_dir)
        .map_err(|e| ValidatorError::io(&config.root_dir, e))?;

    let root_result = validate_module(ctx, &root, "", runner, config);
    let submodules = parser::find_submodules(&root.join("modules"));

    let mut findings = match root_result {
        Ok(findings) => findings,
        Err(e) => {
            cleanup_terraform_artifacts(&root);
            return Err(e);
        }
    };

    if !submodules.is_empty() {
        findings.extend(validate_submodules(ctx, config, runner, &submodules));
        for submodule in &submodules {
            cleanup_terraform_artifacts(&submodule.path);
        }
    }

    cleanup_terraform_artifacts(&root);

    Ok(deduplicate_findings(findings))
}

fn validate_submodules(
    ctx: &Context,
    config: &ValidationConfig,
    runner: &dyn TerraformRunner,
    submodules: &[Submodule],
) -> Vec<ValidationFinding> {
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(submodules.len())
        .max(1);

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<Submodule>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<Vec<ValidationFinding>>();

    for submodule in submodules {
        let _ = job_tx.send(submodule.clone());
    }
    drop(job_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok(submodule) = job_rx.recv() {
                    // every job reports exactly once, successful or not
                    if config.cancellation.is_cancelled() {
                        let _ = result_tx.send(Vec::new());
                        continue;
                    }
                    match validate_module(ctx, &submodule.path, &submodule.name, runner, config) {
                        Ok(found) => {
                            let _ = result_tx.send(found);
                        }
                        Err(e) => {
                            ctx.try_log(|logger| {
                                slog::warn!(
                                    logger,
                                    "failed to validate submodule {}: {}",
                                    submodule.name,
                                    e
                                )
                            });
                            let _ = result_tx.send(Vec::new());
                        }
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut findings = Vec::new();
    while let Ok(batch) = result_rx.recv() {
        findings.extend(batch);
    }
    findings
}
