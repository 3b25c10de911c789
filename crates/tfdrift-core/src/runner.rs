use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::errors::ValidatorError;
use crate::types::TerraformSchema;

/// Cooperative cancellation flag shared between the orchestrator, its
/// workers and in-flight terraform subprocesses.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Seam between the validation pipeline and the terraform toolchain. Both
/// operations must be idempotent per directory.
pub trait TerraformRunner: Send + Sync {
    fn init(&self, dir: &Path, cancellation: &CancellationToken) -> Result<(), ValidatorError>;

    fn schema(
        &self,
        dir: &Path,
        cancellation: &CancellationToken,
    ) -> Result<Arc<TerraformSchema>, ValidatorError>;
}

/// Shells out to the `terraform` binary, caching per-directory so repeated
/// calls never re-run `init` or re-fetch the schema document.
#[derive(Debug, Default)]
pub struct DefaultTerraformRunner {
    initialized: Mutex<HashSet<PathBuf>>,
    schemas: Mutex<HashMap<PathBuf, Arc<TerraformSchema>>>,
}

impl DefaultTerraformRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TerraformRunner for DefaultTerraformRunner {
    fn init(&self, dir: &Path, cancellation: &CancellationToken) -> Result<(), ValidatorError> {
        {
            let initialized = self.initialized.lock().unwrap();
            if initialized.contains(dir) {
                return Ok(());
            }
        }

        let output = run_terraform(dir, &["init"], cancellation)?;
        if !output.success {
            return Err(ValidatorError::Init {
                dir: dir.display().to_string(),
                message: output.combined(),
            });
        }

        self.initialized.lock().unwrap().insert(dir.to_path_buf());
        Ok(())
    }

    fn schema(
        &self,
        dir: &Path,
        cancellation: &CancellationToken,
    ) -> Result<Arc<TerraformSchema>, ValidatorError> {
        {
            let schemas = self.schemas.lock().unwrap();
            if let Some(schema) = schemas.get(dir) {
                return Ok(schema.clone());
            }
        }

        let output = run_terraform(dir, &["providers", "schema", "-json"], cancellation)?;
        if !output.success {
            return Err(ValidatorError::Schema {
                dir: dir.display().to_string(),
                message: output.combined(),
            });
        }

        let schema: TerraformSchema =
            serde_json::from_slice(&output.stdout).map_err(|e| ValidatorError::Schema {
                dir: dir.display().to_string(),
                message: format!("failed to decode schema document: {e}"),
            })?;

        let schema = Arc::new(schema);
        self.schemas.lock().unwrap().insert(dir.to_path_buf(), schema.clone());
        Ok(schema)
    }
}

#[derive(Debug)]
struct CommandOutput {
    success: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl CommandOutput {
    fn combined(&self) -> String {
        let mut message = String::from_utf8_lossy(&self.stderr).trim().to_string();
        if message.is_empty() {
            message = String::from_utf8_lossy(&self.stdout).trim().to_string();
        }
        message
    }
}

/// Runs a terraform subcommand, draining its pipes off-thread while polling
/// the cancellation token. A cancelled run kills the child process.
fn run_terraform(
    dir: &Path,
    args: &[&str],
    cancellation: &CancellationToken,
) -> Result<CommandOutput, ValidatorError> {
    if cancellation.is_cancelled() {
        return Err(ValidatorError::Cancelled);
    }

    let mut child = Command::new("terraform")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ValidatorError::io(dir, e))?;

    let stdout_reader = spawn_pipe_reader(child.stdout.take());
    let stderr_reader = spawn_pipe_reader(child.stderr.take());

    let status = wait_with_cancellation(&mut child, cancellation, dir)?;

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    Ok(CommandOutput { success: status, stdout, stderr })
}

fn spawn_pipe_reader<R>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}

fn wait_with_cancellation(
    child: &mut Child,
    cancellation: &CancellationToken,
    dir: &Path,
) -> Result<bool, ValidatorError> {
    loop {
        if cancellation.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ValidatorError::Cancelled);
        }
        match child.try_wait().map_err(|e| ValidatorError::io(dir, e))? {
            Some(status) => return Ok(status.success()),
            None => thread::sleep(Duration::from_millis(50)),
        }
    }
}

/// Removes everything `terraform init` left behind in a module directory.
pub fn cleanup_terraform_artifacts(dir: &Path) {
    let _ = std::fs::remove_dir_all(dir.join(".terraform"));
    let _ = std::fs::remove_file(dir.join("terraform.tfstate"));
    let _ = std::fs::remove_file(dir.join(".terraform.lock.hcl"));
}
