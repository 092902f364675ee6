//! Joern usage slicing integration
//!
//! Optional enrichment: when a Joern CLI installation can be found,
//! the target project is converted to a code property graph with
//! `php2cpg` and sliced with `joern-slice` to recover usage lines for
//! the target location. The integration is strictly best-effort; any
//! failure leaves the analysis with an empty usage list.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
const CPG_FILE_NAME: &str = "function_analysis.bin";

#[derive(Debug, thiserror::Error)]
pub enum JoernError {
    #[error("Joern CLI tools not found")]
    NotInstalled,

    #[error("CPG generation failed: {0}")]
    CpgGeneration(String),

    #[error("Joern execution timed out after {0} seconds")]
    Timeout(u64),

    #[error("Joern I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Provides usage lines for a target file/line position.
#[async_trait]
pub trait UsageProvider: Send + Sync {
    async fn usages(
        &self,
        src_dir: &Path,
        file: &Path,
        line: u32,
    ) -> Result<Vec<String>, JoernError>;
}

/// Used when no Joern installation is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledUsageProvider;

#[async_trait]
impl UsageProvider for DisabledUsageProvider {
    async fn usages(
        &self,
        _src_dir: &Path,
        _file: &Path,
        _line: u32,
    ) -> Result<Vec<String>, JoernError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Clone)]
pub struct JoernConfig {
    pub joern_dir: PathBuf,
    pub timeout: Duration,
}

/// Drives `php2cpg` and `joern-slice` from a Joern CLI directory.
#[derive(Debug, Clone)]
pub struct JoernSlicer {
    config: JoernConfig,
}

impl JoernSlicer {
    pub fn with_config(config: JoernConfig) -> Self {
        Self { config }
    }

    /// Probe the conventional installation locations: a `joern`
    /// checkout next to the working directory, `$JOERN_DIR`, then
    /// `/opt/joern`.
    pub fn detect() -> Option<Self> {
        let mut candidates = vec![PathBuf::from("./joern/joern-cli")];
        if let Ok(dir) = std::env::var("JOERN_DIR") {
            candidates.push(PathBuf::from(dir));
        }
        candidates.push(PathBuf::from("/opt/joern"));

        candidates
            .into_iter()
            .find(|dir| dir.is_dir())
            .map(|joern_dir| {
                debug!(joern_dir = %joern_dir.display(), "Detected Joern installation");
                Self::with_config(JoernConfig {
                    joern_dir,
                    timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
                })
            })
    }

    /// The usage provider for this environment: a real slicer when an
    /// installation is detected, otherwise the disabled stub.
    pub fn detect_provider() -> Box<dyn UsageProvider> {
        match Self::detect() {
            Some(slicer) => Box::new(slicer),
            None => {
                debug!("No Joern installation found, usage slicing disabled");
                Box::new(DisabledUsageProvider)
            }
        }
    }

    async fn run_bounded(&self, mut command: Command) -> Result<std::process::Output, JoernError> {
        // Grace period past the configured timeout for teardown.
        let bound = self.config.timeout + Duration::from_secs(10);
        match tokio::time::timeout(bound, command.output()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(JoernError::Timeout(self.config.timeout.as_secs())),
        }
    }

    async fn generate_cpg(&self, src_dir: &Path, cpg_path: &Path) -> Result<(), JoernError> {
        let php2cpg = self.config.joern_dir.join("php2cpg");
        if !php2cpg.exists() {
            return Err(JoernError::NotInstalled);
        }

        let mut command = Command::new(&php2cpg);
        command.arg(src_dir).arg("-o").arg(cpg_path);
        let output = self.run_bounded(command).await?;
        if !output.status.success() {
            return Err(JoernError::CpgGeneration(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UsageProvider for JoernSlicer {
    #[instrument(skip(self), fields(src_dir = %src_dir.display(), file = %file.display(), line))]
    async fn usages(
        &self,
        src_dir: &Path,
        file: &Path,
        line: u32,
    ) -> Result<Vec<String>, JoernError> {
        let joern_slice = self.config.joern_dir.join("joern-slice");
        if !joern_slice.exists() {
            return Err(JoernError::NotInstalled);
        }

        let workspace = tempfile::tempdir()?;
        let cpg_path = workspace.path().join(CPG_FILE_NAME);
        self.generate_cpg(src_dir, &cpg_path).await?;

        let mut command = Command::new(&joern_slice);
        command
            .arg("usages")
            .arg(&cpg_path)
            .arg("--file")
            .arg(file)
            .arg("--line")
            .arg(line.to_string());
        let output = self.run_bounded(command).await?;

        if !output.status.success() {
            debug!(
                status = %output.status,
                "joern-slice returned failure, treating as no usages"
            );
            return Ok(Vec::new());
        }

        let usages: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        debug!(count = usages.len(), "Collected Joern usage lines");
        Ok(usages)
    }
}

/// Run the provider, folding every failure into an empty usage list.
pub async fn usages_best_effort(
    provider: &dyn UsageProvider,
    src_dir: &Path,
    file: &Path,
    line: u32,
) -> Vec<String> {
    match provider.usages(src_dir, file, line).await {
        Ok(usages) => usages,
        Err(error) => {
            warn!(%error, "Usage slicing unavailable, continuing without usages");
            Vec::new()
        }
    }
}
