use std::path::PathBuf;

use crate::runner::CancellationToken;

/// Options for a full validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationConfig {
    pub root_dir: PathBuf,
    pub excluded_resources: Vec<String>,
    pub excluded_data_sources: Vec<String>,
    pub cancellation: CancellationToken,
}

impl ValidationConfig {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        ValidationConfig { root_dir: root_dir.into(), ..Default::default() }
    }

    pub fn with_excluded_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_resources.extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn with_excluded_data_sources<I, S>(mut self, data_sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_data_sources.extend(data_sources.into_iter().map(Into::into));
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}
