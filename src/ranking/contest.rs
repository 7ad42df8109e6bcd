use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ContestState {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<TaskInfo>,
    #[serde(default)]
    pub participants: Vec<ParticipantScores>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TaskInfo {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub max_score: f64,
    /// Where the source keeps the statement; meaningful to the source only.
    #[serde(default)]
    pub statement: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParticipantScores {
    pub username: String,
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

/// The owner of contest data. Scores arrive already computed.
#[async_trait]
pub trait ContestSource: Send + Sync {
    async fn load(&self) -> Result<ContestState>;

    /// Returns `None` if there is no statement at `locator`.
    async fn statement(&self, locator: &str) -> Result<Option<Vec<u8>>>;
}

/// Contest described by a TOML file that is re-read on every load, so that it can be edited
/// while the server is running. Statement locators are paths relative to the file.
pub struct FileContest {
    path: PathBuf,
}

impl FileContest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[async_trait]
impl ContestSource for FileContest {
    async fn load(&self) -> Result<ContestState> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read contest from {}", self.path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Contest file {} is invalid", self.path.display()))
    }

    async fn statement(&self, locator: &str) -> Result<Option<Vec<u8>>> {
        let path = self.base_dir().join(locator);
        match tokio::fs::read(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}
