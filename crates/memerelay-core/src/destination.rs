//! Persists the target destination as a `TARGET_CHAT_ID=` line in a `.env` file.

use crate::collab::DestinationStore;
use crate::error::DestinationStoreError;
use async_trait::async_trait;
use lazy_regex::regex;
use std::path::PathBuf;

const KEY: &str = "TARGET_CHAT_ID";

/// [`DestinationStore`] backed by a dotenv file.
#[derive(Debug, Clone)]
pub struct EnvFileDestinationStore {
    path: PathBuf,
}

impl EnvFileDestinationStore {
    /// Store writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Replaces or appends the destination line, leaving other lines alone.
#[must_use]
pub fn upsert_destination(content: &str, destination: &str) -> String {
    let line = format!("{KEY}={destination}");
    let re = regex!(r"(?m)^TARGET_CHAT_ID=.*$");
    if re.is_match(content) {
        re.replace(content, regex::NoExpand(&line)).into_owned()
    } else if content.is_empty() || content.ends_with('\n') {
        format!("{content}{line}\n")
    } else {
        format!("{content}\n{line}\n")
    }
}

fn read_destination(content: &str) -> Option<String> {
    regex!(r"(?m)^TARGET_CHAT_ID=(.*)$")
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl DestinationStore for EnvFileDestinationStore {
    async fn load(&self) -> Result<Option<String>, DestinationStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(read_destination(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, destination: &str) -> Result<(), DestinationStoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        tokio::fs::write(&self.path, upsert_destination(&content, destination)).await?;
        Ok(())
    }
}
