//! Directory-backed playback of narrative proposals.
//!
//! Each `*.json` file in a directory is one recorded proposal. Files are
//! served in file-name order, one per request, so a saved game can be
//! replayed deterministically without a live collaborator.
//!
//! ```bash
//! statecraft-engine save.json proposals/ 0
//! ```

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::infrastructure::ports::{NarrativeError, NarrativePort, NarrativeRequest};

pub struct ReplayNarrative {
    queue: Mutex<VecDeque<PathBuf>>,
}

impl ReplayNarrative {
    /// Queues every `*.json` file in `dir`, sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut files = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == "json")
            })
            .collect::<Vec<_>>();
        files.sort();
        tracing::debug!(dir = %dir.display(), count = files.len(), "Loaded replay proposals");
        Ok(Self::from_files(files))
    }

    pub fn from_files(files: Vec<PathBuf>) -> Self {
        Self {
            queue: Mutex::new(files.into()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    fn next_file(&self) -> Result<PathBuf, NarrativeError> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| NarrativeError::Transport("replay queue poisoned".to_string()))?;
        queue
            .pop_front()
            .ok_or_else(|| NarrativeError::Transport("no recorded proposals left".to_string()))
    }
}

#[async_trait]
impl NarrativePort for ReplayNarrative {
    async fn generate(&self, request: NarrativeRequest) -> Result<String, NarrativeError> {
        let path = self.next_file()?;
        tracing::debug!(
            file = %path.display(),
            date = %request.date,
            action = %request.action,
            "Replaying narrative proposal"
        );
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| NarrativeError::Transport(format!("{}: {}", path.display(), e)))
    }
}
