use thiserror::Error;
use tracing::warn;

use crate::storage::{load_tasks, save_tasks, Storage, StorageError};
use crate::task::Task;
use crate::task_ops::TaskError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// One load -> change -> save cycle over an injected storage port.
#[derive(Debug)]
pub struct Tracker<S> {
    storage: S,
}

impl<S: Storage> Tracker<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Loads the current list. Unreadable records are logged and left out;
    /// the next save drops them from storage.
    pub fn tasks(&self) -> Result<Vec<Task>, StorageError> {
        let decoded = load_tasks(&self.storage)?;
        for warning in &decoded.warnings {
            warn!("{}", warning);
        }
        Ok(decoded.tasks)
    }

    /// Applies `change` under the storage lock and saves only if it succeeds.
    pub fn mutate<T, F>(&self, change: F) -> Result<T, TrackerError>
    where
        F: FnOnce(&mut Vec<Task>) -> Result<T, TaskError>,
    {
        let _lock = self.storage.lock()?;
        let mut tasks = self.tasks()?;
        let value = change(&mut tasks)?;
        save_tasks(&self.storage, &tasks)?;
        Ok(value)
    }
}
