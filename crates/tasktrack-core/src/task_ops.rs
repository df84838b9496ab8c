use std::str::FromStr;

use chrono::Local;
use thiserror::Error;

use crate::task::{Priority, Status, Task, TIMESTAMP_FORMAT};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task description cannot be empty")]
    EmptyDescription,
    #[error("Task with ID {0} not found")]
    NotFound(u32),
    #[error("No task ids left to assign")]
    IdExhausted,
    #[error("Unknown sort key: {0} (expected id, priority, status or created)")]
    UnknownSortKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Priority,
    Status,
    Created,
}

impl FromStr for SortKey {
    type Err = TaskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "priority" => Ok(SortKey::Priority),
            "status" => Ok(SortKey::Status),
            "created" | "created-at" => Ok(SortKey::Created),
            _ => Err(TaskError::UnknownSortKey(value.to_string())),
        }
    }
}

pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Highest id plus one; `1` for an empty list. Ids of deleted tasks at the
/// end of the list are reused.
pub fn next_id(tasks: &[Task]) -> Result<u32, TaskError> {
    match tasks.iter().map(|task| task.id).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or(TaskError::IdExhausted),
    }
}

fn find_mut(tasks: &mut [Task], id: u32) -> Result<&mut Task, TaskError> {
    tasks
        .iter_mut()
        .find(|task| task.id == id)
        .ok_or(TaskError::NotFound(id))
}

fn require_description(description: &str) -> Result<(), TaskError> {
    if description.trim().is_empty() {
        return Err(TaskError::EmptyDescription);
    }
    Ok(())
}

pub fn add_task(
    tasks: &mut Vec<Task>,
    description: &str,
    priority: Priority,
    now: &str,
) -> Result<u32, TaskError> {
    require_description(description)?;
    let id = next_id(tasks)?;
    tasks.push(Task::new(id, description, priority, now));
    Ok(id)
}

pub fn update_description(
    tasks: &mut [Task],
    id: u32,
    description: &str,
    now: &str,
) -> Result<(), TaskError> {
    require_description(description)?;
    let task = find_mut(tasks, id)?;
    task.description = description.to_string();
    task.touch(now);
    Ok(())
}

pub fn delete_task(tasks: &mut Vec<Task>, id: u32) -> Result<Task, TaskError> {
    let idx = tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or(TaskError::NotFound(id))?;
    Ok(tasks.remove(idx))
}

pub fn set_status(tasks: &mut [Task], id: u32, status: Status, now: &str) -> Result<(), TaskError> {
    let task = find_mut(tasks, id)?;
    task.status = status;
    task.touch(now);
    Ok(())
}

pub fn set_priority(
    tasks: &mut [Task],
    id: u32,
    priority: Priority,
    now: &str,
) -> Result<(), TaskError> {
    let task = find_mut(tasks, id)?;
    task.priority = priority;
    task.touch(now);
    Ok(())
}

pub fn filter_by_status(tasks: &[Task], status: Option<Status>) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| match status {
            Some(wanted) => task.status == wanted,
            None => true,
        })
        .collect()
}

fn status_rank(status: Status) -> u8 {
    match status {
        Status::Todo => 0,
        Status::InProgress => 1,
        Status::Done => 2,
    }
}

pub fn sort_tasks(mut tasks: Vec<&Task>, key: SortKey) -> Vec<&Task> {
    match key {
        SortKey::Id => tasks.sort_by_key(|task| task.id),
        SortKey::Priority => {
            tasks.sort_by_key(|task| (std::cmp::Reverse(task.priority.weight()), task.id))
        }
        SortKey::Status => tasks.sort_by_key(|task| (status_rank(task.status), task.id)),
        SortKey::Created => tasks.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
    }
    tasks
}
