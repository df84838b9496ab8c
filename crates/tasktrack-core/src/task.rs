use std::fmt;
use std::str::FromStr;

use colored::Colorize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u32,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn new(id: u32, description: impl Into<String>, priority: Priority, now: &str) -> Self {
        Self {
            id,
            description: description.into(),
            status: Status::default(),
            priority,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    pub fn touch(&mut self, now: &str) {
        self.updated_at = now.to_string();
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    #[error("Unknown status: {0} (expected todo, in-progress or done)")]
    Status(String),
    #[error("Unknown priority: {0} (expected high, medium or low)")]
    Priority(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = LabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| LabelError::Status(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tint {
    Red,
    Yellow,
    Green,
}

struct PriorityInfo {
    priority: Priority,
    label: &'static str,
    weight: u8,
    display: &'static str,
    tint: Tint,
}

static PRIORITIES: [PriorityInfo; 3] = [
    PriorityInfo {
        priority: Priority::High,
        label: "high",
        weight: 3,
        display: "HIGH",
        tint: Tint::Red,
    },
    PriorityInfo {
        priority: Priority::Medium,
        label: "medium",
        weight: 2,
        display: "MED",
        tint: Tint::Yellow,
    },
    PriorityInfo {
        priority: Priority::Low,
        label: "low",
        weight: 1,
        display: "LOW",
        tint: Tint::Green,
    },
];

impl Priority {
    fn info(self) -> &'static PriorityInfo {
        // Every variant has exactly one row.
        match self {
            Priority::High => &PRIORITIES[0],
            Priority::Medium => &PRIORITIES[1],
            Priority::Low => &PRIORITIES[2],
        }
    }

    pub fn as_str(self) -> &'static str {
        self.info().label
    }

    /// Sort weight; higher is more urgent.
    pub fn weight(self) -> u8 {
        self.info().weight
    }

    /// Short label shown in task listings.
    pub fn label(self, style: DisplayStyle) -> String {
        let info = self.info();
        match style {
            DisplayStyle::Plain => info.display.to_string(),
            DisplayStyle::Decorated => match info.tint {
                Tint::Red => info.display.red().to_string(),
                Tint::Yellow => info.display.yellow().to_string(),
                Tint::Green => info.display.green().to_string(),
            },
        }
    }

    /// Lenient lookup used when reading stored records: anything unknown is `medium`.
    pub fn from_label_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|label| label.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = LabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        PRIORITIES
            .iter()
            .find(|info| info.label.eq_ignore_ascii_case(needle))
            .map(|info| info.priority)
            .ok_or_else(|| LabelError::Priority(value.to_string()))
    }
}

/// How labels are rendered at the output boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    Plain,
    #[default]
    Decorated,
}
