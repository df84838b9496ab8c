use crate::task::{DisplayStyle, Status, Task};

pub const DEFAULT_DESCRIPTION_WIDTH: usize = 20;
const RULE_WIDTH: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct ListView {
    pub filter: Option<Status>,
    pub style: DisplayStyle,
    pub description_width: usize,
}

impl Default for ListView {
    fn default() -> Self {
        Self {
            filter: None,
            style: DisplayStyle::default(),
            description_width: DEFAULT_DESCRIPTION_WIDTH,
        }
    }
}

/// Shortens `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    format!("{}...", text.chars().take(keep).collect::<String>())
}

pub fn render_task_line(task: &Task, view: &ListView) -> String {
    let description = task.description.replace(|c: char| c.is_control(), " ");
    format!(
        "{}\t{:<12}\t{}\t{:<width$}\t{}\t{}",
        task.id,
        task.status.as_str(),
        task.priority.label(view.style),
        truncate(&description, view.description_width),
        task.created_at,
        task.updated_at,
        width = view.description_width
    )
}

pub fn render_task_table(tasks: &[&Task], view: &ListView) -> String {
    let suffix = view.filter.map(|status| status.as_str());
    if tasks.is_empty() {
        return match suffix {
            Some(status) => format!("No tasks found with status: {}\n", status),
            None => "No tasks found\n".to_string(),
        };
    }

    let mut out = String::new();
    match suffix {
        Some(status) => out.push_str(&format!("Tasks ({}):\n", status)),
        None => out.push_str("Tasks:\n"),
    }
    out.push_str("ID\tStatus\t\tPriority\tDescription\t\tCreated\t\t\tUpdated\n");
    out.push_str(&"─".repeat(RULE_WIDTH));
    out.push('\n');
    for task in tasks {
        out.push_str(&render_task_line(task, view));
        out.push('\n');
    }
    out
}

pub fn tasks_to_json(tasks: &[&Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tasks)
}
