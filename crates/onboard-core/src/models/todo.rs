use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::{id_string, opt_id_string};
use crate::validation::{validate_task_name, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub task_name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub employee_id: Option<String>,
}

impl Todo {
    /// Due moment formatted for display, e.g. `2024-03-01 09:30`.
    pub fn due_display(&self) -> String {
        match (self.date, self.time) {
            (Some(d), Some(t)) => format!("{} {}", d.format("%Y-%m-%d"), t.format("%H:%M")),
            (Some(d), None) => d.format("%Y-%m-%d").to_string(),
            _ => String::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.completed || self.is_done
    }
}

/// Body sent when creating or updating a task.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodoDraft {
    pub task_name: String,
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_time")]
    pub time: NaiveTime,
    pub completed: bool,
    pub is_done: bool,
    pub employee_id: String,
}

fn serialize_time<S: serde::Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.format("%H:%M:%S").to_string())
}

impl TodoDraft {
    /// New, unfinished task due at `due`. Date and time are both taken from
    /// the UTC instant; sub-second precision is dropped.
    pub fn new(
        task_name: &str,
        due: DateTime<Utc>,
        employee_id: &str,
    ) -> Result<Self, ValidationError> {
        validate_task_name(task_name)?;
        let time = due.time();
        Ok(Self {
            task_name: task_name.trim().to_string(),
            date: due.date_naive(),
            time: time.with_nanosecond(0).unwrap_or(time),
            completed: false,
            is_done: false,
            employee_id: employee_id.to_string(),
        })
    }

    /// Edit of an existing task, keeping its finished flags.
    pub fn edit(
        existing: &Todo,
        task_name: &str,
        due: DateTime<Utc>,
        employee_id: &str,
    ) -> Result<Self, ValidationError> {
        let mut draft = Self::new(task_name, due, employee_id)?;
        draft.completed = existing.completed;
        draft.is_done = existing.is_done;
        Ok(draft)
    }

    /// Copy of an existing task with its finished flags flipped.
    pub fn toggled(existing: &Todo, employee_id: &str) -> Self {
        let done = !existing.is_finished();
        Self {
            task_name: existing.task_name.clone(),
            date: existing.date.unwrap_or_else(|| Utc::now().date_naive()),
            time: existing.time.unwrap_or(NaiveTime::MIN),
            completed: done,
            is_done: done,
            employee_id: employee_id.to_string(),
        }
    }
}
