use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::comment::TaskComment;
use super::project::ProjectStatus;
use super::{Priority, UserSummary};
use crate::error::ApiError;
use crate::filter::SortDirection;
use crate::validation::{FieldErrors, Validate};

text_enum! {
    TaskStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    /// Status implied by the completion toggle
    pub fn for_completion(completed: bool) -> Self {
        if completed {
            TaskStatus::Completed
        } else {
            TaskStatus::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub project_id: Option<i32>,
    pub category_id: Option<i32>,
    pub assigned_to_id: Option<i32>,
    pub created_by_id: i32,
    pub parent_task_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: i32,
    pub name: String,
    pub status: ProjectStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i32,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: i32,
    pub title: String,
    pub status: TaskStatus,
}

/// Task joined with project, category and assignee display columns
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    #[sqlx(flatten)]
    pub task: Task,
    pub project_name: Option<String>,
    pub project_status: Option<ProjectStatus>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub assignee_first_name: Option<String>,
    pub assignee_last_name: Option<String>,
    pub assignee_email: Option<String>,
    pub assignee_avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListItem {
    #[serde(flatten)]
    pub task: Task,
    pub project: Option<ProjectRef>,
    pub category: Option<CategoryRef>,
    pub assigned_to: Option<UserSummary>,
}

impl From<TaskRow> for TaskListItem {
    fn from(row: TaskRow) -> Self {
        let project = match (row.task.project_id, row.project_name, row.project_status) {
            (Some(id), Some(name), Some(status)) => Some(ProjectRef { id, name, status }),
            _ => None,
        };
        let category = match (row.task.category_id, row.category_name, row.category_color) {
            (Some(id), Some(name), Some(color)) => Some(CategoryRef { id, name, color }),
            _ => None,
        };
        let assignee_id = row.task.assigned_to_id.filter(|_| row.assignee_first_name.is_some());
        Self {
            assigned_to: UserSummary::from_parts(
                assignee_id,
                row.assignee_first_name,
                row.assignee_last_name,
                row.assignee_email,
                row.assignee_avatar,
            ),
            project,
            category,
            task: row.task,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: i32,
    pub title: String,
    pub status: TaskStatus,
    pub completed: bool,
    pub assigned_to: Option<UserSummary>,
}

impl From<TaskListItem> for Subtask {
    fn from(item: TaskListItem) -> Self {
        Self {
            id: item.task.id,
            title: item.task.title,
            status: item.task.status,
            completed: item.task.completed,
            assigned_to: item.assigned_to,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskAttachment {
    pub id: i32,
    pub file_name: String,
    pub file_url: String,
    pub file_size: Option<i32>,
    pub mime_type: Option<String>,
    pub task_id: i32,
    pub uploaded_by_id: i32,
    pub created_at: DateTime<Utc>,
}

/// GET /tasks/:id payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    #[serde(flatten)]
    pub task: Task,
    pub project: Option<ProjectRef>,
    pub category: Option<CategoryRef>,
    pub assigned_to: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub parent_task: Option<TaskRef>,
    pub subtasks: Vec<Subtask>,
    pub comments: Vec<TaskComment>,
    pub attachments: Vec<TaskAttachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<i32>,
    pub project_id: Option<i32>,
    pub category_id: Option<i32>,
    pub assigned_to_id: Option<i32>,
    pub parent_task_id: Option<i32>,
}

impl Validate for CreateTaskRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.length("title", &self.title, 1, 255, "Title is required");
        errors.positive("estimatedHours", self.estimated_hours);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub category_id: Option<i32>,
    pub assigned_to_id: Option<i32>,
}

impl Validate for UpdateTaskRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional_length("title", self.title.as_deref(), 1, 255, "Title is required");
        errors.positive("estimatedHours", self.estimated_hours);
        errors.positive("actualHours", self.actual_hours);
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleCompleteRequest {
    pub completed: bool,
}

impl Validate for ToggleCompleteRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub enum TaskSortField {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "dueDate")]
    DueDate,
    #[serde(rename = "priority")]
    Priority,
    #[serde(rename = "title")]
    Title,
}

impl TaskSortField {
    pub fn column(&self) -> &'static str {
        match self {
            TaskSortField::CreatedAt => "t.created_at",
            TaskSortField::DueDate => "t.due_date",
            TaskSortField::Priority => "t.priority",
            TaskSortField::Title => "t.title",
        }
    }
}

/// GET /tasks query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub project_id: Option<i32>,
    pub category_id: Option<i32>,
    pub assigned_to_id: Option<i32>,
    pub created_by_id: Option<i32>,
    pub due_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub include_subtasks: Option<bool>,
    #[serde(default)]
    pub sort_by: TaskSortField,
    #[serde(default)]
    pub sort_order: SortDirection,
}

impl TaskQuery {
    pub fn include_subtasks(&self) -> bool {
        self.include_subtasks.unwrap_or(true)
    }

    /// `[dueDate 00:00 UTC, next day 00:00 UTC)`
    pub fn due_date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let day = self.due_date?;
        let start = day.and_hms_opt(0, 0, 0)?.and_utc();
        let end = day.succ_opt()?.and_hms_opt(0, 0, 0)?.and_utc();
        Some((start, end))
    }
}

/// GET /tasks/my-tasks query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyTasksQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttachmentRequest {
    pub file_name: String,
    pub file_url: String,
    pub file_size: Option<i32>,
    pub mime_type: Option<String>,
}

impl Validate for CreateAttachmentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.length("fileName", &self.file_name, 1, 255, "File name is required");
        errors.http_url("fileUrl", &self.file_url, "Valid file URL is required");
        errors.positive("fileSize", self.file_size);
        errors.finish()
    }
}
