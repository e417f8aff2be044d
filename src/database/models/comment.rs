use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UserSummary;
use crate::error::ApiError;
use crate::validation::{FieldErrors, Validate};

/// Comment row plus the author's display columns
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: i32,
    pub content: String,
    pub parent_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_first_name: Option<String>,
    pub author_last_name: Option<String>,
    pub author_avatar: Option<String>,
}

impl CommentRow {
    fn author(&self) -> Option<UserSummary> {
        let id = self.author_first_name.as_ref().map(|_| self.user_id);
        UserSummary::from_parts(
            id,
            self.author_first_name.clone(),
            self.author_last_name.clone(),
            None,
            self.author_avatar.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub id: i32,
    pub content: String,
    pub task_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Option<UserSummary>,
}

impl From<CommentRow> for TaskComment {
    fn from(row: CommentRow) -> Self {
        Self {
            user: row.author(),
            id: row.id,
            content: row.content,
            task_id: row.parent_id,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectComment {
    pub id: i32,
    pub content: String,
    pub project_id: i32,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: Option<UserSummary>,
}

impl From<CommentRow> for ProjectComment {
    fn from(row: CommentRow) -> Self {
        Self {
            user: row.author(),
            id: row.id,
            content: row.content,
            project_id: row.parent_id,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Body of comment create and edit requests
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

impl Validate for CommentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.length("content", &self.content, 1, usize::MAX, "Comment content is required");
        errors.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comment_is_rejected() {
        assert!(CommentRequest { content: "   ".into() }.validate().is_err());
        assert!(CommentRequest { content: "Looks good".into() }.validate().is_ok());
    }

    #[test]
    fn row_maps_author_summary() {
        let now = Utc::now();
        let row = CommentRow {
            id: 1,
            content: "hi".into(),
            parent_id: 9,
            user_id: 4,
            created_at: now,
            updated_at: now,
            author_first_name: Some("Ada".into()),
            author_last_name: Some("Lovelace".into()),
            author_avatar: None,
        };
        let comment = TaskComment::from(row);
        assert_eq!(comment.task_id, 9);
        assert_eq!(comment.user.unwrap().name, "Ada Lovelace");
    }
}
