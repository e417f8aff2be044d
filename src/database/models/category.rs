use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ApiError;
use crate::validation::{FieldErrors, Validate};

pub const DEFAULT_COLOR: &str = "#3B82F6";

/// A category with `user_id = None` is global
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    pub user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCounts {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub category: Category,
    pub task_count: i64,
    pub completed_task_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub is_global: bool,
}

impl Validate for CreateCategoryRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.length("name", &self.name, 1, 100, "Category name is required");
        if let Some(color) = &self.color {
            errors.hex_color("color", color);
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}

impl Validate for UpdateCategoryRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional_length("name", self.name.as_deref(), 1, 100, "Category name is required");
        if let Some(color) = &self.color {
            errors.hex_color("color", color);
        }
        errors.finish()
    }
}

/// GET /categories query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    pub include_global: Option<bool>,
    pub search: Option<String>,
    pub user_id: Option<i32>,
}

impl CategoryQuery {
    pub fn include_global(&self) -> bool {
        self.include_global.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_is_limited_to_100_chars() {
        let req = CreateCategoryRequest { name: "x".repeat(101), ..Default::default() };
        assert!(req.validate().is_err());
        let req = CreateCategoryRequest { name: "x".repeat(100), ..Default::default() };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn color_must_be_hex() {
        let req: CreateCategoryRequest = serde_json::from_value(json!({"name": "Work", "color": "#12345G"})).unwrap();
        assert!(req.validate().is_err());
        let req: UpdateCategoryRequest = serde_json::from_value(json!({"color": "#10B981"})).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn include_global_defaults_true() {
        assert!(CategoryQuery::default().include_global());
    }
}
