use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Pagination, Priority, UserSummary};
use crate::error::ApiError;
use crate::validation::{FieldErrors, Validate};

text_enum! {
    ProjectStatus {
        Active => "active",
        Completed => "completed",
        Archived => "archived",
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Active
    }
}

text_enum! {
    /// Role inside one project
    MemberRole {
        Owner => "owner",
        Admin => "admin",
        Member => "member",
    }
}

impl Default for MemberRole {
    fn default() -> Self {
        MemberRole::Member
    }
}

impl MemberRole {
    /// Owners and admins may edit the project and its membership
    pub fn can_manage(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: i32,
    pub project_id: i32,
    pub user_id: i32,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Project joined with its owner's display columns
#[derive(Debug, Clone, FromRow)]
pub struct ProjectOwnerRow {
    #[sqlx(flatten)]
    pub project: Project,
    pub owner_first_name: Option<String>,
    pub owner_last_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithOwner {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Option<UserSummary>,
}

impl From<ProjectOwnerRow> for ProjectWithOwner {
    fn from(row: ProjectOwnerRow) -> Self {
        // owner_first_name is NULL exactly when the owner row is missing
        let owner_id = row.owner_first_name.as_ref().map(|_| row.project.owner_id);
        Self {
            owner: UserSummary::from_parts(
                owner_id,
                row.owner_first_name,
                row.owner_last_name,
                row.owner_email,
                row.owner_avatar,
            ),
            project: row.project,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectMemberRow {
    #[sqlx(flatten)]
    pub member: ProjectMember,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
    pub user_email: Option<String>,
    pub user_avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMemberDetail {
    #[serde(flatten)]
    pub member: ProjectMember,
    pub user: Option<UserSummary>,
}

impl From<ProjectMemberRow> for ProjectMemberDetail {
    fn from(row: ProjectMemberRow) -> Self {
        let user_id = row.user_first_name.as_ref().map(|_| row.member.user_id);
        Self {
            user: UserSummary::from_parts(
                user_id,
                row.user_first_name,
                row.user_last_name,
                row.user_email,
                row.user_avatar,
            ),
            member: row.member,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub project: Project,
    pub owner: Option<UserSummary>,
    pub members: Vec<ProjectMemberDetail>,
    pub tasks_count: i64,
    pub completed_tasks_count: i64,
}

/// Entry of GET /projects/my-projects
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberProject {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub project: Project,
    pub member_role: MemberRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPage {
    pub projects: Vec<ProjectWithOwner>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Priority,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub member_ids: Vec<i32>,
}

impl Validate for CreateProjectRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.length("name", &self.name, 1, 255, "Project name is required");
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.add("endDate", "End date must not be before start date");
            }
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Validate for UpdateProjectRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional_length("name", self.name.as_deref(), 1, 255, "Project name is required");
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.add("endDate", "End date must not be before start date");
            }
        }
        errors.finish()
    }
}

/// GET /projects query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub owner_id: Option<i32>,
    pub member_id: Option<i32>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ProjectQuery {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }

    /// Saturates instead of wrapping; `validate` rejects pages whose offset overflows
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

impl Validate for ProjectQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if self.page() < 1 {
            errors.add("page", "Page must be at least 1");
        } else if (self.page() - 1).checked_mul(self.limit()).is_none() {
            errors.add("page", "Page is out of range");
        }
        if !(1..=Self::MAX_LIMIT).contains(&self.limit()) {
            errors.add("limit", "Limit must be between 1 and 100");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAssignment {
    pub user_id: i32,
    #[serde(default)]
    pub role: MemberRole,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddMembersRequest {
    pub members: Vec<MemberAssignment>,
}

impl Validate for AddMembersRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if self.members.is_empty() {
            errors.add("members", "At least one member is required");
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: MemberRole,
}

impl Validate for UpdateMemberRoleRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}
