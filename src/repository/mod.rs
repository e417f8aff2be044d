//! Persistence seams. Each trait has a PostgreSQL implementation here and an
//! in-memory one under `crate::testing` for service tests.

pub mod category;
pub mod project;
pub mod task;
pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::models::category::{
    Category, CategoryWithCounts, CreateCategoryRequest, UpdateCategoryRequest,
};
use crate::database::models::comment::{ProjectComment, TaskComment};
use crate::database::models::project::{
    CreateProjectRequest, MemberAssignment, MemberProject, MemberRole, Project, ProjectDetails,
    ProjectMember, ProjectQuery, ProjectWithOwner, UpdateProjectRequest,
};
use crate::database::models::task::{
    CreateAttachmentRequest, CreateTaskRequest, MyTasksQuery, Task, TaskAttachment, TaskDetails,
    TaskListItem, TaskQuery, UpdateTaskRequest,
};
use crate::database::models::user::{
    NewUser, UpdateUserRequest, User, UserProfile, UserQuery, UserRecord,
};
use crate::database::models::UserSummary;
use crate::database::DatabaseError;

pub use category::PgCategoryRepository;
pub use project::PgProjectRepository;
pub use task::PgTaskRepository;
pub use user::PgUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError>;
    async fn find_record(&self, id: i32) -> Result<Option<UserRecord>, DatabaseError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DatabaseError>;
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn list(&self, query: &UserQuery) -> Result<Vec<User>, DatabaseError>;
    /// Active users as `{id, name, email, avatar}`, ordered by name
    async fn list_active_summaries(&self) -> Result<Vec<UserSummary>, DatabaseError>;
    async fn profile(&self, id: i32) -> Result<Option<UserProfile>, DatabaseError>;
    async fn update(&self, id: i32, changes: &UpdateUserRequest) -> Result<Option<User>, DatabaseError>;
    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), DatabaseError>;
    async fn owns_projects(&self, id: i32) -> Result<bool, DatabaseError>;
    async fn created_tasks(&self, id: i32) -> Result<bool, DatabaseError>;
    /// Removes memberships, authored comments, uploaded attachments and private
    /// categories, unassigns tasks, then the user
    async fn delete(&self, id: i32) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Inserts the project, the owner membership and `member_ids` in one transaction
    async fn create(&self, owner_id: i32, project: &CreateProjectRequest) -> Result<Project, DatabaseError>;
    async fn list(&self, query: &ProjectQuery) -> Result<(Vec<ProjectWithOwner>, i64), DatabaseError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Project>, DatabaseError>;
    async fn details(&self, id: i32) -> Result<Option<ProjectDetails>, DatabaseError>;
    async fn update(&self, id: i32, changes: &UpdateProjectRequest) -> Result<Option<Project>, DatabaseError>;
    /// Removes the project with its tasks, their comments and attachments, comments and memberships
    async fn delete(&self, id: i32) -> Result<(), DatabaseError>;
    async fn find_member(&self, project_id: i32, user_id: i32) -> Result<Option<ProjectMember>, DatabaseError>;
    /// Existing memberships are left untouched; only new rows are returned
    async fn add_members(
        &self,
        project_id: i32,
        members: &[MemberAssignment],
    ) -> Result<Vec<ProjectMember>, DatabaseError>;
    async fn remove_member(&self, project_id: i32, user_id: i32) -> Result<bool, DatabaseError>;
    async fn update_member_role(
        &self,
        project_id: i32,
        user_id: i32,
        role: MemberRole,
    ) -> Result<Option<ProjectMember>, DatabaseError>;
    async fn projects_for_member(&self, user_id: i32) -> Result<Vec<MemberProject>, DatabaseError>;
    async fn list_comments(&self, project_id: i32) -> Result<Vec<ProjectComment>, DatabaseError>;
    async fn create_comment(
        &self,
        project_id: i32,
        user_id: i32,
        content: &str,
    ) -> Result<ProjectComment, DatabaseError>;
    async fn find_comment(&self, comment_id: i32) -> Result<Option<ProjectComment>, DatabaseError>;
    async fn delete_comment(&self, comment_id: i32) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, created_by_id: i32, task: &CreateTaskRequest) -> Result<Task, DatabaseError>;
    async fn list(&self, query: &TaskQuery) -> Result<Vec<TaskListItem>, DatabaseError>;
    /// Tasks assigned to or created by `user_id`, newest first
    async fn for_user(&self, user_id: i32, query: &MyTasksQuery) -> Result<Vec<TaskListItem>, DatabaseError>;
    /// Incomplete tasks due before `now`, earliest first
    async fn overdue(&self, now: DateTime<Utc>) -> Result<Vec<TaskListItem>, DatabaseError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, DatabaseError>;
    async fn details(&self, id: i32) -> Result<Option<TaskDetails>, DatabaseError>;
    async fn update(&self, id: i32, changes: &UpdateTaskRequest) -> Result<Option<Task>, DatabaseError>;
    async fn set_completed(&self, id: i32, completed: bool) -> Result<Option<Task>, DatabaseError>;
    /// Removes comments and attachments, detaches subtasks, then the task
    async fn delete(&self, id: i32) -> Result<(), DatabaseError>;
    async fn create_comment(&self, task_id: i32, user_id: i32, content: &str) -> Result<TaskComment, DatabaseError>;
    async fn find_comment(&self, comment_id: i32) -> Result<Option<TaskComment>, DatabaseError>;
    async fn update_comment(&self, comment_id: i32, content: &str) -> Result<Option<TaskComment>, DatabaseError>;
    async fn delete_comment(&self, comment_id: i32) -> Result<(), DatabaseError>;
    async fn create_attachment(
        &self,
        task_id: i32,
        uploaded_by_id: i32,
        attachment: &CreateAttachmentRequest,
    ) -> Result<TaskAttachment, DatabaseError>;
    async fn find_attachment(&self, attachment_id: i32) -> Result<Option<TaskAttachment>, DatabaseError>;
    async fn delete_attachment(&self, attachment_id: i32) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// `owner_id = None` creates a global category
    async fn create(&self, owner_id: Option<i32>, category: &CreateCategoryRequest) -> Result<Category, DatabaseError>;
    /// Categories owned by `owner_id`, plus globals when asked, with task counts
    async fn list(
        &self,
        owner_id: i32,
        include_global: bool,
        search: Option<&str>,
    ) -> Result<Vec<CategoryWithCounts>, DatabaseError>;
    async fn list_global(&self) -> Result<Vec<CategoryWithCounts>, DatabaseError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Category>, DatabaseError>;
    async fn with_counts(&self, id: i32) -> Result<Option<CategoryWithCounts>, DatabaseError>;
    async fn update(&self, id: i32, changes: &UpdateCategoryRequest) -> Result<Option<Category>, DatabaseError>;
    /// Clears `category_id` on referencing tasks, then removes the category
    async fn delete(&self, id: i32) -> Result<(), DatabaseError>;
}
