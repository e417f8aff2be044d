use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::{db_failure, insufficient_permissions};
use crate::database::models::comment::TaskComment;
use crate::database::models::task::{
    CreateAttachmentRequest, CreateTaskRequest, MyTasksQuery, Task, TaskAttachment, TaskDetails,
    TaskListItem, TaskQuery, TaskStatus, ToggleCompleteRequest, UpdateTaskRequest,
};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::repository::{CategoryRepository, ProjectRepository, TaskRepository, UserRepository};

pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    projects: Arc<dyn ProjectRepository>,
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        projects: Arc<dyn ProjectRepository>,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self { tasks, projects, users, categories }
    }

    pub async fn create(&self, caller: &AuthUser, request: CreateTaskRequest) -> ApiResult<TaskDetails> {
        let failed = db_failure("Failed to create task");

        if let Some(project_id) = request.project_id {
            if self.projects.find_by_id(project_id).await.map_err(&failed)?.is_none() {
                return Err(ApiError::not_found("Project not found"));
            }
            if !caller.is_admin() && self.projects.find_member(project_id, caller.id).await.map_err(&failed)?.is_none() {
                warn!("User {} denied creating a task in project {}", caller.id, project_id);
                return Err(ApiError::forbidden("User is not a project member"));
            }
        }
        if let Some(parent_id) = request.parent_task_id {
            if self.tasks.find_by_id(parent_id).await.map_err(&failed)?.is_none() {
                return Err(ApiError::not_found("Parent task not found"));
            }
        }
        self.check_references(request.category_id, request.assigned_to_id, &failed).await?;

        let task = self.tasks.create(caller.id, &request).await.map_err(&failed)?;
        let details = self.details_or_404(task.id, &failed).await?;

        info!("User {} created task {}", caller.id, task.id);
        Ok(ApiResponse::created("Task created successfully", details))
    }

    pub async fn list(&self, query: &TaskQuery) -> ApiResult<Vec<TaskListItem>> {
        let tasks = self.tasks.list(query).await.map_err(db_failure("Failed to retrieve tasks"))?;
        Ok(ApiResponse::success("Tasks retrieved successfully", tasks))
    }

    pub async fn my_tasks(&self, caller: &AuthUser, query: &MyTasksQuery) -> ApiResult<Vec<TaskListItem>> {
        let tasks = self
            .tasks
            .for_user(caller.id, query)
            .await
            .map_err(db_failure("Failed to retrieve user tasks"))?;
        Ok(ApiResponse::success("User tasks retrieved successfully", tasks))
    }

    pub async fn overdue(&self) -> ApiResult<Vec<TaskListItem>> {
        let tasks = self
            .tasks
            .overdue(Utc::now())
            .await
            .map_err(db_failure("Failed to retrieve overdue tasks"))?;
        Ok(ApiResponse::success("Overdue tasks retrieved successfully", tasks))
    }

    pub async fn get(&self, id: i32) -> ApiResult<TaskDetails> {
        let details = self.details_or_404(id, &db_failure("Failed to retrieve task")).await?;
        Ok(ApiResponse::success("Task retrieved successfully", details))
    }

    pub async fn update(&self, caller: &AuthUser, id: i32, mut request: UpdateTaskRequest) -> ApiResult<TaskDetails> {
        let failed = db_failure("Failed to update task");
        let task = self.require_task(id, &failed).await?;
        self.authorize_mutation(caller, &task, &failed).await?;
        self.check_references(request.category_id, request.assigned_to_id, &failed).await?;

        // keep `completed` and `status` in agreement; `status` wins when both are sent
        match (request.completed, request.status) {
            (_, Some(status)) => request.completed = Some(status == TaskStatus::Completed),
            (Some(completed), None) => request.status = Some(TaskStatus::for_completion(completed)),
            (None, None) => {}
        }

        self.tasks
            .update(id, &request)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Task not found"))?;
        let details = self.details_or_404(id, &failed).await?;

        Ok(ApiResponse::success("Task updated successfully", details))
    }

    pub async fn delete(&self, caller: &AuthUser, id: i32) -> ApiResult<()> {
        let failed = db_failure("Failed to delete task");
        let task = self.require_task(id, &failed).await?;
        self.authorize_mutation(caller, &task, &failed).await?;

        self.tasks.delete(id).await.map_err(&failed)?;
        info!("User {} deleted task {}", caller.id, id);
        Ok(ApiResponse::message_only("Task deleted successfully"))
    }

    /// `completed = true` sets status completed, `false` sets pending
    pub async fn toggle_complete(&self, caller: &AuthUser, id: i32, request: ToggleCompleteRequest) -> ApiResult<Task> {
        let failed = db_failure("Failed to update task completion");
        let task = self.require_task(id, &failed).await?;
        self.authorize_mutation(caller, &task, &failed).await?;

        let task = self
            .tasks
            .set_completed(id, request.completed)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Task not found"))?;

        let state = if request.completed { "completed" } else { "pending" };
        Ok(ApiResponse::success(format!("Task marked as {}", state), task))
    }

    pub async fn add_comment(&self, caller: &AuthUser, task_id: i32, content: &str) -> ApiResult<TaskComment> {
        let failed = db_failure("Failed to create comment");
        self.require_task(task_id, &failed).await?;

        let comment = self.tasks.create_comment(task_id, caller.id, content.trim()).await.map_err(&failed)?;
        Ok(ApiResponse::created("Comment created successfully", comment))
    }

    pub async fn update_comment(
        &self,
        caller: &AuthUser,
        task_id: i32,
        comment_id: i32,
        content: &str,
    ) -> ApiResult<TaskComment> {
        let failed = db_failure("Failed to update comment");
        let comment = self.require_comment(task_id, comment_id, &failed).await?;
        if comment.user_id != caller.id && !caller.is_admin() {
            return Err(ApiError::forbidden("You can only edit your own comments"));
        }

        let comment = self
            .tasks
            .update_comment(comment_id, content.trim())
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Comment not found"))?;
        Ok(ApiResponse::success("Comment updated successfully", comment))
    }

    pub async fn delete_comment(&self, caller: &AuthUser, task_id: i32, comment_id: i32) -> ApiResult<()> {
        let failed = db_failure("Failed to delete comment");
        let comment = self.require_comment(task_id, comment_id, &failed).await?;
        if comment.user_id != caller.id && !caller.is_admin() {
            return Err(ApiError::forbidden("You can only delete your own comments"));
        }

        self.tasks.delete_comment(comment_id).await.map_err(&failed)?;
        Ok(ApiResponse::message_only("Comment deleted successfully"))
    }

    pub async fn add_attachment(
        &self,
        caller: &AuthUser,
        task_id: i32,
        request: CreateAttachmentRequest,
    ) -> ApiResult<TaskAttachment> {
        let failed = db_failure("Failed to create attachment");
        self.require_task(task_id, &failed).await?;

        let attachment = self.tasks.create_attachment(task_id, caller.id, &request).await.map_err(&failed)?;
        Ok(ApiResponse::created("Attachment created successfully", attachment))
    }

    pub async fn delete_attachment(&self, caller: &AuthUser, task_id: i32, attachment_id: i32) -> ApiResult<()> {
        let failed = db_failure("Failed to delete attachment");
        let attachment = self
            .tasks
            .find_attachment(attachment_id)
            .await
            .map_err(&failed)?
            .filter(|a| a.task_id == task_id)
            .ok_or_else(|| ApiError::not_found("Attachment not found"))?;
        if attachment.uploaded_by_id != caller.id && !caller.is_admin() {
            return Err(ApiError::forbidden("You can only delete your own attachments"));
        }

        self.tasks.delete_attachment(attachment_id).await.map_err(&failed)?;
        Ok(ApiResponse::message_only("Attachment deleted successfully"))
    }

    /// Project tasks need membership; personal tasks need the creator or the assignee
    async fn authorize_mutation<F>(&self, caller: &AuthUser, task: &Task, failed: &F) -> Result<(), ApiError>
    where
        F: Fn(DatabaseError) -> ApiError,
    {
        if caller.is_admin() {
            return Ok(());
        }
        let allowed = match task.project_id {
            Some(project_id) => self.projects.find_member(project_id, caller.id).await.map_err(failed)?.is_some(),
            None => task.created_by_id == caller.id || task.assigned_to_id == Some(caller.id),
        };
        if !allowed {
            warn!("User {} denied changing task {}", caller.id, task.id);
            return Err(insufficient_permissions());
        }
        Ok(())
    }

    async fn check_references<F>(&self, category_id: Option<i32>, assignee_id: Option<i32>, failed: &F) -> Result<(), ApiError>
    where
        F: Fn(DatabaseError) -> ApiError,
    {
        if let Some(category_id) = category_id {
            if self.categories.find_by_id(category_id).await.map_err(failed)?.is_none() {
                return Err(ApiError::not_found("Category not found"));
            }
        }
        if let Some(user_id) = assignee_id {
            if self.users.find_by_id(user_id).await.map_err(failed)?.is_none() {
                return Err(ApiError::not_found("Assigned user not found"));
            }
        }
        Ok(())
    }

    async fn require_task<F>(&self, id: i32, failed: &F) -> Result<Task, ApiError>
    where
        F: Fn(DatabaseError) -> ApiError,
    {
        self.tasks
            .find_by_id(id)
            .await
            .map_err(failed)?
            .ok_or_else(|| ApiError::not_found("Task not found"))
    }

    async fn require_comment<F>(&self, task_id: i32, comment_id: i32, failed: &F) -> Result<TaskComment, ApiError>
    where
        F: Fn(DatabaseError) -> ApiError,
    {
        self.tasks
            .find_comment(comment_id)
            .await
            .map_err(failed)?
            .filter(|c| c.task_id == task_id)
            .ok_or_else(|| ApiError::not_found("Comment not found"))
    }

    async fn details_or_404<F>(&self, id: i32, failed: &F) -> Result<TaskDetails, ApiError>
    where
        F: Fn(DatabaseError) -> ApiError,
    {
        self.tasks
            .details(id)
            .await
            .map_err(failed)?
            .ok_or_else(|| ApiError::not_found("Task not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::project::CreateProjectRequest;
    use crate::database::models::user::UserRole;
    use crate::testing::{auth_user, Fixture};

    fn personal_task(title: &str) -> CreateTaskRequest {
        CreateTaskRequest { title: title.into(), ..Default::default() }
    }

    #[tokio::test]
    async fn toggle_sets_matching_status() {
        let fx = Fixture::default();
        let ada = auth_user(fx.user("ada@example.com").id, UserRole::Member);
        let service = fx.task_service();
        let task = service.create(&ada, personal_task("Write docs")).await.unwrap().data.task;

        let done = service.toggle_complete(&ada, task.id, ToggleCompleteRequest { completed: true }).await.unwrap();
        assert_eq!(done.message, "Task marked as completed");
        assert_eq!(done.data.status, TaskStatus::Completed);
        assert!(done.data.completed);

        let undone = service.toggle_complete(&ada, task.id, ToggleCompleteRequest { completed: false }).await.unwrap();
        assert_eq!(undone.message, "Task marked as pending");
        assert_eq!(undone.data.status, TaskStatus::Pending);
        assert!(!undone.data.completed);
    }

    #[tokio::test]
    async fn missing_parent_is_404() {
        let fx = Fixture::default();
        let ada = auth_user(fx.user("ada@example.com").id, UserRole::Member);
        let request = CreateTaskRequest { parent_task_id: Some(77), ..personal_task("Child") };

        let err = fx.task_service().create(&ada, request).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "Parent task not found");
    }

    #[tokio::test]
    async fn missing_assignee_is_404() {
        let fx = Fixture::default();
        let ada = auth_user(fx.user("ada@example.com").id, UserRole::Member);
        let request = CreateTaskRequest { assigned_to_id: Some(77), ..personal_task("Assigned") };

        let err = fx.task_service().create(&ada, request).await.unwrap_err();
        assert_eq!(err.message(), "Assigned user not found");
    }

    #[tokio::test]
    async fn project_tasks_require_membership() {
        let fx = Fixture::default();
        let owner = auth_user(fx.user("owner@example.com").id, UserRole::Member);
        let outsider = auth_user(fx.user("out@example.com").id, UserRole::Member);
        let project = fx
            .project_service()
            .create(&owner, CreateProjectRequest { name: "Website".into(), ..Default::default() })
            .await
            .unwrap()
            .data
            .project;
        let service = fx.task_service();

        let request = CreateTaskRequest { project_id: Some(project.id), ..personal_task("Landing page") };
        assert_eq!(service.create(&outsider, request.clone()).await.unwrap_err().status_code(), 403);

        let task = service.create(&owner, request).await.unwrap().data.task;
        let err = service.delete(&outsider, task.id).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        let admin = auth_user(outsider.id, UserRole::Admin);
        service.delete(&admin, task.id).await.unwrap();
    }

    #[tokio::test]
    async fn personal_task_is_editable_by_creator_and_assignee_only() {
        let fx = Fixture::default();
        let ada = auth_user(fx.user("ada@example.com").id, UserRole::Member);
        let bob = auth_user(fx.user("bob@example.com").id, UserRole::Member);
        let eve = auth_user(fx.user("eve@example.com").id, UserRole::Member);
        let service = fx.task_service();

        let request = CreateTaskRequest { assigned_to_id: Some(bob.id), ..personal_task("Review") };
        let task = service.create(&ada, request).await.unwrap().data.task;

        let rename = UpdateTaskRequest { title: Some("Review PR".into()), ..Default::default() };
        assert_eq!(service.update(&eve, task.id, rename.clone()).await.unwrap_err().status_code(), 403);
        let updated = service.update(&bob, task.id, rename).await.unwrap();
        assert_eq!(updated.data.task.title, "Review PR");
    }

    #[tokio::test]
    async fn update_keeps_completed_and_status_in_step() {
        let fx = Fixture::default();
        let ada = auth_user(fx.user("ada@example.com").id, UserRole::Member);
        let service = fx.task_service();
        let task = service.create(&ada, personal_task("Ship")).await.unwrap().data.task;

        let request = UpdateTaskRequest { completed: Some(true), ..Default::default() };
        let updated = service.update(&ada, task.id, request).await.unwrap().data.task;
        assert_eq!(updated.status, TaskStatus::Completed);

        let conflicting =
            UpdateTaskRequest { completed: Some(true), status: Some(TaskStatus::Pending), ..Default::default() };
        let updated = service.update(&ada, task.id, conflicting).await.unwrap().data.task;
        assert_eq!(updated.status, TaskStatus::Pending);
        assert!(!updated.completed);
    }

    #[tokio::test]
    async fn deleting_task_detaches_subtasks() {
        let fx = Fixture::default();
        let ada = auth_user(fx.user("ada@example.com").id, UserRole::Member);
        let service = fx.task_service();
        let parent = service.create(&ada, personal_task("Parent")).await.unwrap().data.task;
        let child_request = CreateTaskRequest { parent_task_id: Some(parent.id), ..personal_task("Child") };
        let child = service.create(&ada, child_request).await.unwrap().data.task;
        service.add_comment(&ada, parent.id, "note").await.unwrap();

        service.delete(&ada, parent.id).await.unwrap();

        let child = service.get(child.id).await.unwrap().data;
        assert_eq!(child.task.parent_task_id, None);
        assert_eq!(fx.store.task_comment_count(parent.id), 0);
    }

    #[tokio::test]
    async fn comments_and_attachments_belong_to_their_authors() {
        let fx = Fixture::default();
        let ada = auth_user(fx.user("ada@example.com").id, UserRole::Member);
        let bob = auth_user(fx.user("bob@example.com").id, UserRole::Member);
        let service = fx.task_service();
        let task = service.create(&ada, personal_task("Design")).await.unwrap().data.task;

        let comment = service.add_comment(&ada, task.id, "Draft is up").await.unwrap().data;
        let err = service.update_comment(&bob, task.id, comment.id, "hijack").await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        let edited = service.update_comment(&ada, task.id, comment.id, "Draft v2 is up").await.unwrap();
        assert_eq!(edited.data.content, "Draft v2 is up");

        let attachment = service
            .add_attachment(
                &ada,
                task.id,
                CreateAttachmentRequest {
                    file_name: "mock.png".into(),
                    file_url: "https://files.example.com/mock.png".into(),
                    file_size: Some(2048),
                    mime_type: Some("image/png".into()),
                },
            )
            .await
            .unwrap()
            .data;
        assert_eq!(service.delete_attachment(&bob, task.id, attachment.id).await.unwrap_err().status_code(), 403);
        assert_eq!(service.delete_attachment(&ada, task.id + 1, attachment.id).await.unwrap_err().status_code(), 404);
        service.delete_attachment(&ada, task.id, attachment.id).await.unwrap();
    }
}
