// handlers/protected/tasks.rs - /tasks, task comments and attachments

use axum::{extract::State, Extension};

use crate::database::models::comment::{CommentRequest, TaskComment};
use crate::database::models::task::{
    CreateAttachmentRequest, CreateTaskRequest, MyTasksQuery, Task, TaskAttachment, TaskDetails, TaskListItem,
    TaskQuery, ToggleCompleteRequest, UpdateTaskRequest,
};
use crate::handlers::{ApiPath, ApiQuery, ValidJson};
use crate::middleware::{ApiResult, AuthUser};
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(request): ValidJson<CreateTaskRequest>,
) -> ApiResult<TaskDetails> {
    state.tasks.create(&caller, request).await
}

pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<TaskQuery>) -> ApiResult<Vec<TaskListItem>> {
    state.tasks.list(&query).await
}

pub async fn my_tasks(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<MyTasksQuery>,
) -> ApiResult<Vec<TaskListItem>> {
    state.tasks.my_tasks(&caller, &query).await
}

pub async fn overdue(State(state): State<AppState>) -> ApiResult<Vec<TaskListItem>> {
    state.tasks.overdue().await
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i32>) -> ApiResult<TaskDetails> {
    state.tasks.get(id).await
}

pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ValidJson(request): ValidJson<UpdateTaskRequest>,
) -> ApiResult<TaskDetails> {
    state.tasks.update(&caller, id, request).await
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<()> {
    state.tasks.delete(&caller, id).await
}

pub async fn toggle_complete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ValidJson(request): ValidJson<ToggleCompleteRequest>,
) -> ApiResult<Task> {
    state.tasks.toggle_complete(&caller, id, request).await
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ValidJson(request): ValidJson<CommentRequest>,
) -> ApiResult<TaskComment> {
    state.tasks.add_comment(&caller, id, &request.content).await
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath((id, comment_id)): ApiPath<(i32, i32)>,
    ValidJson(request): ValidJson<CommentRequest>,
) -> ApiResult<TaskComment> {
    state.tasks.update_comment(&caller, id, comment_id, &request.content).await
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath((id, comment_id)): ApiPath<(i32, i32)>,
) -> ApiResult<()> {
    state.tasks.delete_comment(&caller, id, comment_id).await
}

/// Stores metadata only; the file itself lives at `fileUrl`
pub async fn add_attachment(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ValidJson(request): ValidJson<CreateAttachmentRequest>,
) -> ApiResult<TaskAttachment> {
    state.tasks.add_attachment(&caller, id, request).await
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath((id, attachment_id)): ApiPath<(i32, i32)>,
) -> ApiResult<()> {
    state.tasks.delete_attachment(&caller, id, attachment_id).await
}
