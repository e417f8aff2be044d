// handlers/protected/projects.rs - /projects, membership and project comments

use axum::{extract::State, Extension};

use crate::database::models::comment::{CommentRequest, ProjectComment};
use crate::database::models::project::{
    AddMembersRequest, CreateProjectRequest, MemberProject, ProjectDetails, ProjectMember, ProjectPage, ProjectQuery,
    UpdateMemberRoleRequest, UpdateProjectRequest,
};
use crate::handlers::{ApiPath, ApiQuery, ValidJson};
use crate::middleware::{ApiResult, AuthUser};
use crate::state::AppState;
use crate::validation::Validate;

pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ValidJson(request): ValidJson<CreateProjectRequest>,
) -> ApiResult<ProjectDetails> {
    state.projects.create(&caller, request).await
}

/// Paged listing; `page` and `limit` are range-checked before querying
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<ProjectQuery>) -> ApiResult<ProjectPage> {
    query.validate()?;
    state.projects.list(&query).await
}

pub async fn my_projects(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Vec<MemberProject>> {
    state.projects.my_projects(&caller).await
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i32>) -> ApiResult<ProjectDetails> {
    state.projects.get(id).await
}

pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ValidJson(request): ValidJson<UpdateProjectRequest>,
) -> ApiResult<ProjectDetails> {
    state.projects.update(&caller, id, request).await
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<()> {
    state.projects.delete(&caller, id).await
}

pub async fn add_members(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ValidJson(request): ValidJson<AddMembersRequest>,
) -> ApiResult<Vec<ProjectMember>> {
    state.projects.add_members(&caller, id, request).await
}

/// DELETE /projects/:id/members/:memberId where `memberId` is the user id
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath((id, user_id)): ApiPath<(i32, i32)>,
) -> ApiResult<()> {
    state.projects.remove_member(&caller, id, user_id).await
}

pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath((id, user_id)): ApiPath<(i32, i32)>,
    ValidJson(request): ValidJson<UpdateMemberRoleRequest>,
) -> ApiResult<ProjectMember> {
    state.projects.update_member_role(&caller, id, user_id, request).await
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Vec<ProjectComment>> {
    state.projects.list_comments(&caller, id).await
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ValidJson(request): ValidJson<CommentRequest>,
) -> ApiResult<ProjectComment> {
    state.projects.create_comment(&caller, id, &request.content).await
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    ApiPath((id, comment_id)): ApiPath<(i32, i32)>,
) -> ApiResult<()> {
    state.projects.delete_comment(&caller, id, comment_id).await
}
