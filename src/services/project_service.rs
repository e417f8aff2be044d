use std::sync::Arc;

use tracing::{info, warn};

use super::{db_failure, insufficient_permissions};
use crate::database::models::comment::ProjectComment;
use crate::database::models::project::{
    AddMembersRequest, CreateProjectRequest, MemberProject, MemberRole, Project, ProjectDetails,
    ProjectMember, ProjectPage, ProjectQuery, UpdateMemberRoleRequest, UpdateProjectRequest,
};
use crate::database::models::Pagination;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::repository::{ProjectRepository, UserRepository};

fn not_a_member() -> ApiError {
    ApiError::forbidden("User is not a project member")
}

pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    users: Arc<dyn UserRepository>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { projects, users }
    }

    /// The caller becomes owner; `memberIds` join as plain members
    pub async fn create(&self, caller: &AuthUser, request: CreateProjectRequest) -> ApiResult<ProjectDetails> {
        let failed = db_failure("Failed to create project");
        for user_id in &request.member_ids {
            self.require_user(*user_id, &failed).await?;
        }

        let project = self.projects.create(caller.id, &request).await.map_err(&failed)?;
        let details = self
            .projects
            .details(project.id)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        info!("User {} created project {}", caller.id, project.id);
        Ok(ApiResponse::created("Project created successfully", details))
    }

    pub async fn list(&self, query: &ProjectQuery) -> ApiResult<ProjectPage> {
        let (projects, total) = self.projects.list(query).await.map_err(db_failure("Failed to retrieve projects"))?;
        let page = ProjectPage {
            projects,
            pagination: Pagination::new(query.page(), query.limit(), total),
        };
        Ok(ApiResponse::success("Projects retrieved successfully", page))
    }

    pub async fn get(&self, id: i32) -> ApiResult<ProjectDetails> {
        let details = self
            .projects
            .details(id)
            .await
            .map_err(db_failure("Failed to retrieve project"))?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;
        Ok(ApiResponse::success("Project retrieved successfully", details))
    }

    pub async fn my_projects(&self, caller: &AuthUser) -> ApiResult<Vec<MemberProject>> {
        let projects = self
            .projects
            .projects_for_member(caller.id)
            .await
            .map_err(db_failure("Failed to retrieve user projects"))?;
        Ok(ApiResponse::success("User projects retrieved successfully", projects))
    }

    pub async fn update(&self, caller: &AuthUser, id: i32, request: UpdateProjectRequest) -> ApiResult<ProjectDetails> {
        let failed = db_failure("Failed to update project");
        self.require_project(id, &failed).await?;
        let role = self.caller_role(id, caller, &failed).await?;
        if !role.is_some_and(|r| r.can_manage()) {
            warn!("User {} denied update of project {}", caller.id, id);
            return Err(insufficient_permissions());
        }

        self.projects
            .update(id, &request)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;
        let details = self
            .projects
            .details(id)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Project not found"))?;

        Ok(ApiResponse::success("Project updated successfully", details))
    }

    pub async fn delete(&self, caller: &AuthUser, id: i32) -> ApiResult<()> {
        let failed = db_failure("Failed to delete project");
        self.require_project(id, &failed).await?;
        if self.caller_role(id, caller, &failed).await? != Some(MemberRole::Owner) {
            warn!("User {} denied deletion of project {}", caller.id, id);
            return Err(ApiError::forbidden("Only project owner can delete project"));
        }

        self.projects.delete(id).await.map_err(&failed)?;
        info!("User {} deleted project {}", caller.id, id);
        Ok(ApiResponse::message_only("Project deleted successfully"))
    }

    pub async fn add_members(
        &self,
        caller: &AuthUser,
        id: i32,
        request: AddMembersRequest,
    ) -> ApiResult<Vec<ProjectMember>> {
        let failed = db_failure("Failed to add project members");
        self.require_project(id, &failed).await?;
        let role = self.caller_role(id, caller, &failed).await?;
        if !role.is_some_and(|r| r.can_manage()) {
            warn!("User {} denied adding members to project {}", caller.id, id);
            return Err(insufficient_permissions());
        }
        if role != Some(MemberRole::Owner) && request.members.iter().any(|m| m.role == MemberRole::Owner) {
            return Err(ApiError::forbidden("Only owner can assign owner role"));
        }
        for member in &request.members {
            self.require_user(member.user_id, &failed).await?;
        }

        let added = self.projects.add_members(id, &request.members).await.map_err(&failed)?;
        Ok(ApiResponse::created("Members added successfully", added))
    }

    /// Any member may leave; removing someone else needs owner or admin, and the owner only leaves by choice
    pub async fn remove_member(&self, caller: &AuthUser, id: i32, user_id: i32) -> ApiResult<()> {
        let failed = db_failure("Failed to remove project member");
        self.require_project(id, &failed).await?;
        let Some(role) = self.caller_role(id, caller, &failed).await? else {
            return Err(not_a_member());
        };
        let target = self
            .projects
            .find_member(id, user_id)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Member not found"))?;

        let is_self = target.user_id == caller.id;
        if !is_self && !role.can_manage() {
            warn!("User {} denied removing user {} from project {}", caller.id, user_id, id);
            return Err(insufficient_permissions());
        }
        if target.role == MemberRole::Owner && !is_self {
            return Err(ApiError::forbidden("Cannot remove project owner"));
        }

        self.projects.remove_member(id, user_id).await.map_err(&failed)?;
        Ok(ApiResponse::message_only("Member removed successfully"))
    }

    pub async fn update_member_role(
        &self,
        caller: &AuthUser,
        id: i32,
        user_id: i32,
        request: UpdateMemberRoleRequest,
    ) -> ApiResult<ProjectMember> {
        let failed = db_failure("Failed to update member role");
        self.require_project(id, &failed).await?;
        let role = self.caller_role(id, caller, &failed).await?;
        if !role.is_some_and(|r| r.can_manage()) {
            warn!("User {} denied changing roles in project {}", caller.id, id);
            return Err(insufficient_permissions());
        }
        let target = self
            .projects
            .find_member(id, user_id)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Member not found"))?;
        if (request.role == MemberRole::Owner || target.role == MemberRole::Owner) && role != Some(MemberRole::Owner) {
            return Err(ApiError::forbidden("Only owner can assign owner role"));
        }

        let member = self
            .projects
            .update_member_role(id, user_id, request.role)
            .await
            .map_err(&failed)?
            .ok_or_else(|| ApiError::not_found("Member not found"))?;
        Ok(ApiResponse::success("Member role updated successfully", member))
    }

    pub async fn list_comments(&self, caller: &AuthUser, id: i32) -> ApiResult<Vec<ProjectComment>> {
        let failed = db_failure("Failed to retrieve comments");
        self.require_project(id, &failed).await?;
        if self.caller_role(id, caller, &failed).await?.is_none() {
            return Err(not_a_member());
        }

        let comments = self.projects.list_comments(id).await.map_err(&failed)?;
        Ok(ApiResponse::success("Comments retrieved successfully", comments))
    }

    pub async fn create_comment(&self, caller: &AuthUser, id: i32, content: &str) -> ApiResult<ProjectComment> {
        let failed = db_failure("Failed to create comment");
        self.require_project(id, &failed).await?;
        if self.caller_role(id, caller, &failed).await?.is_none() {
            return Err(not_a_member());
        }

        let comment = self.projects.create_comment(id, caller.id, content.trim()).await.map_err(&failed)?;
        Ok(ApiResponse::created("Comment created successfully", comment))
    }

    /// Authors delete their own comments; project owners and admins delete any
    pub async fn delete_comment(&self, caller: &AuthUser, id: i32, comment_id: i32) -> ApiResult<()> {
        let failed = db_failure("Failed to delete comment");
        self.require_project(id, &failed).await?;
        let comment = self
            .projects
            .find_comment(comment_id)
            .await
            .map_err(&failed)?
            .filter(|c| c.project_id == id)
            .ok_or_else(|| ApiError::not_found("Comment not found"))?;

        if comment.user_id != caller.id {
            let role = self.caller_role(id, caller, &failed).await?;
            if !role.is_some_and(|r| r.can_manage()) {
                return Err(ApiError::forbidden("You can only delete your own comments"));
            }
        }

        self.projects.delete_comment(comment_id).await.map_err(&failed)?;
        Ok(ApiResponse::message_only("Comment deleted successfully"))
    }

    async fn require_project<F>(&self, id: i32, failed: &F) -> Result<Project, ApiError>
    where
        F: Fn(crate::database::DatabaseError) -> ApiError,
    {
        self.projects
            .find_by_id(id)
            .await
            .map_err(failed)?
            .ok_or_else(|| ApiError::not_found("Project not found"))
    }

    async fn require_user<F>(&self, id: i32, failed: &F) -> Result<(), ApiError>
    where
        F: Fn(crate::database::DatabaseError) -> ApiError,
    {
        match self.users.find_by_id(id).await.map_err(failed)? {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found(format!("User {} not found", id))),
        }
    }

    async fn caller_role<F>(&self, id: i32, caller: &AuthUser, failed: &F) -> Result<Option<MemberRole>, ApiError>
    where
        F: Fn(crate::database::DatabaseError) -> ApiError,
    {
        let member = self.projects.find_member(id, caller.id).await.map_err(failed)?;
        Ok(member.map(|m| m.role))
    }
}
