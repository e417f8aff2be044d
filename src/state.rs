use std::sync::Arc;

use sqlx::PgPool;

use crate::repository::{
    CategoryRepository, PgCategoryRepository, PgProjectRepository, PgTaskRepository, PgUserRepository,
    ProjectRepository, TaskRepository, UserRepository,
};
use crate::services::{AuthService, CategoryService, ProjectService, TaskService, UserService};

/// Shared handler state: the pool for health checks and one instance of each service
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub projects: Arc<ProjectService>,
    pub tasks: Arc<TaskService>,
    pub categories: Arc<CategoryService>,
}

impl AppState {
    /// Services backed by the PostgreSQL repositories
    pub fn new(pool: PgPool) -> Self {
        Self::with_repositories(
            pool.clone(),
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgProjectRepository::new(pool.clone())),
            Arc::new(PgTaskRepository::new(pool.clone())),
            Arc::new(PgCategoryRepository::new(pool)),
        )
    }

    pub fn with_repositories(
        pool: PgPool,
        users: Arc<dyn UserRepository>,
        projects: Arc<dyn ProjectRepository>,
        tasks: Arc<dyn TaskRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            pool,
            auth: Arc::new(AuthService::new(users.clone())),
            users: Arc::new(UserService::new(users.clone())),
            projects: Arc::new(ProjectService::new(projects.clone(), users.clone())),
            tasks: Arc::new(TaskService::new(tasks, projects, users, categories.clone())),
            categories: Arc::new(CategoryService::new(categories)),
        }
    }
}
