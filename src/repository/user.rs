use async_trait::async_trait;
use sqlx::PgPool;

use super::UserRepository;
use crate::database::models::user::{NewUser, UpdateUserRequest, User, UserProfile, UserQuery, UserRecord};
use crate::database::models::{UserSummary, UserSummaryRow};
use crate::database::query_builder;
use crate::database::DatabaseError;
use crate::filter::{Filter, SortDirection};

const USER_COLUMNS: &str = "id, first_name, last_name, email, role, avatar, is_active, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_record(&self, id: i32) -> Result<Option<UserRecord>, DatabaseError> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (first_name, last_name, email, password, role, avatar) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.avatar)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn list(&self, query: &UserQuery) -> Result<Vec<User>, DatabaseError> {
        let sql = Filter::new()
            .eq_opt("role", query.role.map(|r| r.as_str()))
            .search(&["first_name", "last_name", "email"], query.search.as_deref())
            .order("created_at", SortDirection::Desc)
            .to_sql(&format!("SELECT {} FROM users", USER_COLUMNS))
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        query_builder::select_all(&sql, &self.pool).await
    }

    async fn list_active_summaries(&self) -> Result<Vec<UserSummary>, DatabaseError> {
        let rows = sqlx::query_as::<_, UserSummaryRow>(
            "SELECT id, first_name, last_name, email, avatar FROM users \
             WHERE is_active = TRUE ORDER BY first_name, last_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(UserSummary::from).collect())
    }

    async fn profile(&self, id: i32) -> Result<Option<UserProfile>, DatabaseError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT u.id, u.first_name, u.last_name, u.email, u.role, u.avatar, u.is_active, \
                    u.created_at, u.updated_at, \
                    (SELECT COUNT(*) FROM project_members pm WHERE pm.user_id = u.id) AS projects_count, \
                    (SELECT COUNT(*) FROM tasks t \
                        WHERE t.assigned_to_id = u.id OR t.created_by_id = u.id) AS tasks_count, \
                    (SELECT COUNT(*) FROM tasks t \
                        WHERE (t.assigned_to_id = u.id OR t.created_by_id = u.id) AND t.completed) \
                        AS completed_tasks_count \
             FROM users u WHERE u.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn update(&self, id: i32, changes: &UpdateUserRequest) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                email = COALESCE($4, email), \
                role = COALESCE($5, role), \
                avatar = COALESCE($6, avatar), \
                is_active = COALESCE($7, is_active), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.email)
        .bind(changes.role)
        .bind(&changes.avatar)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE users SET password = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn owns_projects(&self, id: i32) -> Result<bool, DatabaseError> {
        let owns = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM projects WHERE owner_id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(owns)
    }

    async fn created_tasks(&self, id: i32) -> Result<bool, DatabaseError> {
        let created = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM tasks WHERE created_by_id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM project_members WHERE user_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM task_comments WHERE user_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM project_comments WHERE user_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM task_attachments WHERE uploaded_by_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query(
            "UPDATE tasks SET category_id = NULL, updated_at = NOW() \
             WHERE category_id IN (SELECT id FROM categories WHERE user_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM categories WHERE user_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("UPDATE tasks SET assigned_to_id = NULL, updated_at = NOW() WHERE assigned_to_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }
}
