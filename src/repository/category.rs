use async_trait::async_trait;
use sqlx::PgPool;

use super::CategoryRepository;
use crate::database::models::category::{
    Category, CategoryWithCounts, CreateCategoryRequest, UpdateCategoryRequest, DEFAULT_COLOR,
};
use crate::database::query_builder;
use crate::database::DatabaseError;
use crate::filter::{Filter, SortDirection};

const CATEGORY_WITH_COUNTS: &str = "SELECT c.*, \
        (SELECT COUNT(*) FROM tasks t WHERE t.category_id = c.id) AS task_count, \
        (SELECT COUNT(*) FROM tasks t WHERE t.category_id = c.id AND t.completed) AS completed_task_count \
     FROM categories c";

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select(&self, filter: Filter) -> Result<Vec<CategoryWithCounts>, DatabaseError> {
        let sql = filter
            .order("c.name", SortDirection::Asc)
            .order("c.id", SortDirection::Asc)
            .to_sql(CATEGORY_WITH_COUNTS)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        query_builder::select_all(&sql, &self.pool).await
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, owner_id: Option<i32>, category: &CreateCategoryRequest) -> Result<Category, DatabaseError> {
        let created = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, color, description, user_id) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(category.name.trim())
        .bind(category.color.as_deref().unwrap_or(DEFAULT_COLOR))
        .bind(&category.description)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn list(
        &self,
        owner_id: i32,
        include_global: bool,
        search: Option<&str>,
    ) -> Result<Vec<CategoryWithCounts>, DatabaseError> {
        let filter = if include_global {
            Filter::new().eq_or_null("c.user_id", owner_id)
        } else {
            Filter::new().eq("c.user_id", owner_id)
        };
        self.select(filter.search(&["c.name", "c.description"], search)).await
    }

    async fn list_global(&self) -> Result<Vec<CategoryWithCounts>, DatabaseError> {
        self.select(Filter::new().is_null("c.user_id")).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Category>, DatabaseError> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn with_counts(&self, id: i32) -> Result<Option<CategoryWithCounts>, DatabaseError> {
        let category = sqlx::query_as::<_, CategoryWithCounts>(&format!("{} WHERE c.id = $1", CATEGORY_WITH_COUNTS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn update(&self, id: i32, changes: &UpdateCategoryRequest) -> Result<Option<Category>, DatabaseError> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET \
                name = COALESCE($2, name), \
                color = COALESCE($3, color), \
                description = COALESCE($4, description) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(&changes.color)
        .bind(&changes.description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE tasks SET category_id = NULL, updated_at = NOW() WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }
}
