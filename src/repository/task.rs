use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::TaskRepository;
use crate::database::models::comment::{CommentRow, TaskComment};
use crate::database::models::task::{
    CreateAttachmentRequest, CreateTaskRequest, MyTasksQuery, Subtask, Task, TaskAttachment,
    TaskDetails, TaskListItem, TaskQuery, TaskRef, TaskRow, TaskStatus, UpdateTaskRequest,
};
use crate::database::models::{UserSummary, UserSummaryRow};
use crate::database::query_builder;
use crate::database::DatabaseError;
use crate::filter::{Filter, FilterError, SortDirection};

const TASK_WITH_RELATIONS: &str = "SELECT t.*, \
        p.name AS project_name, p.status AS project_status, \
        c.name AS category_name, c.color AS category_color, \
        u.first_name AS assignee_first_name, u.last_name AS assignee_last_name, \
        u.email AS assignee_email, u.avatar AS assignee_avatar \
     FROM tasks t \
     LEFT JOIN projects p ON p.id = t.project_id \
     LEFT JOIN categories c ON c.id = t.category_id \
     LEFT JOIN users u ON u.id = t.assigned_to_id";

/// Comment columns read from `source`, which must be aliased `c`
fn comment_select(source: &str) -> String {
    format!(
        "SELECT c.id, c.content, c.task_id AS parent_id, c.user_id, c.created_at, c.updated_at, \
                u.first_name AS author_first_name, u.last_name AS author_last_name, u.avatar AS author_avatar \
         FROM {} LEFT JOIN users u ON u.id = c.user_id",
        source
    )
}

fn to_db(err: FilterError) -> DatabaseError {
    DatabaseError::QueryError(err.to_string())
}

pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select_items(&self, filter: Filter) -> Result<Vec<TaskListItem>, DatabaseError> {
        let sql = filter.to_sql(TASK_WITH_RELATIONS).map_err(to_db)?;
        let rows: Vec<TaskRow> = query_builder::select_all(&sql, &self.pool).await?;
        Ok(rows.into_iter().map(TaskListItem::from).collect())
    }

    async fn user_summary(&self, id: Option<i32>) -> Result<Option<UserSummary>, DatabaseError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, UserSummaryRow>(
            "SELECT id, first_name, last_name, email, avatar FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserSummary::from))
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, created_by_id: i32, task: &CreateTaskRequest) -> Result<Task, DatabaseError> {
        let created = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (title, description, status, priority, completed, due_date, reminder_date, \
                                estimated_hours, project_id, category_id, assigned_to_id, created_by_id, parent_task_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.status == TaskStatus::Completed)
        .bind(task.due_date)
        .bind(task.reminder_date)
        .bind(task.estimated_hours)
        .bind(task.project_id)
        .bind(task.category_id)
        .bind(task.assigned_to_id)
        .bind(created_by_id)
        .bind(task.parent_task_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn list(&self, query: &TaskQuery) -> Result<Vec<TaskListItem>, DatabaseError> {
        let mut filter = Filter::new()
            .eq_opt("t.status", query.status.map(|s| s.as_str()))
            .eq_opt("t.priority", query.priority.map(|p| p.as_str()))
            .eq_opt("t.completed", query.completed)
            .eq_opt("t.project_id", query.project_id)
            .eq_opt("t.category_id", query.category_id)
            .eq_opt("t.assigned_to_id", query.assigned_to_id)
            .eq_opt("t.created_by_id", query.created_by_id)
            .search(&["t.title", "t.description"], query.search.as_deref());
        if !query.include_subtasks() {
            filter = filter.is_null("t.parent_task_id");
        }
        if let Some((start, end)) = query.due_date_range() {
            filter = filter.gte("t.due_date", start).lt("t.due_date", end);
        }
        let filter = filter
            .order(query.sort_by.column(), query.sort_order)
            .order("t.id", query.sort_order);

        self.select_items(filter).await
    }

    async fn for_user(&self, user_id: i32, query: &MyTasksQuery) -> Result<Vec<TaskListItem>, DatabaseError> {
        let filter = Filter::new()
            .any_eq(&["t.assigned_to_id", "t.created_by_id"], user_id)
            .eq_opt("t.status", query.status.map(|s| s.as_str()))
            .eq_opt("t.priority", query.priority.map(|p| p.as_str()))
            .eq_opt("t.completed", query.completed)
            .order("t.created_at", SortDirection::Desc)
            .order("t.id", SortDirection::Desc);

        self.select_items(filter).await
    }

    async fn overdue(&self, now: DateTime<Utc>) -> Result<Vec<TaskListItem>, DatabaseError> {
        let filter = Filter::new()
            .eq("t.completed", false)
            .lt("t.due_date", now)
            .order("t.due_date", SortDirection::Asc)
            .order("t.id", SortDirection::Asc);

        self.select_items(filter).await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, DatabaseError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn details(&self, id: i32) -> Result<Option<TaskDetails>, DatabaseError> {
        let Some(row) = sqlx::query_as::<_, TaskRow>(&format!("{} WHERE t.id = $1", TASK_WITH_RELATIONS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let item = TaskListItem::from(row);

        let created_by = self.user_summary(Some(item.task.created_by_id)).await?;

        let parent_task = match item.task.parent_task_id {
            Some(parent_id) => sqlx::query_as::<_, (i32, String, TaskStatus)>(
                "SELECT id, title, status FROM tasks WHERE id = $1",
            )
            .bind(parent_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|(id, title, status)| TaskRef { id, title, status }),
            None => None,
        };

        let subtasks = self
            .select_items(Filter::new().eq("t.parent_task_id", id).order("t.created_at", SortDirection::Asc))
            .await?
            .into_iter()
            .map(Subtask::from)
            .collect();

        let comments = sqlx::query_as::<_, CommentRow>(&format!(
            "{} WHERE c.task_id = $1 ORDER BY c.created_at DESC",
            comment_select("task_comments c")
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TaskComment::from)
        .collect();

        let attachments = sqlx::query_as::<_, TaskAttachment>(
            "SELECT * FROM task_attachments WHERE task_id = $1 ORDER BY created_at DESC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(TaskDetails {
            task: item.task,
            project: item.project,
            category: item.category,
            assigned_to: item.assigned_to,
            created_by,
            parent_task,
            subtasks,
            comments,
            attachments,
        }))
    }

    async fn update(&self, id: i32, changes: &UpdateTaskRequest) -> Result<Option<Task>, DatabaseError> {
        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                status = COALESCE($4, status), \
                priority = COALESCE($5, priority), \
                completed = COALESCE($6, completed), \
                due_date = COALESCE($7, due_date), \
                reminder_date = COALESCE($8, reminder_date), \
                estimated_hours = COALESCE($9, estimated_hours), \
                actual_hours = COALESCE($10, actual_hours), \
                category_id = COALESCE($11, category_id), \
                assigned_to_id = COALESCE($12, assigned_to_id), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.status)
        .bind(changes.priority)
        .bind(changes.completed)
        .bind(changes.due_date)
        .bind(changes.reminder_date)
        .bind(changes.estimated_hours)
        .bind(changes.actual_hours)
        .bind(changes.category_id)
        .bind(changes.assigned_to_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn set_completed(&self, id: i32, completed: bool) -> Result<Option<Task>, DatabaseError> {
        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks SET completed = $2, status = $3, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(completed)
        .bind(TaskStatus::for_completion(completed))
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM task_comments WHERE task_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM task_attachments WHERE task_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("UPDATE tasks SET parent_task_id = NULL, updated_at = NOW() WHERE parent_task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tasks WHERE id = $1").bind(id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn create_comment(&self, task_id: i32, user_id: i32, content: &str) -> Result<TaskComment, DatabaseError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "WITH c AS (INSERT INTO task_comments (content, task_id, user_id) \
                        VALUES ($1, $2, $3) RETURNING *) {}",
            comment_select("c")
        ))
        .bind(content)
        .bind(task_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_comment(&self, comment_id: i32) -> Result<Option<TaskComment>, DatabaseError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{} WHERE c.id = $1", comment_select("task_comments c")))
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(TaskComment::from))
    }

    async fn update_comment(&self, comment_id: i32, content: &str) -> Result<Option<TaskComment>, DatabaseError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "WITH c AS (UPDATE task_comments SET content = $2, updated_at = NOW() \
                        WHERE id = $1 RETURNING *) {}",
            comment_select("c")
        ))
        .bind(comment_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TaskComment::from))
    }

    async fn delete_comment(&self, comment_id: i32) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM task_comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_attachment(
        &self,
        task_id: i32,
        uploaded_by_id: i32,
        attachment: &CreateAttachmentRequest,
    ) -> Result<TaskAttachment, DatabaseError> {
        let created = sqlx::query_as::<_, TaskAttachment>(
            "INSERT INTO task_attachments (file_name, file_url, file_size, mime_type, task_id, uploaded_by_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(&attachment.file_name)
        .bind(&attachment.file_url)
        .bind(attachment.file_size)
        .bind(&attachment.mime_type)
        .bind(task_id)
        .bind(uploaded_by_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_attachment(&self, attachment_id: i32) -> Result<Option<TaskAttachment>, DatabaseError> {
        let attachment = sqlx::query_as::<_, TaskAttachment>("SELECT * FROM task_attachments WHERE id = $1")
            .bind(attachment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(attachment)
    }

    async fn delete_attachment(&self, attachment_id: i32) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM task_attachments WHERE id = $1")
            .bind(attachment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
