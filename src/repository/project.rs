use async_trait::async_trait;
use sqlx::PgPool;

use super::ProjectRepository;
use crate::database::models::comment::{CommentRow, ProjectComment};
use crate::database::models::project::{
    CreateProjectRequest, MemberAssignment, MemberProject, MemberRole, Project, ProjectDetails,
    ProjectMember, ProjectMemberDetail, ProjectMemberRow, ProjectOwnerRow, ProjectQuery,
    ProjectWithOwner, UpdateProjectRequest,
};
use crate::database::query_builder;
use crate::database::DatabaseError;
use crate::filter::{Filter, SortDirection};

const PROJECT_WITH_OWNER: &str = "SELECT p.*, \
        u.first_name AS owner_first_name, u.last_name AS owner_last_name, \
        u.email AS owner_email, u.avatar AS owner_avatar \
     FROM projects p LEFT JOIN users u ON u.id = p.owner_id";

/// Comment columns read from `source`, which must be aliased `c`
fn comment_select(source: &str) -> String {
    format!(
        "SELECT c.id, c.content, c.project_id AS parent_id, c.user_id, c.created_at, c.updated_at, \
                u.first_name AS author_first_name, u.last_name AS author_last_name, u.avatar AS author_avatar \
         FROM {} LEFT JOIN users u ON u.id = c.user_id",
        source
    )
}

pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn create(&self, owner_id: i32, project: &CreateProjectRequest) -> Result<Project, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (name, description, status, priority, start_date, end_date, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status)
        .bind(project.priority)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(created.id)
            .bind(owner_id)
            .bind(MemberRole::Owner)
            .execute(&mut *tx)
            .await?;

        let member_ids: Vec<i32> = project.member_ids.iter().copied().filter(|id| *id != owner_id).collect();
        if !member_ids.is_empty() {
            sqlx::query(
                "INSERT INTO project_members (project_id, user_id, role) \
                 SELECT $1, UNNEST($2::int4[]), $3 \
                 ON CONFLICT (project_id, user_id) DO NOTHING",
            )
            .bind(created.id)
            .bind(&member_ids)
            .bind(MemberRole::Member)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn list(&self, query: &ProjectQuery) -> Result<(Vec<ProjectWithOwner>, i64), DatabaseError> {
        let mut filter = Filter::new()
            .eq_opt("p.status", query.status.map(|s| s.as_str()))
            .eq_opt("p.priority", query.priority.map(|p| p.as_str()))
            .eq_opt("p.owner_id", query.owner_id)
            .search(&["p.name", "p.description"], query.search.as_deref());
        if let Some(member_id) = query.member_id {
            filter = filter.in_subquery("p.id", "project_id", "project_members", "user_id", member_id);
        }

        let to_db = |e: crate::filter::FilterError| DatabaseError::QueryError(e.to_string());

        let count_sql = filter.to_count_sql("projects p").map_err(to_db)?;
        let total = query_builder::count(&count_sql, &self.pool).await?;

        let list_sql = filter
            .order("p.created_at", SortDirection::Desc)
            .limit(query.limit(), Some(query.offset()))
            .and_then(|f| f.to_sql(PROJECT_WITH_OWNER))
            .map_err(to_db)?;
        let rows: Vec<ProjectOwnerRow> = query_builder::select_all(&list_sql, &self.pool).await?;

        Ok((rows.into_iter().map(ProjectWithOwner::from).collect(), total))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Project>, DatabaseError> {
        let project = sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn details(&self, id: i32) -> Result<Option<ProjectDetails>, DatabaseError> {
        let Some(row) = sqlx::query_as::<_, ProjectOwnerRow>(&format!("{} WHERE p.id = $1", PROJECT_WITH_OWNER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let members = sqlx::query_as::<_, ProjectMemberRow>(
            "SELECT pm.*, u.first_name AS user_first_name, u.last_name AS user_last_name, \
                    u.email AS user_email, u.avatar AS user_avatar \
             FROM project_members pm LEFT JOIN users u ON u.id = pm.user_id \
             WHERE pm.project_id = $1 ORDER BY pm.joined_at, pm.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let (tasks_count, completed_tasks_count) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE completed) FROM tasks WHERE project_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let with_owner = ProjectWithOwner::from(row);
        Ok(Some(ProjectDetails {
            project: with_owner.project,
            owner: with_owner.owner,
            members: members.into_iter().map(ProjectMemberDetail::from).collect(),
            tasks_count,
            completed_tasks_count,
        }))
    }

    async fn update(&self, id: i32, changes: &UpdateProjectRequest) -> Result<Option<Project>, DatabaseError> {
        let project = sqlx::query_as::<_, Project>(
            "UPDATE projects SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                status = COALESCE($4, status), \
                priority = COALESCE($5, priority), \
                start_date = COALESCE($6, start_date), \
                end_date = COALESCE($7, end_date), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.status)
        .bind(changes.priority)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM task_comments WHERE task_id IN (SELECT id FROM tasks WHERE project_id = $1)")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM task_attachments WHERE task_id IN (SELECT id FROM tasks WHERE project_id = $1)")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        // Subtasks living outside this project lose their parent
        sqlx::query(
            "UPDATE tasks SET parent_task_id = NULL, updated_at = NOW() \
             WHERE parent_task_id IN (SELECT id FROM tasks WHERE project_id = $1) \
               AND project_id IS DISTINCT FROM $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM tasks WHERE project_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM project_comments WHERE project_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM project_members WHERE project_id = $1").bind(id).execute(&mut *tx).await?;
        sqlx::query("DELETE FROM projects WHERE id = $1").bind(id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_member(&self, project_id: i32, user_id: i32) -> Result<Option<ProjectMember>, DatabaseError> {
        let member = sqlx::query_as::<_, ProjectMember>(
            "SELECT * FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn add_members(
        &self,
        project_id: i32,
        members: &[MemberAssignment],
    ) -> Result<Vec<ProjectMember>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut added = Vec::with_capacity(members.len());

        for member in members {
            let inserted = sqlx::query_as::<_, ProjectMember>(
                "INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3) \
                 ON CONFLICT (project_id, user_id) DO NOTHING RETURNING *",
            )
            .bind(project_id)
            .bind(member.user_id)
            .bind(member.role)
            .fetch_optional(&mut *tx)
            .await?;
            added.extend(inserted);
        }

        tx.commit().await?;
        Ok(added)
    }

    async fn remove_member(&self, project_id: i32, user_id: i32) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_member_role(
        &self,
        project_id: i32,
        user_id: i32,
        role: MemberRole,
    ) -> Result<Option<ProjectMember>, DatabaseError> {
        let member = sqlx::query_as::<_, ProjectMember>(
            "UPDATE project_members SET role = $3 WHERE project_id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn projects_for_member(&self, user_id: i32) -> Result<Vec<MemberProject>, DatabaseError> {
        let projects = sqlx::query_as::<_, MemberProject>(
            "SELECT p.*, pm.role AS member_role \
             FROM projects p INNER JOIN project_members pm ON pm.project_id = p.id \
             WHERE pm.user_id = $1 ORDER BY p.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn list_comments(&self, project_id: i32) -> Result<Vec<ProjectComment>, DatabaseError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{} WHERE c.project_id = $1 ORDER BY c.created_at DESC",
            comment_select("project_comments c")
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ProjectComment::from).collect())
    }

    async fn create_comment(
        &self,
        project_id: i32,
        user_id: i32,
        content: &str,
    ) -> Result<ProjectComment, DatabaseError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "WITH c AS (INSERT INTO project_comments (content, project_id, user_id) \
                        VALUES ($1, $2, $3) RETURNING *) {}",
            comment_select("c")
        ))
        .bind(content)
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_comment(&self, comment_id: i32) -> Result<Option<ProjectComment>, DatabaseError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{} WHERE c.id = $1", comment_select("project_comments c")))
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ProjectComment::from))
    }

    async fn delete_comment(&self, comment_id: i32) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM project_comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
