//! In-memory repositories and fixtures for service tests.
//!
//! `MemoryStore` implements every repository trait over one set of tables so
//! cascades behave as they do in PostgreSQL.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::models::category::{
    Category, CategoryWithCounts, CreateCategoryRequest, UpdateCategoryRequest, DEFAULT_COLOR,
};
use crate::database::models::comment::{ProjectComment, TaskComment};
use crate::database::models::project::{
    CreateProjectRequest, MemberAssignment, MemberProject, MemberRole, Project, ProjectDetails,
    ProjectMember, ProjectMemberDetail, ProjectQuery, ProjectStatus, ProjectWithOwner,
    UpdateProjectRequest,
};
use crate::database::models::task::{
    CategoryRef, CreateAttachmentRequest, CreateTaskRequest, MyTasksQuery, ProjectRef, Subtask, Task,
    TaskAttachment, TaskDetails, TaskListItem, TaskQuery, TaskRef, TaskSortField, TaskStatus,
    UpdateTaskRequest,
};
use crate::database::models::user::{
    NewUser, UpdateUserRequest, User, UserProfile, UserQuery, UserRecord, UserRole,
};
use crate::database::models::{Priority, UserSummary};
use crate::database::DatabaseError;
use crate::filter::SortDirection;
use crate::middleware::AuthUser;
use crate::repository::{CategoryRepository, ProjectRepository, TaskRepository, UserRepository};
use crate::services::{CategoryService, ProjectService, TaskService, UserService};

pub fn sample_user(id: i32, email: &str) -> User {
    let now = Utc::now();
    User {
        id,
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: email.into(),
        role: UserRole::Member,
        avatar: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn auth_user(id: i32, role: UserRole) -> AuthUser {
    AuthUser {
        id,
        email: format!("user{}@example.com", id),
        first_name: "Test".into(),
        last_name: "User".into(),
        role,
    }
}

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: Vec<UserRecord>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    project_comments: Vec<ProjectComment>,
    categories: Vec<Category>,
    tasks: Vec<Task>,
    task_comments: Vec<TaskComment>,
    attachments: Vec<TaskAttachment>,
}

impl Tables {
    fn id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn summary(&self, user_id: i32) -> Option<UserSummary> {
        self.users.iter().find(|u| u.id == user_id).map(|u| UserSummary {
            id: u.id,
            name: format!("{} {}", u.first_name, u.last_name),
            email: Some(u.email.clone()),
            avatar: u.avatar.clone(),
        })
    }

    fn task_item(&self, task: &Task) -> TaskListItem {
        let project = task
            .project_id
            .and_then(|id| self.projects.iter().find(|p| p.id == id))
            .map(|p| ProjectRef { id: p.id, name: p.name.clone(), status: p.status });
        let category = task
            .category_id
            .and_then(|id| self.categories.iter().find(|c| c.id == id))
            .map(|c| CategoryRef { id: c.id, name: c.name.clone(), color: c.color.clone() });
        TaskListItem {
            task: task.clone(),
            project,
            category,
            assigned_to: task.assigned_to_id.and_then(|id| self.summary(id)),
        }
    }

    fn category_counts(&self, category: &Category) -> CategoryWithCounts {
        let tasks = self.tasks.iter().filter(|t| t.category_id == Some(category.id));
        let (total, completed) = tasks.fold((0, 0), |(n, c), t| (n + 1, c + i64::from(t.completed)));
        CategoryWithCounts { category: category.clone(), task_count: total, completed_task_count: completed }
    }

    fn remove_task(&mut self, id: i32) {
        self.task_comments.retain(|c| c.task_id != id);
        self.attachments.retain(|a| a.task_id != id);
        for task in self.tasks.iter_mut().filter(|t| t.parent_task_id == Some(id)) {
            task.parent_task_id = None;
        }
        self.tasks.retain(|t| t.id != id);
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn insert(&self, email: &str, password_hash: &str) -> User {
        let mut t = self.tables();
        let now = Utc::now();
        let record = UserRecord {
            id: t.id(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: password_hash.into(),
            role: UserRole::Member,
            avatar: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.users.push(record.clone());
        record.into()
    }

    /// Project row plus the owner membership, bypassing services
    pub fn insert_project(&self, owner_id: i32, name: &str) -> Project {
        let mut t = self.tables();
        let now = Utc::now();
        let project = Project {
            id: t.id(),
            name: name.into(),
            description: None,
            status: ProjectStatus::Active,
            priority: Priority::Medium,
            start_date: None,
            end_date: None,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        let member = ProjectMember { id: t.id(), project_id: project.id, user_id: owner_id, role: MemberRole::Owner, joined_at: now };
        t.projects.push(project.clone());
        t.members.push(member);
        project
    }

    pub fn count(&self) -> usize {
        self.tables().users.len()
    }

    pub fn members_of(&self, project_id: i32) -> Vec<ProjectMember> {
        self.tables().members.iter().filter(|m| m.project_id == project_id).cloned().collect()
    }

    pub fn task_comment_count(&self, task_id: i32) -> usize {
        self.tables().task_comments.iter().filter(|c| c.task_id == task_id).count()
    }

    pub fn attachment_count(&self, task_id: i32) -> usize {
        self.tables().attachments.iter().filter(|a| a.task_id == task_id).count()
    }

    pub fn category_count(&self) -> usize {
        self.tables().categories.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_record(&self, id: i32) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned().map(User::from))
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut t = self.tables();
        let now = Utc::now();
        let record = UserRecord {
            id: t.id(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password: user.password_hash,
            role: user.role,
            avatar: user.avatar,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.users.push(record.clone());
        Ok(record.into())
    }

    async fn list(&self, query: &UserQuery) -> Result<Vec<User>, DatabaseError> {
        let t = self.tables();
        let term = search_term(query.search.as_deref());
        let mut users: Vec<User> = t
            .users
            .iter()
            .filter(|u| query.role.map_or(true, |r| u.role == r))
            .filter(|u| {
                term.map_or(true, |s| {
                    contains_ci(Some(&u.first_name), s) || contains_ci(Some(&u.last_name), s) || contains_ci(Some(&u.email), s)
                })
            })
            .cloned()
            .map(User::from)
            .collect();
        users.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(users)
    }

    async fn list_active_summaries(&self) -> Result<Vec<UserSummary>, DatabaseError> {
        let t = self.tables();
        let mut active: Vec<&UserRecord> = t.users.iter().filter(|u| u.is_active).collect();
        active.sort_by(|a, b| (&a.first_name, &a.last_name).cmp(&(&b.first_name, &b.last_name)));
        Ok(active.into_iter().filter_map(|u| t.summary(u.id)).collect())
    }

    async fn profile(&self, id: i32) -> Result<Option<UserProfile>, DatabaseError> {
        let t = self.tables();
        let Some(user) = t.users.iter().find(|u| u.id == id).cloned() else {
            return Ok(None);
        };
        let involved = |task: &&Task| task.assigned_to_id == Some(id) || task.created_by_id == id;
        Ok(Some(UserProfile {
            user: user.into(),
            projects_count: t.members.iter().filter(|m| m.user_id == id).count() as i64,
            tasks_count: t.tasks.iter().filter(involved).count() as i64,
            completed_tasks_count: t.tasks.iter().filter(involved).filter(|task| task.completed).count() as i64,
        }))
    }

    async fn update(&self, id: i32, changes: &UpdateUserRequest) -> Result<Option<User>, DatabaseError> {
        let mut t = self.tables();
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(v) = &changes.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &changes.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &changes.email {
            user.email = v.clone();
        }
        if let Some(v) = changes.role {
            user.role = v;
        }
        if let Some(v) = &changes.avatar {
            user.avatar = Some(v.clone());
        }
        if let Some(v) = changes.is_active {
            user.is_active = v;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone().into()))
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), DatabaseError> {
        let mut t = self.tables();
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DatabaseError::NotFound("User not found".into()))?;
        user.password = password_hash.into();
        Ok(())
    }

    async fn owns_projects(&self, id: i32) -> Result<bool, DatabaseError> {
        Ok(self.tables().projects.iter().any(|p| p.owner_id == id))
    }

    async fn created_tasks(&self, id: i32) -> Result<bool, DatabaseError> {
        Ok(self.tables().tasks.iter().any(|t| t.created_by_id == id))
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        let mut t = self.tables();
        t.members.retain(|m| m.user_id != id);
        t.task_comments.retain(|c| c.user_id != id);
        t.project_comments.retain(|c| c.user_id != id);
        t.attachments.retain(|a| a.uploaded_by_id != id);
        let private: Vec<i32> = t.categories.iter().filter(|c| c.user_id == Some(id)).map(|c| c.id).collect();
        for task in t.tasks.iter_mut().filter(|task| task.category_id.is_some_and(|c| private.contains(&c))) {
            task.category_id = None;
        }
        t.categories.retain(|c| c.user_id != Some(id));
        for task in t.tasks.iter_mut().filter(|task| task.assigned_to_id == Some(id)) {
            task.assigned_to_id = None;
        }
        t.users.retain(|u| u.id != id);
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn create(&self, owner_id: i32, request: &CreateProjectRequest) -> Result<Project, DatabaseError> {
        let mut t = self.tables();
        let now = Utc::now();
        let project = Project {
            id: t.id(),
            name: request.name.clone(),
            description: request.description.clone(),
            status: request.status,
            priority: request.priority,
            start_date: request.start_date,
            end_date: request.end_date,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        t.projects.push(project.clone());

        let mut joined = vec![(owner_id, MemberRole::Owner)];
        for user_id in &request.member_ids {
            if !joined.iter().any(|(id, _)| id == user_id) {
                joined.push((*user_id, MemberRole::Member));
            }
        }
        for (user_id, role) in joined {
            let id = t.id();
            t.members.push(ProjectMember { id, project_id: project.id, user_id, role, joined_at: now });
        }
        Ok(project)
    }

    async fn list(&self, query: &ProjectQuery) -> Result<(Vec<ProjectWithOwner>, i64), DatabaseError> {
        let t = self.tables();
        let term = search_term(query.search.as_deref());
        let mut matching: Vec<&Project> = t
            .projects
            .iter()
            .filter(|p| query.status.map_or(true, |s| p.status == s))
            .filter(|p| query.priority.map_or(true, |s| p.priority == s))
            .filter(|p| query.owner_id.map_or(true, |o| p.owner_id == o))
            .filter(|p| {
                query
                    .member_id
                    .map_or(true, |u| t.members.iter().any(|m| m.project_id == p.id && m.user_id == u))
            })
            .filter(|p| term.map_or(true, |s| contains_ci(Some(&p.name), s) || contains_ci(p.description.as_deref(), s)))
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .map(|p| ProjectWithOwner { project: p.clone(), owner: t.summary(p.owner_id) })
            .collect();
        Ok((page, total))
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Project>, DatabaseError> {
        Ok(self.tables().projects.iter().find(|p| p.id == id).cloned())
    }

    async fn details(&self, id: i32) -> Result<Option<ProjectDetails>, DatabaseError> {
        let t = self.tables();
        let Some(project) = t.projects.iter().find(|p| p.id == id).cloned() else {
            return Ok(None);
        };
        let members = t
            .members
            .iter()
            .filter(|m| m.project_id == id)
            .map(|m| ProjectMemberDetail { member: m.clone(), user: t.summary(m.user_id) })
            .collect();
        let tasks: Vec<&Task> = t.tasks.iter().filter(|task| task.project_id == Some(id)).collect();
        Ok(Some(ProjectDetails {
            owner: t.summary(project.owner_id),
            members,
            tasks_count: tasks.len() as i64,
            completed_tasks_count: tasks.iter().filter(|task| task.completed).count() as i64,
            project,
        }))
    }

    async fn update(&self, id: i32, changes: &UpdateProjectRequest) -> Result<Option<Project>, DatabaseError> {
        let mut t = self.tables();
        let Some(project) = t.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(v) = &changes.name {
            project.name = v.clone();
        }
        if let Some(v) = &changes.description {
            project.description = Some(v.clone());
        }
        if let Some(v) = changes.status {
            project.status = v;
        }
        if let Some(v) = changes.priority {
            project.priority = v;
        }
        if changes.start_date.is_some() {
            project.start_date = changes.start_date;
        }
        if changes.end_date.is_some() {
            project.end_date = changes.end_date;
        }
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        let mut t = self.tables();
        let task_ids: Vec<i32> = t.tasks.iter().filter(|task| task.project_id == Some(id)).map(|task| task.id).collect();
        for task_id in task_ids {
            t.remove_task(task_id);
        }
        t.project_comments.retain(|c| c.project_id != id);
        t.members.retain(|m| m.project_id != id);
        t.projects.retain(|p| p.id != id);
        Ok(())
    }

    async fn find_member(&self, project_id: i32, user_id: i32) -> Result<Option<ProjectMember>, DatabaseError> {
        let t = self.tables();
        Ok(t.members.iter().find(|m| m.project_id == project_id && m.user_id == user_id).cloned())
    }

    async fn add_members(&self, project_id: i32, members: &[MemberAssignment]) -> Result<Vec<ProjectMember>, DatabaseError> {
        let mut t = self.tables();
        let mut added = Vec::new();
        for assignment in members {
            let exists = t.members.iter().any(|m| m.project_id == project_id && m.user_id == assignment.user_id);
            if exists {
                continue;
            }
            let member = ProjectMember {
                id: t.id(),
                project_id,
                user_id: assignment.user_id,
                role: assignment.role,
                joined_at: Utc::now(),
            };
            t.members.push(member.clone());
            added.push(member);
        }
        Ok(added)
    }

    async fn remove_member(&self, project_id: i32, user_id: i32) -> Result<bool, DatabaseError> {
        let mut t = self.tables();
        let before = t.members.len();
        t.members.retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        Ok(t.members.len() < before)
    }

    async fn update_member_role(
        &self,
        project_id: i32,
        user_id: i32,
        role: MemberRole,
    ) -> Result<Option<ProjectMember>, DatabaseError> {
        let mut t = self.tables();
        let member = t.members.iter_mut().find(|m| m.project_id == project_id && m.user_id == user_id);
        Ok(member.map(|m| {
            m.role = role;
            m.clone()
        }))
    }

    async fn projects_for_member(&self, user_id: i32) -> Result<Vec<MemberProject>, DatabaseError> {
        let t = self.tables();
        Ok(t.members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                let project = t.projects.iter().find(|p| p.id == m.project_id)?;
                Some(MemberProject { project: project.clone(), member_role: m.role })
            })
            .collect())
    }

    async fn list_comments(&self, project_id: i32) -> Result<Vec<ProjectComment>, DatabaseError> {
        let t = self.tables();
        let mut comments: Vec<ProjectComment> =
            t.project_comments.iter().filter(|c| c.project_id == project_id).cloned().collect();
        comments.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(comments)
    }

    async fn create_comment(&self, project_id: i32, user_id: i32, content: &str) -> Result<ProjectComment, DatabaseError> {
        let mut t = self.tables();
        let now = Utc::now();
        let comment = ProjectComment {
            id: t.id(),
            content: content.into(),
            project_id,
            user_id,
            created_at: now,
            updated_at: now,
            user: t.summary(user_id),
        };
        t.project_comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, comment_id: i32) -> Result<Option<ProjectComment>, DatabaseError> {
        Ok(self.tables().project_comments.iter().find(|c| c.id == comment_id).cloned())
    }

    async fn delete_comment(&self, comment_id: i32) -> Result<(), DatabaseError> {
        self.tables().project_comments.retain(|c| c.id != comment_id);
        Ok(())
    }
}

fn sort_tasks(items: &mut [TaskListItem], field: TaskSortField, order: SortDirection) {
    items.sort_by(|a, b| {
        let (a, b) = (&a.task, &b.task);
        let ordering = match field {
            TaskSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            TaskSortField::DueDate => a.due_date.cmp(&b.due_date),
            TaskSortField::Priority => a.priority.as_str().cmp(b.priority.as_str()),
            TaskSortField::Title => a.title.cmp(&b.title),
        }
        .then(a.id.cmp(&b.id));
        match order {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create(&self, created_by_id: i32, request: &CreateTaskRequest) -> Result<Task, DatabaseError> {
        let mut t = self.tables();
        let now = Utc::now();
        let task = Task {
            id: t.id(),
            title: request.title.clone(),
            description: request.description.clone(),
            status: request.status,
            priority: request.priority,
            completed: request.status == TaskStatus::Completed,
            due_date: request.due_date,
            reminder_date: request.reminder_date,
            estimated_hours: request.estimated_hours,
            actual_hours: None,
            project_id: request.project_id,
            category_id: request.category_id,
            assigned_to_id: request.assigned_to_id,
            created_by_id,
            parent_task_id: request.parent_task_id,
            created_at: now,
            updated_at: now,
        };
        t.tasks.push(task.clone());
        Ok(task)
    }

    async fn list(&self, query: &TaskQuery) -> Result<Vec<TaskListItem>, DatabaseError> {
        let t = self.tables();
        let term = search_term(query.search.as_deref());
        let range = query.due_date_range();
        let mut items: Vec<TaskListItem> = t
            .tasks
            .iter()
            .filter(|task| query.status.map_or(true, |v| task.status == v))
            .filter(|task| query.priority.map_or(true, |v| task.priority == v))
            .filter(|task| query.completed.map_or(true, |v| task.completed == v))
            .filter(|task| query.project_id.map_or(true, |v| task.project_id == Some(v)))
            .filter(|task| query.category_id.map_or(true, |v| task.category_id == Some(v)))
            .filter(|task| query.assigned_to_id.map_or(true, |v| task.assigned_to_id == Some(v)))
            .filter(|task| query.created_by_id.map_or(true, |v| task.created_by_id == v))
            .filter(|task| query.include_subtasks() || task.parent_task_id.is_none())
            .filter(|task| {
                range.map_or(true, |(start, end)| task.due_date.is_some_and(|d: DateTime<Utc>| d >= start && d < end))
            })
            .filter(|task| term.map_or(true, |s| contains_ci(Some(&task.title), s) || contains_ci(task.description.as_deref(), s)))
            .map(|task| t.task_item(task))
            .collect();
        sort_tasks(&mut items, query.sort_by, query.sort_order);
        Ok(items)
    }

    async fn for_user(&self, user_id: i32, query: &MyTasksQuery) -> Result<Vec<TaskListItem>, DatabaseError> {
        let t = self.tables();
        let mut items: Vec<TaskListItem> = t
            .tasks
            .iter()
            .filter(|task| task.assigned_to_id == Some(user_id) || task.created_by_id == user_id)
            .filter(|task| query.status.map_or(true, |v| task.status == v))
            .filter(|task| query.priority.map_or(true, |v| task.priority == v))
            .filter(|task| query.completed.map_or(true, |v| task.completed == v))
            .map(|task| t.task_item(task))
            .collect();
        sort_tasks(&mut items, TaskSortField::CreatedAt, SortDirection::Desc);
        Ok(items)
    }

    async fn overdue(&self, now: DateTime<Utc>) -> Result<Vec<TaskListItem>, DatabaseError> {
        let t = self.tables();
        let mut items: Vec<TaskListItem> = t
            .tasks
            .iter()
            .filter(|task| !task.completed && task.due_date.is_some_and(|d| d < now))
            .map(|task| t.task_item(task))
            .collect();
        sort_tasks(&mut items, TaskSortField::DueDate, SortDirection::Asc);
        Ok(items)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, DatabaseError> {
        Ok(self.tables().tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn details(&self, id: i32) -> Result<Option<TaskDetails>, DatabaseError> {
        let t = self.tables();
        let Some(task) = t.tasks.iter().find(|task| task.id == id) else {
            return Ok(None);
        };
        let item = t.task_item(task);
        let parent_task = task
            .parent_task_id
            .and_then(|pid| t.tasks.iter().find(|p| p.id == pid))
            .map(|p| TaskRef { id: p.id, title: p.title.clone(), status: p.status });
        let subtasks = t
            .tasks
            .iter()
            .filter(|s| s.parent_task_id == Some(id))
            .map(|s| Subtask::from(t.task_item(s)))
            .collect();
        Ok(Some(TaskDetails {
            created_by: t.summary(task.created_by_id),
            parent_task,
            subtasks,
            comments: t.task_comments.iter().filter(|c| c.task_id == id).cloned().collect(),
            attachments: t.attachments.iter().filter(|a| a.task_id == id).cloned().collect(),
            task: item.task,
            project: item.project,
            category: item.category,
            assigned_to: item.assigned_to,
        }))
    }

    async fn update(&self, id: i32, changes: &UpdateTaskRequest) -> Result<Option<Task>, DatabaseError> {
        let mut t = self.tables();
        let Some(task) = t.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        if let Some(v) = &changes.title {
            task.title = v.clone();
        }
        if let Some(v) = &changes.description {
            task.description = Some(v.clone());
        }
        if let Some(v) = changes.status {
            task.status = v;
        }
        if let Some(v) = changes.priority {
            task.priority = v;
        }
        if let Some(v) = changes.completed {
            task.completed = v;
        }
        task.due_date = changes.due_date.or(task.due_date);
        task.reminder_date = changes.reminder_date.or(task.reminder_date);
        task.estimated_hours = changes.estimated_hours.or(task.estimated_hours);
        task.actual_hours = changes.actual_hours.or(task.actual_hours);
        task.category_id = changes.category_id.or(task.category_id);
        task.assigned_to_id = changes.assigned_to_id.or(task.assigned_to_id);
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn set_completed(&self, id: i32, completed: bool) -> Result<Option<Task>, DatabaseError> {
        let mut t = self.tables();
        let task = t.tasks.iter_mut().find(|task| task.id == id);
        Ok(task.map(|task| {
            task.completed = completed;
            task.status = TaskStatus::for_completion(completed);
            task.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        self.tables().remove_task(id);
        Ok(())
    }

    async fn create_comment(&self, task_id: i32, user_id: i32, content: &str) -> Result<TaskComment, DatabaseError> {
        let mut t = self.tables();
        let now = Utc::now();
        let comment = TaskComment {
            id: t.id(),
            content: content.into(),
            task_id,
            user_id,
            created_at: now,
            updated_at: now,
            user: t.summary(user_id),
        };
        t.task_comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, comment_id: i32) -> Result<Option<TaskComment>, DatabaseError> {
        Ok(self.tables().task_comments.iter().find(|c| c.id == comment_id).cloned())
    }

    async fn update_comment(&self, comment_id: i32, content: &str) -> Result<Option<TaskComment>, DatabaseError> {
        let mut t = self.tables();
        let comment = t.task_comments.iter_mut().find(|c| c.id == comment_id);
        Ok(comment.map(|c| {
            c.content = content.into();
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete_comment(&self, comment_id: i32) -> Result<(), DatabaseError> {
        self.tables().task_comments.retain(|c| c.id != comment_id);
        Ok(())
    }

    async fn create_attachment(
        &self,
        task_id: i32,
        uploaded_by_id: i32,
        request: &CreateAttachmentRequest,
    ) -> Result<TaskAttachment, DatabaseError> {
        let mut t = self.tables();
        let attachment = TaskAttachment {
            id: t.id(),
            file_name: request.file_name.clone(),
            file_url: request.file_url.clone(),
            file_size: request.file_size,
            mime_type: request.mime_type.clone(),
            task_id,
            uploaded_by_id,
            created_at: Utc::now(),
        };
        t.attachments.push(attachment.clone());
        Ok(attachment)
    }

    async fn find_attachment(&self, attachment_id: i32) -> Result<Option<TaskAttachment>, DatabaseError> {
        Ok(self.tables().attachments.iter().find(|a| a.id == attachment_id).cloned())
    }

    async fn delete_attachment(&self, attachment_id: i32) -> Result<(), DatabaseError> {
        self.tables().attachments.retain(|a| a.id != attachment_id);
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn create(&self, owner_id: Option<i32>, request: &CreateCategoryRequest) -> Result<Category, DatabaseError> {
        let mut t = self.tables();
        let category = Category {
            id: t.id(),
            name: request.name.trim().to_string(),
            color: request.color.clone().unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            description: request.description.clone(),
            user_id: owner_id,
            created_at: Utc::now(),
        };
        t.categories.push(category.clone());
        Ok(category)
    }

    async fn list(
        &self,
        owner_id: i32,
        include_global: bool,
        search: Option<&str>,
    ) -> Result<Vec<CategoryWithCounts>, DatabaseError> {
        let t = self.tables();
        let term = search_term(search);
        let mut categories: Vec<&Category> = t
            .categories
            .iter()
            .filter(|c| c.user_id == Some(owner_id) || (include_global && c.user_id.is_none()))
            .filter(|c| term.map_or(true, |s| contains_ci(Some(&c.name), s) || contains_ci(c.description.as_deref(), s)))
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories.into_iter().map(|c| t.category_counts(c)).collect())
    }

    async fn list_global(&self) -> Result<Vec<CategoryWithCounts>, DatabaseError> {
        let t = self.tables();
        let mut categories: Vec<&Category> = t.categories.iter().filter(|c| c.is_global()).collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories.into_iter().map(|c| t.category_counts(c)).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Category>, DatabaseError> {
        Ok(self.tables().categories.iter().find(|c| c.id == id).cloned())
    }

    async fn with_counts(&self, id: i32) -> Result<Option<CategoryWithCounts>, DatabaseError> {
        let t = self.tables();
        Ok(t.categories.iter().find(|c| c.id == id).map(|c| t.category_counts(c)))
    }

    async fn update(&self, id: i32, changes: &UpdateCategoryRequest) -> Result<Option<Category>, DatabaseError> {
        let mut t = self.tables();
        let category = t.categories.iter_mut().find(|c| c.id == id);
        Ok(category.map(|c| {
            if let Some(v) = &changes.name {
                c.name = v.trim().to_string();
            }
            if let Some(v) = &changes.color {
                c.color = v.clone();
            }
            if let Some(v) = &changes.description {
                c.description = Some(v.clone());
            }
            c.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        let mut t = self.tables();
        for task in t.tasks.iter_mut().filter(|task| task.category_id == Some(id)) {
            task.category_id = None;
        }
        t.categories.retain(|c| c.id != id);
        Ok(())
    }
}

/// One store wired into every service
#[derive(Default)]
pub struct Fixture {
    pub store: Arc<MemoryStore>,
}

impl Fixture {
    pub fn user(&self, email: &str) -> User {
        self.store.insert(email, "unused-hash")
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.store.clone())
    }

    pub fn project_service(&self) -> ProjectService {
        ProjectService::new(self.store.clone(), self.store.clone())
    }

    pub fn task_service(&self) -> TaskService {
        TaskService::new(self.store.clone(), self.store.clone(), self.store.clone(), self.store.clone())
    }

    pub fn category_service(&self) -> CategoryService {
        CategoryService::new(self.store.clone())
    }
}
