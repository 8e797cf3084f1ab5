use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use crate::types::TaskStatus;

use crate::{entities::task, models::ids};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Task not found")]
    TaskNotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub position: Option<i32>,
}

/// One entry of a batch reorder: the task's new lane and position.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskReorderEntry {
    pub id: Uuid,
    pub status: TaskStatus,
    pub position: i32,
}

/// The four kanban lanes, each ordered by position then creation time.
#[derive(Debug, Default, Serialize)]
pub struct TasksByStatus {
    pub todo: Vec<Task>,
    #[serde(rename = "in-progress")]
    pub in_progress: Vec<Task>,
    pub review: Vec<Task>,
    pub done: Vec<Task>,
}

impl Task {
    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let project_uuid = ids::project_uuid_by_id(db, model.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        Ok(Self {
            id: model.uuid,
            project_id: project_uuid,
            title: model.title,
            description: model.description,
            status: model.status,
            position: model.position,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    async fn collect<C: ConnectionTrait>(
        db: &C,
        models: Vec<task::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = task::Entity::find()
            .order_by_desc(task::Column::CreatedAt)
            .all(db)
            .await?;
        Self::collect(db, models).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;

        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_project<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let Some(project_row_id) = ids::project_id_by_uuid(db, project_id).await? else {
            return Ok(Vec::new());
        };

        let models = task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_row_id))
            .order_by_asc(task::Column::Position)
            .order_by_asc(task::Column::CreatedAt)
            .all(db)
            .await?;
        Self::collect(db, models).await
    }

    pub async fn find_by_status<C: ConnectionTrait>(
        db: &C,
        status: TaskStatus,
    ) -> Result<Vec<Self>, DbErr> {
        let models = task::Entity::find()
            .filter(task::Column::Status.eq(status))
            .order_by_asc(task::Column::Position)
            .order_by_asc(task::Column::CreatedAt)
            .all(db)
            .await?;
        Self::collect(db, models).await
    }

    pub async fn find_by_project_grouped<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<TasksByStatus, DbErr> {
        let tasks = Self::find_by_project(db, project_id).await?;

        let mut grouped = TasksByStatus::default();
        for task in tasks {
            match task.status {
                TaskStatus::Todo => grouped.todo.push(task),
                TaskStatus::InProgress => grouped.in_progress.push(task),
                TaskStatus::Review => grouped.review.push(task),
                TaskStatus::Done => grouped.done.push(task),
            }
        }
        Ok(grouped)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, data.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(task_id),
            project_id: Set(project_row_id),
            title: Set(data.title.trim().to_string()),
            description: Set(data.description.clone()),
            status: Set(data.status.clone().unwrap_or_default()),
            position: Set(data.position.unwrap_or(0)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        title: String,
        description: Option<String>,
        status: TaskStatus,
        position: i32,
    ) -> Result<Self, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let mut active: task::ActiveModel = record.into();
        active.title = Set(title);
        active.description = Set(description);
        active.status = Set(status);
        active.position = Set(position);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    pub async fn update_status<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Self, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let mut active: task::ActiveModel = record.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    pub async fn update_position<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        position: i32,
    ) -> Result<Self, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let mut active: task::ActiveModel = record.into();
        active.position = Set(position);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let task = Self::from_model(db, record).await?;
        task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(Some(task))
    }

    /// Applies each entry as an independent update scoped to the given
    /// project. Entries whose id does not belong to the project are skipped,
    /// not treated as errors. Callers wanting all-or-nothing semantics run
    /// this inside a transaction.
    pub async fn reorder<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
        entries: &[TaskReorderEntry],
    ) -> Result<Vec<Self>, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let mut updated = Vec::new();
        for entry in entries {
            let record = task::Entity::find()
                .filter(task::Column::Uuid.eq(entry.id))
                .filter(task::Column::ProjectId.eq(project_row_id))
                .one(db)
                .await?;

            let Some(record) = record else {
                tracing::debug!(task_id = %entry.id, %project_id, "skipping reorder entry outside project");
                continue;
            };

            let mut active: task::ActiveModel = record.into();
            active.status = Set(entry.status.clone());
            active.position = Set(entry.position);
            active.updated_at = Set(Utc::now().into());
            updated.push(Self::from_model(db, active.update(db).await?).await?);
        }

        Ok(updated)
    }
}
