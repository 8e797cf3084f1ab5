use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entities::project,
    models::{mind_map_node::MindMapNode, task::Task},
};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Project not found")]
    ProjectNotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
}

/// Patch payload. An omitted field keeps the stored value; an empty string
/// in a clearable text field resets it to NULL.
#[derive(Debug, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectWithDetails {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
    pub mind_map_nodes: Vec<MindMapNode>,
}

fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Project {
    fn from_model(model: project::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            description: model.description,
            system_prompt: model.system_prompt,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = project::Entity::find()
            .order_by_desc(project::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateProject,
        project_id: Uuid,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = project::ActiveModel {
            uuid: Set(project_id),
            name: Set(data.name.trim().to_string()),
            description: Set(data.description.as_deref().and_then(normalize_text)),
            system_prompt: Set(data.system_prompt.as_deref().and_then(normalize_text)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        payload: &UpdateProject,
    ) -> Result<Self, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let mut active: project::ActiveModel = record.into();
        if let Some(name) = payload.name.as_deref() {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = payload.description.as_deref() {
            active.description = Set(normalize_text(description));
        }
        if let Some(system_prompt) = payload.system_prompt.as_deref() {
            active.system_prompt = Set(normalize_text(system_prompt));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    /// Removes the project and, through the cascade rules, every task and
    /// mind-map node that belongs to it. Returns the deleted row.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let project = Self::from_model(record);
        project::Entity::delete_many()
            .filter(project::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(Some(project))
    }

    pub async fn tasks<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Vec<Task>, DbErr> {
        Task::find_by_project(db, id).await
    }

    pub async fn mind_map_nodes<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Vec<MindMapNode>, DbErr> {
        MindMapNode::find_by_project(db, id).await
    }

    /// Project plus its tasks and nodes in one call. Run inside a
    /// transaction by the caller so the three reads see one snapshot.
    pub async fn find_with_details<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<ProjectWithDetails>, DbErr> {
        let Some(project) = Self::find_by_id(db, id).await? else {
            return Ok(None);
        };

        let tasks = Task::find_by_project(db, id).await?;
        let mind_map_nodes = MindMapNode::find_by_project(db, id).await?;

        Ok(Some(ProjectWithDetails {
            project,
            tasks,
            mind_map_nodes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use crate::models::{
        mind_map_node::{CreateMindMapNode, MindMapNode},
        task::{CreateTask, Task},
    };

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn create_payload(name: &str) -> CreateProject {
        CreateProject {
            name: name.to_string(),
            description: Some("A board".to_string()),
            system_prompt: None,
        }
    }

    #[tokio::test]
    async fn create_and_find_round_trip() {
        let db = setup_db().await;
        let id = Uuid::new_v4();

        let created = Project::create(&db, &create_payload("Alpha"), id).await.unwrap();
        assert_eq!(created.id, id);
        assert_eq!(created.name, "Alpha");
        assert_eq!(created.description.as_deref(), Some("A board"));
        assert!(created.system_prompt.is_none());

        let found = Project::find_by_id(&db, id).await.unwrap().unwrap();
        assert_eq!(found.name, "Alpha");
        assert_eq!(found.created_at, created.created_at);

        assert!(Project::find_by_id(&db, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_patches_only_provided_fields() {
        let db = setup_db().await;
        let id = Uuid::new_v4();
        Project::create(&db, &create_payload("Alpha"), id).await.unwrap();

        let updated = Project::update(
            &db,
            id,
            &UpdateProject {
                name: Some("Beta".to_string()),
                description: None,
                system_prompt: Some("be brief".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Beta");
        assert_eq!(updated.description.as_deref(), Some("A board"));
        assert_eq!(updated.system_prompt.as_deref(), Some("be brief"));
    }

    #[tokio::test]
    async fn update_clears_description_on_empty_string() {
        let db = setup_db().await;
        let id = Uuid::new_v4();
        Project::create(&db, &create_payload("Alpha"), id).await.unwrap();

        let updated = Project::update(
            &db,
            id,
            &UpdateProject {
                name: None,
                description: Some("  ".to_string()),
                system_prompt: None,
            },
        )
        .await
        .unwrap();

        assert!(updated.description.is_none());
    }

    #[tokio::test]
    async fn update_missing_project_is_record_not_found() {
        let db = setup_db().await;
        let err = Project::update(
            &db,
            Uuid::new_v4(),
            &UpdateProject {
                name: Some("Beta".to_string()),
                description: None,
                system_prompt: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbErr::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn delete_cascades_to_tasks_and_nodes() {
        let db = setup_db().await;
        let project_id = Uuid::new_v4();
        Project::create(&db, &create_payload("Alpha"), project_id).await.unwrap();

        let task_id = Uuid::new_v4();
        Task::create(
            &db,
            &CreateTask {
                project_id,
                title: "t".to_string(),
                description: None,
                status: None,
                position: None,
            },
            task_id,
        )
        .await
        .unwrap();

        let node_id = Uuid::new_v4();
        MindMapNode::create(
            &db,
            &CreateMindMapNode {
                project_id,
                parent_id: None,
                title: "n".to_string(),
                description: None,
                x_position: None,
                y_position: None,
                color: None,
            },
            node_id,
        )
        .await
        .unwrap();

        let deleted = Project::delete(&db, project_id).await.unwrap().unwrap();
        assert_eq!(deleted.id, project_id);

        assert!(Project::find_by_id(&db, project_id).await.unwrap().is_none());
        assert!(Task::find_by_id(&db, task_id).await.unwrap().is_none());
        assert!(MindMapNode::find_by_id(&db, node_id).await.unwrap().is_none());

        assert!(Project::delete(&db, project_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_with_details_collects_tasks_and_nodes() {
        let db = setup_db().await;
        let project_id = Uuid::new_v4();
        Project::create(&db, &create_payload("Alpha"), project_id).await.unwrap();

        for title in ["one", "two"] {
            Task::create(
                &db,
                &CreateTask {
                    project_id,
                    title: title.to_string(),
                    description: None,
                    status: None,
                    position: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        }
        MindMapNode::create(
            &db,
            &CreateMindMapNode {
                project_id,
                parent_id: None,
                title: "root".to_string(),
                description: None,
                x_position: None,
                y_position: None,
                color: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let details = Project::find_with_details(&db, project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.project.id, project_id);
        assert_eq!(details.tasks.len(), 2);
        assert_eq!(details.mind_map_nodes.len(), 1);

        assert!(Project::find_with_details(&db, Uuid::new_v4()).await.unwrap().is_none());
    }
}
