use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entities::mind_map_node,
    models::{
        ids,
        task::{CreateTask, Task, TaskStatus},
    },
};

pub const DEFAULT_NODE_COLOR: &str = "#4A5568";

#[derive(Debug, Error)]
pub enum MindMapNodeError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Mind map node not found")]
    NodeNotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub x_position: f64,
    pub y_position: f64,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMindMapNode {
    pub project_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub x_position: Option<f64>,
    pub y_position: Option<f64>,
    pub color: Option<String>,
}

/// Patch payload. `parent_id` distinguishes "absent" (keep) from an explicit
/// `null` (detach to root) via the nested `Option`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMindMapNode {
    pub title: Option<String>,
    pub description: Option<String>,
    pub x_position: Option<f64>,
    pub y_position: Option<f64>,
    pub color: Option<String>,
    #[serde(default, with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
}

mod double_option {
    use serde::{Deserialize, Deserializer};
    use uuid::Uuid;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Uuid>::deserialize(deserializer).map(Some)
    }
}

/// One node of the hierarchy tree, children nested in creation order.
#[derive(Debug, Clone, Serialize)]
pub struct NodeTree {
    #[serde(flatten)]
    pub node: MindMapNode,
    pub children: Vec<NodeTree>,
}

/// Flat list plus assembled trees, the shape the hierarchy endpoint returns.
#[derive(Debug, Serialize)]
pub struct NodeHierarchy {
    pub nodes: Vec<MindMapNode>,
    pub hierarchy: Vec<NodeTree>,
}

fn normalize_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl MindMapNode {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: mind_map_node::Model,
    ) -> Result<Self, DbErr> {
        let project_uuid = ids::project_uuid_by_id(db, model.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let parent_uuid = match model.parent_id {
            Some(id) => ids::mind_map_node_uuid_by_id(db, id)
                .await?
                .ok_or(DbErr::RecordNotFound("Parent node not found".to_string()))
                .map(Some)?,
            None => None,
        };

        Ok(Self {
            id: model.uuid,
            project_id: project_uuid,
            parent_id: parent_uuid,
            title: model.title,
            description: model.description,
            x_position: model.x_position,
            y_position: model.y_position,
            color: model.color,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    async fn collect<C: ConnectionTrait>(
        db: &C,
        models: Vec<mind_map_node::Model>,
    ) -> Result<Vec<Self>, DbErr> {
        let mut nodes = Vec::with_capacity(models.len());
        for model in models {
            nodes.push(Self::from_model(db, model).await?);
        }
        Ok(nodes)
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = mind_map_node::Entity::find()
            .order_by_desc(mind_map_node::Column::CreatedAt)
            .all(db)
            .await?;
        Self::collect(db, models).await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = mind_map_node::Entity::find()
            .filter(mind_map_node::Column::Uuid.eq(id))
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

        let models = mind_map_node::Entity::find()
            .filter(mind_map_node::Column::ProjectId.eq(project_row_id))
            .order_by_asc(mind_map_node::Column::CreatedAt)
            .order_by_asc(mind_map_node::Column::Id)
            .all(db)
            .await?;
        Self::collect(db, models).await
    }

    pub async fn find_children<C: ConnectionTrait>(
        db: &C,
        parent_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let Some(parent_row_id) = ids::mind_map_node_id_by_uuid(db, parent_id).await? else {
            return Ok(Vec::new());
        };

        let models = mind_map_node::Entity::find()
            .filter(mind_map_node::Column::ParentId.eq(parent_row_id))
            .order_by_asc(mind_map_node::Column::CreatedAt)
            .order_by_asc(mind_map_node::Column::Id)
            .all(db)
            .await?;
        Self::collect(db, models).await
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateMindMapNode,
        node_id: Uuid,
    ) -> Result<Self, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, data.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let parent_row_id = match data.parent_id {
            Some(parent) => ids::mind_map_node_id_by_uuid(db, parent)
                .await?
                .ok_or(DbErr::RecordNotFound("Parent node not found".to_string()))
                .map(Some)?,
            None => None,
        };

        let now = Utc::now();
        let active = mind_map_node::ActiveModel {
            uuid: Set(node_id),
            project_id: Set(project_row_id),
            parent_id: Set(parent_row_id),
            title: Set(data.title.trim().to_string()),
            description: Set(data.description.as_deref().and_then(normalize_text)),
            x_position: Set(data.x_position.unwrap_or(0.0)),
            y_position: Set(data.y_position.unwrap_or(0.0)),
            color: Set(data
                .color
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NODE_COLOR.to_string())),
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
        payload: &UpdateMindMapNode,
    ) -> Result<Self, DbErr> {
        let record = mind_map_node::Entity::find()
            .filter(mind_map_node::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Mind map node not found".to_string()))?;

        let mut active: mind_map_node::ActiveModel = record.into();
        if let Some(title) = payload.title.as_deref() {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = payload.description.as_deref() {
            active.description = Set(normalize_text(description));
        }
        if let Some(x) = payload.x_position {
            active.x_position = Set(x);
        }
        if let Some(y) = payload.y_position {
            active.y_position = Set(y);
        }
        if let Some(color) = payload.color.as_deref()
            && !color.trim().is_empty()
        {
            active.color = Set(color.trim().to_string());
        }
        match payload.parent_id {
            Some(Some(parent)) => {
                let parent_row_id = ids::mind_map_node_id_by_uuid(db, parent)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Parent node not found".to_string()))?;
                active.parent_id = Set(Some(parent_row_id));
            }
            Some(None) => {
                active.parent_id = Set(None);
            }
            None => {}
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    pub async fn update_position<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        x_position: f64,
        y_position: f64,
    ) -> Result<Self, DbErr> {
        let record = mind_map_node::Entity::find()
            .filter(mind_map_node::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Mind map node not found".to_string()))?;

        let mut active: mind_map_node::ActiveModel = record.into();
        active.x_position = Set(x_position);
        active.y_position = Set(y_position);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    /// Removes direct children, then the node itself. Deeper descendants are
    /// taken out by the parent-id cascade rule. Callers wrap this in a
    /// transaction so a crash cannot orphan a child. Returns the deleted row.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = mind_map_node::Entity::find()
            .filter(mind_map_node::Column::Uuid.eq(id))
            .one(db)
            .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let node = Self::from_model(db, record.clone()).await?;
        mind_map_node::Entity::delete_many()
            .filter(mind_map_node::Column::ParentId.eq(record.id))
            .exec(db)
            .await?;
        mind_map_node::Entity::delete_many()
            .filter(mind_map_node::Column::Id.eq(record.id))
            .exec(db)
            .await?;
        Ok(Some(node))
    }

    /// Turns the node into a task carrying its project, title and
    /// description, then deletes the node. Callers run this inside one
    /// transaction: the node is never lost without a task, never duplicated.
    pub async fn convert_to_task<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        task_id: Uuid,
        status: TaskStatus,
        position: i32,
    ) -> Result<Task, MindMapNodeError> {
        let record = mind_map_node::Entity::find()
            .filter(mind_map_node::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(MindMapNodeError::NodeNotFound)?;

        let project_id = ids::project_uuid_by_id(db, record.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let task = Task::create(
            db,
            &CreateTask {
                project_id,
                title: record.title.clone(),
                description: record.description.clone(),
                status: Some(status),
                position: Some(position),
            },
            task_id,
        )
        .await?;

        mind_map_node::Entity::delete_many()
            .filter(mind_map_node::Column::ParentId.eq(record.id))
            .exec(db)
            .await?;
        mind_map_node::Entity::delete_many()
            .filter(mind_map_node::Column::Id.eq(record.id))
            .exec(db)
            .await?;

        Ok(task)
    }

    /// All of a project's nodes as a flat list plus assembled trees.
    pub async fn hierarchy<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<NodeHierarchy, DbErr> {
        let nodes = Self::find_by_project(db, project_id).await?;
        let hierarchy = build_tree(&nodes);
        Ok(NodeHierarchy { nodes, hierarchy })
    }
}

/// Single-pass bucketing by parent id. A node whose parent is not in the set
/// becomes a root; the visited set keeps a malformed parent chain (written
/// around the accessor's self-parent guard) from looping.
fn build_tree(nodes: &[MindMapNode]) -> Vec<NodeTree> {
    let known: HashSet<Uuid> = nodes.iter().map(|n| n.id).collect();
    let mut children_of: HashMap<Uuid, Vec<&MindMapNode>> = HashMap::new();
    let mut roots: Vec<&MindMapNode> = Vec::new();

    for node in nodes {
        match node.parent_id {
            Some(parent) if parent != node.id && known.contains(&parent) => {
                children_of.entry(parent).or_default().push(node);
            }
            _ => roots.push(node),
        }
    }

    let mut visited = HashSet::new();
    let mut trees = Vec::with_capacity(roots.len());
    for root in roots {
        if visited.insert(root.id) {
            trees.push(attach_children(root, &children_of, &mut visited));
        }
    }
    trees
}

fn attach_children(
    node: &MindMapNode,
    children_of: &HashMap<Uuid, Vec<&MindMapNode>>,
    visited: &mut HashSet<Uuid>,
) -> NodeTree {
    let mut children = Vec::new();
    if let Some(kids) = children_of.get(&node.id) {
        for kid in kids {
            if visited.insert(kid.id) {
                children.push(attach_children(kid, children_of, visited));
            }
        }
    }
    NodeTree {
        node: node.clone(),
        children,
    }
}
