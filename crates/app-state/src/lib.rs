//! UI state for the single-page client, modeled as a reducer: a fixed set of
//! named transitions over one state tree. Network calls live outside the
//! store; their results come back in as actions.

use db::models::{mind_map_node::MindMapNode, project::Project, task::Task};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Kanban,
    Chat,
    MindMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// The modals the client can open; each is tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modal {
    Project,
    Task,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    pub project: bool,
    pub task: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    pub sidebar_open: bool,
    pub modals: ModalState,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            modals: ModalState::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub current_project: Option<Project>,
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub mind_map_nodes: Vec<MindMapNode>,
    pub current_view: View,
    pub theme: Theme,
    pub ui: UiState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    SetCurrentProject(Option<Project>),
    SetProjects(Vec<Project>),
    AddProject(Project),
    UpdateProject(Project),
    DeleteProject(Uuid),
    SetTasks(Vec<Task>),
    AddTask(Task),
    UpdateTask(Task),
    DeleteTask(Uuid),
    SetMindMapNodes(Vec<MindMapNode>),
    AddMindMapNode(MindMapNode),
    UpdateMindMapNode(MindMapNode),
    DeleteMindMapNode(Uuid),
    SetCurrentView(View),
    ToggleSidebar,
    ToggleTheme,
    OpenModal(Modal),
    CloseModal(Modal),
}

/// Pure transition function: every action maps old state to new state, no
/// I/O, no failure mode.
#[must_use]
pub fn reduce(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::SetCurrentProject(project) => {
            state.current_project = project;
        }
        Action::SetProjects(projects) => {
            state.projects = projects;
        }
        Action::AddProject(project) => {
            state.projects.push(project);
        }
        Action::UpdateProject(project) => {
            if let Some(existing) = state.projects.iter_mut().find(|p| p.id == project.id) {
                *existing = project.clone();
            }
            if state
                .current_project
                .as_ref()
                .is_some_and(|p| p.id == project.id)
            {
                state.current_project = Some(project);
            }
        }
        Action::DeleteProject(id) => {
            state.projects.retain(|p| p.id != id);
            if state.current_project.as_ref().is_some_and(|p| p.id == id) {
                state.current_project = None;
            }
        }
        Action::SetTasks(tasks) => {
            state.tasks = tasks;
        }
        Action::AddTask(task) => {
            state.tasks.push(task);
        }
        Action::UpdateTask(task) => {
            if let Some(existing) = state.tasks.iter_mut().find(|t| t.id == task.id) {
                *existing = task;
            }
        }
        Action::DeleteTask(id) => {
            state.tasks.retain(|t| t.id != id);
        }
        Action::SetMindMapNodes(nodes) => {
            state.mind_map_nodes = nodes;
        }
        Action::AddMindMapNode(node) => {
            state.mind_map_nodes.push(node);
        }
        Action::UpdateMindMapNode(node) => {
            if let Some(existing) = state.mind_map_nodes.iter_mut().find(|n| n.id == node.id) {
                *existing = node;
            }
        }
        Action::DeleteMindMapNode(id) => {
            state.mind_map_nodes.retain(|n| n.id != id);
        }
        Action::SetCurrentView(view) => {
            state.current_view = view;
        }
        Action::ToggleSidebar => {
            state.ui.sidebar_open = !state.ui.sidebar_open;
        }
        Action::ToggleTheme => {
            state.theme = state.theme.toggled();
        }
        Action::OpenModal(modal) => match modal {
            Modal::Project => state.ui.modals.project = true,
            Modal::Task => state.ui.modals.task = true,
        },
        Action::CloseModal(modal) => match modal {
            Modal::Project => state.ui.modals.project = false,
            Modal::Task => state.ui.modals.task = false,
        },
    }
    state
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn project(name: &str) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            system_prompt: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn task(project_id: Uuid, title: &str) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id,
            title: title.to_string(),
            description: None,
            status: db::types::TaskStatus::Todo,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn defaults_match_the_initial_client_state() {
        let state = AppState::default();
        assert!(state.current_project.is_none());
        assert_eq!(state.current_view, View::Kanban);
        assert_eq!(state.theme, Theme::Light);
        assert!(state.ui.sidebar_open);
        assert!(!state.ui.modals.project);
        assert!(!state.ui.modals.task);
    }

    #[test]
    fn update_project_also_refreshes_current_selection() {
        let mut p = project("Alpha");
        let state = reduce(AppState::default(), Action::AddProject(p.clone()));
        let state = reduce(state, Action::SetCurrentProject(Some(p.clone())));

        p.name = "Beta".to_string();
        let state = reduce(state, Action::UpdateProject(p.clone()));

        assert_eq!(state.projects[0].name, "Beta");
        assert_eq!(state.current_project.as_ref().unwrap().name, "Beta");
    }

    #[test]
    fn delete_project_clears_matching_selection_only() {
        let keep = project("Keep");
        let drop = project("Drop");
        let mut state = AppState::default();
        state = reduce(state, Action::SetProjects(vec![keep.clone(), drop.clone()]));
        state = reduce(state, Action::SetCurrentProject(Some(keep.clone())));

        state = reduce(state, Action::DeleteProject(drop.id));
        assert_eq!(state.projects.len(), 1);
        assert!(state.current_project.is_some());

        state = reduce(state, Action::DeleteProject(keep.id));
        assert!(state.projects.is_empty());
        assert!(state.current_project.is_none());
    }

    #[test]
    fn task_transitions_add_update_delete() {
        let p = project("Alpha");
        let mut t = task(p.id, "write");
        let state = reduce(AppState::default(), Action::AddTask(t.clone()));
        assert_eq!(state.tasks.len(), 1);

        t.title = "write more".to_string();
        let state = reduce(state, Action::UpdateTask(t.clone()));
        assert_eq!(state.tasks[0].title, "write more");

        let state = reduce(state, Action::DeleteTask(t.id));
        assert!(state.tasks.is_empty());
    }

    #[test]
    fn toggles_flip_and_flip_back() {
        let state = reduce(AppState::default(), Action::ToggleSidebar);
        assert!(!state.ui.sidebar_open);
        let state = reduce(state, Action::ToggleSidebar);
        assert!(state.ui.sidebar_open);

        let state = reduce(state, Action::ToggleTheme);
        assert_eq!(state.theme, Theme::Dark);
        let state = reduce(state, Action::ToggleTheme);
        assert_eq!(state.theme, Theme::Light);
    }

    #[test]
    fn modals_open_and_close_independently() {
        let state = reduce(AppState::default(), Action::OpenModal(Modal::Project));
        let state = reduce(state, Action::OpenModal(Modal::Task));
        assert!(state.ui.modals.project);
        assert!(state.ui.modals.task);

        let state = reduce(state, Action::CloseModal(Modal::Project));
        assert!(!state.ui.modals.project);
        assert!(state.ui.modals.task);
    }

    #[test]
    fn unmatched_update_leaves_state_unchanged() {
        let p = project("Alpha");
        let before = reduce(AppState::default(), Action::AddProject(p));
        let after = reduce(before.clone(), Action::UpdateProject(project("Ghost")));
        assert_eq!(before, after);
    }

    #[test]
    fn actions_round_trip_through_json() {
        let action = Action::SetCurrentView(View::MindMap);
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("set_current_view"));
        let back: Action = serde_json::from_value(json).unwrap();
        assert!(matches!(back, Action::SetCurrentView(View::MindMap)));
    }
}
