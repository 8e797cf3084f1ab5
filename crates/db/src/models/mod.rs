pub mod ids;
pub mod mind_map_node;
pub mod project;
pub mod task;
