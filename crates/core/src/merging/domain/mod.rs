pub mod adjacency;
pub mod geometry_adapter;
pub mod group_merger;
pub mod grouper;
pub mod merge_config;
pub mod merge_engine;
pub mod union_find;
