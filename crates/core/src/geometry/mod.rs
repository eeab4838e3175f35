pub mod polygon_metrics;
pub mod projection;
pub mod shape;
