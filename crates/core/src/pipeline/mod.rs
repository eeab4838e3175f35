pub mod analysis_result;
pub mod analysis_settings;
pub mod analyze_parking_use_case;
pub mod geo_projector;
pub mod pipeline_logger;
