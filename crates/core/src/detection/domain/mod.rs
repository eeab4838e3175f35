pub mod mask_renderer;
pub mod parking_space_detector;
pub mod vehicle_counter;
