pub mod overlay_mask_renderer;
pub mod replay_detector;
pub mod worker_thread_detector;
