pub mod fps_tracking;
pub mod sort_overlay;
