pub mod help_overlay;
pub mod hud;
pub mod map_view;
pub mod run_summary;
pub mod toast;
