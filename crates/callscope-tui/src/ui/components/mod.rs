mod error_popup;
mod help_overlay;
mod status_bar;

pub use error_popup::ErrorPopup;
pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, log_viewer_hints};
