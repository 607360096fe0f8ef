//! Terminal user interface for callscope
//!
//! State management, keybindings, terminal event handling and the widgets
//! that draw a loaded call log.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{ErrorPopup, HelpOverlay, StatusBar};
pub use ui::screens::LogViewerScreen;
pub use ui::{Layout, Theme};
