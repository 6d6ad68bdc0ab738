//! GUI module - User interface components

mod action_board;
mod app;
mod data_panel;

pub use action_board::{ActionBoard, BoardAction};
pub use app::NextActionApp;
pub use data_panel::{DataPanel, DataPanelAction, PreviewRow};
