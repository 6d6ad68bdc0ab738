//! Next Action BI - recommendation board and sales profitability metrics.
//!
//! The [`data`] module loads a sales dataset and derives cost, profit and
//! margin columns through a process-wide cache. The rest of the crate is the
//! dashboard that presents recommendations and emails assignments to teams.

pub mod catalog;
pub mod data;
pub mod gui;
pub mod notify;
pub mod session;
pub mod settings;

pub use data::load_data;
