//! Formats a captured text selection as JSON, highlights it into a typed
//! markup tree and searches the rendered text with a navigable cursor.

pub mod capture;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod highlight;
pub mod loader;
pub mod messages;
pub mod render;
pub mod search;
pub mod state;
pub mod store;
pub mod surface;
pub mod tree;
pub mod types;

pub use controller::DisplayController;
pub use document::Document;
pub use highlight::highlight;
pub use search::{search, Cursor, SearchSession};
pub use types::{Category, MarkedNode, MatchSpan, Presentation, RenderedView};
