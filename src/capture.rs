use tracing::{debug, info};

use crate::error::StorageError;
use crate::store::{SelectionStore, SELECTED_JSON_KEY};

pub const MENU_ITEM_ID: &str = "format-json";
pub const MENU_ITEM_TITLE: &str = "View Formatted JSON";

/// Context-menu entry offered on text selections.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MenuItem {
    pub id: &'static str,
    pub title: &'static str,
    pub contexts: &'static [&'static str],
}

pub fn menu_item() -> MenuItem {
    MenuItem {
        id: MENU_ITEM_ID,
        title: MENU_ITEM_TITLE,
        contexts: &["selection"],
    }
}

/// Handles a context-menu click. Stores the selection when the click was on
/// our item and reports whether it did.
pub fn on_menu_clicked(
    store: &dyn SelectionStore,
    item_id: &str,
    selection_text: &str,
) -> Result<bool, StorageError> {
    if item_id != MENU_ITEM_ID {
        debug!(item_id, "ignoring menu click");
        return Ok(false);
    }
    store.set(SELECTED_JSON_KEY, selection_text)?;
    info!(chars = selection_text.chars().count(), "JSON stored in storage");
    Ok(true)
}
