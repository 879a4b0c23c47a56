use std::sync::Arc;

use parking_lot::Mutex;
use tokio::{sync::broadcast, task::spawn_blocking};
use tracing::{debug, warn};

use crate::controller::{DisplayController, LoadOutcome};
use crate::error::StorageError;
use crate::store::{SelectionStore, StoreChange, SELECTED_JSON_KEY};
use crate::surface::Surface;

/// Reads the stored selection on the blocking pool.
pub async fn fetch_selection(store: Arc<dyn SelectionStore>) -> Result<Option<String>, StorageError> {
    spawn_blocking(move || store.get(SELECTED_JSON_KEY))
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
}

/// Loads the stored selection into the controller. The controller lock is
/// only held to issue and to apply the ticket, never across the await.
pub async fn refresh<S: Surface>(
    controller: &Mutex<DisplayController<S>>,
    store: Arc<dyn SelectionStore>,
) -> LoadOutcome {
    let ticket = controller.lock().begin_load();
    let result = fetch_selection(store).await;
    controller.lock().complete_load(ticket, result)
}

pub fn is_selection_change(change: &StoreChange) -> bool {
    change.key == SELECTED_JSON_KEY
}

/// Reloads on every change to the selection key until the store's change
/// feed closes.
pub async fn follow_changes<S: Surface>(
    controller: &Mutex<DisplayController<S>>,
    store: Arc<dyn SelectionStore>,
    mut changes: broadcast::Receiver<StoreChange>,
) {
    loop {
        match changes.recv().await {
            Ok(change) if is_selection_change(&change) => {
                refresh(controller, store.clone()).await;
            }
            Ok(change) => debug!(key = %change.key, "ignoring unrelated store change"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "missed store changes, reloading");
                refresh(controller, store.clone()).await;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Format;
    use crate::store::MemoryStore;
    use crate::surface::TerminalSurface;
    use crate::types::Presentation;

    #[tokio::test]
    async fn refresh_applies_stored_selection() {
        let store: Arc<dyn SelectionStore> = Arc::new(MemoryStore::new());
        store.set(SELECTED_JSON_KEY, r#"{"a":1}"#).unwrap();
        let controller = Mutex::new(DisplayController::new(TerminalSurface::new(Vec::new(), Format::Plain)));

        assert_eq!(refresh(&controller, store).await, LoadOutcome::Applied);
        assert_eq!(controller.lock().presentation(), &Presentation::Formatted);
    }

    #[tokio::test]
    async fn empty_store_shows_placeholder() {
        let store: Arc<dyn SelectionStore> = Arc::new(MemoryStore::new());
        let controller = Mutex::new(DisplayController::new(TerminalSurface::new(Vec::new(), Format::Plain)));
        controller.lock().display(Some("[1]"));

        refresh(&controller, store).await;
        assert_eq!(controller.lock().presentation(), &Presentation::Placeholder);
    }
}
