use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use snappy_lens_lib::{
    capture::{on_menu_clicked, MENU_ITEM_ID},
    clipboard::{Clipboards, CopyMethod},
    controller::{DisplayController, Key, LoadOutcome, PLACEHOLDER_TEXT},
    highlight,
    loader::{follow_changes, refresh},
    render::Format,
    state::AppState,
    store::{MemoryStore, SelectionStore, SELECTED_JSON_KEY},
    surface::{SnapshotSurface, Surface},
    Category, Cursor, Document, MarkedNode, Presentation, RenderedView,
};

#[derive(Default)]
struct Panel {
    shown: Vec<String>,
    query_cleared: usize,
    search_visible: bool,
    counter: String,
    scrolled_to: Vec<usize>,
}

impl Surface for Panel {
    fn show_placeholder(&mut self, message: &str) {
        self.shown.push(format!("placeholder:{message}"));
    }
    fn show_error(&mut self, message: &str) {
        self.shown.push(format!("error:{message}"));
    }
    fn show_formatted(&mut self, view: &RenderedView) {
        self.shown.push(format!("formatted:{}", view.root.projection()));
    }
    fn set_search_visible(&mut self, visible: bool) {
        self.search_visible = visible;
    }
    fn set_counter(&mut self, counter: &str) {
        self.counter = counter.to_string();
    }
    fn clear_query(&mut self) {
        self.query_cleared += 1;
    }
    fn scroll_to_current(&mut self, index: usize) {
        self.scrolled_to.push(index);
    }
    fn copy_feedback(&mut self, _method: CopyMethod) {}
    fn alert(&mut self, _message: &str) {}
}

fn tagged(node: &MarkedNode) -> Vec<(Category, &str)> {
    node.leaves()
        .into_iter()
        .filter_map(|leaf| match leaf {
            MarkedNode::Tagged { category, text } => Some((*category, text.as_str())),
            _ => None,
        })
        .collect()
}

#[test]
fn compact_object_is_pretty_printed_and_tagged() {
    let doc = Document::parse(r#"{"a":1,"b":"x"}"#).unwrap();
    assert_eq!(doc.pretty(), "{\n  \"a\": 1,\n  \"b\": \"x\"\n}");
    assert_eq!(
        tagged(doc.marked()),
        vec![
            (Category::Key, "\"a\""),
            (Category::Number, "1"),
            (Category::Key, "\"b\""),
            (Category::String, "\"x\""),
        ]
    );
}

#[test]
fn invalid_json_shows_error_and_hides_search() {
    let mut controller = DisplayController::new(Panel::default());
    controller.display(Some(r#"{"a":}"#));

    let Presentation::Error { message } = controller.presentation() else {
        panic!("expected the error pane");
    };
    assert!(message.starts_with("Error: "));
    assert!(message.contains("line 1"), "{message}");
    assert!(!controller.surface().search_visible);
    assert_eq!(controller.surface().shown.last(), Some(&format!("error:{message}")));
}

#[test]
fn apple_matches_cycle_through_the_counter() {
    let mut controller = DisplayController::new(Panel::default());
    controller.display(Some(r#"{"fruit":"apple","dessert":"Apple Pie"}"#));
    assert!(controller.surface().search_visible);

    controller.on_query_input("apple");
    assert_eq!(controller.surface().counter, "1/2");
    controller.on_key(Key::Enter);
    assert_eq!(controller.surface().counter, "2/2");
    controller.on_key(Key::Enter);
    assert_eq!(controller.surface().counter, "1/2");
    assert_eq!(controller.surface().scrolled_to, vec![0, 1, 0]);
}

#[tokio::test]
async fn empty_selection_shows_placeholder() {
    let store: Arc<dyn SelectionStore> = Arc::new(MemoryStore::new());
    on_menu_clicked(store.as_ref(), MENU_ITEM_ID, "").unwrap();
    let controller = Mutex::new(DisplayController::new(Panel::default()));
    controller.lock().display(Some("[1]"));

    assert_eq!(refresh(&controller, store).await, LoadOutcome::Applied);
    let controller = controller.lock();
    assert_eq!(controller.presentation(), &Presentation::Placeholder);
    assert_eq!(
        controller.surface().shown.last(),
        Some(&format!("placeholder:{PLACEHOLDER_TEXT}"))
    );
}

#[test]
fn new_content_resets_cursor_and_clears_query() {
    let mut controller = DisplayController::new(Panel::default());
    controller.display(Some(r#"["a","a","a"]"#));
    controller.on_query_input("a");
    controller.next();
    let cleared_before = controller.surface().query_cleared;

    controller.display(Some(r#"["a"]"#));
    assert_eq!(controller.session().cursor(), Cursor::Empty);
    assert_eq!(controller.session().query(), "");
    assert_eq!(controller.surface().counter, "0/0");
    assert_eq!(controller.surface().query_cleared, cleared_before + 1);
}

#[test]
fn clearing_the_query_restores_the_plain_view() {
    let mut controller = DisplayController::new(Panel::default());
    controller.display(Some(r#"{"k":"value"}"#));
    controller.on_query_input("val");
    assert_eq!(controller.view().unwrap().root.matches().len(), 1);

    controller.on_query_input("");
    let view = controller.view().unwrap();
    assert_eq!(&view.root, controller.document().unwrap().marked());
    assert_eq!(controller.surface().counter, "0/0");
}

#[test]
fn highlighted_tree_survives_a_search_overlay() {
    let root = highlight("{\n  \"name\": \"snappy\"\n}");
    let (matches, view) = snappy_lens_lib::search(&root, "APP");
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].start, matches[0].len), (15, 3));
    assert_eq!(view.root.projection(), root.projection());
}

#[tokio::test]
async fn store_change_triggers_reload() {
    let store = Arc::new(MemoryStore::new());
    let controller = Arc::new(Mutex::new(DisplayController::new(Panel::default())));
    let changes = store.subscribe();
    let follower = {
        let controller = controller.clone();
        let store: Arc<dyn SelectionStore> = store.clone();
        tokio::spawn(async move { follow_changes(&*controller, store, changes).await })
    };

    store.set("unrelated", "x").unwrap();
    store.set(SELECTED_JSON_KEY, "[true]").unwrap();
    for _ in 0..500 {
        if controller.lock().document().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    follower.abort();

    let pretty = controller.lock().document().map(|doc| doc.pretty().to_string());
    assert_eq!(pretty.as_deref(), Some("[\n  true\n]"));
}

async fn show_stored(raw: &str, query: Option<&str>) -> String {
    let store: Arc<dyn SelectionStore> = Arc::new(MemoryStore::new());
    store.set(SELECTED_JSON_KEY, raw).unwrap();
    let surface = SnapshotSurface::new(Format::Plain).with_counter(query.is_some());
    let state = AppState::new(store, surface, Clipboards::system());
    let mut out = Vec::new();
    state.show(query, &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn show_with_query_prints_the_document_once() {
    let out = show_stored(r#"["apple","Apple Pie"]"#, Some("apple")).await;
    assert_eq!(out, "[\n  \"apple\",\n  \"Apple Pie\"\n]\n[1/2]\n");
    assert!(!out.contains(PLACEHOLDER_TEXT));
}

#[tokio::test]
async fn show_prints_only_the_final_state() {
    assert_eq!(show_stored("[true]", None).await, "[\n  true\n]\n");
    assert_eq!(show_stored("{oops", None).await.lines().count(), 1);
    assert!(show_stored("{oops", Some("x")).await.starts_with("Error: "));
    assert_eq!(show_stored("", Some("x")).await, format!("{PLACEHOLDER_TEXT}\n"));
}
