use std::fs;
use std::path::Path;

use catpick::app::backend::Backend;
use catpick::app::page::{Host, Page, PageAnchors, PageEvent, PageOutcome, Trigger};
use catpick::app::scan::ScannerConfig;
use catpick::app::store::{MemoryStorage, SELECTED_FILES_KEY, SelectionStore, Storage};
use catpick::domain::model::TreeNode;
use catpick::infra::config::Config;
use catpick::infra::http::HttpBackend;
use catpick::server::{self, AppState};
use catpick::ui::components::document::content_text;
use reqwest::StatusCode;
use reqwest::redirect::Policy;
use tempfile::TempDir;
use tokio::net::TcpListener;

#[derive(Default)]
struct Alerts(Vec<String>);

impl Host for Alerts {
    fn alert(&mut self, message: &str) {
        self.0.push(message.to_owned());
    }
}

fn workspace() -> TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
    fs::write(root.join("src/util.rs"), "pub fn util() {}\n").unwrap();
    fs::write(root.join("README.md"), "# demo\n").unwrap();
    fs::write(root.join("debug.log"), "noise\n").unwrap();
    temp
}

async fn spawn(root: &Path, config_path: Option<&Path>) -> String {
    let scan = ScannerConfig::from_config(&Config::default()).with_root(root);
    let state = AppState::new(scan, config_path.map(Path::to_path_buf)).expect("state");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move { server::serve(listener, state).await.expect("serve") });
    format!("http://{addr}")
}

async fn load_page(url: &str) -> (Page<HttpBackend, MemoryStorage>, Alerts) {
    let backend = HttpBackend::new(url).expect("backend");
    let store = SelectionStore::new(MemoryStorage::new());
    let mut alerts = Alerts::default();
    let page = Page::load(PageAnchors::full(), backend, store, &mut alerts)
        .await
        .expect("page");
    (page, alerts)
}

async fn check(page: &mut Page<HttpBackend, MemoryStorage>, path: &str, alerts: &mut Alerts) {
    let checkbox = page.explorer().checkbox_by_value(path).expect("checkbox");
    page.dispatch(
        PageEvent::CheckboxChange {
            checkbox,
            checked: true,
        },
        alerts,
    )
    .await;
}

#[tokio::test]
async fn file_structure_lists_sorted_tree_without_ignored_extensions() {
    let temp = workspace();
    let url = spawn(temp.path(), None).await;

    let tree = HttpBackend::new(&url).unwrap().fetch_tree().await.unwrap();

    assert_eq!(
        tree,
        vec![
            TreeNode::file("README.md", "README.md"),
            TreeNode::folder(
                "src",
                "src",
                vec![
                    TreeNode::file("main.rs", "src/main.rs"),
                    TreeNode::file("util.rs", "src/util.rs"),
                ]
            ),
        ]
    );
}

#[tokio::test]
async fn plain_concatenation_navigates_to_result_page() {
    let temp = workspace();
    let url = spawn(temp.path(), None).await;
    let (mut page, mut alerts) = load_page(&url).await;

    check(&mut page, "src/main.rs", &mut alerts).await;
    check(&mut page, "README.md", &mut alerts).await;
    let outcome = page
        .dispatch(PageEvent::Click(Trigger::Concatenate), &mut alerts)
        .await;

    let PageOutcome::Navigated(document) = outcome else {
        panic!("expected navigation, got {outcome:?}");
    };
    assert_eq!(document.action, "/results");
    assert_eq!(
        content_text(&document.html).unwrap(),
        "--- README.md ---\n# demo\n\n\n--- src/main.rs ---\nfn main() {}\n\n\n"
    );
    assert!(alerts.0.is_empty());
}

#[tokio::test]
async fn v2_submission_uses_multipart_and_line_numbers() {
    let temp = workspace();
    let url = spawn(temp.path(), None).await;
    let (mut page, mut alerts) = load_page(&url).await;

    check(&mut page, "src/util.rs", &mut alerts).await;
    page.dispatch(PageEvent::LineNumbersChange(true), &mut alerts)
        .await;
    let outcome = page
        .dispatch(PageEvent::Click(Trigger::ConcatenateV2), &mut alerts)
        .await;

    let PageOutcome::Replaced(document) = outcome else {
        panic!("expected replacement, got {outcome:?}");
    };
    assert_eq!(
        content_text(&document.html).unwrap(),
        "--- src/util.rs ---\n   1 | pub fn util() {}\n\n\n"
    );
}

#[tokio::test]
async fn ai_submission_shows_file_names_and_contents() {
    let temp = workspace();
    let url = spawn(temp.path(), None).await;
    let (mut page, mut alerts) = load_page(&url).await;

    page.dispatch(PageEvent::Click(Trigger::SelectAll), &mut alerts)
        .await;
    let outcome = page
        .dispatch(PageEvent::Click(Trigger::ConcatenateWithAi), &mut alerts)
        .await;

    let PageOutcome::Navigated(document) = outcome else {
        panic!("expected navigation, got {outcome:?}");
    };
    assert!(document.html.contains("<h2>README.md</h2>"));
    assert!(document.html.contains("<h2>util.rs</h2>"));
    assert!(document.html.contains("<pre>fn main() {}\n</pre>"));
}

#[tokio::test]
async fn empty_and_missing_selections_render_index_errors() {
    let temp = workspace();
    let url = spawn(temp.path(), None).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{url}/results"))
        .form(&[("include_line_numbers", "true")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.text().await.unwrap();
    assert!(body.contains("No files selected for concatenation."));
    assert!(body.contains(r#"id="file-explorer""#));

    let response = http
        .post(format!("{url}/concat_with_ai"))
        .form(&[("selected_files", "README.md"), ("selected_files", "nope.txt")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("File not found: nope.txt"));
}

#[tokio::test]
async fn base_dir_update_redirects_reloads_and_persists() {
    let temp = workspace();
    let other = tempfile::tempdir().unwrap();
    fs::write(other.path().join("other.txt"), "other\n").unwrap();
    let config_dir = tempfile::tempdir().unwrap();
    let config_path = config_dir.path().join("config.toml");
    let url = spawn(temp.path(), Some(&config_path)).await;
    let (mut page, mut alerts) = load_page(&url).await;
    check(&mut page, "README.md", &mut alerts).await;

    let new_dir = other.path().display().to_string();
    let outcome = page
        .dispatch(PageEvent::BaseDirSubmit(new_dir), &mut alerts)
        .await;

    assert_eq!(outcome, PageOutcome::Reload);
    assert!(alerts.0.is_empty());
    let (backend, store) = page.into_parts();
    assert_eq!(store.storage().get_item(SELECTED_FILES_KEY), None);
    assert_eq!(
        backend.fetch_tree().await.unwrap(),
        vec![TreeNode::file("other.txt", "other.txt")]
    );
    let persisted = fs::read_to_string(&config_path).unwrap();
    assert!(persisted.contains("base_dir"));
}

#[tokio::test]
async fn invalid_base_dir_is_rejected_with_index_error() {
    let temp = workspace();
    let url = spawn(temp.path(), None).await;
    let http = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    let response = http
        .post(format!("{url}/update_base_dir"))
        .form(&[("new_base_dir", temp.path().join("missing").display().to_string())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains(
        "Error updating base directory: The specified path is not a valid directory."
    ));

    let (mut page, mut alerts) = load_page(&url).await;
    let outcome = page
        .dispatch(
            PageEvent::BaseDirSubmit("/definitely/not/here".into()),
            &mut alerts,
        )
        .await;
    assert_eq!(outcome, PageOutcome::Idle);
    assert_eq!(alerts.0.len(), 1);
    assert!(alerts.0[0].starts_with("Error updating base directory:"));
}

#[tokio::test]
async fn index_and_test_endpoint_respond() {
    let temp = workspace();
    let url = spawn(temp.path(), None).await;

    let index = reqwest::get(format!("{url}/")).await.unwrap();
    assert_eq!(index.status(), StatusCode::OK);
    assert!(index.text().await.unwrap().contains(r#"id="file-explorer""#));

    let body: serde_json::Value = reqwest::get(format!("{url}/test_endpoint"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, serde_json::json!({ "message": "Endpoint is working" }));
}

#[tokio::test]
async fn unreachable_server_alerts_and_leaves_explorer_empty() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let (page, alerts) = load_page(&url).await;

    assert!(page.explorer().file_values().is_empty());
    assert_eq!(
        alerts.0,
        vec!["An error occurred while fetching the file structure.".to_string()]
    );
}
