// End-to-end coordinator scenarios: selection, supersession, crawl convergence

mod common;
use common::{build_tree, build_wide_tree, result_names, result_paths, spawn_coordinator};

use appseek::coordinator::SearchMode;
use appseek::RESULT_LIMIT;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

const IDLE_TIMEOUT: Duration = Duration::from_secs(20);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_selection_follows_entry_across_catalog_refresh() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    build_tree(root, &["x_a", "x_b", "x_c"]);
    let coordinator = spawn_coordinator(vec![root.to_path_buf()]);

    coordinator.set_key("x").await.unwrap();
    coordinator.select_next().await.unwrap();
    let snapshot = coordinator.snapshot();
    assert_eq!(result_names(&snapshot), vec!["x_a", "x_b", "x_c"]);
    assert_eq!(snapshot.selected, Some(1));

    // [A, B, C] -> [B, D, E]: B survives and stays selected
    fs::remove_file(root.join("x_a")).unwrap();
    fs::remove_file(root.join("x_c")).unwrap();
    build_tree(root, &["x_d", "x_e"]);
    coordinator.refresh_catalog().await.unwrap();
    let snapshot = coordinator.snapshot();
    assert_eq!(result_names(&snapshot), vec!["x_b", "x_d", "x_e"]);
    assert_eq!(snapshot.selected_entry().map(|e| e.name()), Some("x_b"));

    // B gone: first match selected
    fs::remove_file(root.join("x_b")).unwrap();
    coordinator.refresh_catalog().await.unwrap();
    let snapshot = coordinator.snapshot();
    assert_eq!(result_names(&snapshot), vec!["x_d", "x_e"]);
    assert_eq!(snapshot.selected, Some(0));

    // nothing left: no selection
    fs::remove_file(root.join("x_d")).unwrap();
    fs::remove_file(root.join("x_e")).unwrap();
    coordinator.refresh_catalog().await.unwrap();
    let snapshot = coordinator.snapshot();
    assert!(snapshot.results.is_empty());
    assert_eq!(snapshot.selected, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_superseded_crawl_leaks_nothing() {
    let x = TempDir::new().unwrap();
    let y = TempDir::new().unwrap();
    build_wide_tree(x.path(), "xfile", 6, 3);
    build_tree(y.path(), &["yfile_1.txt", "nested/yfile_2.txt"]);
    let coordinator = spawn_coordinator(vec![]);

    coordinator
        .set_search_base(Some(x.path().to_path_buf()))
        .await
        .unwrap();
    coordinator
        .set_search_base(Some(y.path().to_path_buf()))
        .await
        .unwrap();
    tokio::time::timeout(IDLE_TIMEOUT, coordinator.wait_for_idle())
        .await
        .unwrap()
        .unwrap();

    coordinator.set_key("file").await.unwrap();
    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.mode.base(), Some(y.path()));
    assert_eq!(result_names(&snapshot), vec!["yfile_1.txt", "yfile_2.txt"]);
    assert!(snapshot.results.iter().all(|e| e.path().starts_with(y.path())));

    coordinator.set_key("xfile").await.unwrap();
    assert!(coordinator.snapshot().results.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_crawl_converges_to_same_paths() {
    let temp_dir = TempDir::new().unwrap();
    build_tree(
        temp_dir.path(),
        &[
            "item_top.txt",
            "item_one/item_a.txt",
            "item_one/item_b.txt",
            "item_two/item_deep/item_c.txt",
        ],
    );
    let base = temp_dir.path().to_path_buf();
    let coordinator = spawn_coordinator(vec![]);

    let mut runs = Vec::new();
    for _ in 0..2 {
        coordinator.set_search_base(Some(base.clone())).await.unwrap();
        tokio::time::timeout(IDLE_TIMEOUT, coordinator.wait_for_idle())
            .await
            .unwrap()
            .unwrap();
        coordinator.set_key("item").await.unwrap();
        runs.push(result_paths(&coordinator.snapshot()));
        coordinator.set_search_base(None).await.unwrap();
    }

    // 4 files and 3 folders
    assert_eq!(runs[0].len(), 7);
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_results_never_exceed_limit() {
    let temp_dir = TempDir::new().unwrap();
    build_wide_tree(temp_dir.path(), "doc", 5, 2);
    let coordinator = spawn_coordinator(vec![]);

    coordinator
        .set_search_base(Some(temp_dir.path().to_path_buf()))
        .await
        .unwrap();
    coordinator.set_key("doc").await.unwrap();

    let mut rx = coordinator.subscribe();
    let idle = tokio::time::timeout(IDLE_TIMEOUT, async {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            assert!(snapshot.results.len() <= RESULT_LIMIT);
            if !snapshot.crawling {
                return snapshot;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    assert_eq!(idle.results.len(), RESULT_LIMIT);
    assert!(matches!(idle.mode, SearchMode::FileSystem { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pivot_then_back_restores_catalog() {
    let catalog = TempDir::new().unwrap();
    build_tree(catalog.path(), &["project-notes.md"]);
    let coordinator = spawn_coordinator(vec![catalog.path().to_path_buf()]);

    coordinator.set_key("notes").await.unwrap();
    assert!(coordinator.pivot_into_selected().await.unwrap());
    tokio::time::timeout(IDLE_TIMEOUT, coordinator.wait_for_idle())
        .await
        .unwrap()
        .unwrap();

    coordinator.set_key("project").await.unwrap();
    assert_eq!(result_names(&coordinator.snapshot()), vec!["project-notes.md"]);

    coordinator.reset().await.unwrap();
    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.mode, SearchMode::Catalog);
    assert!(snapshot.key.is_empty());
    assert!(snapshot.results.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_key_set_during_crawl_publishes_before_completion() {
    let temp_dir = TempDir::new().unwrap();
    build_wide_tree(temp_dir.path(), "doc", 8, 4);
    let coordinator = spawn_coordinator(vec![]);
    let mut rx = coordinator.subscribe();

    coordinator
        .set_search_base(Some(temp_dir.path().to_path_buf()))
        .await
        .unwrap();
    coordinator.set_key("doc").await.unwrap();

    let mid_crawl = tokio::time::timeout(IDLE_TIMEOUT, async {
        let mut seen = 0;
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if matches!(snapshot.mode, SearchMode::FileSystem { .. }) {
                if !snapshot.crawling {
                    return seen;
                }
                if !snapshot.results.is_empty() {
                    assert_eq!(snapshot.key, "doc");
                    assert!(snapshot.results.iter().all(|e| e.name().contains("doc")));
                    seen += 1;
                }
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    assert!(mid_crawl > 0);
}
