//! Product line aggregate round-trip tests
//!
//! Every graph operation runs against a fresh in-memory database, read
//! back through the repository (and, for cascade checks, through the raw
//! store path).

mod common;

use std::collections::HashSet;

use linecard_catalog::{Product, ProductLine, ProductLineRepository};
use linecard_common::Error;
use tokio_util::sync::CancellationToken;

use crate::common::TestApp;

async fn repository() -> (TestApp, ProductLineRepository) {
    let app = TestApp::new().await;
    let repo = ProductLineRepository::new(app.primary.clone());
    (app, repo)
}

fn line_with_products(name: &str, products: &[&str]) -> ProductLine {
    let mut line = ProductLine::new(name);
    line.products = products.iter().map(|p| Product::new(*p)).collect();
    line
}

fn product_names(line: &ProductLine) -> HashSet<String> {
    line.products.iter().map(|p| p.name.clone()).collect()
}

#[test_log::test(tokio::test)]
async fn create_assigns_key_and_stamps_children() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Line A", &["X"]);
    let key = repo.create(&mut line).await.unwrap();
    assert!(key > 0);
    assert_eq!(line.id, key);

    let echo = repo
        .get_by_key(key, true, &cancel)
        .await
        .unwrap()
        .expect("line should exist after create");
    assert_eq!(echo.name, "Line A");
    assert_eq!(echo.products.len(), 1);
    assert_eq!(echo.products[0].name, "X");
    assert_eq!(echo.products[0].product_line_id, key);
}

#[test_log::test(tokio::test)]
async fn create_persists_the_whole_child_collection() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Line B", &["X", "Y", "Z"]);
    line.products[0].weight = Some(1.25);
    line.products[0].shipping_weight = Some(1.75);
    let key = repo.create(&mut line).await.unwrap();

    let echo = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    assert_eq!(
        product_names(&echo),
        HashSet::from(["X".to_string(), "Y".to_string(), "Z".to_string()])
    );
    assert!(echo.products.iter().all(|p| p.product_line_id == key));

    let x = echo.products.iter().find(|p| p.name == "X").unwrap();
    assert_eq!(x.weight, Some(1.25));
    assert_eq!(x.shipping_weight, Some(1.75));
}

#[test_log::test(tokio::test)]
async fn create_rejects_an_already_persisted_line() {
    let (_app, repo) = repository().await;

    let mut line = ProductLine::new("Line C");
    line.id = 17;
    let err = repo.create(&mut line).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test_log::test(tokio::test)]
async fn absent_lookups_are_not_errors() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    assert!(repo.get_by_key(999, true, &cancel).await.unwrap().is_none());
    assert!(repo
        .find_by_name("no such line", true, &cancel)
        .await
        .unwrap()
        .is_empty());
}

#[test_log::test(tokio::test)]
async fn skipping_products_leaves_collection_empty() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Line D", &["X", "Y"]);
    let key = repo.create(&mut line).await.unwrap();

    let echo = repo.get_by_key(key, false, &cancel).await.unwrap().unwrap();
    assert!(echo.products.is_empty());
}

#[test_log::test(tokio::test)]
async fn multi_line_reads_partition_children_by_foreign_key() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut first = line_with_products("Widgets", &["W1", "W2"]);
    let mut second = line_with_products("Widgets", &["W3"]);
    let mut other = line_with_products("Gadgets", &["G1"]);
    repo.create(&mut first).await.unwrap();
    repo.create(&mut second).await.unwrap();
    repo.create(&mut other).await.unwrap();

    let found = repo.find_by_name("Widgets", true, &cancel).await.unwrap();
    assert_eq!(found.len(), 2);
    for line in &found {
        assert!(line.products.iter().all(|p| p.product_line_id == line.id));
    }
    let by_id = |id: i64| found.iter().find(|l| l.id == id).unwrap();
    assert_eq!(
        product_names(by_id(first.id)),
        HashSet::from(["W1".to_string(), "W2".to_string()])
    );
    assert_eq!(product_names(by_id(second.id)), HashSet::from(["W3".to_string()]));

    let all = repo.get_all(true, &cancel).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[test_log::test(tokio::test)]
async fn delete_cascades_to_children() {
    let (app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Doomed", &["X", "Y"]);
    let key = repo.create(&mut line).await.unwrap();
    let echo = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    let child_keys: Vec<i64> = echo.products.iter().map(|p| p.id).collect();
    assert_eq!(child_keys.len(), 2);

    repo.delete(&echo).await.unwrap();

    assert!(repo.get_by_key(key, false, &cancel).await.unwrap().is_none());
    for child_key in child_keys {
        assert!(app
            .primary
            .get_by_key_or_null::<Product>(child_key, &cancel)
            .await
            .unwrap()
            .is_none());
    }
}

#[test_log::test(tokio::test)]
async fn update_touches_only_the_parent_row() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Before", &["X"]);
    let key = repo.create(&mut line).await.unwrap();

    let mut renamed = repo.get_by_key(key, false, &cancel).await.unwrap().unwrap();
    renamed.name = "After".to_string();
    repo.update(&renamed).await.unwrap();

    let echo = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    assert_eq!(echo.name, "After");
    assert_eq!(echo.products.len(), 1);
}

#[test_log::test(tokio::test)]
async fn update_product_touches_one_child_row() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Line E", &["X", "Y"]);
    let key = repo.create(&mut line).await.unwrap();

    let echo = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    let mut x = echo.products.iter().find(|p| p.name == "X").unwrap().clone();
    x.weight = Some(9.5);
    repo.update_product(&x).await.unwrap();

    let echo = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    let x = echo.products.iter().find(|p| p.name == "X").unwrap();
    let y = echo.products.iter().find(|p| p.name == "Y").unwrap();
    assert_eq!(x.weight, Some(9.5));
    assert_eq!(y.weight, None);
}

#[test_log::test(tokio::test)]
async fn upsert_only_update_orphans_removed_children() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Line F", &["C1", "C2"]);
    let key = repo.create(&mut line).await.unwrap();

    let mut edited = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    edited.products.retain(|p| p.name == "C1");
    edited.products.push(Product::new("C3"));
    repo.update_graph(&mut edited).await.unwrap();

    // C2 was removed from memory but never deleted from the store
    let echo = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    assert_eq!(
        product_names(&echo),
        HashSet::from(["C1".to_string(), "C2".to_string(), "C3".to_string()])
    );
    assert!(echo.products.iter().all(|p| p.product_line_id == key));
}

#[test_log::test(tokio::test)]
async fn full_diff_update_mirrors_the_in_memory_set() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Line G", &["C1", "C2"]);
    let key = repo.create(&mut line).await.unwrap();
    let created = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    let c1 = created.products.iter().find(|p| p.name == "C1").unwrap().clone();

    let mut edited = created.clone();
    edited.products.retain(|p| p.name == "C1");
    repo.update_graph_with_child_deletes(&mut edited).await.unwrap();

    let echo = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    assert_eq!(echo.products.len(), 1);
    assert_eq!(echo.products[0], c1);
}

#[test_log::test(tokio::test)]
async fn full_diff_update_is_idempotent() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Line H", &["C1", "C2"]);
    let key = repo.create(&mut line).await.unwrap();
    let mut edited = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    edited.products.retain(|p| p.name == "C1");

    repo.update_graph_with_child_deletes(&mut edited).await.unwrap();
    let first = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();

    repo.update_graph_with_child_deletes(&mut edited).await.unwrap();
    let second = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();

    let keys = |l: &ProductLine| l.products.iter().map(|p| p.id).collect::<HashSet<i64>>();
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(first.products.len(), 1);
}

#[test_log::test(tokio::test)]
async fn full_diff_update_inserts_new_children_with_the_parent_key() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Line I", &["C1"]);
    let key = repo.create(&mut line).await.unwrap();

    let mut edited = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    edited.products.push(Product::new("C2"));
    repo.update_graph_with_child_deletes(&mut edited).await.unwrap();

    let echo = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    assert_eq!(
        product_names(&echo),
        HashSet::from(["C1".to_string(), "C2".to_string()])
    );
    assert!(echo.products.iter().all(|p| p.product_line_id == key && p.id > 0));
}

#[test_log::test(tokio::test)]
async fn explicit_deletes_remove_exactly_the_given_keys() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Line J", &["C1", "C2", "C3"]);
    let key = repo.create(&mut line).await.unwrap();
    let created = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    let c2_key = created.products.iter().find(|p| p.name == "C2").unwrap().id;

    // In-memory collection holds only C1; C3 is untouched persisted state
    let mut edited = created.clone();
    edited.products.retain(|p| p.name == "C1");
    repo.update_graph_with_deletes(&mut edited, &[c2_key]).await.unwrap();

    let echo = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    assert_eq!(
        product_names(&echo),
        HashSet::from(["C1".to_string(), "C3".to_string()])
    );
}

#[test_log::test(tokio::test)]
async fn graph_updates_reject_an_unpersisted_line() {
    let (_app, repo) = repository().await;

    let mut line = line_with_products("Never saved", &["X"]);
    assert!(matches!(
        repo.update_graph(&mut line).await.unwrap_err(),
        Error::Validation(_)
    ));
    assert!(matches!(
        repo.update_graph_with_child_deletes(&mut line).await.unwrap_err(),
        Error::Validation(_)
    ));
    assert!(matches!(
        repo.update_graph_with_deletes(&mut line, &[]).await.unwrap_err(),
        Error::Validation(_)
    ));
    assert!(matches!(
        repo.delete(&line).await.unwrap_err(),
        Error::Validation(_)
    ));
}

#[test_log::test(tokio::test)]
async fn failed_graph_update_commits_nothing() {
    let (_app, repo) = repository().await;
    let cancel = CancellationToken::new();

    let mut line = line_with_products("Line K", &["C1"]);
    let key = repo.create(&mut line).await.unwrap();

    // Parent update inside the transaction fails (row does not exist), so
    // the child upserts that would have followed are never visible.
    let mut phantom = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    phantom.id = key + 1000;
    phantom.products.push(Product::new("C2"));
    let err = repo.update_graph(&mut phantom).await.unwrap_err();
    assert!(matches!(err, Error::MissingData(_)));

    let echo = repo.get_by_key(key, true, &cancel).await.unwrap().unwrap();
    assert_eq!(product_names(&echo), HashSet::from(["C1".to_string()]));
}
