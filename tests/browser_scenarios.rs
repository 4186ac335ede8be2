//! End-to-end browsing scenarios against the recording gateway
use std::sync::Arc;
use std::time::Duration;

use medequip_storefront_lib::application::{
    BrowseOutcome, BrowseState, CatalogBrowser, ResultSource,
};
use medequip_storefront_lib::domain::{FetchError, FilterCriteria, Product};
use medequip_storefront_lib::infrastructure::BrowsingConfig;
use medequip_storefront_lib::test_utils::{
    GatewayCall, RecordingGateway, ScrollRecorder, fixtures,
};
use proptest::prelude::*;
use rstest::rstest;
use tokio_test::{assert_err, assert_ok};

type Browser = CatalogBrowser<Product, RecordingGateway<Product>>;

/// Twelve products, exactly one of them titled with "xr".
fn showroom() -> Vec<Product> {
    let mut catalog = fixtures::products(11);
    catalog.push(fixtures::product(
        "prod-xr",
        "XR-200 Mobile Radiography",
        "GE Healthcare",
        "Imaging",
    ));
    catalog
}

fn browser_over(catalog: Vec<Product>) -> (Arc<RecordingGateway<Product>>, Browser) {
    let gateway = Arc::new(RecordingGateway::new(catalog));
    let browser = CatalogBrowser::new(Arc::clone(&gateway), BrowsingConfig::default());
    (gateway, browser)
}

#[tokio::test]
async fn storefront_scenario_local_then_remote_then_paged() {
    let (gateway, browser) = browser_over(showroom());
    assert_ok!(browser.load_all().await);
    assert_eq!(browser.displayed_len().await, 12);

    let outcome = assert_ok!(browser.search("xr", None).await);
    assert_eq!(outcome.source(), Some(ResultSource::LocalScan));
    let shown = browser.displayed().await;
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].id, "prod-xr");
    assert_eq!(browser.current_page().await, 1);
    assert_eq!(gateway.calls(GatewayCall::Search), 0);

    let remote = vec![fixtures::product(
        "prod-pm",
        "Portable Monitor Pro",
        "Philips Healthcare",
        "Monitoring",
    )];
    gateway.set_search_results("portable monitor", remote.clone());
    let outcome = assert_ok!(browser.search("portable monitor", None).await);
    assert_eq!(outcome.source(), Some(ResultSource::Gateway));
    assert_eq!(browser.displayed().await, remote);
    assert_eq!(gateway.search_queries(), vec!["portable monitor".to_string()]);

    let imaging = FilterCriteria::new().departments(["imaging"]);
    gateway.set_filter_results(&imaging, fixtures::products(10));
    assert_ok!(browser.apply_filters(&imaging).await);
    assert_eq!(browser.total_pages().await, 2);

    browser.set_page(2).await;
    let page_two = browser.displayed_slice().await;
    assert_eq!(page_two.len(), 1);
    assert_eq!(page_two[0].id, "prod-10");
}

#[tokio::test]
async fn load_all_twice_fetches_once() {
    let (gateway, browser) = browser_over(showroom());

    let first = assert_ok!(browser.load_all().await);
    let second = assert_ok!(browser.load_all().await);

    assert_eq!(first.source(), Some(ResultSource::Gateway));
    assert_eq!(second.source(), Some(ResultSource::Cache));
    assert_eq!(gateway.calls(GatewayCall::ListAll), 1);
}

#[tokio::test]
async fn concurrent_initial_loads_share_one_fetch() {
    let (gateway, browser) = browser_over(showroom());
    gateway.delay(GatewayCall::ListAll, Duration::from_millis(20));

    let (a, b) = tokio::join!(browser.load_all(), browser.load_all());
    assert_ok!(a);
    assert_ok!(b);

    assert_eq!(gateway.calls(GatewayCall::ListAll), 1);
    assert_eq!(browser.displayed_len().await, 12);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\t\n")]
#[tokio::test]
async fn blank_search_restores_full_list_on_first_page(#[case] text: &str) {
    let (gateway, browser) = browser_over(showroom());
    assert_ok!(browser.load_all().await);
    assert_ok!(browser.search("xr", None).await);
    browser.set_page(3).await;

    let outcome = assert_ok!(browser.search(text, None).await);

    assert_eq!(outcome.source(), Some(ResultSource::Cache));
    assert_eq!(browser.displayed_len().await, 12);
    assert_eq!(browser.current_page().await, 1);
    assert_eq!(gateway.calls(GatewayCall::Search), 0);
}

#[rstest]
#[case("zzz", ResultSource::Gateway)]
#[case("GE", ResultSource::LocalScan)]
#[case("ecg", ResultSource::LocalScan)]
#[case("pump", ResultSource::Gateway)]
#[tokio::test]
async fn short_queries_scan_locally_only_when_something_matches(
    #[case] text: &str,
    #[case] expected: ResultSource,
) {
    let (gateway, browser) = browser_over(showroom());
    assert_ok!(browser.load_all().await);

    let outcome = assert_ok!(browser.search(text, None).await);

    assert_eq!(outcome.source(), Some(expected));
    let remote_calls = usize::from(expected == ResultSource::Gateway);
    assert_eq!(gateway.calls(GatewayCall::Search), remote_calls);
}

#[tokio::test]
async fn precomputed_results_skip_the_gateway() {
    let (gateway, browser) = browser_over(showroom());
    assert_ok!(browser.load_all().await);
    let precomputed = fixtures::products(2);

    let outcome = assert_ok!(browser.search("defibrillator", Some(precomputed.clone())).await);

    assert_eq!(outcome.source(), Some(ResultSource::Precomputed));
    assert_eq!(browser.displayed().await, precomputed);
    assert_eq!(gateway.calls(GatewayCall::Search), 0);
}

#[tokio::test]
async fn filters_always_go_remote() {
    let (gateway, browser) = browser_over(showroom());
    assert_ok!(browser.load_all().await);

    let ge = FilterCriteria::new().brands(["brand-ge"]);
    assert_ok!(browser.apply_filters(&ge).await);
    assert_ok!(browser.apply_filters(&ge).await);

    assert_eq!(gateway.calls(GatewayCall::Filter), 2);
    assert_eq!(gateway.filter_requests(), vec![ge.clone(), ge]);
    // Nothing scripted for the brand, so the gateway answered with nothing
    let view = browser.view().await;
    assert!(view.is_empty);
    assert_eq!(view.total_pages, 1);
}

#[tokio::test]
async fn empty_filters_then_load_all_round_trips() {
    let catalog = showroom();
    let (gateway, browser) = browser_over(catalog.clone());
    assert_ok!(browser.load_all().await);

    assert_ok!(browser.apply_filters(&FilterCriteria::new()).await);
    assert_ok!(browser.load_all().await);

    let mut shown: Vec<String> = browser.displayed().await.into_iter().map(|p| p.id).collect();
    let mut expected: Vec<String> = catalog.into_iter().map(|p| p.id).collect();
    shown.sort();
    expected.sort();
    assert_eq!(shown, expected);
    assert_eq!(gateway.calls(GatewayCall::ListAll), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_earlier_search_cannot_overwrite_newer_results() {
    let (gateway, browser) = browser_over(showroom());
    assert_ok!(browser.load_all().await);
    let browser = Arc::new(browser);

    let stale = vec![fixtures::product("old", "Older Result", "Medtronic", "Surgical")];
    let fresh = vec![fixtures::product("new", "Newer Result", "Drager", "Monitoring")];
    gateway.set_search_results("ventilator", stale);
    gateway.set_search_results("ventilators", fresh.clone());
    gateway.delay_search("ventilator", Duration::from_millis(300));

    let slow = tokio::spawn({
        let browser = Arc::clone(&browser);
        async move { browser.search("ventilator", None).await }
    });
    tokio::task::yield_now().await;
    let newer = assert_ok!(browser.search("ventilators", None).await);
    let older = assert_ok!(assert_ok!(slow.await));

    assert_eq!(newer.source(), Some(ResultSource::Gateway));
    assert_eq!(older, BrowseOutcome::Superseded);
    assert_eq!(browser.displayed().await, fresh);
    assert_eq!(browser.state().await, BrowseState::Ready);
}

#[tokio::test(start_paused = true)]
async fn clearing_search_during_first_load_still_shows_full_list() {
    let (gateway, browser) = browser_over(showroom());
    gateway.delay(GatewayCall::ListAll, Duration::from_millis(300));
    let browser = Arc::new(browser);

    let load = tokio::spawn({
        let browser = Arc::clone(&browser);
        async move { browser.load_all().await }
    });
    tokio::task::yield_now().await;

    assert_ok!(browser.search("", None).await);
    let loaded = assert_ok!(assert_ok!(load.await));

    assert_eq!(loaded.source(), Some(ResultSource::Gateway));
    assert_eq!(browser.displayed_len().await, 12);
    assert_eq!(browser.state().await, BrowseState::Ready);
    assert!(!browser.view().await.is_empty);
    assert_eq!(gateway.calls(GatewayCall::ListAll), 1);
}

#[tokio::test(start_paused = true)]
async fn search_typed_after_clearing_still_wins_over_first_load() {
    let (gateway, browser) = browser_over(showroom());
    gateway.delay(GatewayCall::ListAll, Duration::from_millis(300));
    let wanted = vec![fixtures::product("prod-vent", "Ventilator V500", "Drager", "Monitoring")];
    gateway.set_search_results("ventilator", wanted.clone());
    let browser = Arc::new(browser);

    let load = tokio::spawn({
        let browser = Arc::clone(&browser);
        async move { browser.load_all().await }
    });
    tokio::task::yield_now().await;

    assert_ok!(browser.search("", None).await);
    assert_ok!(browser.search("ventilator", None).await);
    let loaded = assert_ok!(assert_ok!(load.await));

    assert_eq!(loaded, BrowseOutcome::Superseded);
    assert_eq!(browser.displayed().await, wanted);
    assert!(browser.is_cache_populated().await);
}

#[tokio::test]
async fn failed_search_keeps_previous_list_and_records_error() {
    let (gateway, browser) = browser_over(showroom());
    assert_ok!(browser.load_all().await);
    gateway.fail(GatewayCall::Search, FetchError::transport("connection reset"));

    let err = assert_err!(browser.search("anesthesia", None).await);

    assert!(err.is_transient());
    assert_eq!(browser.displayed_len().await, 12);
    assert_eq!(browser.state().await, BrowseState::Ready);
    assert_eq!(browser.last_error().await, Some(err));

    gateway.recover(GatewayCall::Search);
    assert_ok!(browser.search("anesthesia", None).await);
    assert_eq!(browser.last_error().await, None);
}

#[tokio::test]
async fn failed_initial_load_leaves_empty_list_and_retries_next_time() {
    let (gateway, browser) = browser_over(showroom());
    gateway.fail(
        GatewayCall::ListAll,
        FetchError::Status {
            status: 503,
            body: "unavailable".into(),
        },
    );

    assert_err!(browser.load_all().await);
    assert_eq!(browser.displayed_len().await, 0);
    assert!(!browser.is_cache_populated().await);

    gateway.recover(GatewayCall::ListAll);
    assert_ok!(browser.load_all().await);
    assert_eq!(gateway.calls(GatewayCall::ListAll), 2);
    assert_eq!(browser.displayed_len().await, 12);
}

#[tokio::test]
async fn page_changes_request_smooth_scroll() {
    let gateway = Arc::new(RecordingGateway::new(fixtures::products(20)));
    let recorder = Arc::new(ScrollRecorder::default());
    let browser = CatalogBrowser::new(Arc::clone(&gateway), BrowsingConfig::default())
        .with_scroll_sink(recorder.clone());
    assert_ok!(browser.load_all().await);

    browser.set_page(2).await;
    browser.set_page(3).await;
    browser.set_page(7).await;

    assert_eq!(recorder.pages(), vec![2, 3, 7]);
    assert!(recorder.requests().iter().all(|r| r.smooth));
    assert_eq!(browser.displayed_slice().await.len(), 0);
}

proptest! {
    #[test]
    fn page_slices_partition_the_displayed_list(count in 0usize..60) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let (_, browser) = browser_over(fixtures::products(count));
            browser.load_all().await.unwrap();

            let pages = browser.total_pages().await;
            prop_assert_eq!(pages, count.div_ceil(9).max(1));

            let mut seen = Vec::new();
            for page in 1..=pages {
                browser.set_page(page).await;
                let slice = browser.displayed_slice().await;
                prop_assert!(slice.len() <= 9);
                seen.extend(slice.into_iter().map(|p| p.id));
            }
            let all: Vec<String> = fixtures::products(count).into_iter().map(|p| p.id).collect();
            prop_assert_eq!(seen, all);
            Ok(())
        })?;
    }
}
