use std::sync::Arc;

use atlas_sync::cache::{QueryCache, QueryKey, QueryStatus};
use atlas_sync::client::{ClientError, ResourceClient};
use atlas_sync::domain::{
    Country, CountryPayload, Flag, Page, PageRequest, ResourceKind,
};
use atlas_sync::mutation::{MutationError, MutationExecutor, MutationOp, MutationOutcome};

mod common;

use common::mock_client::MockCountryClient;

fn valid_payload(name: &str) -> CountryPayload {
    CountryPayload {
        name: name.to_string(),
        flag: Flag::from_file_bytes("flag.png", b"\x89PNG"),
    }
}

fn executor(
    client: &MockCountryClient,
    cache: &QueryCache<Page<Country>>,
) -> MutationExecutor<MockCountryClient, Page<Country>> {
    MutationExecutor::new(Arc::new(client.clone()), cache.clone())
}

fn subscribe_listing(
    cache: &QueryCache<Page<Country>>,
    client: &MockCountryClient,
) -> atlas_sync::cache::Subscription<Page<Country>> {
    let page = PageRequest::new(0, 10);
    let client = client.clone();
    cache.subscribe(QueryKey::list(ResourceKind::Country, page), move || {
        let client = client.clone();
        async move { client.list(page).await }
    })
}

#[tokio::test]
async fn invalid_payload_never_reaches_the_client() {
    let client = MockCountryClient::new();
    let cache = QueryCache::new();
    let executor = executor(&client, &cache);

    let payload = CountryPayload {
        name: String::new(),
        flag: Flag::from_file_bytes("flag.png", b"\x89PNG"),
    };
    let result = executor.create(payload).await;

    assert!(matches!(result, Err(MutationError::Validation(_))));
    assert_eq!(client.calls().create, 0, "zero network calls");
}

#[tokio::test]
async fn successful_create_refreshes_the_listing() {
    let client = MockCountryClient::new();
    let cache = QueryCache::new();
    let executor = executor(&client, &cache);

    let mut sub = subscribe_listing(&cache, &client);
    let before = sub.settled().await.unwrap();
    assert_eq!(before.total, 0);

    let created = executor.create(valid_payload("Germany")).await.unwrap();

    let after = sub.settled().await.unwrap();
    assert_eq!(after.total, 1);
    assert!(after.items.iter().any(|c| c.id == created.id));
    assert_eq!(client.calls().list, 2, "one initial fetch, one refetch");
}

#[tokio::test]
async fn delete_removes_the_item_from_the_listing() {
    let client = MockCountryClient::new();
    let cache = QueryCache::new();
    let executor = executor(&client, &cache);

    executor.create(valid_payload("Germany")).await.unwrap();
    let doomed = executor.create(valid_payload("Atlantis")).await.unwrap();

    let mut sub = subscribe_listing(&cache, &client);
    let before = sub.settled().await.unwrap();
    assert_eq!(before.total, 2);

    executor.delete(doomed.id).await.unwrap();

    let after = sub.settled().await.unwrap();
    assert_eq!(after.total, before.total - 1);
    assert!(after.items.iter().all(|c| c.id != doomed.id));
}

#[tokio::test]
async fn update_uses_structured_payload_and_refreshes() {
    let client = MockCountryClient::new();
    let cache = QueryCache::new();
    let executor = executor(&client, &cache);

    let created = executor.create(valid_payload("Germny")).await.unwrap();

    let mut sub = subscribe_listing(&cache, &client);
    sub.settled().await.unwrap();

    let outcome = executor
        .execute(MutationOp::Update {
            id: created.id,
            payload: valid_payload("Germany"),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, MutationOutcome::Written(_)));

    let after = sub.settled().await.unwrap();
    let renamed = after.items.iter().find(|c| c.id == created.id).unwrap();
    assert_eq!(renamed.name, "Germany");
}

#[tokio::test]
async fn failed_mutation_leaves_the_cache_untouched() {
    let client = MockCountryClient::new();
    let cache = QueryCache::new();
    let executor = executor(&client, &cache);

    let mut sub = subscribe_listing(&cache, &client);
    sub.settled().await.unwrap();
    let lists_before = client.calls().list;

    client.fail_next_write(ClientError::Rejected {
        status: 409,
        message: "country already exists".to_string(),
    });
    let result = executor.create(valid_payload("Germany")).await;

    assert!(matches!(
        result,
        Err(MutationError::Client(ClientError::Rejected { .. }))
    ));
    assert_eq!(sub.current().status, QueryStatus::Fresh);
    assert_eq!(client.calls().list, lists_before, "no refetch was triggered");
}

#[tokio::test]
async fn mutation_invalidates_every_key_of_its_kind() {
    let client = MockCountryClient::new();
    let cache = QueryCache::new();
    let executor = executor(&client, &cache);

    for name in ["Germany", "France", "Spain"] {
        executor.create(valid_payload(name)).await.unwrap();
    }

    let mut page0 = subscribe_listing(&cache, &client);
    page0.settled().await.unwrap();

    let page = PageRequest::new(1, 2);
    let page_client = client.clone();
    let mut page1 = cache.subscribe(QueryKey::list(ResourceKind::Country, page), move || {
        let client = page_client.clone();
        async move { client.list(page).await }
    });
    page1.settled().await.unwrap();

    executor.create(valid_payload("Portugal")).await.unwrap();

    assert_eq!(page0.settled().await.unwrap().total, 4);
    assert_eq!(page1.settled().await.unwrap().total, 4);
}
