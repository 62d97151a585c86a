use crate::{Collection, Fetch, Item};
use futures::{StreamExt, stream};
use indexmap::{IndexMap, IndexSet};

/// Fetches every distinct collection referenced by a set of items.
///
/// Each collection is requested once, no matter how many items reference it,
/// and at most `concurrency` requests are in flight at a time. The returned
/// map is ordered by first reference. A collection that can't be fetched is
/// logged and left out.
///
/// # Examples
///
/// ```no_run
/// use satsearch::{Client, Config};
/// use serde_json::json;
///
/// let client = Client::new(Config::new("http://stac.test").unwrap()).unwrap();
/// let items = vec![json!({"id": "a", "collection": "c1"}).as_object().unwrap().clone()];
/// # tokio_test::block_on(async {
/// let collections = satsearch::resolve(&client, &items, 4).await;
/// assert!(collections.contains_key("c1"));
/// # })
/// ```
pub async fn resolve<F: Fetch>(
    fetcher: &F,
    items: &[Item],
    concurrency: usize,
) -> IndexMap<String, Collection> {
    let ids: IndexSet<&str> = items.iter().filter_map(collection_id).collect();
    if ids.is_empty() {
        return IndexMap::new();
    }
    tracing::debug!("resolving {} collections", ids.len());
    let mut fetched: IndexMap<&str, Collection> = stream::iter(ids.iter().copied())
        .map(|id| async move { (id, fetcher.collection(id).await) })
        .buffer_unordered(concurrency.max(1))
        .filter_map(|(id, result)| async move {
            match result {
                Ok(collection) => Some((id, collection)),
                Err(err) => {
                    tracing::warn!("could not fetch collection {id}: {err}");
                    None
                }
            }
        })
        .collect()
        .await;
    ids.into_iter()
        .filter_map(|id| {
            fetched
                .swap_remove(id)
                .map(|collection| (id.to_string(), collection))
        })
        .collect()
}

/// Returns the id of the collection an item belongs to, if it says.
pub(crate) fn collection_id(item: &Item) -> Option<&str> {
    item.get("collection").and_then(|value| value.as_str())
}
