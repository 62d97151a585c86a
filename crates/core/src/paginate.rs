use crate::{Fetch, Item, Result, Search};

/// Fetches pages of a search until the limit is reached or the server runs out.
///
/// A first request with `limit=0` asks the server how many items match. If
/// no limit is given, that count is the limit. If the count exceeds the
/// limit, a warning is logged and the results are truncated. If the server
/// doesn't report a count, pages are fetched until there's no next link.
///
/// A next link with `merge: true` is merged over the first page's request,
/// even when earlier next links replaced it.
///
/// Items are returned in the order the server sent them, never re-sorted or
/// de-duplicated, and never more than the limit. Any failed request fails
/// the whole pagination.
///
/// # Examples
///
/// ```no_run
/// use satsearch::{Client, Config, SearchSpec};
///
/// let client = Client::new(Config::new("http://stac.test").unwrap()).unwrap();
/// let search = SearchSpec::new().translate().unwrap();
/// # tokio_test::block_on(async {
/// let items = satsearch::paginate(&client, &search, Some(100), 50).await.unwrap();
/// assert!(items.len() <= 100);
/// # })
/// ```
pub async fn paginate<F: Fetch>(
    fetcher: &F,
    search: &Search,
    limit: Option<u64>,
    page_size: u64,
) -> Result<Vec<Item>> {
    let probe = fetcher
        .fetch(&fetcher.search_link(&search.clone().with_limit(0))?)
        .await?;
    let matched = match probe.matched_field() {
        Some((field, matched)) => {
            tracing::debug!("{matched} items matched (from {field})");
            Some(matched)
        }
        None => {
            tracing::debug!("server did not report a matched count");
            None
        }
    };
    if matched == Some(0) {
        return Ok(Vec::new());
    }
    let limit = match (limit, matched) {
        (Some(limit), Some(matched)) => {
            if matched > limit {
                tracing::warn!("{matched} items matched, only returning the first {limit}");
            }
            Some(limit)
        }
        (limit, matched) => limit.or(matched),
    };
    if limit == Some(0) {
        return Ok(Vec::new());
    }

    let page_size = limit.map_or(page_size, |limit| limit.min(page_size)).max(1);
    let original = fetcher.search_link(&search.clone().with_limit(page_size))?;
    let mut link = original.clone();
    let mut items = Vec::new();
    let mut warned = false;
    loop {
        let page = fetcher.fetch(&link).await?;
        if let (Some(expected), Some(actual)) = (matched, page.matched())
            && expected != actual
            && !warned
        {
            tracing::warn!("matched count changed between pages: {expected} then {actual}");
            warned = true;
        }
        let count = page.features.len();
        items.extend(page.features);
        tracing::info!("got a page of {count} items ({} total)", items.len());
        if limit.is_some_and(|limit| items.len() as u64 >= limit) {
            break;
        }
        if count == 0 {
            tracing::debug!("got an empty page, stopping");
            break;
        }
        match page.links.into_iter().find(|link| link.is_next()) {
            Some(next) => link = next.continue_from(&original),
            None => break,
        }
    }
    if let Some(limit) = limit {
        items.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use crate::{Client, Config, Error, Search, SearchSpec};
    use indexmap::IndexMap;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use serde_json::{Value, json};

    fn items(ids: std::ops::Range<usize>) -> Vec<Value> {
        ids.map(|i| json!({"type": "Feature", "id": format!("item-{i}"), "collection": "c1"}))
            .collect()
    }

    fn search() -> Search {
        SearchSpec::new()
            .collections(vec!["c1".to_string()])
            .translate()
            .unwrap()
    }

    fn client(server: &ServerGuard) -> Client {
        Client::new(Config::new(&server.url()).unwrap()).unwrap()
    }

    async fn probe(server: &mut ServerGuard, matched: Option<u64>) -> Mock {
        let body = match matched {
            Some(matched) => json!({"features": [], "context": {"matched": matched}}),
            None => json!({"features": []}),
        };
        server
            .mock("POST", "/search")
            .match_body(Matcher::Json(json!({"collections": ["c1"], "limit": 0})))
            .with_body(body.to_string())
            .expect(1)
            .create_async()
            .await
    }

    async fn page(server: &mut ServerGuard, request: Value, response: Value) -> Mock {
        server
            .mock("POST", "/search")
            .match_body(Matcher::Json(request))
            .with_body(response.to_string())
            .expect(1)
            .create_async()
            .await
    }

    fn next(url: &str, token: &str, merge: bool) -> Value {
        json!({
            "rel": "next",
            "href": format!("{url}/search"),
            "method": "POST",
            "body": {"token": token},
            "merge": merge
        })
    }

    #[tokio::test]
    async fn nothing_matched() {
        let mut server = Server::new_async().await;
        let probe = probe(&mut server, Some(0)).await;
        let any_page = server
            .mock("POST", "/search")
            .match_body(Matcher::PartialJson(json!({"limit": 1000})))
            .expect(0)
            .create_async()
            .await;
        let items = super::paginate(&client(&server), &search(), None, 1000)
            .await
            .unwrap();
        assert!(items.is_empty());
        probe.assert_async().await;
        any_page.assert_async().await;
    }

    #[tokio::test]
    async fn limit_below_matched() {
        let mut server = Server::new_async().await;
        let url = server.url();
        let probe = probe(&mut server, Some(25)).await;
        let first = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 10}),
            json!({"features": items(0..10), "links": [next(&url, "2", true)]}),
        )
        .await;
        let items = super::paginate(&client(&server), &search(), Some(10), 1000)
            .await
            .unwrap();
        probe.assert_async().await;
        first.assert_async().await;
        assert_eq!(items.len(), 10);
        assert_eq!(items[0]["id"], "item-0");
        assert_eq!(items[9]["id"], "item-9");
    }

    #[tokio::test]
    async fn several_pages_truncated() {
        let mut server = Server::new_async().await;
        let url = server.url();
        let probe = probe(&mut server, Some(25)).await;
        let first = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 4}),
            json!({"features": items(0..4), "links": [next(&url, "2", true)]}),
        )
        .await;
        let second = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 4, "token": "2"}),
            json!({"features": items(4..8), "links": [next(&url, "3", true)]}),
        )
        .await;
        let third = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 4, "token": "3"}),
            json!({"features": items(8..12), "links": [next(&url, "4", true)]}),
        )
        .await;
        let items = super::paginate(&client(&server), &search(), Some(10), 4)
            .await
            .unwrap();
        probe.assert_async().await;
        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
        let ids: Vec<_> = items.iter().map(|item| item["id"].clone()).collect();
        assert_eq!(
            ids,
            (0..10)
                .map(|i| Value::from(format!("item-{i}")))
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn next_link_without_merge_is_used_as_is() {
        let mut server = Server::new_async().await;
        let url = server.url();
        let _probe = probe(&mut server, Some(4)).await;
        let _first = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 4}),
            json!({"features": items(0..2), "links": [next(&url, "2", false)]}),
        )
        .await;
        let second = page(
            &mut server,
            json!({"token": "2"}),
            json!({"features": items(2..4)}),
        )
        .await;
        let items = super::paginate(&client(&server), &search(), None, 1000)
            .await
            .unwrap();
        second.assert_async().await;
        assert_eq!(items.len(), 4);
    }

    #[tokio::test]
    async fn merge_after_replacing_link_uses_first_request() {
        let mut server = Server::new_async().await;
        let url = server.url();
        let _probe = probe(&mut server, Some(6)).await;
        let first = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 2}),
            json!({"features": items(0..2), "links": [next(&url, "2", false)]}),
        )
        .await;
        let second = page(
            &mut server,
            json!({"token": "2"}),
            json!({"features": items(2..4), "links": [next(&url, "3", true)]}),
        )
        .await;
        let third = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 2, "token": "3"}),
            json!({"features": items(4..6)}),
        )
        .await;
        let items = super::paginate(&client(&server), &search(), None, 2)
            .await
            .unwrap();
        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
        assert_eq!(items.len(), 6);
    }

    #[tokio::test]
    async fn merged_headers_are_sent() {
        let mut server = Server::new_async().await;
        let url = server.url();
        let _probe = probe(&mut server, Some(4)).await;
        let mut link = next(&url, "2", true);
        link["headers"] = json!({"x-page-token": "2"});
        let _first = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 2}),
            json!({"features": items(0..2), "links": [link]}),
        )
        .await;
        let second = server
            .mock("POST", "/search")
            .match_header("x-api-key", "secret")
            .match_header("x-page-token", "2")
            .match_body(Matcher::Json(
                json!({"collections": ["c1"], "limit": 2, "token": "2"}),
            ))
            .with_body(json!({"features": items(2..4)}).to_string())
            .expect(1)
            .create_async()
            .await;
        let mut headers = IndexMap::new();
        let _ = headers.insert("x-api-key".to_string(), "secret".to_string());
        let config = Config::new(&url).unwrap().with_headers(headers);
        let items = super::paginate(&Client::new(config).unwrap(), &search(), None, 2)
            .await
            .unwrap();
        second.assert_async().await;
        assert_eq!(items.len(), 4);
    }

    #[tokio::test]
    async fn exhaustion_without_matched() {
        let mut server = Server::new_async().await;
        let url = server.url();
        let _probe = probe(&mut server, None).await;
        let _first = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 1000}),
            json!({"features": items(0..3), "links": [next(&url, "2", true)]}),
        )
        .await;
        let _second = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 1000, "token": "2"}),
            json!({"features": items(3..5), "links": []}),
        )
        .await;
        let items = super::paginate(&client(&server), &search(), None, 1000)
            .await
            .unwrap();
        assert_eq!(items.len(), 5);
    }

    #[tokio::test]
    async fn server_order_and_duplicates_are_kept() {
        let mut server = Server::new_async().await;
        let _probe = probe(&mut server, Some(3)).await;
        let _first = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 3}),
            json!({"features": [{"id": "b"}, {"id": "a"}, {"id": "a"}]}),
        )
        .await;
        let items = super::paginate(&client(&server), &search(), None, 1000)
            .await
            .unwrap();
        let ids: Vec<_> = items.iter().map(|item| item["id"].clone()).collect();
        assert_eq!(ids, vec![json!("b"), json!("a"), json!("a")]);
    }

    #[tokio::test]
    async fn failed_page_discards_everything() {
        let mut server = Server::new_async().await;
        let url = server.url();
        let _probe = probe(&mut server, Some(8)).await;
        let _first = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 4}),
            json!({"features": items(0..4), "links": [next(&url, "2", true)]}),
        )
        .await;
        let _second = server
            .mock("POST", "/search")
            .match_body(Matcher::PartialJson(json!({"token": "2"})))
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;
        let error = super::paginate(&client(&server), &search(), None, 4)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn empty_page_stops() {
        let mut server = Server::new_async().await;
        let url = server.url();
        let _probe = probe(&mut server, Some(10)).await;
        let first = page(
            &mut server,
            json!({"collections": ["c1"], "limit": 10}),
            json!({"features": [], "links": [next(&url, "2", true)]}),
        )
        .await;
        let items = super::paginate(&client(&server), &search(), None, 1000)
            .await
            .unwrap();
        first.assert_async().await;
        assert!(items.is_empty());
    }
}
