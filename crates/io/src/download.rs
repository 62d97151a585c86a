use crate::{Error, FilenameTemplate, Result};
use reqwest::Client;
use satsearch::Item;
use serde_json::Value;
use std::path::{Path, PathBuf};
use url::Url;

const REQUESTER_PAYS_HEADER: &str = "x-amz-request-payer";

/// Downloads item assets to local files.
///
/// Each asset is tried at its `href` first and then at each of its
/// `alternate` hrefs, in order, until one succeeds. Files land at
/// `{dir}/{template}_{key}{ext}` and are not downloaded again if they
/// already exist.
///
/// # Examples
///
/// ```no_run
/// use satsearch_io::Downloader;
/// use serde_json::json;
///
/// let item = json!({
///     "id": "an-id",
///     "collection": "c1",
///     "properties": {"datetime": "2020-01-01T00:00:00Z"},
///     "assets": {"thumbnail": {"href": "https://example.com/thumb.png"}}
/// });
/// let downloader = Downloader::new().unwrap();
/// # tokio_test::block_on(async {
/// let path = downloader
///     .download(item.as_object().unwrap(), "thumbnail", "data")
///     .await
///     .unwrap();
/// assert_eq!(path.to_str().unwrap(), "data/c1/2020-01-01/an-id_thumbnail.png");
/// # })
/// ```
#[derive(Clone, Debug)]
pub struct Downloader {
    client: Client,
    template: FilenameTemplate,
    requester_pays: bool,
}

impl Downloader {
    /// Creates a new downloader with the default filename template.
    pub fn new() -> Result<Downloader> {
        let client = Client::builder().user_agent(crate::user_agent()).build()?;
        Ok(Downloader::with_client(client))
    }

    /// Creates a new downloader with the given [reqwest::Client].
    pub fn with_client(client: Client) -> Downloader {
        Downloader {
            client,
            template: FilenameTemplate::default(),
            requester_pays: false,
        }
    }

    /// Sets the filename template.
    pub fn with_template(mut self, template: FilenameTemplate) -> Downloader {
        self.template = template;
        self
    }

    /// Sends `x-amz-request-payer: requester` with every request.
    pub fn with_requester_pays(mut self, requester_pays: bool) -> Downloader {
        self.requester_pays = requester_pays;
        self
    }

    /// Returns the path an asset of an item would be downloaded to.
    pub fn path(&self, item: &Item, key: &str, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let hrefs = candidate_hrefs(item, key)?;
        let extension = hrefs.first().map(|href| extension(href)).unwrap_or_default();
        let file_name = format!("{}_{key}{extension}", self.template.render(item));
        Ok(dir.as_ref().join(file_name))
    }

    /// Downloads one asset of an item into `dir`, returning the path.
    pub async fn download(&self, item: &Item, key: &str, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.path(item, key, dir)?;
        if tokio::fs::try_exists(&path).await? {
            tracing::debug!("{} already exists, skipping", path.display());
            return Ok(path);
        }
        let hrefs = candidate_hrefs(item, key)?;
        for href in &hrefs {
            match self.get(href).await {
                Ok(bytes) => {
                    if let Some(parent) = path.parent() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                    tokio::fs::write(&path, bytes).await?;
                    tracing::info!("downloaded {href} to {}", path.display());
                    return Ok(path);
                }
                Err(err) => tracing::warn!("could not download {href}: {err}"),
            }
        }
        Err(Error::AllCandidatesFailed {
            id: item_id(item),
            key: key.to_string(),
            hrefs,
        })
    }

    /// Downloads some assets of every item.
    ///
    /// Items that don't have one of the keys are skipped. Any other failure
    /// stops the downloads.
    pub async fn download_all(
        &self,
        items: &[Item],
        keys: &[String],
        dir: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for item in items {
            for key in keys {
                match self.download(item, key, dir).await {
                    Ok(path) => paths.push(path),
                    Err(Error::MissingAsset { id, key }) => {
                        tracing::warn!("item {id} has no asset {key}, skipping")
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(paths)
    }

    async fn get(&self, href: &str) -> Result<Vec<u8>> {
        let mut request = self.client.get(href);
        if self.requester_pays {
            request = request.header(REQUESTER_PAYS_HEADER, "requester");
        }
        let response = request.send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

fn item_id(item: &Item) -> String {
    item.get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn candidate_hrefs(item: &Item, key: &str) -> Result<Vec<String>> {
    let asset = item
        .get("assets")
        .and_then(|assets| assets.get(key))
        .ok_or_else(|| Error::MissingAsset {
            id: item_id(item),
            key: key.to_string(),
        })?;
    let href = |value: &Value| value.get("href").and_then(Value::as_str).map(String::from);
    let mut hrefs: Vec<String> = href(asset).into_iter().collect();
    if let Some(alternates) = asset.get("alternate").and_then(Value::as_object) {
        hrefs.extend(alternates.values().filter_map(href));
    }
    if hrefs.is_empty() {
        return Err(Error::MissingAsset {
            id: item_id(item),
            key: key.to_string(),
        });
    }
    Ok(hrefs)
}

fn extension(href: &str) -> String {
    let path = match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.to_string(),
    };
    let file_name = path.rsplit('/').next().unwrap_or_default();
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!(".{extension}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::Downloader;
    use crate::{Error, FilenameTemplate};
    use mockito::Server;
    use rstest::rstest;
    use satsearch::Item;
    use serde_json::json;
    use tempfile::TempDir;

    fn item(url: &str) -> Item {
        json!({
            "type": "Feature",
            "id": "an-id",
            "collection": "c1",
            "properties": {"datetime": "2020-01-01T00:00:00Z"},
            "assets": {
                "thumbnail": {"href": format!("{url}/thumb.png")},
                "B04": {
                    "href": format!("{url}/broken/B04.tif"),
                    "alternate": {
                        "s3": {"href": format!("{url}/also-broken/B04.tif")},
                        "https": {"href": format!("{url}/mirror/B04.tif")}
                    }
                }
            }
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[rstest]
    #[case("https://example.com/a/b.tif", ".tif")]
    #[case("https://example.com/a/b.tif?token=x", ".tif")]
    #[case("https://example.com/a/b", "")]
    #[case("s3://bucket/a/b.TIF", ".TIF")]
    #[case("relative/thumb.jpg", ".jpg")]
    #[case("https://example.com/a/.hidden", "")]
    fn extension(#[case] href: &str, #[case] expected: &str) {
        assert_eq!(super::extension(href), expected);
    }

    #[tokio::test]
    async fn download() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/thumb.png")
            .with_body("png")
            .expect(1)
            .create_async()
            .await;
        let tempdir = TempDir::new().unwrap();
        let downloader = Downloader::new().unwrap();
        let item = item(&server.url());
        let path = downloader
            .download(&item, "thumbnail", tempdir.path())
            .await
            .unwrap();
        assert_eq!(
            path,
            tempdir.path().join("c1/2020-01-01/an-id_thumbnail.png")
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "png");

        let again = downloader
            .download(&item, "thumbnail", tempdir.path())
            .await
            .unwrap();
        assert_eq!(again, path);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn falls_back_to_alternates_in_order() {
        let mut server = Server::new_async().await;
        let broken = server
            .mock("GET", "/broken/B04.tif")
            .with_status(403)
            .expect(1)
            .create_async()
            .await;
        let also_broken = server
            .mock("GET", "/also-broken/B04.tif")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        let mirror = server
            .mock("GET", "/mirror/B04.tif")
            .with_body("tif")
            .expect(1)
            .create_async()
            .await;
        let tempdir = TempDir::new().unwrap();
        let downloader = Downloader::new()
            .unwrap()
            .with_template("${id}".parse::<FilenameTemplate>().unwrap());
        let path = downloader
            .download(&item(&server.url()), "B04", tempdir.path())
            .await
            .unwrap();
        broken.assert_async().await;
        also_broken.assert_async().await;
        mirror.assert_async().await;
        assert_eq!(path, tempdir.path().join("an-id_B04.tif"));
    }

    #[tokio::test]
    async fn all_candidates_failed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let tempdir = TempDir::new().unwrap();
        let error = Downloader::new()
            .unwrap()
            .download(&item(&server.url()), "B04", tempdir.path())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::AllCandidatesFailed { ref hrefs, .. } if hrefs.len() == 3
        ));
    }

    #[tokio::test]
    async fn missing_asset() {
        let tempdir = TempDir::new().unwrap();
        let error = Downloader::new()
            .unwrap()
            .download(&item("http://stac.test"), "B08", tempdir.path())
            .await
            .unwrap_err();
        assert!(matches!(error, Error::MissingAsset { ref key, .. } if key == "B08"));
    }

    #[tokio::test]
    async fn requester_pays() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/thumb.png")
            .match_header("x-amz-request-payer", "requester")
            .with_body("png")
            .expect(1)
            .create_async()
            .await;
        let tempdir = TempDir::new().unwrap();
        let _ = Downloader::new()
            .unwrap()
            .with_requester_pays(true)
            .download(&item(&server.url()), "thumbnail", tempdir.path())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn download_all_skips_missing_assets() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/thumb.png")
            .with_body("png")
            .create_async()
            .await;
        let tempdir = TempDir::new().unwrap();
        let paths = Downloader::new()
            .unwrap()
            .download_all(
                &[item(&server.url())],
                &["thumbnail".to_string(), "B08".to_string()],
                tempdir.path(),
            )
            .await
            .unwrap();
        assert_eq!(paths.len(), 1);
    }
}
