// The verbosity stuff is cribbed from https://github.com/clap-rs/clap-verbosity-flag/blob/c621a6a8a7c0b6df8f1464a985a5d076b4915693/src/lib.rs and updated for tracing

#![deny(unused_crate_dependencies)]

mod calendar;
mod summary;

use anyhow::{Error, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand};
use geojson::{GeoJson, Geometry};
use indexmap::IndexMap;
use satsearch::{Client, Config, ResultSet, SearchMethod, SearchSpec};
use satsearch_io::{DEFAULT_FILENAME_TEMPLATE, Downloader, FilenameTemplate};
use serde_json::Value;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::metadata::Level;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{
    fmt::writer::MakeWriterExt, layer::SubscriberExt, util::SubscriberInitExt,
};

const DOWNLOAD_ALL: &str = "ALL";

/// sat-search: search a STAC API and download the assets of what you find
#[derive(Debug, Parser)]
#[command(version)]
pub struct SatSearch {
    #[command(subcommand)]
    command: Command,

    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        help = ErrorLevel::verbose_help(),
        long_help = ErrorLevel::verbose_long_help(),
    )]
    verbose: u8,

    #[arg(
        long,
        action = clap::ArgAction::Count,
        global = true,
        help = ErrorLevel::quiet_help(),
        long_help = ErrorLevel::quiet_long_help(),
        conflicts_with = "verbose",
    )]
    quiet: u8,
}

/// A sat-search subcommand.
#[derive(Debug, Subcommand)]
#[allow(clippy::large_enum_variant)]
pub enum Command {
    /// Performs a new search of items.
    Search {
        #[command(flatten)]
        search: SearchArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Loads items from a previous search.
    Load {
        /// A GeoJSON file saved with `--save`.
        items: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Generate completion scripts for a given shell.
    GenerateCompletions {
        /// The shell to generate completion scripts for.
        shell: clap_complete::Shell,
    },
}

/// Search options.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// The root url of the STAC API.
    #[arg(long, env = satsearch::URL_ENV_VAR)]
    pub url: Option<String>,

    /// Collection ids that each matching item must be in.
    #[arg(short = 'c', long, num_args = 1..)]
    pub collections: Vec<String>,

    /// One or more item ids (ignores other search options except collections).
    #[arg(long, num_args = 1..)]
    pub ids: Vec<String>,

    /// Bounding box (min lon, min lat, max lon, max lat).
    #[arg(
        long,
        num_args = 4,
        allow_negative_numbers = true,
        value_names = ["MIN_LON", "MIN_LAT", "MAX_LON", "MAX_LAT"]
    )]
    pub bbox: Option<Vec<f64>>,

    /// A GeoJSON geometry, feature, or feature collection, as a file or a string.
    ///
    /// Features contribute their geometry, and feature collections the
    /// geometry of their first feature.
    #[arg(long)]
    pub intersects: Option<String>,

    /// Single date+time, or begin and end date+time separated by `/`.
    #[arg(long)]
    pub datetime: Option<String>,

    /// Property comparisons, e.g. `eo:cloud_cover<10` (`=`, `<`, `>`, `<=`, and `>=` are supported).
    #[arg(short = 'q', long, num_args = 1..)]
    pub query: Vec<String>,

    /// Fields to sort by, prefixed with `>` or `-` for descending and `<` or `+` for ascending.
    #[arg(long, num_args = 1..)]
    pub sortby: Vec<String>,

    /// The maximum number of items to return.
    #[arg(long)]
    pub limit: Option<u64>,

    /// The number of items to request per page.
    #[arg(long, default_value_t = satsearch::DEFAULT_PAGE_SIZE)]
    pub page_size: u64,

    /// The HTTP method to search with, GET or POST.
    #[arg(long, default_value_t = SearchMethod::Post)]
    pub method: SearchMethod,

    /// A request header in `KEY=VALUE` format. Can be repeated.
    #[arg(long = "header")]
    pub header: Vec<KeyValue>,

    /// Request headers as a JSON object, as a file or a string.
    #[arg(long)]
    pub headers: Option<String>,

    /// Only print how many items were found.
    #[arg(long)]
    pub found: bool,
}

/// Output and download options.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Print a table of these fields for every item (date and id by default).
    #[arg(long = "print-md", num_args = 0.., value_name = "FIELD")]
    pub print_md: Option<Vec<String>>,

    /// Print a calendar of item dates, labeled by this property.
    #[arg(
        long = "print-cal",
        num_args = 0..=1,
        default_missing_value = "platform",
        value_name = "FIELD"
    )]
    pub print_cal: Option<String>,

    /// Save the results as GeoJSON.
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Asset keys to download, or `ALL` for every asset.
    #[arg(long, num_args = 1..)]
    pub download: Vec<String>,

    /// Save assets with this filename pattern, filled in from item fields.
    #[arg(long, default_value = DEFAULT_FILENAME_TEMPLATE)]
    pub filename_template: FilenameTemplate,

    /// The directory to download assets into.
    #[arg(long, default_value = ".")]
    pub datadir: PathBuf,

    /// Acknowledge paying egress costs for downloads from requester pays buckets.
    #[arg(long)]
    pub requester_pays: bool,
}

/// A `KEY=VALUE` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue(pub String, pub String);

#[derive(Copy, Clone, Debug, Default)]
struct ErrorLevel;

impl SatSearch {
    /// Runs this command.
    ///
    /// If `init_tracing_subscriber` is `false`, it is expected that the caller
    /// is setting up the appropriate logging.
    pub async fn run(self, init_tracing_subscriber: bool) -> Result<()> {
        if init_tracing_subscriber {
            let indicatif_layer = IndicatifLayer::new();
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer().with_writer(
                        indicatif_layer
                            .get_stderr_writer()
                            .with_max_level(self.log_level().unwrap_or(Level::WARN)),
                    ),
                )
                .with(indicatif_layer)
                .init();
        }
        match self.command {
            Command::Search { search, output } => {
                let client = Client::new(search.config().await?)?;
                let spec = search.spec().await?;
                if search.found {
                    match client.found(&spec).await? {
                        Some(found) => println!("{found} items found"),
                        None => println!("the API did not report how many items were found"),
                    }
                    return Ok(());
                }
                let result_set = client.search(&spec).await?;
                output.handle(&result_set).await
            }
            Command::Load { items, output } => {
                let result_set = satsearch_io::read(items)?;
                output.handle(&result_set).await
            }
            Command::GenerateCompletions { shell } => {
                let mut command = SatSearch::command();
                clap_complete::generate(shell, &mut command, "sat-search", &mut std::io::stdout());
                Ok(())
            }
        }
    }

    /// Returns the subcommand.
    pub fn subcommand(&self) -> &Command {
        &self.command
    }

    /// Returns the log level set by `-v` and `--quiet`.
    pub fn log_level(&self) -> Option<Level> {
        level_enum(self.verbosity())
    }

    fn verbosity(&self) -> i8 {
        level_value(ErrorLevel::default()) - (self.quiet as i8) + (self.verbose as i8)
    }
}

impl SearchArgs {
    /// Returns the client configuration.
    ///
    /// Headers from `--headers` are applied first, then each `--header`.
    pub async fn config(&self) -> Result<Config> {
        let config = match &self.url {
            Some(url) => Config::new(url)?,
            None => Config::from_env()?,
        };
        let mut headers = IndexMap::new();
        if let Some(value) = &self.headers {
            let value = read_json(value).await?;
            let Value::Object(object) = value else {
                return Err(anyhow!("--headers must be a JSON object"));
            };
            for (key, value) in object {
                let value = match value {
                    Value::String(s) => s,
                    value => value.to_string(),
                };
                let _ = headers.insert(key, value);
            }
        }
        for KeyValue(key, value) in &self.header {
            let _ = headers.insert(key.clone(), value.clone());
        }
        Ok(config
            .with_headers(headers)
            .with_method(self.method)
            .with_page_size(self.page_size))
    }

    /// Returns the search spec.
    pub async fn spec(&self) -> Result<SearchSpec> {
        let mut spec = SearchSpec::new()
            .collections(self.collections.clone())
            .ids(self.ids.clone())
            .query(self.query.clone())
            .sortby(self.sortby.clone());
        if let Some(bbox) = &self.bbox {
            spec = spec.bbox(bbox.clone());
        }
        if let Some(intersects) = &self.intersects {
            spec = spec.intersects(intersects_geometry(read_json(intersects).await?)?);
        }
        if let Some(datetime) = &self.datetime {
            spec = spec.datetime(datetime);
        }
        if let Some(limit) = self.limit {
            spec = spec.limit(limit);
        }
        Ok(spec)
    }
}

impl OutputArgs {
    async fn handle(&self, result_set: &ResultSet) -> Result<()> {
        println!("{} items found", result_set.len());
        if let Some(fields) = &self.print_md {
            println!("{}", summary::render(result_set, fields));
        }
        if let Some(field) = &self.print_cal {
            let dates = calendar::dates(result_set.items(), field);
            println!("{}", calendar::render(&dates));
        }
        if let Some(save) = &self.save {
            satsearch_io::write(save, result_set, false)?;
        }
        let keys = self.download_keys(result_set);
        if !keys.is_empty() {
            let downloader = Downloader::new()?
                .with_template(self.filename_template.clone())
                .with_requester_pays(self.requester_pays);
            let paths = downloader
                .download_all(result_set.items(), &keys, &self.datadir)
                .await?;
            tracing::info!("downloaded {} files", paths.len());
        }
        Ok(())
    }

    /// Returns the asset keys to download.
    pub fn download_keys(&self, result_set: &ResultSet) -> Vec<String> {
        if self.download.iter().any(|key| key == DOWNLOAD_ALL) {
            result_set.asset_keys()
        } else {
            self.download.clone()
        }
    }
}

impl ErrorLevel {
    fn default() -> Option<Level> {
        Some(Level::ERROR)
    }

    fn verbose_help() -> Option<&'static str> {
        Some("Increase verbosity")
    }

    fn verbose_long_help() -> Option<&'static str> {
        None
    }

    fn quiet_help() -> Option<&'static str> {
        Some("Decrease verbosity")
    }

    fn quiet_long_help() -> Option<&'static str> {
        None
    }
}

impl FromStr for KeyValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some((key, value)) = s.split_once('=') {
            Ok(KeyValue(key.to_string(), value.to_string()))
        } else {
            Err(anyhow!("invalid header '{s}', expected format KEY=VALUE"))
        }
    }
}

/// Parses JSON from a file, if `s` is a path to one, or from `s` itself.
async fn read_json(s: &str) -> Result<Value> {
    let path = Path::new(s);
    let value = if tokio::fs::try_exists(path).await.unwrap_or(false) {
        let text = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&text)?
    } else {
        serde_json::from_str(s)?
    };
    Ok(value)
}

fn intersects_geometry(value: Value) -> Result<Geometry> {
    match GeoJson::from_json_value(value)? {
        GeoJson::Geometry(geometry) => Ok(geometry),
        GeoJson::Feature(feature) => feature
            .geometry
            .ok_or_else(|| anyhow!("the intersects feature has no geometry")),
        GeoJson::FeatureCollection(feature_collection) => feature_collection
            .features
            .into_iter()
            .next()
            .and_then(|feature| feature.geometry)
            .ok_or_else(|| anyhow!("the intersects feature collection has no geometry")),
    }
}

fn level_enum(verbosity: i8) -> Option<Level> {
    match verbosity {
        i8::MIN..=-1 => None,
        0 => Some(Level::ERROR),
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        4..=i8::MAX => Some(Level::TRACE),
    }
}

fn level_value(level: Option<Level>) -> i8 {
    match level {
        None => -1,
        Some(Level::ERROR) => 0,
        Some(Level::WARN) => 1,
        Some(Level::INFO) => 2,
        Some(Level::DEBUG) => 3,
        Some(Level::TRACE) => 4,
    }
}

#[cfg(test)]
use {assert_cmd as _, mockito as _, rstest as _, tempfile as _};

#[cfg(test)]
mod tests {
    use super::intersects_geometry;
    use geojson::Value as GeometryValue;
    use serde_json::json;

    #[test]
    fn intersects_feature_collection() {
        let geometry = intersects_geometry(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [3.0, 4.0]}}
            ]
        }))
        .unwrap();
        assert_eq!(geometry.value, GeometryValue::Point(vec![1.0, 2.0]));
    }

    #[test]
    fn intersects_feature_without_geometry() {
        let _ = intersects_geometry(json!({
            "type": "Feature",
            "properties": {},
            "geometry": null
        }))
        .unwrap_err();
    }
}
