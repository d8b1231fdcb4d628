//! Snapshot loading from a directory or an HTTP server.
//!
//! Loading is the only asynchronous step: every requested dataset is fetched
//! and parsed concurrently, and the first failure aborts the whole load with
//! a [`DmVizError::DataLoad`] naming the generator script to re-run. There
//! are no retries and no partial snapshots.

use crate::datasets::{DayHourData, ResponseTimeTable, SentRecvTable};
use crate::table::Table;
use async_trait::async_trait;
use dmviz_common::{DmVizError, Granularity, Result};
use dmviz_config::{
    DataConfig, DAY_HOUR_FILE, MONTHLY_FILE, QUARTERLY_FILE, RESPONSE_TIMES_FILE, SENT_RECV_FILE,
};
use futures::future::try_join_all;
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Script that writes the monthly and quarterly tables.
pub const MONTHLY_GENERATOR: &str = "query_messages_monthly.py";

/// Script that writes the detailed datasets.
pub const DETAILED_GENERATOR: &str = "query_messages_detailed.py";

/// The snapshot files a chart may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetKind {
    /// Per-contact monthly counts.
    Monthly,
    /// Per-contact quarterly counts.
    Quarterly,
    /// Monthly sent/received counts.
    SentReceived,
    /// Monthly median reply times.
    ResponseTimes,
    /// Day-of-week by hour-of-day grids.
    DayHour,
}

impl DatasetKind {
    /// Every dataset kind.
    pub const ALL: &'static [Self] = &[
        Self::Monthly,
        Self::Quarterly,
        Self::SentReceived,
        Self::ResponseTimes,
        Self::DayHour,
    ];

    /// Generator script that produces this dataset.
    pub const fn generator(self) -> &'static str {
        match self {
            Self::Monthly | Self::Quarterly => MONTHLY_GENERATOR,
            Self::SentReceived | Self::ResponseTimes | Self::DayHour => DETAILED_GENERATOR,
        }
    }

    /// File name used when none is configured.
    pub const fn default_file_name(self) -> &'static str {
        match self {
            Self::Monthly => MONTHLY_FILE,
            Self::Quarterly => QUARTERLY_FILE,
            Self::SentReceived => SENT_RECV_FILE,
            Self::ResponseTimes => RESPONSE_TIMES_FILE,
            Self::DayHour => DAY_HOUR_FILE,
        }
    }

    /// Configured file name for this dataset.
    pub fn file_name(self, data: &DataConfig) -> &str {
        match self {
            Self::Monthly => &data.monthly_file,
            Self::Quarterly => &data.quarterly_file,
            Self::SentReceived => &data.sent_recv_file,
            Self::ResponseTimes => &data.response_times_file,
            Self::DayHour => &data.day_hour_file,
        }
    }

    /// The count table kind for a granularity.
    pub const fn for_granularity(granularity: Granularity) -> Self {
        match granularity {
            Granularity::Monthly => Self::Monthly,
            Granularity::Quarterly => Self::Quarterly,
        }
    }

    fn missing(self) -> DmVizError {
        DmVizError::data_load(
            self.default_file_name(),
            self.generator(),
            "dataset was not loaded",
        )
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::SentReceived => "sent_received",
            Self::ResponseTimes => "response_times",
            Self::DayHour => "day_hour",
        };
        f.write_str(name)
    }
}

/// Where snapshot files are read from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the raw bytes of one snapshot file.
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>>;

    /// Human readable location, for logs.
    fn location(&self) -> String;
}

/// Reads snapshot files from a local directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    base_dir: PathBuf,
}

impl FileSource {
    /// Creates a source rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>> {
        let path = self.base_dir.join(file_name);
        debug!(path = %path.display(), "Reading snapshot file");
        Ok(tokio::fs::read(&path).await?)
    }

    fn location(&self) -> String {
        self.base_dir.display().to_string()
    }
}

/// Fetches snapshot files over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: Url,
    cache_bust: bool,
}

impl HttpSource {
    /// Request timeout for a single snapshot file.
    pub const TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a source for files under `base_url`.
    pub fn new(base_url: &str, cache_bust: bool) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            DmVizError::config_with_source(format!("Invalid snapshot base URL '{base_url}'"), e)
        })?;
        // a base without a trailing slash would replace its last segment on join
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| DmVizError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            base_url,
            cache_bust,
        })
    }

    /// URL of one snapshot file, with a timestamp query when cache busting.
    pub fn url_for(&self, file_name: &str) -> Result<Url> {
        let mut url = self.base_url.join(file_name).map_err(|e| {
            DmVizError::config_with_source(format!("Invalid snapshot file name '{file_name}'"), e)
        })?;
        if self.cache_bust {
            url.set_query(Some(&chrono::Utc::now().timestamp_millis().to_string()));
        }
        Ok(url)
    }
}

#[async_trait]
impl SnapshotSource for HttpSource {
    async fn fetch(&self, file_name: &str) -> Result<Vec<u8>> {
        let url = self.url_for(file_name)?;
        debug!(%url, "Fetching snapshot file");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    fn location(&self) -> String {
        self.base_url.to_string()
    }
}

/// The datasets loaded for one view session. Read-only after loading.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Monthly counts.
    pub monthly: Option<Table>,
    /// Quarterly counts.
    pub quarterly: Option<Table>,
    /// Sent/received counts.
    pub sent_recv: Option<SentRecvTable>,
    /// Reply times.
    pub response_times: Option<ResponseTimeTable>,
    /// Day/hour grids.
    pub day_hour: Option<DayHourData>,
}

impl Snapshot {
    /// Monthly counts, or a data-load error if they were not loaded.
    pub fn require_monthly(&self) -> Result<&Table> {
        self.monthly
            .as_ref()
            .ok_or_else(|| DatasetKind::Monthly.missing())
    }

    /// Quarterly counts, or a data-load error if they were not loaded.
    pub fn require_quarterly(&self) -> Result<&Table> {
        self.quarterly
            .as_ref()
            .ok_or_else(|| DatasetKind::Quarterly.missing())
    }

    /// The count table for `granularity`.
    pub fn require_table(&self, granularity: Granularity) -> Result<&Table> {
        match granularity {
            Granularity::Monthly => self.require_monthly(),
            Granularity::Quarterly => self.require_quarterly(),
        }
    }

    /// Sent/received counts, or a data-load error if they were not loaded.
    pub fn require_sent_recv(&self) -> Result<&SentRecvTable> {
        self.sent_recv
            .as_ref()
            .ok_or_else(|| DatasetKind::SentReceived.missing())
    }

    /// Reply times, or a data-load error if they were not loaded.
    pub fn require_response_times(&self) -> Result<&ResponseTimeTable> {
        self.response_times
            .as_ref()
            .ok_or_else(|| DatasetKind::ResponseTimes.missing())
    }

    /// Day/hour grids, or a data-load error if they were not loaded.
    pub fn require_day_hour(&self) -> Result<&DayHourData> {
        self.day_hour
            .as_ref()
            .ok_or_else(|| DatasetKind::DayHour.missing())
    }
}

enum Dataset {
    Table(DatasetKind, Table),
    SentRecv(SentRecvTable),
    ResponseTimes(ResponseTimeTable),
    DayHour(DayHourData),
}

/// Loads snapshot datasets from a [`SnapshotSource`].
pub struct SnapshotLoader {
    source: Box<dyn SnapshotSource>,
    files: DataConfig,
}

impl SnapshotLoader {
    /// Creates a loader over an explicit source.
    pub fn new(source: impl SnapshotSource + 'static, files: DataConfig) -> Self {
        Self {
            source: Box::new(source),
            files,
        }
    }

    /// HTTP when `base_url` is set, otherwise the local `base_dir`.
    pub fn from_config(data: &DataConfig) -> Result<Self> {
        let loader = match &data.base_url {
            Some(base_url) => Self::new(HttpSource::new(base_url, data.cache_bust)?, data.clone()),
            None => Self::new(FileSource::new(data.base_dir.clone()), data.clone()),
        };
        info!(source = %loader.source.location(), "Snapshot source configured");
        Ok(loader)
    }

    /// Fetch and parse `kinds` concurrently.
    #[instrument(skip(self))]
    pub async fn load(&self, kinds: &[DatasetKind]) -> Result<Snapshot> {
        let mut kinds = kinds.to_vec();
        kinds.sort_unstable();
        kinds.dedup();

        let datasets = try_join_all(kinds.iter().map(|kind| self.load_one(*kind))).await?;

        let mut snapshot = Snapshot::default();
        for dataset in datasets {
            match dataset {
                Dataset::Table(DatasetKind::Quarterly, table) => snapshot.quarterly = Some(table),
                Dataset::Table(_, table) => snapshot.monthly = Some(table),
                Dataset::SentRecv(table) => snapshot.sent_recv = Some(table),
                Dataset::ResponseTimes(table) => snapshot.response_times = Some(table),
                Dataset::DayHour(data) => snapshot.day_hour = Some(data),
            }
        }

        info!(datasets = kinds.len(), "Snapshot loaded");
        Ok(snapshot)
    }

    async fn load_one(&self, kind: DatasetKind) -> Result<Dataset> {
        let file_name = kind.file_name(&self.files);
        let fail = |e: DmVizError| {
            DmVizError::data_load_with_source(file_name, kind.generator(), e.to_string(), e)
        };

        let bytes = self.source.fetch(file_name).await.map_err(fail)?;
        debug!(%kind, bytes = bytes.len(), "Fetched dataset");

        let dataset = match kind {
            DatasetKind::Monthly | DatasetKind::Quarterly => {
                let table = Table::from_csv_reader(bytes.as_slice()).map_err(fail)?;
                let expected = if kind == DatasetKind::Quarterly {
                    Granularity::Quarterly
                } else {
                    Granularity::Monthly
                };
                if !table.periods().is_empty() && table.granularity() != expected {
                    return Err(fail(DmVizError::parse(format!(
                        "expected {expected} columns, found {}",
                        table.granularity()
                    ))));
                }
                Dataset::Table(kind, table)
            }
            DatasetKind::SentReceived => {
                Dataset::SentRecv(SentRecvTable::from_csv_reader(bytes.as_slice()).map_err(fail)?)
            }
            DatasetKind::ResponseTimes => Dataset::ResponseTimes(
                ResponseTimeTable::from_csv_reader(bytes.as_slice()).map_err(fail)?,
            ),
            DatasetKind::DayHour => {
                let content = String::from_utf8_lossy(&bytes);
                Dataset::DayHour(DayHourData::from_json_str(&content).map_err(fail)?)
            }
        };
        Ok(dataset)
    }
}
