use crate::{SnapshotRecord, SnapshotStore, StoreError, StoredSnapshot};
use chrono::{DateTime, Utc};
use sqlite::{Connection, State, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

const SETUP_QUERY: &str = "CREATE TABLE IF NOT EXISTS snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    load_mbps REAL,
    voip_kbps INTEGER,
    http_mbps REAL,
    ftp_mbps REAL,
    arrival_rate INTEGER,
    base_delay_ms REAL,
    queue_length INTEGER,
    state TEXT,
    confidence REAL,
    infer_time_ms REAL,
    bandwidth_voip INTEGER,
    bandwidth_http INTEGER,
    bandwidth_ftp INTEGER,
    queue_voip INTEGER,
    queue_http INTEGER,
    queue_ftp INTEGER,
    link_utilization INTEGER,
    queue_occupancy INTEGER,
    final_delay_ms REAL,
    throughput_mbps REAL,
    packet_loss REAL,
    alert_count INTEGER
);";

const INSERT_SNAPSHOT: &str = "INSERT INTO snapshots (
    timestamp, load_mbps, voip_kbps, http_mbps, ftp_mbps, arrival_rate,
    base_delay_ms, queue_length, state, confidence, infer_time_ms,
    bandwidth_voip, bandwidth_http, bandwidth_ftp, queue_voip, queue_http,
    queue_ftp, link_utilization, queue_occupancy, final_delay_ms,
    throughput_mbps, packet_loss, alert_count
) VALUES (
    :timestamp, :load_mbps, :voip_kbps, :http_mbps, :ftp_mbps, :arrival_rate,
    :base_delay_ms, :queue_length, :state, :confidence, :infer_time_ms,
    :bandwidth_voip, :bandwidth_http, :bandwidth_ftp, :queue_voip, :queue_http,
    :queue_ftp, :link_utilization, :queue_occupancy, :final_delay_ms,
    :throughput_mbps, :packet_loss, :alert_count
);";

const SELECT_RECENT: &str = "SELECT * FROM snapshots ORDER BY id DESC LIMIT :limit;";

/// Snapshot store backed by a SQLite file.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Creates a store for the database at `path`. Nothing is opened
    /// until the first insert or query.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Database file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Connect(format!("{}: {e}", parent.display())))?;
            }
        }
        let cn = sqlite::open(&self.path)
            .map_err(|e| StoreError::Connect(format!("{}: {e}", self.path.display())))?;
        cn.execute(SETUP_QUERY)
            .map_err(|e| StoreError::Connect(format!("schema setup failed: {e}")))?;
        Ok(cn)
    }
}

impl SnapshotStore for SqliteStore {
    fn insert(&self, record: &SnapshotRecord, timestamp: DateTime<Utc>) -> Result<(), StoreError> {
        let cn = self.connect()?;
        let mut statement = cn.prepare(INSERT_SNAPSHOT)?;
        statement.bind_iter::<_, (_, Value)>([
            (":timestamp", timestamp.to_rfc3339().into()),
            (":load_mbps", record.load_mbps.into()),
            (":voip_kbps", record.voip_kbps.into()),
            (":http_mbps", record.http_mbps.into()),
            (":ftp_mbps", record.ftp_mbps.into()),
            (":arrival_rate", record.arrival_rate.into()),
            (":base_delay_ms", record.base_delay_ms.into()),
            (":queue_length", record.queue_length.into()),
            (":state", record.state.clone().into()),
            (":confidence", record.confidence.into()),
            (":infer_time_ms", record.infer_time_ms.into()),
            (":bandwidth_voip", record.bandwidth_voip.into()),
            (":bandwidth_http", record.bandwidth_http.into()),
            (":bandwidth_ftp", record.bandwidth_ftp.into()),
            (":queue_voip", record.queue_voip.into()),
            (":queue_http", record.queue_http.into()),
            (":queue_ftp", record.queue_ftp.into()),
            (":link_utilization", record.link_utilization.into()),
            (":queue_occupancy", record.queue_occupancy.into()),
            (":final_delay_ms", record.final_delay_ms.into()),
            (":throughput_mbps", record.throughput_mbps.into()),
            (":packet_loss", record.packet_loss.into()),
            (":alert_count", record.alert_count.into()),
        ])?;
        statement.next()?;
        debug!("Stored snapshot for {timestamp}");
        Ok(())
    }

    fn query(&self, limit: usize) -> Result<Vec<StoredSnapshot>, StoreError> {
        let cn = self.connect()?;
        let mut statement = cn.prepare(SELECT_RECENT)?;
        statement.bind((":limit", limit as i64))?;

        let mut result = Vec::new();
        while let State::Row = statement.next()? {
            let raw_time = statement.read::<String, _>("timestamp")?;
            let timestamp = DateTime::parse_from_rfc3339(&raw_time)
                .map_err(|e| StoreError::Decode(format!("{raw_time}: {e}")))?
                .with_timezone(&Utc);
            result.push(StoredSnapshot {
                id: statement.read::<i64, _>("id")?,
                timestamp,
                record: SnapshotRecord {
                    load_mbps: statement.read::<f64, _>("load_mbps")?,
                    voip_kbps: statement.read::<i64, _>("voip_kbps")?,
                    http_mbps: statement.read::<f64, _>("http_mbps")?,
                    ftp_mbps: statement.read::<f64, _>("ftp_mbps")?,
                    arrival_rate: statement.read::<i64, _>("arrival_rate")?,
                    base_delay_ms: statement.read::<f64, _>("base_delay_ms")?,
                    queue_length: statement.read::<i64, _>("queue_length")?,
                    state: statement.read::<String, _>("state")?,
                    confidence: statement.read::<f64, _>("confidence")?,
                    infer_time_ms: statement.read::<f64, _>("infer_time_ms")?,
                    bandwidth_voip: statement.read::<i64, _>("bandwidth_voip")?,
                    bandwidth_http: statement.read::<i64, _>("bandwidth_http")?,
                    bandwidth_ftp: statement.read::<i64, _>("bandwidth_ftp")?,
                    queue_voip: statement.read::<i64, _>("queue_voip")?,
                    queue_http: statement.read::<i64, _>("queue_http")?,
                    queue_ftp: statement.read::<i64, _>("queue_ftp")?,
                    link_utilization: statement.read::<i64, _>("link_utilization")?,
                    queue_occupancy: statement.read::<i64, _>("queue_occupancy")?,
                    final_delay_ms: statement.read::<f64, _>("final_delay_ms")?,
                    throughput_mbps: statement.read::<f64, _>("throughput_mbps")?,
                    packet_loss: statement.read::<f64, _>("packet_loss")?,
                    alert_count: statement.read::<i64, _>("alert_count")?,
                },
            });
        }
        Ok(result)
    }
}
