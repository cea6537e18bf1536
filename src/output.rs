//! CSV output, mirroring the way `stanford-esrg-retina`'s `lcore::monitor::Logger`
//! drives `csv::Writer` — one writer per output stream, explicit `flush()` calls,
//! errors propagated rather than swallowed.

use std::fs::File;
use std::path::Path;

use csv::Writer;
use serde::Serialize;

use crate::types::{FeatureRecord, WindowHistoryEntry};

/// Writes [`FeatureRecord`]s to a CSV file, one row per `retrieve_statistics` call,
/// with the header order matching the field declaration order.
pub struct FeatureRecordWriter {
    inner: Writer<File>,
}

impl FeatureRecordWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        Ok(FeatureRecordWriter {
            inner: Writer::from_path(path)?,
        })
    }

    pub fn write(&mut self, record: &FeatureRecord) -> Result<(), csv::Error> {
        self.inner.serialize(record)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Writes raw [`WindowHistoryEntry`] rows (the `dump_windows` retrieval mode),
/// each prefixed with the owning source IP.
pub struct WindowDumpWriter {
    inner: Writer<File>,
}

#[derive(Serialize)]
struct DumpRow<'a> {
    src_ip: &'a str,
    window_id: u32,
    tstamp_start: u64,
    tstamp_end: u64,
    pkts_total: u64,
    bytes_total: u64,
    tcp_pkt_count: u64,
    udp_pkt_count: u64,
    icmp_pkt_count: u64,
    pkts_frag_count: u64,
    pkt_arrivals_avg: f64,
    pkt_arrivals_std: f64,
    pkt_size_min: u32,
    pkt_size_max: u32,
    pkt_size_avg: f32,
    pkt_size_std: f32,
    port_src_unique: f32,
    port_src_entropy: f32,
    conn_pkts_avg: f32,
    hdrs_payload_ratio_avg: f32,
}

impl<'a> DumpRow<'a> {
    fn new(src_ip: &'a str, entry: &WindowHistoryEntry) -> Self {
        DumpRow {
            src_ip,
            window_id: entry.window_id,
            tstamp_start: entry.tstamp_start,
            tstamp_end: entry.tstamp_end,
            pkts_total: entry.pkts_total,
            bytes_total: entry.bytes_total,
            tcp_pkt_count: entry.tcp_pkt_count,
            udp_pkt_count: entry.udp_pkt_count,
            icmp_pkt_count: entry.icmp_pkt_count,
            pkts_frag_count: entry.pkts_frag_count,
            pkt_arrivals_avg: entry.pkt_arrivals_avg,
            pkt_arrivals_std: entry.pkt_arrivals_std,
            pkt_size_min: entry.pkt_size_min,
            pkt_size_max: entry.pkt_size_max,
            pkt_size_avg: entry.pkt_size_avg,
            pkt_size_std: entry.pkt_size_std,
            port_src_unique: entry.port_src_unique,
            port_src_entropy: entry.port_src_entropy,
            conn_pkts_avg: entry.conn_pkts_avg,
            hdrs_payload_ratio_avg: entry.hdrs_payload_ratio_avg,
        }
    }
}

impl WindowDumpWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        Ok(WindowDumpWriter {
            inner: Writer::from_path(path)?,
        })
    }

    pub fn write(&mut self, src_ip: &str, entry: &WindowHistoryEntry) -> Result<(), csv::Error> {
        self.inner.serialize(DumpRow::new(src_ip, entry))
    }

    pub fn write_all(&mut self, src_ip: &str, entries: &[WindowHistoryEntry]) -> Result<(), csv::Error> {
        for entry in entries {
            self.write(src_ip, entry)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile_free_test_support::temp_csv_path;

    mod tempfile_free_test_support {
        use std::path::PathBuf;
        use std::sync::atomic::{AtomicU64, Ordering};

        static COUNTER: AtomicU64 = AtomicU64::new(0);

        /// Returns a unique path under the OS temp directory, avoiding a `tempfile`
        /// dev-dependency for a single test helper.
        pub fn temp_csv_path(label: &str) -> PathBuf {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            std::env::temp_dir().join(format!("windower-core-test-{label}-{n}.csv"))
        }
    }

    fn sample_record() -> FeatureRecord {
        FeatureRecord {
            src_ip: "10.0.0.1".to_string(),
            window_count: 1,
            window_span: 1,
            pkts_total: 100,
            bytes_total: 10_000,
            pkt_rate: 100.0,
            byte_rate: 10_000.0,
            pkt_arrivals_avg: 1_000_000.0,
            pkt_arrivals_std: 0.0,
            pkt_size_min: 100,
            pkt_size_max: 100,
            pkt_size_avg: 100.0,
            pkt_size_std: 0.0,
            proto_tcp_share: 1.0,
            proto_udp_share: 0.0,
            proto_icmp_share: 0.0,
            port_src_unique: 100.0,
            port_src_entropy: 1.0,
            conn_pkts_avg: 1.0,
            pkts_frag_share: 0.0,
            hdrs_payload_ratio_avg: 0.6,
            pkts_total_std: 0.0,
            bytes_total_std: 0.0,
            pkt_size_avg_std: 0.0,
            pkt_size_std_std: 0.0,
            pkt_arrivals_avg_std: 0.0,
            port_src_unique_std: 0.0,
            port_src_entropy_std: 0.0,
            conn_pkts_avg_std: 0.0,
            pkts_frag_share_std: 0.0,
            hdrs_payload_ratio_avg_std: 0.0,
            dominant_proto_ratio_std: 0.0,
            intrawindow_activity_ratio: 0.0,
            interwindow_activity_ratio: 1.0,
        }
    }

    #[test]
    fn writes_feature_record_header_and_row() {
        let path = temp_csv_path("features");
        {
            let mut writer = FeatureRecordWriter::create(&path).unwrap();
            writer.write(&sample_record()).unwrap();
            writer.flush().unwrap();
        }
        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert!(contents.starts_with("src_ip,window_count,window_span"));
        assert!(contents.contains("10.0.0.1"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn writes_window_dump_rows_prefixed_with_ip() {
        let path = temp_csv_path("dump");
        {
            let mut writer = WindowDumpWriter::create(&path).unwrap();
            let entry = WindowHistoryEntry {
                window_id: 7,
                ..Default::default()
            };
            writer.write("10.0.0.2", &entry).unwrap();
            writer.flush().unwrap();
        }
        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert!(contents.contains("10.0.0.2"));
        assert!(contents.contains('7'));
        std::fs::remove_file(&path).ok();
    }
}
