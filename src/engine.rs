//! The windowed statistics engine: ties together per-IP window aggregation (D),
//! bounded history (C), and the retrieval/synthesis operation (E).

use std::collections::HashMap;

use crate::cache::{ReadyIpCache, WindowHistoryCache};
use crate::config::EngineConfig;
use crate::types::{FeatureRecord, WindowHistoryEntry};
use crate::window::IpWindow;

/// Options for [`Engine::retrieve_statistics`].
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// Reference time (ns) used to evaluate history-TTL membership. Defaults to
    /// the engine's most recently observed packet timestamp.
    pub current_time: Option<u64>,
    pub compute_interwindow_stats: bool,
    pub window_cnt: Option<usize>,
    pub dump_windows: bool,
    pub delete_after: bool,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        RetrieveOptions {
            current_time: None,
            compute_interwindow_stats: true,
            window_cnt: None,
            dump_windows: false,
            delete_after: true,
        }
    }
}

/// Result of a successful `retrieve_statistics` call.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrieveOutcome {
    Summary(FeatureRecord),
    Windows(Vec<WindowHistoryEntry>),
}

/// Per-source-IP windowed statistics engine.
pub struct Engine {
    config: EngineConfig,
    window_current: HashMap<String, IpWindow>,
    window_history: WindowHistoryCache,
    ready_ips: ReadyIpCache,
    window_id: u32,
    /// Clock used to drive history TTL: the latest observed packet timestamp, not
    /// wall-clock time, so the engine's behaviour is fully determined by its input
    /// stream.
    last_time_ns: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let history_size = config.effective_history_size();
        let history_timeout_ns = config.effective_history_timeout_ns();
        let ready_capacity = (history_size / config.history_min.max(1) as u64).max(1) as usize;
        Engine {
            window_history: WindowHistoryCache::new(history_size, history_timeout_ns),
            ready_ips: ReadyIpCache::new(ready_capacity),
            window_current: HashMap::new(),
            window_id: 0,
            last_time_ns: 0,
            config,
        }
    }

    /// Folds one packet observation into its source IP's currently-open window.
    pub fn log(&mut self, pf: &crate::types::PacketFeatures) {
        if pf.time > self.last_time_ns {
            self.last_time_ns = pf.time;
        }
        match self.window_current.get_mut(&pf.src_ip) {
            Some(window) => window.log(pf),
            None => {
                let window = IpWindow::new(pf, self.config.samples_size);
                self.window_current.insert(pf.src_ip.clone(), window);
            }
        }
    }

    /// Closes every currently-open window, finalising and filing IPs that cleared
    /// `packets_min`; IPs below threshold are dropped silently.
    pub fn end_window(&mut self) {
        let closed_window_id = self.window_id;
        self.window_id = self.window_id.wrapping_add(1);

        let packets_min = self.config.packets_min as u64;
        let history_min = self.config.history_min as usize;
        let history_timeout_ns = self.config.effective_history_timeout_ns();
        let now_ns = self.last_time_ns;

        let current = std::mem::take(&mut self.window_current);
        for (ip, window) in current {
            if window.pkts_total() < packets_min {
                log::debug!("dropping sub-threshold window for {ip}: {} pkts", window.pkts_total());
                continue;
            }
            let entry = window.finalize(closed_window_id);

            let history_len;
            let boundary_fresh;
            {
                let history = self.window_history.push(&ip, entry, now_ns);
                history_len = history.len();
                boundary_fresh = if history_len >= history_min {
                    let boundary = history[history_len - history_min];
                    entry.tstamp_end.saturating_sub(boundary.tstamp_start) < history_timeout_ns
                } else {
                    false
                };
            }

            if history_len >= history_min {
                if boundary_fresh {
                    self.ready_ips.mark_ready(&ip);
                } else {
                    self.window_history.truncate_to_last(&ip, history_min);
                }
            }
        }

        log::debug!(
            "end_window {closed_window_id}: {} IPs ready",
            self.ready_ips.len()
        );
    }

    /// Snapshot of IPs with at least `history_min` fresh windows recorded.
    pub fn find_candidates(&self) -> Vec<String> {
        self.ready_ips.keys()
    }

    /// Synthesises a feature record for `ip`'s recorded history, consuming it (by
    /// default) in the process.
    pub fn retrieve_statistics(
        &mut self,
        ip: &str,
        opts: RetrieveOptions,
    ) -> Option<RetrieveOutcome> {
        let cache_now_ns = self.last_time_ns;
        self.window_history.get(ip, cache_now_ns)?;

        let hist: Vec<WindowHistoryEntry> = if opts.delete_after {
            self.window_history.remove(ip)?.into_iter().collect()
        } else {
            self.window_history
                .get(ip, cache_now_ns)?
                .iter()
                .copied()
                .collect()
        };
        self.ready_ips.remove(ip);

        if hist.is_empty() {
            return None;
        }

        let history_min = self.config.history_min as usize;
        let history_timeout_ns = self.config.effective_history_timeout_ns();

        let logs_to_keep = if let Some(now_ns) = opts.current_time.filter(|_| history_timeout_ns != 0) {
            let mut count = 0usize;
            for entry in hist.iter().rev() {
                if now_ns.saturating_sub(entry.tstamp_start) < history_timeout_ns {
                    count += 1;
                } else {
                    break;
                }
            }
            count
        } else if let Some(cnt) = opts.window_cnt {
            cnt
        } else {
            hist.len()
        };
        let logs_to_keep = logs_to_keep.max(history_min).min(hist.len());
        let start = hist.len() - logs_to_keep;
        let stats = &hist[start..];

        if opts.dump_windows {
            return Some(RetrieveOutcome::Windows(stats.to_vec()));
        }

        Some(RetrieveOutcome::Summary(synthesize(
            ip,
            stats,
            self.config.window_length_ns(),
            opts.compute_interwindow_stats,
        )))
    }

    /// Resets all engine state, preserving configuration.
    pub fn clear(&mut self) {
        self.window_current.clear();
        self.window_history.clear();
        self.ready_ips.clear();
        self.window_id = 0;
        self.last_time_ns = 0;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// `(last - first + 1) mod 2^32`, so that `last == first` yields a span of 1 and
/// the window-ID counter's wraparound is handled transparently.
fn circular_distance(first: u32, last: u32) -> u32 {
    last.wrapping_sub(first).wrapping_add(1)
}

fn mean(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let mut sum = 0.0;
    let mut n = 0u64;
    for v in values {
        sum += v;
        n += 1;
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn population_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    var.sqrt()
}

fn synthesize(
    ip: &str,
    stats: &[WindowHistoryEntry],
    window_length_ns: u64,
    compute_interwindow_stats: bool,
) -> FeatureRecord {
    let n = stats.len();
    let first = stats.first().expect("stats is non-empty");
    let last = stats.last().expect("stats is non-empty");

    let window_span = circular_distance(first.window_id, last.window_id);

    let pkts_total = mean(stats.iter().map(|w| w.pkts_total as f64)).round() as u64;
    let bytes_total = mean(stats.iter().map(|w| w.bytes_total as f64)).round() as u64;
    let pkt_arrivals_avg = mean(stats.iter().map(|w| w.pkt_arrivals_avg));
    let pkt_arrivals_std = mean(stats.iter().map(|w| w.pkt_arrivals_std));
    let pkt_size_avg = mean(stats.iter().map(|w| w.pkt_size_avg as f64)) as f32;
    let pkt_size_std = mean(stats.iter().map(|w| w.pkt_size_std as f64)) as f32;
    let port_src_unique = mean(stats.iter().map(|w| w.port_src_unique as f64)) as f32;
    let port_src_entropy = mean(stats.iter().map(|w| w.port_src_entropy as f64)) as f32;
    let conn_pkts_avg = mean(stats.iter().map(|w| w.conn_pkts_avg as f64)) as f32;
    let hdrs_payload_ratio_avg =
        mean(stats.iter().map(|w| w.hdrs_payload_ratio_avg as f64)) as f32;

    let proto_tcp_share = mean(stats.iter().map(|w| w.tcp_share() as f64)) as f32;
    let proto_udp_share = mean(stats.iter().map(|w| w.udp_share() as f64)) as f32;
    let proto_icmp_share = mean(stats.iter().map(|w| w.icmp_share() as f64)) as f32;
    let pkts_frag_share = mean(stats.iter().map(|w| w.frag_share() as f64)) as f32;

    let pkt_size_min = stats.iter().map(|w| w.pkt_size_min).min().unwrap_or(0);
    let pkt_size_max = stats.iter().map(|w| w.pkt_size_max).max().unwrap_or(0);

    let span_secs = (last.tstamp_end.saturating_sub(first.tstamp_start)) as f64 / 1e9;
    let total_pkts: u64 = stats.iter().map(|w| w.pkts_total).sum();
    let total_bytes: u64 = stats.iter().map(|w| w.bytes_total).sum();
    let pkt_rate = if span_secs > 0.0 {
        (total_pkts as f64 / span_secs) as f32
    } else {
        0.0
    };
    let byte_rate = if span_secs > 0.0 {
        (total_bytes as f64 / span_secs) as f32
    } else {
        0.0
    };

    let (
        pkts_total_std,
        bytes_total_std,
        pkt_size_avg_std,
        pkt_size_std_std,
        pkt_arrivals_avg_std,
        port_src_unique_std,
        port_src_entropy_std,
        conn_pkts_avg_std,
        pkts_frag_share_std,
        hdrs_payload_ratio_avg_std,
        dominant_proto_ratio_std,
        intrawindow_activity_ratio,
        interwindow_activity_ratio,
    ) = if compute_interwindow_stats {
        let sum_tcp: u64 = stats.iter().map(|w| w.tcp_pkt_count).sum();
        let sum_udp: u64 = stats.iter().map(|w| w.udp_pkt_count).sum();
        let sum_icmp: u64 = stats.iter().map(|w| w.icmp_pkt_count).sum();
        let dominant_shares: Vec<f64> = if sum_tcp >= sum_udp && sum_tcp >= sum_icmp {
            stats.iter().map(|w| w.tcp_share() as f64).collect()
        } else if sum_udp >= sum_icmp {
            stats.iter().map(|w| w.udp_share() as f64).collect()
        } else {
            stats.iter().map(|w| w.icmp_share() as f64).collect()
        };

        let intrawindow_activity_ratio = (stats
            .iter()
            .map(|w| w.tstamp_end.saturating_sub(w.tstamp_start) as f64)
            .sum::<f64>()
            / (n as f64 * window_length_ns as f64)) as f32;
        let interwindow_activity_ratio = n as f32 / window_span as f32;

        (
            population_std_dev(&stats.iter().map(|w| w.pkts_total as f64).collect::<Vec<_>>())
                as f32,
            population_std_dev(&stats.iter().map(|w| w.bytes_total as f64).collect::<Vec<_>>())
                as f32,
            population_std_dev(
                &stats.iter().map(|w| w.pkt_size_avg as f64).collect::<Vec<_>>(),
            ) as f32,
            population_std_dev(
                &stats.iter().map(|w| w.pkt_size_std as f64).collect::<Vec<_>>(),
            ) as f32,
            population_std_dev(
                &stats.iter().map(|w| w.pkt_arrivals_avg).collect::<Vec<_>>(),
            ) as f32,
            population_std_dev(
                &stats
                    .iter()
                    .map(|w| w.port_src_unique as f64)
                    .collect::<Vec<_>>(),
            ) as f32,
            population_std_dev(
                &stats
                    .iter()
                    .map(|w| w.port_src_entropy as f64)
                    .collect::<Vec<_>>(),
            ) as f32,
            population_std_dev(
                &stats.iter().map(|w| w.conn_pkts_avg as f64).collect::<Vec<_>>(),
            ) as f32,
            population_std_dev(
                &stats.iter().map(|w| w.frag_share() as f64).collect::<Vec<_>>(),
            ) as f32,
            population_std_dev(
                &stats
                    .iter()
                    .map(|w| w.hdrs_payload_ratio_avg as f64)
                    .collect::<Vec<_>>(),
            ) as f32,
            population_std_dev(&dominant_shares) as f32,
            intrawindow_activity_ratio,
            interwindow_activity_ratio,
        )
    } else {
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    };

    FeatureRecord {
        src_ip: ip.to_string(),
        window_count: n as u32,
        window_span,
        pkts_total,
        bytes_total,
        pkt_rate,
        byte_rate,
        pkt_arrivals_avg,
        pkt_arrivals_std,
        pkt_size_min,
        pkt_size_max,
        pkt_size_avg,
        pkt_size_std,
        proto_tcp_share,
        proto_udp_share,
        proto_icmp_share,
        port_src_unique,
        port_src_entropy,
        conn_pkts_avg,
        pkts_frag_share,
        hdrs_payload_ratio_avg,
        pkts_total_std,
        bytes_total_std,
        pkt_size_avg_std,
        pkt_size_std_std,
        pkt_arrivals_avg_std,
        port_src_unique_std,
        port_src_entropy_std,
        conn_pkts_avg_std,
        pkts_frag_share_std,
        hdrs_payload_ratio_avg_std,
        dominant_proto_ratio_std,
        intrawindow_activity_ratio,
        interwindow_activity_ratio,
    }
}
