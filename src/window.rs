//! Per-IP window aggregator.
//!
//! `IpWindow` is the live, mutable state accumulated for one source IP during the
//! engine's currently-open window. It owns every streaming primitive and sketch
//! needed to finalise a [`crate::types::WindowHistoryEntry`] at `end_window()`.

use crate::hll::HyperLogLog;
use crate::streaming::average::RunningAverage;
use crate::streaming::entropy;
use crate::streaming::sampling::ReservoirSampler;
use crate::streaming::variance::WelfordAccumulator;
use crate::types::{PacketFeatures, WindowHistoryEntry};

#[derive(Debug)]
pub struct IpWindow {
    pkts_total: u64,
    bytes_total: u64,
    tcp_pkt_count: u64,
    udp_pkt_count: u64,
    icmp_pkt_count: u64,
    pkts_frag_count: u64,

    tstamp_start: u64,
    tstamp_end: u64,
    last_pkt_arrival: u64,
    pkt_arrivals_avg: RunningAverage,
    pkt_arrivals_std_aux: WelfordAccumulator,

    pkt_size_min: u32,
    pkt_size_max: u32,
    pkt_size_avg: RunningAverage,
    pkt_size_std_aux: WelfordAccumulator,

    hdrs_payload_ratio_avg: RunningAverage,

    src_port_samples: ReservoirSampler<u16>,
    src_ports_hll: HyperLogLog,
    connections_hll: HyperLogLog,
}

impl IpWindow {
    /// Creates a window from its first observed packet. Per the aggregator's
    /// initialisation rule, the arrival-delay mean is left untouched (there is no
    /// prior packet to measure a delay against).
    pub fn new(pf: &PacketFeatures, samples_size: usize) -> Self {
        let pkt_size = pf.pkt_size();
        let mut pkt_size_avg = RunningAverage::new();
        pkt_size_avg.update(pkt_size as f64);
        let mut hdrs_payload_ratio_avg = RunningAverage::new();
        hdrs_payload_ratio_avg.update(pf.len_headers as f64 / pkt_size as f64);

        let mut src_port_samples = ReservoirSampler::new(samples_size);
        src_port_samples.sample(pf.src_port);

        let mut window = IpWindow {
            pkts_total: 1,
            bytes_total: pkt_size as u64,
            tcp_pkt_count: 0,
            udp_pkt_count: 0,
            icmp_pkt_count: 0,
            pkts_frag_count: 0,
            tstamp_start: pf.time,
            tstamp_end: pf.time,
            last_pkt_arrival: pf.time,
            pkt_arrivals_avg: RunningAverage::new(),
            pkt_arrivals_std_aux: WelfordAccumulator::new(),
            pkt_size_min: pkt_size,
            pkt_size_max: pkt_size,
            pkt_size_avg,
            pkt_size_std_aux: WelfordAccumulator::new(),
            hdrs_payload_ratio_avg,
            src_port_samples,
            src_ports_hll: HyperLogLog::new(),
            connections_hll: HyperLogLog::new(),
        };
        window.log_common_tail(pf);
        window
    }

    /// Folds a subsequent packet (not the window's first) into the aggregator.
    pub fn log(&mut self, pf: &PacketFeatures) {
        let pkt_size = pf.pkt_size();
        let delay = pf.time.saturating_sub(self.last_pkt_arrival) as f64;

        self.src_port_samples.sample(pf.src_port);

        self.pkts_total += 1;
        self.bytes_total += pkt_size as u64;
        if pf.time > self.tstamp_end {
            self.tstamp_end = pf.time;
        }

        let prev_arrivals_mean = self.pkt_arrivals_avg.get();
        let new_arrivals_mean = self.pkt_arrivals_avg.update(delay);
        self.pkt_arrivals_std_aux
            .update(delay, prev_arrivals_mean, new_arrivals_mean);

        let prev_size_mean = self.pkt_size_avg.get();
        let new_size_mean = self.pkt_size_avg.update(pkt_size as f64);
        self.pkt_size_std_aux
            .update(pkt_size as f64, prev_size_mean, new_size_mean);

        self.hdrs_payload_ratio_avg
            .update(pf.len_headers as f64 / pkt_size as f64);

        if pkt_size < self.pkt_size_min {
            self.pkt_size_min = pkt_size;
        }
        if pkt_size > self.pkt_size_max {
            self.pkt_size_max = pkt_size;
        }

        self.log_common_tail(pf);
    }

    fn log_common_tail(&mut self, pf: &PacketFeatures) {
        use crate::types::Proto;
        self.last_pkt_arrival = pf.time;
        match pf.proto_l4 {
            Proto::Tcp => self.tcp_pkt_count += 1,
            Proto::Udp => self.udp_pkt_count += 1,
            Proto::Icmp => self.icmp_pkt_count += 1,
            _ => {}
        }
        if pf.fragmented {
            self.pkts_frag_count += 1;
        }
        self.src_ports_hll.add(&pf.src_port.to_string());
        self.connections_hll
            .add(&format!("{}{}{}", pf.src_port, pf.dst_ip, pf.dst_port));
    }

    pub fn pkts_total(&self) -> u64 {
        self.pkts_total
    }

    /// Finalises this window into a history entry, stamping `window_id`.
    pub fn finalize(&self, window_id: u32) -> WindowHistoryEntry {
        let pkt_arrivals_std = if self.pkts_total > 1 {
            self.pkt_arrivals_std_aux.variance().sqrt()
        } else {
            0.0
        };
        let pkt_size_std = if self.pkts_total > 1 {
            self.pkt_size_std_aux.variance().sqrt() as f32
        } else {
            0.0
        };

        let port_src_unique = self.src_ports_hll.cardinality() as f32;
        let samples = self.src_port_samples.samples();
        let used = &samples[..samples.len().min(self.pkts_total as usize)];
        let port_src_entropy = entropy::shannon_norm(used) as f32;

        let connections = self.connections_hll.cardinality().max(1);
        let conn_pkts_avg = self.pkts_total as f32 / connections as f32;

        WindowHistoryEntry {
            window_id,
            tstamp_start: self.tstamp_start,
            tstamp_end: self.tstamp_end,
            pkts_total: self.pkts_total,
            bytes_total: self.bytes_total,
            tcp_pkt_count: self.tcp_pkt_count,
            udp_pkt_count: self.udp_pkt_count,
            icmp_pkt_count: self.icmp_pkt_count,
            pkts_frag_count: self.pkts_frag_count,
            pkt_arrivals_avg: self.pkt_arrivals_avg.get(),
            pkt_arrivals_std,
            pkt_size_min: self.pkt_size_min,
            pkt_size_max: self.pkt_size_max,
            pkt_size_avg: self.pkt_size_avg.get() as f32,
            pkt_size_std,
            port_src_unique,
            port_src_entropy,
            conn_pkts_avg,
            hdrs_payload_ratio_avg: self.hdrs_payload_ratio_avg.get() as f32,
        }
    }
}
