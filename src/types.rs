//! Core data types shared across the engine: the packet-level input record, the
//! finalised per-window history record, and the output feature record.

use serde::Serialize;

/// Layer-4 protocol of an observed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Proto {
    Tcp,
    Udp,
    Icmp,
    Sctp,
    Other(u8),
}

impl Proto {
    pub fn from_ip_proto_number(n: u8) -> Self {
        match n {
            6 => Proto::Tcp,
            17 => Proto::Udp,
            1 | 58 => Proto::Icmp, // 58 = ICMPv6
            132 => Proto::Sctp,
            other => Proto::Other(other),
        }
    }
}

/// One immutable packet observation, as produced by an upstream decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketFeatures {
    /// Monotonic non-decreasing timestamp, nanoseconds.
    pub time: u64,
    pub src_ip: String,
    pub dst_ip: String,
    pub proto_l4: Proto,
    /// 0 when the protocol has no notion of ports.
    pub src_port: u16,
    pub dst_port: u16,
    pub len_headers: u32,
    pub len_payload: u32,
    pub fragmented: bool,
}

impl PacketFeatures {
    /// `len_headers + len_payload`, guaranteed `>= 1` by the caller.
    pub fn pkt_size(&self) -> u32 {
        self.len_headers + self.len_payload
    }
}

/// A finalised `IPWindow`, as stored in per-IP history.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowHistoryEntry {
    pub window_id: u32,
    pub tstamp_start: u64,
    pub tstamp_end: u64,
    pub pkts_total: u64,
    pub bytes_total: u64,
    pub tcp_pkt_count: u64,
    pub udp_pkt_count: u64,
    pub icmp_pkt_count: u64,
    pub pkts_frag_count: u64,
    pub pkt_arrivals_avg: f64,
    pub pkt_arrivals_std: f64,
    pub pkt_size_min: u32,
    pub pkt_size_max: u32,
    pub pkt_size_avg: f32,
    pub pkt_size_std: f32,
    pub port_src_unique: f32,
    pub port_src_entropy: f32,
    pub conn_pkts_avg: f32,
    pub hdrs_payload_ratio_avg: f32,
}

impl WindowHistoryEntry {
    pub fn tcp_share(&self) -> f32 {
        ratio(self.tcp_pkt_count, self.pkts_total)
    }

    pub fn udp_share(&self) -> f32 {
        ratio(self.udp_pkt_count, self.pkts_total)
    }

    pub fn icmp_share(&self) -> f32 {
        ratio(self.icmp_pkt_count, self.pkts_total)
    }

    pub fn frag_share(&self) -> f32 {
        ratio(self.pkts_frag_count, self.pkts_total)
    }
}

fn ratio(count: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        count as f32 / total as f32
    }
}

/// The single-row output of `retrieve_statistics`, matching the CSV header order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub src_ip: String,
    pub window_count: u32,
    pub window_span: u32,
    pub pkts_total: u64,
    pub bytes_total: u64,
    pub pkt_rate: f32,
    pub byte_rate: f32,
    pub pkt_arrivals_avg: f64,
    pub pkt_arrivals_std: f64,
    pub pkt_size_min: u32,
    pub pkt_size_max: u32,
    pub pkt_size_avg: f32,
    pub pkt_size_std: f32,
    pub proto_tcp_share: f32,
    pub proto_udp_share: f32,
    pub proto_icmp_share: f32,
    pub port_src_unique: f32,
    pub port_src_entropy: f32,
    pub conn_pkts_avg: f32,
    pub pkts_frag_share: f32,
    pub hdrs_payload_ratio_avg: f32,
    pub pkts_total_std: f32,
    pub bytes_total_std: f32,
    pub pkt_size_avg_std: f32,
    pub pkt_size_std_std: f32,
    pub pkt_arrivals_avg_std: f32,
    pub port_src_unique_std: f32,
    pub port_src_entropy_std: f32,
    pub conn_pkts_avg_std: f32,
    pub pkts_frag_share_std: f32,
    pub hdrs_payload_ratio_avg_std: f32,
    pub dominant_proto_ratio_std: f32,
    pub intrawindow_activity_ratio: f32,
    pub interwindow_activity_ratio: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proto_from_ip_proto_number() {
        assert_eq!(Proto::from_ip_proto_number(6), Proto::Tcp);
        assert_eq!(Proto::from_ip_proto_number(17), Proto::Udp);
        assert_eq!(Proto::from_ip_proto_number(1), Proto::Icmp);
        assert_eq!(Proto::from_ip_proto_number(58), Proto::Icmp);
        assert_eq!(Proto::from_ip_proto_number(132), Proto::Sctp);
        assert_eq!(Proto::from_ip_proto_number(47), Proto::Other(47));
    }

    #[test]
    fn pkt_size_sums_headers_and_payload() {
        let pf = PacketFeatures {
            time: 0,
            src_ip: "10.0.0.1".into(),
            dst_ip: "10.0.0.2".into(),
            proto_l4: Proto::Tcp,
            src_port: 1234,
            dst_port: 80,
            len_headers: 60,
            len_payload: 40,
            fragmented: false,
        };
        assert_eq!(pf.pkt_size(), 100);
    }

    #[test]
    fn shares_are_zero_with_no_packets() {
        let entry = WindowHistoryEntry::default();
        assert_eq!(entry.tcp_share(), 0.0);
        assert_eq!(entry.frag_share(), 0.0);
    }
}
