//! Packet-time windowing driver.
//!
//! The engine itself has no notion of "when a window elapses" — it only reacts to
//! explicit `log`/`end_window` calls. `WindowDriver` supplies the gap-detecting
//! windowing policy, grounded in `original_source`'s `dataset_creator/packet_handler.py`
//! (`PacketHandler.process` / `end_logger_window`): the window boundary advances by
//! whole multiples of `window_length` based on packet timestamps, not wall-clock time.

use crate::config::EngineConfig;
use crate::engine::{Engine, RetrieveOptions, RetrieveOutcome};
use crate::types::{FeatureRecord, PacketFeatures};

/// Drives an [`Engine`] off a stream of packet timestamps, detecting window
/// boundaries (including multi-interval gaps) and harvesting ready IPs as soon as
/// each window closes.
pub struct WindowDriver {
    engine: Engine,
    last_window_start: u64,
    window_length_ns: u64,
    collected: Vec<FeatureRecord>,
}

impl WindowDriver {
    pub fn new(config: EngineConfig) -> Self {
        let window_length_ns = config.window_length_ns();
        WindowDriver {
            engine: Engine::new(config),
            last_window_start: 0,
            window_length_ns,
            collected: Vec::new(),
        }
    }

    /// Feeds one packet through the windowing policy, closing and harvesting the
    /// current window first if `pf.time` has moved past it.
    pub fn process(&mut self, pf: &PacketFeatures) {
        if self.last_window_start == 0 {
            self.last_window_start = pf.time;
        } else {
            let elapsed = pf.time.saturating_sub(self.last_window_start);
            if elapsed > self.window_length_ns {
                let windows_elapsed = elapsed / self.window_length_ns;
                self.last_window_start += windows_elapsed * self.window_length_ns;
                self.end_logger_window();
            }
        }
        self.engine.log(pf);
    }

    /// Closes whatever window is currently open (e.g. at end of input) and drains
    /// any IPs that become ready as a result. Safe to call repeatedly.
    pub fn finish(&mut self) {
        self.end_logger_window();
    }

    fn end_logger_window(&mut self) {
        self.engine.end_window();
        self.drain_ready();
    }

    fn drain_ready(&mut self) {
        for ip in self.engine.find_candidates() {
            let opts = RetrieveOptions {
                compute_interwindow_stats: true,
                ..Default::default()
            };
            if let Some(RetrieveOutcome::Summary(record)) =
                self.engine.retrieve_statistics(&ip, opts)
            {
                self.collected.push(record);
            }
        }
    }

    /// Feature records harvested so far.
    pub fn collected(&self) -> &[FeatureRecord] {
        &self.collected
    }

    /// Drains and returns the feature records harvested so far.
    pub fn take_collected(&mut self) -> Vec<FeatureRecord> {
        std::mem::take(&mut self.collected)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn clear(&mut self) {
        self.engine.clear();
        self.last_window_start = 0;
        self.collected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Proto;

    fn config() -> EngineConfig {
        let mut c = EngineConfig::new(1.0);
        c.history_min = 1;
        c.packets_min = 1;
        c
    }

    fn pf(src_ip: &str, time: u64, src_port: u16) -> PacketFeatures {
        PacketFeatures {
            time,
            src_ip: src_ip.to_string(),
            dst_ip: "10.0.0.254".to_string(),
            proto_l4: Proto::Tcp,
            src_port,
            dst_port: 80,
            len_headers: 60,
            len_payload: 40,
            fragmented: false,
        }
    }

    #[test]
    fn window_gap_closes_the_first_window_and_starts_a_fresh_one() {
        let mut driver = WindowDriver::new(config());
        driver.process(&pf("10.0.0.3", 0, 1));
        // 5 window-lengths later: must close exactly one window, containing t=0.
        driver.process(&pf("10.0.0.3", 5_000_000_000, 2));
        assert_eq!(driver.collected().len(), 1);
        assert_eq!(driver.collected()[0].pkts_total, 1);
    }

    #[test]
    fn finish_flushes_the_open_window() {
        let mut driver = WindowDriver::new(config());
        driver.process(&pf("10.0.0.1", 0, 1));
        driver.process(&pf("10.0.0.1", 1_000_000, 2));
        assert!(driver.collected().is_empty());
        driver.finish();
        assert_eq!(driver.collected().len(), 1);
    }
}
