//! Bounded caches backing window history and the "ready" IP set.
//!
//! Grounded in `stanford-esrg-retina`'s `core/src/conntrack/{mod,timerwheel}.rs`: a
//! `hashlink::LinkedHashMap` keyed table plus lazy, read-time expiry, rather than a
//! background sweeper thread.

pub mod history;
pub mod ready;

pub use history::WindowHistoryCache;
pub use ready::ReadyIpCache;
