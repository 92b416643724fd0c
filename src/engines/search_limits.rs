//! Search inputs: per-move limits and engine-wide configuration.
//!
//! The UCI layer fills [`SearchLimits`] straight from a `go` command and the
//! engine resolves the final budget in `time_management`.

use crate::search::aspiration::DEFAULT_ASPIRATION_WINDOW;
use crate::search::quiescence::MAX_QUIESCENCE_PLY;

pub const DEFAULT_TT_SIZE_MB: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: Option<u64>,
    pub binc_ms: Option<u64>,
    pub movestogo: Option<u16>,
    pub nodes: Option<u64>,
    /// Look for a mate in this many moves.
    pub mate: Option<u32>,
    /// Search until stopped from outside.
    pub infinite: bool,
}

impl SearchLimits {
    pub fn fixed_depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    pub fn fixed_time(movetime_ms: u64) -> Self {
        Self {
            movetime_ms: Some(movetime_ms),
            ..Self::default()
        }
    }

    pub fn infinite() -> Self {
        Self {
            infinite: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub tt_size_mb: usize,
    /// Total search threads, the calling thread included.
    pub threads: usize,
    pub aspiration_window: i32,
    pub max_quiescence_ply: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tt_size_mb: DEFAULT_TT_SIZE_MB,
            threads: std::thread::available_parallelism().map_or(1, |n| n.get()),
            aspiration_window: DEFAULT_ASPIRATION_WINDOW,
            max_quiescence_ply: MAX_QUIESCENCE_PLY,
        }
    }
}

impl EngineConfig {
    pub fn single_threaded() -> Self {
        Self {
            threads: 1,
            ..Self::default()
        }
    }

    #[inline]
    pub fn normalized_threads(&self) -> usize {
        self.threads.max(1)
    }

    #[inline]
    pub fn helper_threads(&self) -> usize {
        self.normalized_threads() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_thread_normalization() {
        let config = EngineConfig::default();
        assert_eq!(config.tt_size_mb, 64);
        assert_eq!(config.aspiration_window, 50);
        assert_eq!(config.max_quiescence_ply, 32);
        assert!(config.threads >= 1);

        let zero = EngineConfig {
            threads: 0,
            ..EngineConfig::default()
        };
        assert_eq!(zero.normalized_threads(), 1);
        assert_eq!(zero.helper_threads(), 0);
        assert_eq!(EngineConfig::single_threaded().helper_threads(), 0);
    }

    #[test]
    fn limit_constructors_set_one_field() {
        assert_eq!(SearchLimits::fixed_depth(5).depth, Some(5));
        assert_eq!(SearchLimits::fixed_time(250).movetime_ms, Some(250));
        assert!(SearchLimits::infinite().infinite);
        assert_eq!(SearchLimits::default().nodes, None);
    }
}
