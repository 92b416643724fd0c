//! Per-move time and depth budgeting.
//!
//! Explicit `movetime` wins. Otherwise the mover's clock is split as
//! `remaining / movestogo + increment` (40 moves when unknown), never more
//! than half of what is left. Depth, node, mate and infinite searches run
//! without a deadline; with no limits at all a default budget applies.

use crate::engines::search_limits::SearchLimits;
use crate::game_state::chess_types::Color;
use crate::search::iterative_deepening::INFINITE_DEPTH;

pub const DEFAULT_MOVE_TIME_MS: u64 = 1000;
const DEFAULT_MOVES_TO_GO: u64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeControlDecision {
    /// `None` means no wall-clock deadline.
    pub time_ms: Option<u64>,
    pub max_depth: i32,
}

pub fn decide_time_control(limits: &SearchLimits, side_to_move: Color) -> TimeControlDecision {
    TimeControlDecision {
        time_ms: time_budget_ms(limits, side_to_move),
        max_depth: depth_budget(limits),
    }
}

fn depth_budget(limits: &SearchLimits) -> i32 {
    let requested = limits
        .depth
        .map(|d| d.clamp(1, INFINITE_DEPTH as u32) as i32);
    let mate = limits
        .mate
        .map(|m| (2 * m.max(1)).min(INFINITE_DEPTH as u32) as i32);
    match (requested, mate) {
        (Some(d), Some(m)) => d.min(m),
        (Some(d), None) => d,
        (None, Some(m)) => m,
        (None, None) => INFINITE_DEPTH,
    }
}

fn time_budget_ms(limits: &SearchLimits, side_to_move: Color) -> Option<u64> {
    if limits.infinite {
        return None;
    }
    if let Some(movetime) = limits.movetime_ms {
        return Some(movetime);
    }

    let (remaining, increment) = match side_to_move {
        Color::Light => (limits.wtime_ms, limits.winc_ms),
        Color::Dark => (limits.btime_ms, limits.binc_ms),
    };
    if let Some(remaining) = remaining {
        let moves_to_go = limits
            .movestogo
            .map_or(DEFAULT_MOVES_TO_GO, |m| u64::from(m.max(1)));
        let budget = remaining / moves_to_go + increment.unwrap_or(0);
        return Some(budget.min(remaining / 2).max(1));
    }

    if limits.depth.is_some() || limits.nodes.is_some() || limits.mate.is_some() {
        None
    } else {
        Some(DEFAULT_MOVE_TIME_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movetime_is_used_verbatim() {
        let decision = decide_time_control(&SearchLimits::fixed_time(750), Color::Light);
        assert_eq!(decision.time_ms, Some(750));
        assert_eq!(decision.max_depth, INFINITE_DEPTH);
    }

    #[test]
    fn clock_split_uses_the_side_to_move() {
        let limits = SearchLimits {
            wtime_ms: Some(60_000),
            btime_ms: Some(20_000),
            winc_ms: Some(1_000),
            binc_ms: Some(0),
            ..SearchLimits::default()
        };
        assert_eq!(decide_time_control(&limits, Color::Light).time_ms, Some(2_500));
        assert_eq!(decide_time_control(&limits, Color::Dark).time_ms, Some(500));
    }

    #[test]
    fn clock_budget_is_capped_at_half_the_remaining_time() {
        let limits = SearchLimits {
            wtime_ms: Some(1_000),
            winc_ms: Some(5_000),
            ..SearchLimits::default()
        };
        assert_eq!(decide_time_control(&limits, Color::Light).time_ms, Some(500));
    }

    #[test]
    fn movestogo_replaces_the_default_horizon() {
        let limits = SearchLimits {
            btime_ms: Some(10_000),
            movestogo: Some(5),
            ..SearchLimits::default()
        };
        assert_eq!(decide_time_control(&limits, Color::Dark).time_ms, Some(2_000));
    }

    #[test]
    fn depth_nodes_mate_and_infinite_have_no_deadline() {
        let depth = decide_time_control(&SearchLimits::fixed_depth(7), Color::Light);
        assert_eq!(depth, TimeControlDecision { time_ms: None, max_depth: 7 });

        let nodes = SearchLimits {
            nodes: Some(10_000),
            ..SearchLimits::default()
        };
        assert_eq!(decide_time_control(&nodes, Color::Light).time_ms, None);

        let mate = SearchLimits {
            mate: Some(3),
            ..SearchLimits::default()
        };
        assert_eq!(
            decide_time_control(&mate, Color::Light),
            TimeControlDecision { time_ms: None, max_depth: 6 }
        );

        let infinite = decide_time_control(&SearchLimits::infinite(), Color::Dark);
        assert_eq!(infinite.time_ms, None);
        assert_eq!(infinite.max_depth, INFINITE_DEPTH);
    }

    #[test]
    fn no_limits_falls_back_to_the_default_budget() {
        let decision = decide_time_control(&SearchLimits::default(), Color::Light);
        assert_eq!(decision.time_ms, Some(DEFAULT_MOVE_TIME_MS));
    }
}
