//! Aspiration windows around the previous iteration's score.
//!
//! A fail widens only the failing side, doubling its margin each time. After
//! [`MAX_WIDENINGS`] fails the window opens fully, and a full window cannot
//! fail, so at most `MAX_WIDENINGS + 1` re-searches follow the first try.

use crate::game_state::board::Board;
use crate::search::negamax::{negamax, NodeResult, SCORE_INFINITY};
use crate::search::search_context::SearchContext;

pub const DEFAULT_ASPIRATION_WINDOW: i32 = 50;
pub const MAX_WIDENINGS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStep {
    /// The score is inside the window (or the window is already full).
    Accept,
    /// Re-search with the widened bounds.
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspirationWindow {
    pub alpha: i32,
    pub beta: i32,
    low_margin: i32,
    high_margin: i32,
    widenings: u32,
}

impl AspirationWindow {
    pub fn full() -> Self {
        Self {
            alpha: -SCORE_INFINITY,
            beta: SCORE_INFINITY,
            low_margin: SCORE_INFINITY,
            high_margin: SCORE_INFINITY,
            widenings: MAX_WIDENINGS,
        }
    }

    pub fn around(center: i32, margin: i32) -> Self {
        let margin = margin.max(1);
        Self {
            alpha: (center - margin).max(-SCORE_INFINITY),
            beta: (center + margin).min(SCORE_INFINITY),
            low_margin: margin,
            high_margin: margin,
            widenings: 0,
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.alpha <= -SCORE_INFINITY && self.beta >= SCORE_INFINITY
    }

    #[inline]
    pub fn widenings(&self) -> u32 {
        self.widenings
    }

    /// Classify `score` and, on a fail, move the failing bound outward.
    pub fn update(&mut self, score: i32) -> WindowStep {
        let failed_low = score <= self.alpha && self.alpha > -SCORE_INFINITY;
        let failed_high = score >= self.beta && self.beta < SCORE_INFINITY;
        if !failed_low && !failed_high {
            return WindowStep::Accept;
        }

        if self.widenings >= MAX_WIDENINGS {
            *self = Self::full();
            return WindowStep::Retry;
        }
        self.widenings += 1;

        if failed_low {
            self.low_margin = self.low_margin.saturating_mul(2);
            self.alpha = score.saturating_sub(self.low_margin).max(-SCORE_INFINITY);
        } else {
            self.high_margin = self.high_margin.saturating_mul(2);
            self.beta = score.saturating_add(self.high_margin).min(SCORE_INFINITY);
        }
        WindowStep::Retry
    }
}

/// Root search for one iteration, full width at depth 1.
pub fn search_with_aspiration(
    board: &mut Board,
    ctx: &mut SearchContext,
    depth: i32,
    previous_score: i32,
    margin: i32,
) -> NodeResult {
    let mut window = if depth <= 1 {
        AspirationWindow::full()
    } else {
        AspirationWindow::around(previous_score, margin)
    };

    loop {
        let result = negamax(board, ctx, depth, window.alpha, window.beta, 0);
        if ctx.stopped() {
            return result;
        }
        match window.update(result.score) {
            WindowStep::Accept => return result,
            WindowStep::Retry => {
                log::trace!(
                    "aspiration re-search depth={} score={} window=({}, {})",
                    depth,
                    result.score,
                    window.alpha,
                    window.beta
                );
            }
        }
    }
}
