//! Time management.
//!
//! Turns a UCI time control into a soft (optimal) and hard (maximum)
//! budget for one move. The search stops starting a new iteration past
//! the soft budget and trips the stop flag mid-search past the hard one.

use std::time::Duration;

/// Clock fields of a `go` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeControl {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u64>,
    pub movetime: Option<u64>,
    pub infinite: bool,
}

/// Soft and hard budgets for the move. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBudget {
    pub optimal: Option<Duration>,
    pub maximum: Option<Duration>,
}

impl TimeBudget {
    pub const UNLIMITED: TimeBudget = TimeBudget {
        optimal: None,
        maximum: None,
    };
}

/// Horizon estimate when `movestogo` is absent: assume more remaining
/// moves the more time is left on the clock.
fn horizon(my_time_ms: u64) -> u64 {
    if my_time_ms >= 300_000 {
        50
    } else if my_time_ms >= 120_000 {
        40
    } else if my_time_ms >= 30_000 {
        30
    } else if my_time_ms >= 10_000 {
        20
    } else {
        15
    }
}

/// Compute the budget for the side to move.
#[must_use]
pub fn compute_budget(tc: &TimeControl, white_to_move: bool, move_overhead_ms: u64) -> TimeBudget {
    if tc.infinite {
        return TimeBudget::UNLIMITED;
    }

    if let Some(movetime) = tc.movetime {
        let ms = movetime.saturating_sub(move_overhead_ms).max(1);
        let d = Duration::from_millis(ms);
        return TimeBudget {
            optimal: Some(d),
            maximum: Some(d),
        };
    }

    let (my_time, my_inc) = if white_to_move {
        (tc.wtime, tc.winc.unwrap_or(0))
    } else {
        (tc.btime, tc.binc.unwrap_or(0))
    };
    let Some(my_time) = my_time else {
        return TimeBudget::UNLIMITED;
    };

    let available = my_time.saturating_sub(move_overhead_ms).max(1);
    let moves_left = tc.movestogo.filter(|&m| m > 0).unwrap_or_else(|| horizon(my_time));

    let base = available / moves_left;
    // The increment is nearly free time, but trust it less on a short clock
    let inc = if my_time < 60_000 { my_inc / 2 } else { my_inc };

    let mut optimal = base + inc;
    if available > 50 {
        optimal = optimal.max(50);
    }
    optimal = optimal.min(available);

    let maximum = if my_time < 5_000 {
        optimal.saturating_mul(2)
    } else {
        (available / 10)
            .min(optimal.saturating_mul(5))
            .min(available / 3)
    };
    let maximum = maximum.max(optimal).min(available);

    TimeBudget {
        optimal: Some(Duration::from_millis(optimal)),
        maximum: Some(Duration::from_millis(maximum)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(wtime: u64, winc: u64) -> TimeControl {
        TimeControl {
            wtime: Some(wtime),
            winc: Some(winc),
            ..Default::default()
        }
    }

    #[test]
    fn test_infinite_has_no_deadlines() {
        let tc = TimeControl {
            infinite: true,
            ..Default::default()
        };
        assert_eq!(compute_budget(&tc, true, 10), TimeBudget::UNLIMITED);
    }

    #[test]
    fn test_no_clock_means_unlimited() {
        let tc = TimeControl::default();
        assert_eq!(compute_budget(&tc, true, 10), TimeBudget::UNLIMITED);
    }

    #[test]
    fn test_movetime_is_used_directly() {
        let tc = TimeControl {
            movetime: Some(500),
            ..Default::default()
        };
        let budget = compute_budget(&tc, true, 10);
        assert_eq!(budget.optimal, Some(Duration::from_millis(490)));
        assert_eq!(budget.maximum, budget.optimal);
    }

    #[test]
    fn test_budget_never_exceeds_remaining_time() {
        for wtime in [50, 200, 1_000, 10_000, 60_000, 300_000] {
            for winc in [0, 100, 2_000] {
                let budget = compute_budget(&clock(wtime, winc), true, 10);
                let maximum = budget.maximum.expect("deadline");
                assert!(
                    maximum <= Duration::from_millis(wtime),
                    "max {maximum:?} exceeds clock {wtime}ms"
                );
                assert!(budget.optimal.expect("soft") <= maximum);
            }
        }
    }

    #[test]
    fn test_movestogo_overrides_horizon() {
        let mut tc = clock(30_000, 0);
        tc.movestogo = Some(5);
        let budget = compute_budget(&tc, true, 0);
        assert_eq!(budget.optimal, Some(Duration::from_millis(6_000)));
    }

    #[test]
    fn test_one_second_scramble_fits_in_the_clock() {
        // One second on the clock, no increment: the whole move must fit
        let budget = compute_budget(&clock(1_000, 0), true, 10);
        let optimal = budget.optimal.expect("soft").as_millis() as u64;
        let maximum = budget.maximum.expect("hard").as_millis() as u64;
        assert!(optimal >= 50);
        assert!(maximum < 1_000);
    }

    #[test]
    fn test_black_uses_black_clock() {
        let tc = TimeControl {
            wtime: Some(100),
            btime: Some(60_000),
            ..Default::default()
        };
        let white = compute_budget(&tc, true, 0);
        let black = compute_budget(&tc, false, 0);
        assert!(black.optimal.expect("soft") > white.optimal.expect("soft"));
    }

    #[test]
    fn test_horizon_tiers_descend() {
        assert!(horizon(400_000) > horizon(150_000));
        assert!(horizon(150_000) > horizon(40_000));
        assert!(horizon(40_000) > horizon(15_000));
        assert!(horizon(15_000) > horizon(2_000));
    }
}
