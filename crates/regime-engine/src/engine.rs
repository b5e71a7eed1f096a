//! Stateful ON/OFF/OFF_OVERRIDE/NEU state machine over a daily series (§4.6).

use std::collections::VecDeque;

use syi_core::{
    PegStatus, RegimeAlert, RegimeAlertLevel, RegimeAlertType, RegimeComponent, RegimeDayInput, RegimeSample,
    RegimeState,
};

use crate::params::RegimeParams;
use crate::stats::{annualized_slope, ema_step, std_dev};

const VOLATILITY_WINDOW: usize = 30;
const SLOPE_WINDOW: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    ToOn,
    ToOff,
}

#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    direction: Direction,
    days_count: u32,
}

/// Runs the §4.6 state machine one evaluation (one calendar day) at a time.
/// Owns all history the computation needs; callers feed it `RegimeDayInput`s
/// in order and keep the returned `RegimeSample`s for the time-series store.
pub struct RegimeEngine {
    params: RegimeParams,
    syi_excess_history: VecDeque<f64>,
    delta_history: VecDeque<f64>,
    ema_short: Option<f64>,
    ema_long: Option<f64>,
    days_seen: u32,
    left_neu: bool,
    underlying_state: RegimeState,
    days_in_state: u32,
    pending: Option<PendingTransition>,
    cooldown_remaining: u32,
    override_active: bool,
    override_clear_days: u32,
}

impl RegimeEngine {
    pub fn new(params: RegimeParams) -> Self {
        Self {
            params,
            syi_excess_history: VecDeque::new(),
            delta_history: VecDeque::new(),
            ema_short: None,
            ema_long: None,
            days_seen: 0,
            left_neu: false,
            underlying_state: RegimeState::Neu,
            days_in_state: 0,
            pending: None,
            cooldown_remaining: 0,
            override_active: false,
            override_clear_days: 0,
        }
    }

    fn breadth_pct(components: &[RegimeComponent], tbill_3m: f64) -> f64 {
        if components.is_empty() {
            return 0.0;
        }
        let above = components.iter().filter(|c| c.ray > tbill_3m).count();
        100.0 * above as f64 / components.len() as f64
    }

    fn peg_breach(&self, peg: &Option<PegStatus>) -> bool {
        match peg {
            Some(p) => p.max_depeg_bps >= self.params.peg_single_bps || p.agg_depeg_bps >= self.params.peg_agg_bps,
            None => false,
        }
    }

    /// Runs one day's evaluation in order. Panics if fed out-of-order
    /// history would be a caller bug, not recovered here — the scheduler
    /// is responsible for feeding dates strictly increasing.
    pub fn evaluate(&mut self, input: &RegimeDayInput) -> RegimeSample {
        let syi_excess = input.syi - input.tbill_3m;

        if let Some(&last) = self.syi_excess_history.back() {
            self.delta_history.push_back(syi_excess - last);
            if self.delta_history.len() > VOLATILITY_WINDOW {
                self.delta_history.pop_front();
            }
        }
        self.syi_excess_history.push_back(syi_excess);
        if self.syi_excess_history.len() > VOLATILITY_WINDOW.max(SLOPE_WINDOW) {
            self.syi_excess_history.pop_front();
        }
        self.days_seen += 1;

        self.ema_short = Some(ema_step(self.ema_short, syi_excess, self.params.ema_short_days));
        self.ema_long = Some(ema_step(self.ema_long, syi_excess, self.params.ema_long_days));
        let ema_short = self.ema_short.unwrap();
        let ema_long = self.ema_long.unwrap();
        let spread = ema_short - ema_long;

        let volatility_30d = std_dev(self.delta_history.make_contiguous());
        let z_score = spread / volatility_30d.max(self.params.volatility_epsilon);

        let slope_window: Vec<f64> = self
            .syi_excess_history
            .iter()
            .rev()
            .take(SLOPE_WINDOW)
            .rev()
            .copied()
            .collect();
        let slope7 = annualized_slope(&slope_window);

        let breadth_pct = Self::breadth_pct(&input.components, input.tbill_3m);

        let mut alert = None;
        let breach = self.peg_breach(&input.peg_status);

        if !self.left_neu && self.days_seen >= self.params.ema_long_days {
            self.left_neu = true;
            self.underlying_state = if z_score >= 0.0 { RegimeState::On } else { RegimeState::Off };
            self.days_in_state = 0;
            self.pending = None;
        } else if self.left_neu {
            if self.cooldown_remaining > 0 {
                self.cooldown_remaining -= 1;
            } else {
                alert = self.evaluate_transition(z_score, breadth_pct);
            }
            self.days_in_state += 1;
        }

        let entering_override = breach && !self.override_active;
        if breach {
            self.override_active = true;
            self.override_clear_days = 0;
        } else if self.override_active {
            self.override_clear_days += 1;
            if self.override_clear_days >= self.params.peg_clear_days() {
                self.override_active = false;
            }
        }

        if entering_override {
            alert = Some(RegimeAlert {
                alert_type: RegimeAlertType::OverridePeg,
                level: RegimeAlertLevel::Critical,
                message: "peg stress threshold breached, forcing OFF_OVERRIDE".to_string(),
                trigger_conditions: vec!["max_depeg_bps or agg_depeg_bps over threshold".to_string()],
            });
        } else if self.override_active {
            // override masks the underlying alert while it is ongoing, already entered.
            alert = None;
        }

        let reported_state = if self.override_active {
            RegimeState::OffOverride
        } else {
            self.underlying_state
        };

        RegimeSample {
            date: input.date,
            syi_excess,
            ema_short,
            ema_long,
            spread,
            volatility_30d,
            z_score,
            slope7,
            breadth_pct,
            state: reported_state,
            days_in_state: self.days_in_state,
            alert,
            methodology_version: self.params.methodology_version.clone(),
            params_version: self.params.params_version.clone(),
        }
    }

    fn evaluate_transition(&mut self, z_score: f64, breadth_pct: f64) -> Option<RegimeAlert> {
        match self.underlying_state {
            RegimeState::On => {
                let proposed = z_score <= -self.params.z_enter && breadth_pct >= self.params.breadth_off_min;
                self.progress_proposal(Direction::ToOff, proposed)
            }
            RegimeState::Off => {
                let proposed = z_score >= self.params.z_enter && breadth_pct <= self.params.breadth_on_max;
                self.progress_proposal(Direction::ToOn, proposed)
            }
            RegimeState::Neu | RegimeState::OffOverride => None,
        }
    }

    fn progress_proposal(&mut self, direction: Direction, proposed: bool) -> Option<RegimeAlert> {
        if proposed {
            let days_count = match self.pending {
                Some(p) if p.direction == direction => p.days_count + 1,
                _ => 1,
            };
            self.pending = Some(PendingTransition { direction, days_count });

            if days_count >= self.params.persist_days {
                self.underlying_state = match direction {
                    Direction::ToOn => RegimeState::On,
                    Direction::ToOff => RegimeState::Off,
                };
                self.days_in_state = 0;
                self.cooldown_remaining = self.params.cooldown_days;
                self.pending = None;
                Some(RegimeAlert {
                    alert_type: RegimeAlertType::FlipConfirmed,
                    level: RegimeAlertLevel::Warning,
                    message: format!("regime flipped to {:?}", self.underlying_state),
                    trigger_conditions: vec!["z-score and breadth condition held for persist_days".to_string()],
                })
            } else {
                Some(RegimeAlert {
                    alert_type: RegimeAlertType::EarlyWarning,
                    level: RegimeAlertLevel::Info,
                    message: "transition proposed, awaiting persistence".to_string(),
                    trigger_conditions: vec!["z-score and breadth condition met today".to_string()],
                })
            }
        } else if self.pending.take().is_some() {
            Some(RegimeAlert {
                alert_type: RegimeAlertType::Invalidation,
                level: RegimeAlertLevel::Info,
                message: "pending transition cancelled before confirmation".to_string(),
                trigger_conditions: vec!["condition no longer held".to_string()],
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(date: NaiveDate, syi: f64, tbill: f64, ray: f64, peg: Option<PegStatus>) -> RegimeDayInput {
        RegimeDayInput {
            date,
            syi,
            tbill_3m: tbill,
            components: vec![RegimeComponent { symbol: "USDC".into(), ray }],
            peg_status: peg,
        }
    }

    #[test]
    fn stays_neu_until_ema_long_days_of_history_exist() {
        let mut engine = RegimeEngine::new(RegimeParams::default());
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        for i in 0..29 {
            let sample = engine.evaluate(&day(start + chrono::Duration::days(i), 0.05, 0.04, 0.05, None));
            assert_eq!(sample.state, RegimeState::Neu);
        }
    }

    #[test]
    fn leaves_neu_on_the_ema_long_days_boundary() {
        let mut engine = RegimeEngine::new(RegimeParams::default());
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut last = None;
        for i in 0..30 {
            last = Some(engine.evaluate(&day(start + chrono::Duration::days(i), 0.05, 0.04, 0.05, None)));
        }
        assert_ne!(last.unwrap().state, RegimeState::Neu);
    }

    #[test]
    fn peg_stress_forces_override_and_bypasses_cooldown() {
        let mut engine = RegimeEngine::new(RegimeParams::default());
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        for i in 0..30 {
            engine.evaluate(&day(start + chrono::Duration::days(i), 0.05, 0.04, 0.05, None));
        }
        let stressed = engine.evaluate(&day(
            start + chrono::Duration::days(30),
            0.05,
            0.04,
            0.05,
            Some(PegStatus {
                max_depeg_bps: 200,
                agg_depeg_bps: 0,
            }),
        ));
        assert_eq!(stressed.state, RegimeState::OffOverride);
        assert!(matches!(
            stressed.alert,
            Some(RegimeAlert {
                alert_type: RegimeAlertType::OverridePeg,
                ..
            })
        ));
    }

    #[test]
    fn determinism_same_sequence_same_output() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let inputs: Vec<RegimeDayInput> = (0..40)
            .map(|i| day(start + chrono::Duration::days(i), 0.05 - i as f64 * 0.001, 0.04, 0.05, None))
            .collect();

        let mut engine_a = RegimeEngine::new(RegimeParams::default());
        let mut engine_b = RegimeEngine::new(RegimeParams::default());
        let results_a: Vec<RegimeState> = inputs.iter().map(|i| engine_a.evaluate(i).state).collect();
        let results_b: Vec<RegimeState> = inputs.iter().map(|i| engine_b.evaluate(i).state).collect();
        assert_eq!(results_a, results_b);
    }
}
