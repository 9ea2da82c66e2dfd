// Value over replacement (VORP).
//
// A player's horizon EV minus the EV of a cheap, playable alternative at
// the same position. The replacement level is read from the budget pool:
// players at or under the position's price cap who meet a minutes floor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Player, PlayerSignals, Position};
use crate::ranking::{rank_order, PlayerFilter};
use crate::signal::{round_to, Signal};

/// Expected points per expected goal involvement.
const POINTS_PER_INVOLVEMENT: f64 = 4.5;

pub const MIN_HORIZON: u32 = 1;
pub const MAX_HORIZON: u32 = 12;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Budget price caps per position, in tenths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceCaps {
    pub goalkeeper: u32,
    pub defender: u32,
    pub midfielder: u32,
    pub forward: u32,
}

impl Default for PriceCaps {
    fn default() -> Self {
        Self {
            goalkeeper: 45,
            defender: 45,
            midfielder: 50,
            forward: 55,
        }
    }
}

impl PriceCaps {
    pub fn cap(&self, position: Position) -> u32 {
        match position {
            Position::Goalkeeper => self.goalkeeper,
            Position::Defender => self.defender,
            Position::Midfielder => self.midfielder,
            Position::Forward => self.forward,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VorpParams {
    /// Gameweeks projected, clamped to [1, 12].
    pub horizon: u32,
    pub price_caps: PriceCaps,
    /// Minutes-risk floor for the replacement pool.
    pub replacement_min_risk: f64,
    /// Fractional rank into the descending replacement pool.
    pub replacement_rank_share: f64,
}

impl Default for VorpParams {
    fn default() -> Self {
        Self {
            horizon: 5,
            price_caps: PriceCaps::default(),
            replacement_min_risk: 0.5,
            replacement_rank_share: 0.2,
        }
    }
}

impl VorpParams {
    pub fn sanitized(mut self) -> Self {
        self.horizon = self.horizon.clamp(MIN_HORIZON, MAX_HORIZON);
        if !self.replacement_min_risk.is_finite() {
            self.replacement_min_risk = 0.5;
        }
        self.replacement_min_risk = self.replacement_min_risk.clamp(0.0, 1.0);
        if !self.replacement_rank_share.is_finite() {
            self.replacement_rank_share = 0.2;
        }
        self.replacement_rank_share = self.replacement_rank_share.clamp(0.0, 1.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Per-player EV
// ---------------------------------------------------------------------------

/// Fixture multiplier: easier runs inflate EV, harder runs deflate it.
/// Unknown FDR is neutral.
pub fn fixture_factor(fdr: Signal<f64>) -> f64 {
    match fdr {
        Signal::Known(fdr) => (1.15 - (fdr - 2.5) * 0.18).clamp(0.70, 1.30),
        Signal::Unknown => 1.0,
    }
}

pub fn ev_per_gameweek(signals: &PlayerSignals) -> f64 {
    signals.xgi.xgi90.or(0.0)
        * POINTS_PER_INVOLVEMENT
        * signals.minutes_risk.clamp(0.0, 1.0)
        * fixture_factor(signals.fdr_attack_next3)
}

pub fn horizon_ev(signals: &PlayerSignals, horizon: u32) -> f64 {
    ev_per_gameweek(signals) * horizon.clamp(MIN_HORIZON, MAX_HORIZON) as f64
}

// ---------------------------------------------------------------------------
// Replacement levels
// ---------------------------------------------------------------------------

/// Replacement horizon EV for every position.
///
/// Per position, the budget pool is sorted by horizon EV descending and the
/// value at `floor(share × n)` is taken. An empty budget pool gives 0.
pub fn determine_replacement_levels(pool: &[Player], params: &VorpParams) -> HashMap<Position, f64> {
    let params = params.clone().sanitized();
    let mut levels = HashMap::with_capacity(Position::ALL.len());

    for pos in Position::ALL {
        let cap = params.price_caps.cap(pos);
        let mut evs: Vec<f64> = pool
            .iter()
            .filter(|p| p.position == pos)
            .filter(|p| p.price_tenths <= cap)
            .filter(|p| p.signals.minutes_risk >= params.replacement_min_risk)
            .map(|p| horizon_ev(&p.signals, params.horizon))
            .collect();
        evs.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let repl = if evs.is_empty() {
            0.0
        } else {
            let idx = (params.replacement_rank_share * evs.len() as f64).floor() as usize;
            evs[idx.min(evs.len() - 1)]
        };
        levels.insert(pos, repl);
    }

    levels
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    #[default]
    Vorp,
    HorizonEv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VorpEntry {
    pub player_id: u32,
    pub name: String,
    pub team_name: String,
    pub position: Position,
    pub price: f64,
    pub ev_per_gameweek: f64,
    pub horizon_ev: f64,
    pub replacement_ev: f64,
    pub vorp: f64,
}

/// Rank the filtered pool by VORP (or raw horizon EV), best first.
///
/// Replacement levels are computed from the whole pool so that the filter
/// narrows the candidates without moving the baseline.
pub fn rank_by_vorp(
    pool: &[Player],
    filter: &PlayerFilter,
    params: &VorpParams,
    rank_by: RankBy,
    limit: usize,
) -> Vec<VorpEntry> {
    let params = params.clone().sanitized();
    let levels = determine_replacement_levels(pool, &params);

    let mut scored: Vec<(f64, f64, &Player)> = pool
        .iter()
        .filter(|p| filter.matches(p))
        .map(|p| {
            let ev = horizon_ev(&p.signals, params.horizon);
            let repl = levels.get(&p.position).copied().unwrap_or(0.0);
            (ev, ev - repl, p)
        })
        .collect();

    scored.sort_by(|(a_ev, a_vorp, a), (b_ev, b_vorp, b)| match rank_by {
        RankBy::Vorp => rank_order(*a_vorp, a, *b_vorp, b),
        RankBy::HorizonEv => rank_order(*a_ev, a, *b_ev, b),
    });

    scored
        .into_iter()
        .take(limit)
        .map(|(ev, vorp, p)| VorpEntry {
            player_id: p.id,
            name: p.name.clone(),
            team_name: p.team_name.clone(),
            position: p.position,
            price: p.price(),
            ev_per_gameweek: round_to(ev_per_gameweek(&p.signals), 2),
            horizon_ev: round_to(ev, 2),
            replacement_ev: round_to(ev - vorp, 2),
            vorp: round_to(vorp, 2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::test_support::{player, with_signals};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn fixture_factor_bounds() {
        assert!(approx_eq(fixture_factor(Signal::Known(2.5)), 1.15));
        assert!(approx_eq(fixture_factor(Signal::Known(1.0)), 1.3));
        assert!(approx_eq(fixture_factor(Signal::Known(5.0)), 0.7));
        assert_eq!(fixture_factor(Signal::Unknown), 1.0);
    }

    #[test]
    fn horizon_ev_scales_linearly() {
        let p = with_signals(player(1, Position::Forward, 80), 60.0, 1.0, 0.4, None);
        // 0.4 × 4.5 × 1.0 × 1.0 = 1.8 per gameweek
        assert!(approx_eq(ev_per_gameweek(&p.signals), 1.8));
        assert!(approx_eq(horizon_ev(&p.signals, 5), 9.0));
        assert!(approx_eq(horizon_ev(&p.signals, 40), 1.8 * 12.0));
    }

    #[test]
    fn replacement_uses_budget_pool_index() {
        // five budget midfielders with xgi 0.1..0.5; index floor(0.2 × 5) = 1
        let mut pool: Vec<Player> = (1..=5)
            .map(|i| with_signals(player(i, Position::Midfielder, 50), 50.0, 1.0, i as f64 / 10.0, None))
            .collect();
        // expensive and benched players stay out of the baseline
        pool.push(with_signals(player(6, Position::Midfielder, 120), 80.0, 1.0, 0.9, None));
        pool.push(with_signals(player(7, Position::Midfielder, 45), 80.0, 0.2, 0.9, None));

        let params = VorpParams {
            horizon: 1,
            ..VorpParams::default()
        };
        let levels = determine_replacement_levels(&pool, &params);
        assert!(approx_eq(levels[&Position::Midfielder], 0.4 * 4.5));
        assert_eq!(levels[&Position::Goalkeeper], 0.0);
    }

    #[test]
    fn empty_replacement_pool_means_vorp_equals_horizon_ev() {
        let pool = vec![with_signals(player(1, Position::Forward, 100), 70.0, 0.9, 0.6, Some(2.5))];
        let ranked = rank_by_vorp(&pool, &PlayerFilter::default(), &VorpParams::default(), RankBy::Vorp, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].replacement_ev, 0.0);
        assert_eq!(ranked[0].vorp, ranked[0].horizon_ev);
    }

    #[test]
    fn ranking_is_a_stable_total_order() {
        let pool: Vec<Player> = vec![
            with_signals(player(4, Position::Defender, 50), 40.0, 0.9, 0.2, Some(3.0)),
            with_signals(player(2, Position::Defender, 50), 40.0, 0.9, 0.2, Some(3.0)),
            with_signals(player(3, Position::Defender, 45), 40.0, 0.9, 0.2, Some(3.0)),
            with_signals(player(1, Position::Defender, 60), 55.0, 0.9, 0.2, Some(3.0)),
            with_signals(player(5, Position::Defender, 60), 40.0, 1.0, 0.2, Some(3.0)),
        ];
        let params = VorpParams::default();
        let ids = |pool: &[Player]| -> Vec<u32> {
            rank_by_vorp(pool, &PlayerFilter::default(), &params, RankBy::Vorp, 10)
                .iter()
                .map(|e| e.player_id)
                .collect()
        };
        let forward = ids(&pool);
        // equal VORP: risk first, then form, then price, then id
        assert_eq!(forward, vec![5, 1, 3, 2, 4]);

        let mut reversed = pool.clone();
        reversed.reverse();
        assert_eq!(ids(&reversed), forward);
    }

    #[test]
    fn filter_narrows_candidates_only() {
        let pool = vec![
            with_signals(player(1, Position::Forward, 100), 70.0, 1.0, 0.8, None),
            with_signals(player(2, Position::Forward, 55), 50.0, 1.0, 0.2, None),
        ];
        let filter = PlayerFilter {
            min_price: Some(9.0),
            ..Default::default()
        };
        let ranked = rank_by_vorp(&pool, &filter, &VorpParams::default(), RankBy::HorizonEv, 10);
        assert_eq!(ranked.len(), 1);
        // baseline still comes from the 5.5 forward: 0.2 × 4.5 × 5
        assert!(approx_eq(ranked[0].replacement_ev, 4.5));
    }
}
