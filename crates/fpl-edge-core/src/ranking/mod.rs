// Player filtering and deterministic ranking.
//
// Every ranking in the engine resolves ties the same way so that the output
// is a total order and identical across runs: higher minutes risk, then
// higher form, then lower price, then lower player id.

pub mod screen;
pub mod vorp;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::{Player, Position};

pub use screen::{screen_players, ScreenCriteria, ScreenOutcome, ScreenSort, ScreenStage, StageCount};
pub use vorp::{
    determine_replacement_levels, ev_per_gameweek, fixture_factor, horizon_ev, rank_by_vorp,
    PriceCaps, RankBy, VorpEntry, VorpParams,
};

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Optional, independently applied player filters.
///
/// Filters combine as a conjunction. A player whose value for a filtered
/// field is unknown (FDR, ownership) passes that filter; price is always
/// known and always enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFilter {
    /// Price bounds in millions, inclusive.
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub position: Option<Position>,
    pub min_minutes_risk: Option<f64>,
    pub max_fdr: Option<f64>,
    /// Team names to exclude, matched case-insensitively.
    pub excluded_teams: Vec<String>,
    /// Ownership bounds in percent, inclusive.
    pub min_ownership: Option<f64>,
    pub max_ownership: Option<f64>,
    pub min_form: Option<f64>,
}

impl PlayerFilter {
    pub fn matches(&self, player: &Player) -> bool {
        self.passes_price(player)
            && self.passes_position(player)
            && self.passes_minutes_risk(player)
            && self.passes_fdr(player)
            && self.passes_team(player)
            && self.passes_ownership(player)
            && self.passes_form(player)
    }

    pub fn passes_price(&self, player: &Player) -> bool {
        let price = player.price();
        self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
    }

    pub fn passes_position(&self, player: &Player) -> bool {
        self.position.map_or(true, |pos| player.position == pos)
    }

    pub fn passes_minutes_risk(&self, player: &Player) -> bool {
        self.min_minutes_risk
            .map_or(true, |min| player.signals.minutes_risk >= min)
    }

    pub fn passes_fdr(&self, player: &Player) -> bool {
        match (self.max_fdr, player.signals.fdr_attack_next3.known()) {
            (Some(max), Some(fdr)) => fdr <= max,
            _ => true,
        }
    }

    pub fn passes_team(&self, player: &Player) -> bool {
        !self
            .excluded_teams
            .iter()
            .any(|t| t.trim().eq_ignore_ascii_case(player.team_name.trim()))
    }

    pub fn passes_ownership(&self, player: &Player) -> bool {
        let Some(own) = player.ownership.known() else {
            return true;
        };
        self.min_ownership.map_or(true, |min| own >= min)
            && self.max_ownership.map_or(true, |max| own <= max)
    }

    pub fn passes_form(&self, player: &Player) -> bool {
        self.min_form.map_or(true, |min| player.signals.form >= min)
    }
}

// ---------------------------------------------------------------------------
// Tie-breaking
// ---------------------------------------------------------------------------

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Shared tie-break chain: higher minutes risk, higher form, lower price,
/// lower id.
pub fn tie_break(a: &Player, b: &Player) -> Ordering {
    desc(a.signals.minutes_risk, b.signals.minutes_risk)
        .then_with(|| desc(a.signals.form, b.signals.form))
        .then_with(|| a.price_tenths.cmp(&b.price_tenths))
        .then_with(|| a.id.cmp(&b.id))
}

/// Order by a primary score descending, then [`tie_break`].
pub fn rank_order(a_score: f64, a: &Player, b_score: f64, b: &Player) -> Ordering {
    desc(a_score, b_score).then_with(|| tie_break(a, b))
}
