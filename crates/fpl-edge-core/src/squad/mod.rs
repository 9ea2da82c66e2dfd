// Squad planning for a manager's own players: starting XI and formation,
// bench order, captain and vice, sell candidates and a transfer-in
// shortlist drawn from the whole pool.
//
// Every selection here runs off `start_score`, a blend of minutes security,
// form, attacking output and fixture ease.

pub mod chips;
pub mod stacks;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::fdr::NEUTRAL_FDR;
use crate::model::{Player, PlayerSignals, Position};
use crate::ranking::{rank_order, tie_break};
use crate::signal::round_to;
use crate::valuation::{expected_value, ValuationWeights};

pub use chips::{chip_advice, ChipAdvice, ChipParams, ChipReport};
pub use stacks::{team_stacks, template_gap, StackKind, StackParams, StackSuggestion, TemplateGap};

/// Players needed to field a starting XI.
pub const MIN_SQUAD: usize = 11;
pub const XI_SIZE: usize = 11;

/// FDR assumed for shortlist candidates with no known fixtures.
const SHORTLIST_UNKNOWN_FDR: f64 = 5.0;

/// Start score in roughly [0, 1.1]: 0.5 × minutes risk + 0.3 × form/100 +
/// 0.2 × min(xGI/90, 1) + 0.1 × (3.5 − FDR)/2. Unknown xGI counts as 0,
/// unknown FDR as neutral.
pub fn start_score(signals: &PlayerSignals) -> f64 {
    let xgi = signals.xgi.xgi90.or(0.0).clamp(0.0, 1.0);
    let fdr = signals.fdr_attack_next3.or(NEUTRAL_FDR);
    0.5 * signals.minutes_risk + 0.3 * signals.form / 100.0 + 0.2 * xgi + 0.1 * (3.5 - fdr) / 2.0
}

fn by_start_score(a: &Player, b: &Player) -> Ordering {
    rank_order(start_score(&a.signals), a, start_score(&b.signals), b)
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Transfer-in shortlist thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistParams {
    pub min_form: f64,
    pub min_minutes_risk: f64,
    /// Unknown FDR counts as 5 and so never passes.
    pub max_fdr: f64,
    pub limit: usize,
}

impl Default for ShortlistParams {
    fn default() -> Self {
        Self {
            min_form: 65.0,
            min_minutes_risk: 0.75,
            max_fdr: 3.2,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SquadParams {
    pub weights: ValuationWeights,
    pub sell_candidates: usize,
    pub shortlist: ShortlistParams,
}

impl Default for SquadParams {
    fn default() -> Self {
        Self {
            weights: ValuationWeights::default(),
            sell_candidates: 3,
            shortlist: ShortlistParams::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadSlot {
    pub player_id: u32,
    pub name: String,
    pub team_name: String,
    pub position: Position,
    pub price: f64,
    /// Rounded to 3 decimals.
    pub start_score: f64,
    pub ev: f64,
}

impl SquadSlot {
    fn new(player: &Player, weights: ValuationWeights) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            team_name: player.team_name.clone(),
            position: player.position,
            price: player.price(),
            start_score: round_to(start_score(&player.signals), 3),
            ev: expected_value(&player.signals, weights).ev,
        }
    }
}

/// Outfield shape of the starting XI, e.g. 3-4-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formation {
    pub defenders: usize,
    pub midfielders: usize,
    pub forwards: usize,
}

impl Formation {
    fn of(xi: &[&Player]) -> Self {
        let count = |pos: Position| xi.iter().filter(|p| p.position == pos).count();
        Self {
            defenders: count(Position::Defender),
            midfielders: count(Position::Midfielder),
            forwards: count(Position::Forward),
        }
    }

    pub fn label(&self) -> String {
        format!("{}-{}-{}", self.defenders, self.midfielders, self.forwards)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadPlan {
    pub formation: Formation,
    pub starting_xi: Vec<SquadSlot>,
    /// Everyone not starting, best start score first.
    pub bench: Vec<SquadSlot>,
    pub captain: Option<SquadSlot>,
    pub vice_captain: Option<SquadSlot>,
    /// Lowest start scores in the squad.
    pub sell_candidates: Vec<SquadSlot>,
    pub shortlist: Vec<SquadSlot>,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

fn ranked_at<'a>(squad: &'a [Player], position: Position) -> Vec<&'a Player> {
    let mut players: Vec<&Player> = squad.iter().filter(|p| p.position == position).collect();
    players.sort_by(|a, b| by_start_score(a, b));
    players
}

fn form_at(players: &[&Player], idx: usize) -> f64 {
    players.get(idx).map_or(0.0, |p| p.signals.form)
}

/// Pick the starting XI: one goalkeeper, three defenders, then 3-4-3 unless
/// the fifth-best midfielder is in better form than the third-best forward,
/// in which case 3-5-2. Short positions are filled from the remaining
/// outfield players by start score.
pub fn pick_xi(squad: &[Player]) -> Vec<&Player> {
    let keepers = ranked_at(squad, Position::Goalkeeper);
    let defenders = ranked_at(squad, Position::Defender);
    let midfielders = ranked_at(squad, Position::Midfielder);
    let forwards = ranked_at(squad, Position::Forward);

    let (mids, fwds) = if form_at(&midfielders, 4) > form_at(&forwards, 2) {
        (5, 2)
    } else {
        (4, 3)
    };

    let mut xi: Vec<&Player> = keepers
        .iter()
        .take(1)
        .chain(defenders.iter().take(3))
        .chain(midfielders.iter().take(mids))
        .chain(forwards.iter().take(fwds))
        .copied()
        .collect();

    if xi.len() < XI_SIZE {
        let mut spare: Vec<&Player> = squad
            .iter()
            .filter(|p| p.position != Position::Goalkeeper)
            .filter(|p| !xi.iter().any(|s| s.id == p.id))
            .collect();
        spare.sort_by(|a, b| by_start_score(a, b));
        let missing = XI_SIZE - xi.len();
        xi.extend(spare.into_iter().take(missing));
    }
    xi.truncate(XI_SIZE);
    xi
}

/// Lowest start scores first, ties by id.
pub fn sell_candidates(squad: &[Player], count: usize) -> Vec<&Player> {
    let mut players: Vec<&Player> = squad.iter().collect();
    players.sort_by(|a, b| {
        start_score(&a.signals)
            .partial_cmp(&start_score(&b.signals))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    players.truncate(count);
    players
}

/// Global transfer-in shortlist: in-form, nailed players with kind
/// fixtures, by xGI/90 then form. Players already owned are skipped.
pub fn transfer_shortlist<'a>(
    pool: &'a [Player],
    owned: &[u32],
    params: &ShortlistParams,
) -> Vec<&'a Player> {
    let mut players: Vec<&Player> = pool
        .iter()
        .filter(|p| !owned.contains(&p.id))
        .filter(|p| p.signals.form >= params.min_form)
        .filter(|p| p.signals.minutes_risk >= params.min_minutes_risk)
        .filter(|p| p.signals.fdr_attack_next3.or(SHORTLIST_UNKNOWN_FDR) <= params.max_fdr)
        .collect();
    players.sort_by(|a, b| {
        let xgi = |p: &Player| p.signals.xgi.xgi90.or(0.0);
        xgi(b)
            .partial_cmp(&xgi(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.signals.form.partial_cmp(&a.signals.form).unwrap_or(Ordering::Equal))
            .then_with(|| tie_break(a, b))
    });
    players.truncate(params.limit);
    players
}

/// Full plan for one squad. `pool` is the whole scored player pool and only
/// feeds the shortlist.
pub fn plan_squad(
    squad: &[Player],
    pool: &[Player],
    params: &SquadParams,
) -> Result<SquadPlan, EngineError> {
    if squad.len() < MIN_SQUAD {
        return Err(EngineError::SquadTooSmall {
            needed: MIN_SQUAD,
            found: squad.len(),
        });
    }
    let weights = params.weights.sanitized();
    let slot = |p: &Player| SquadSlot::new(p, weights);

    let xi = pick_xi(squad);
    let mut bench: Vec<&Player> = squad
        .iter()
        .filter(|p| !xi.iter().any(|s| s.id == p.id))
        .collect();
    bench.sort_by(|a, b| by_start_score(a, b));

    let mut armband: Vec<(f64, &Player)> = xi
        .iter()
        .map(|p| (expected_value(&p.signals, weights).ev, *p))
        .collect();
    armband.sort_by(|(a_ev, a), (b_ev, b)| {
        b_ev.partial_cmp(a_ev)
            .unwrap_or(Ordering::Equal)
            .then_with(|| by_start_score(a, b))
    });

    let owned: Vec<u32> = squad.iter().map(|p| p.id).collect();

    Ok(SquadPlan {
        formation: Formation::of(&xi),
        starting_xi: xi.iter().map(|p| slot(p)).collect(),
        bench: bench.iter().map(|p| slot(p)).collect(),
        captain: armband.first().map(|(_, p)| slot(p)),
        vice_captain: armband.get(1).map(|(_, p)| slot(p)),
        sell_candidates: sell_candidates(squad, params.sell_candidates)
            .into_iter()
            .map(slot)
            .collect(),
        shortlist: transfer_shortlist(pool, &owned, &params.shortlist)
            .into_iter()
            .map(slot)
            .collect(),
    })
}
