// Captain suggestions: EV shortlist, history-backed confidence and an
// optional Monte Carlo pass over the final picks.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fpl_edge_core::fdr::NEUTRAL_FDR;
use fpl_edge_core::simulator::{simulate_captaincy, CaptaincyCandidate, SimulationConfig, SimulationResult};
use fpl_edge_core::valuation::{
    confidence_from_history, confidence_without_history, expected_value, ConfidenceBreakdown,
    EvBreakdown, ValuationWeights,
};
use fpl_edge_core::{EngineError, MatchHistoryEntry, Player, Position};

use crate::config::CaptainConfig;

pub const MAX_CAPTAIN_LIMIT: usize = 10;
/// Shortlist never smaller than this, so confidence can reorder near-ties.
pub const MIN_SHORTLIST: usize = 12;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CaptainParams {
    /// Clamped to [1, 10].
    pub limit: usize,
    pub min_minutes_risk: f64,
    pub include_goalkeepers: bool,
    pub shortlist: usize,
    pub weights: ValuationWeights,
}

impl Default for CaptainParams {
    fn default() -> Self {
        Self {
            limit: 3,
            min_minutes_risk: 0.6,
            include_goalkeepers: false,
            shortlist: MIN_SHORTLIST,
            weights: ValuationWeights::default(),
        }
    }
}

impl CaptainParams {
    pub fn from_config(config: &CaptainConfig, weights: ValuationWeights) -> Self {
        Self {
            limit: config.limit,
            min_minutes_risk: config.min_minutes_risk,
            include_goalkeepers: config.include_goalkeepers,
            shortlist: config.shortlist,
            weights,
        }
    }

    pub fn sanitized(mut self) -> Self {
        self.limit = self.limit.clamp(1, MAX_CAPTAIN_LIMIT);
        self.shortlist = self.shortlist.max(self.limit).max(MIN_SHORTLIST);
        if !self.min_minutes_risk.is_finite() {
            self.min_minutes_risk = Self::default().min_minutes_risk;
        }
        self.weights = self.weights.sanitized();
        self
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptainReason {
    HighForm,
    StrongXgi,
    KindFixtures,
    SecureMinutes,
}

/// Short human-readable explanations for a captain pick.
pub fn captain_reasons(player: &Player) -> Vec<CaptainReason> {
    let s = &player.signals;
    let mut reasons = Vec::new();
    if s.form >= 70.0 {
        reasons.push(CaptainReason::HighForm);
    }
    if s.xgi.xgi90.or(0.0) >= 0.5 {
        reasons.push(CaptainReason::StrongXgi);
    }
    if s.fdr_attack_next3.or(NEUTRAL_FDR) <= 3.0 {
        reasons.push(CaptainReason::KindFixtures);
    }
    if s.minutes_risk >= 0.75 {
        reasons.push(CaptainReason::SecureMinutes);
    }
    reasons
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptainPick {
    pub player_id: u32,
    pub name: String,
    pub team_name: String,
    pub position: Position,
    pub price: f64,
    pub ev: EvBreakdown,
    pub confidence: ConfidenceBreakdown,
    /// Confidence came from the fallback formula because the history lookup
    /// failed.
    pub history_missing: bool,
    pub reasons: Vec<CaptainReason>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptainReport {
    pub generated_at: DateTime<Utc>,
    pub current_gameweek: u32,
    pub picks: Vec<CaptainPick>,
    /// Empty when the simulation was skipped.
    pub simulation: Vec<SimulationResult>,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

fn by_ev(a_ev: f64, a_id: u32, b_ev: f64, b_id: u32) -> Ordering {
    b_ev.partial_cmp(&a_ev)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_id.cmp(&b_id))
}

/// Eligible players with their EV, best first, cut to the shortlist size.
pub fn shortlist<'a>(players: &'a [Player], params: &CaptainParams) -> Vec<(&'a Player, EvBreakdown)> {
    let mut eligible: Vec<(&Player, EvBreakdown)> = players
        .iter()
        .filter(|p| params.include_goalkeepers || p.position != Position::Goalkeeper)
        .filter(|p| p.signals.minutes_risk >= params.min_minutes_risk)
        .map(|p| (p, expected_value(&p.signals, params.weights)))
        .collect();
    eligible.sort_by(|a, b| by_ev(a.1.ev, a.0.id, b.1.ev, b.0.id));
    eligible.truncate(params.shortlist);
    eligible
}

/// Rank captain picks: shortlist by EV, then order by EV and confidence.
/// Histories come from the ingestion cycle; a player without one gets the
/// no-history confidence formula.
pub fn suggest_captains(
    players: &[Player],
    histories: &HashMap<u32, Vec<MatchHistoryEntry>>,
    params: &CaptainParams,
) -> Vec<CaptainPick> {
    let params = params.clone().sanitized();
    let candidates = shortlist(players, &params);
    debug!(shortlist = candidates.len(), "captain shortlist built");

    let mut picks: Vec<CaptainPick> = candidates
        .into_iter()
        .map(|(player, ev)| {
            let (confidence, history_missing) = match histories.get(&player.id) {
                Some(history) => (confidence_from_history(history, &player.signals), false),
                None => (confidence_without_history(&player.signals), true),
            };
            CaptainPick {
                player_id: player.id,
                name: player.name.clone(),
                team_name: player.team_name.clone(),
                position: player.position,
                price: player.price(),
                ev,
                confidence,
                history_missing,
                reasons: captain_reasons(player),
            }
        })
        .collect();

    picks.sort_by(|a, b| {
        b.ev.ev
            .partial_cmp(&a.ev.ev)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.confidence
                    .confidence
                    .partial_cmp(&a.confidence.confidence)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    picks.truncate(params.limit);

    let fallback = picks.iter().filter(|p| p.history_missing).count();
    info!(picks = picks.len(), fallback, "captain suggestions ready");
    picks
}

/// Simulate the first `count` picks.
pub fn simulate_picks(
    picks: &[CaptainPick],
    players: &[Player],
    count: usize,
    config: &SimulationConfig,
) -> Result<Vec<SimulationResult>, EngineError> {
    let candidates: Vec<CaptaincyCandidate> = picks
        .iter()
        .take(count)
        .filter_map(|pick| players.iter().find(|p| p.id == pick.player_id))
        .map(CaptaincyCandidate::from_player)
        .collect();
    simulate_captaincy(&candidates, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpl_edge_core::{Availability, PlayerSignals, Signal, XgiRates};

    fn player(id: u32, position: Position, form: f64, risk: f64) -> Player {
        Player {
            id,
            name: format!("P{id}"),
            team_id: 1,
            team_name: "Team".into(),
            position,
            price_tenths: 80,
            ownership: Signal::Known(10.0),
            availability: Availability::default(),
            signals: PlayerSignals {
                form,
                minutes_risk: risk,
                fdr_attack_next3: Signal::Known(3.0),
                xgi: XgiRates {
                    xgi90: Signal::Known(0.5),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    #[test]
    fn params_are_clamped() {
        let params = CaptainParams {
            limit: 40,
            shortlist: 3,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(params.limit, 10);
        assert_eq!(params.shortlist, 12);

        let params = CaptainParams {
            limit: 0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(params.limit, 1);
    }

    #[test]
    fn reasons_follow_thresholds() {
        let p = player(1, Position::Forward, 72.0, 0.8);
        assert_eq!(
            captain_reasons(&p),
            vec![
                CaptainReason::HighForm,
                CaptainReason::StrongXgi,
                CaptainReason::KindFixtures,
                CaptainReason::SecureMinutes,
            ]
        );
        let mut weak = player(2, Position::Forward, 40.0, 0.7);
        weak.signals.fdr_attack_next3 = Signal::Unknown;
        weak.signals.xgi.xgi90 = Signal::Unknown;
        // unknown fdr is treated as neutral 3
        assert_eq!(captain_reasons(&weak), vec![CaptainReason::KindFixtures]);
    }

    #[test]
    fn picks_use_supplied_histories() {
        let players = vec![
            player(2, Position::Forward, 60.0, 0.9),
            player(3, Position::Midfielder, 80.0, 0.9),
        ];
        let steady = MatchHistoryEntry {
            minutes: 90,
            points: 6,
            ..Default::default()
        };
        let histories = HashMap::from([(3, vec![steady.clone(), steady.clone(), steady])]);
        let picks = suggest_captains(&players, &histories, &CaptainParams::default());

        assert_eq!(picks.iter().map(|p| p.player_id).collect::<Vec<_>>(), vec![3, 2]);
        assert!(!picks[0].history_missing);
        assert_eq!(picks[0].confidence.stability, Some(1.0));
        assert!(picks[1].history_missing);
        assert_eq!(picks[1].confidence.stability, None);
    }

    #[test]
    fn shortlist_excludes_keepers_and_rotation_risks() {
        let players = vec![
            player(1, Position::Goalkeeper, 90.0, 1.0),
            player(2, Position::Forward, 50.0, 1.0),
            player(3, Position::Midfielder, 80.0, 0.5),
            player(4, Position::Midfielder, 80.0, 0.9),
        ];
        let params = CaptainParams::default().sanitized();
        let ids: Vec<u32> = shortlist(&players, &params).iter().map(|(p, _)| p.id).collect();
        assert_eq!(ids, vec![4, 2]);

        let with_gk = CaptainParams {
            include_goalkeepers: true,
            ..params
        };
        let ids: Vec<u32> = shortlist(&players, &with_gk).iter().map(|(p, _)| p.id).collect();
        assert_eq!(ids, vec![1, 4, 2]);
    }
}
