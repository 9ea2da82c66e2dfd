// Fixture difficulty rating (FDR) from an attacking perspective.
//
// Difficulty is relative: an opponent's defensive rating in the context it
// plays in is placed on the league's min/max range for that context and
// mapped linearly onto a 1-5 half-step scale. The weakest defence in the
// league rates 1, the strongest 5.

pub mod congestion;
pub mod heatmap;

use serde::{Deserialize, Serialize};

use crate::model::{Fixture, Team, NEUTRAL_STRENGTH};
use crate::signal::round_half;
use crate::snapshot::LeagueSnapshot;

pub use congestion::{congestion_report, CongestionParams, TeamCongestion};
pub use heatmap::{fixture_heatmap, FixtureHeatmap, HeatmapCell, HeatmapRow};

/// Rating used whenever difficulty cannot be determined.
pub const NEUTRAL_FDR: f64 = 3.0;
pub const MIN_FDR: f64 = 1.0;
pub const MAX_FDR: f64 = 5.0;

// ---------------------------------------------------------------------------
// DefenceStrengthRange
// ---------------------------------------------------------------------------

/// League-wide min/max of home and away defensive ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefenceStrengthRange {
    pub min_home: f64,
    pub max_home: f64,
    pub min_away: f64,
    pub max_away: f64,
}

impl DefenceStrengthRange {
    /// Compute the range over every team. An empty slice yields a
    /// degenerate range at the neutral strength, which rates everything 3.
    pub fn from_teams(teams: &[Team]) -> Self {
        if teams.is_empty() {
            return Self {
                min_home: NEUTRAL_STRENGTH,
                max_home: NEUTRAL_STRENGTH,
                min_away: NEUTRAL_STRENGTH,
                max_away: NEUTRAL_STRENGTH,
            };
        }
        teams.iter().fold(
            Self {
                min_home: f64::INFINITY,
                max_home: f64::NEG_INFINITY,
                min_away: f64::INFINITY,
                max_away: f64::NEG_INFINITY,
            },
            |acc, t| Self {
                min_home: acc.min_home.min(t.defence_home),
                max_home: acc.max_home.max(t.defence_home),
                min_away: acc.min_away.min(t.defence_away),
                max_away: acc.max_away.max(t.defence_away),
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FdrParams {
    /// Subtracted from the raw rating of home fixtures before rounding.
    pub home_attack_bonus: f64,
    /// Fixtures averaged for the headline rating.
    pub fixtures: usize,
}

impl Default for FdrParams {
    fn default() -> Self {
        Self {
            home_attack_bonus: 0.2,
            fixtures: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Unrounded linear position of `x` on the [1, 5] scale, or `None` when the
/// range is degenerate or any input is non-finite.
pub fn raw_fdr(x: f64, min: f64, max: f64) -> Option<f64> {
    if !x.is_finite() || !min.is_finite() || !max.is_finite() || min == max {
        return None;
    }
    let t = (x - min) / (max - min);
    Some(MIN_FDR + t * (MAX_FDR - MIN_FDR))
}

/// Map a defensive rating onto the half-step 1-5 scale.
pub fn map_to_fdr(x: f64, min: f64, max: f64) -> f64 {
    raw_fdr(x, min, max)
        .map(|raw| round_half(raw).clamp(MIN_FDR, MAX_FDR))
        .unwrap_or(NEUTRAL_FDR)
}

/// Difficulty of one fixture for `team_id`.
///
/// Playing at home the opponent defends away, so its away rating is placed
/// on the league away range (and vice versa). Home fixtures get the attack
/// bonus subtracted before rounding. Returns 3 when the team is not in the
/// fixture, the opponent is unknown or the range is degenerate.
pub fn fixture_fdr(
    snapshot: &LeagueSnapshot,
    team_id: u32,
    fixture: &Fixture,
    params: &FdrParams,
) -> f64 {
    let Some((opponent_id, is_home)) = fixture.opponent_of(team_id) else {
        return NEUTRAL_FDR;
    };
    let Some(opponent) = snapshot.team(opponent_id) else {
        return NEUTRAL_FDR;
    };

    let range = snapshot.defence_range();
    let raw = if is_home {
        raw_fdr(opponent.defence_away, range.min_away, range.max_away)
    } else {
        raw_fdr(opponent.defence_home, range.min_home, range.max_home)
    };

    match raw {
        Some(raw) => {
            let adjusted = if is_home { raw - params.home_attack_bonus } else { raw };
            round_half(adjusted).clamp(MIN_FDR, MAX_FDR)
        }
        None => NEUTRAL_FDR,
    }
}

/// Headline attacking FDR: the average rating of the team's next
/// `params.fixtures` upcoming fixtures, rounded to the nearest half.
/// No upcoming fixtures rates exactly 3.
pub fn attack_fdr_next_n(snapshot: &LeagueSnapshot, team_id: u32, params: &FdrParams) -> f64 {
    let schedule = snapshot.schedule_for(team_id);
    let upcoming = schedule.next_n(params.fixtures);
    if upcoming.is_empty() {
        return NEUTRAL_FDR;
    }
    let total: f64 = upcoming
        .iter()
        .map(|f| fixture_fdr(snapshot, team_id, f, params))
        .sum();
    round_half(total / upcoming.len() as f64).clamp(MIN_FDR, MAX_FDR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u32, defence_home: f64, defence_away: f64) -> Team {
        Team {
            id,
            name: format!("Team {id}"),
            defence_home,
            defence_away,
        }
    }

    fn fixture(id: u32, gw: u32, home: u32, away: u32) -> Fixture {
        Fixture {
            id,
            gameweek: Some(gw),
            kickoff: None,
            home_team: home,
            away_team: away,
            finished: false,
        }
    }

    /// Team 1 is the attacking side under test; teams 2-4 span the range.
    fn snapshot(fixtures: Vec<Fixture>) -> LeagueSnapshot {
        let teams = vec![
            team(1, 1200.0, 1200.0),
            team(2, 1000.0, 1000.0),
            team(3, 1400.0, 1400.0),
            team(4, 1100.0, 1300.0),
        ];
        LeagueSnapshot::new(teams, fixtures, 1).unwrap()
    }

    #[test]
    fn mapping_is_linear_over_range() {
        assert_eq!(map_to_fdr(1000.0, 1000.0, 1400.0), 1.0);
        assert_eq!(map_to_fdr(1400.0, 1000.0, 1400.0), 5.0);
        assert_eq!(map_to_fdr(1200.0, 1000.0, 1400.0), 3.0);
        assert_eq!(map_to_fdr(1100.0, 1000.0, 1400.0), 2.0);
        // t = 0.3 -> 2.2 -> 2.0
        assert_eq!(map_to_fdr(1120.0, 1000.0, 1400.0), 2.0);
    }

    #[test]
    fn degenerate_or_non_finite_is_neutral() {
        assert_eq!(map_to_fdr(5.0, 3.0, 3.0), NEUTRAL_FDR);
        assert_eq!(map_to_fdr(f64::NAN, 1.0, 5.0), NEUTRAL_FDR);
    }

    #[test]
    fn away_fixture_uses_opponent_home_defence() {
        let snap = snapshot(vec![fixture(1, 1, 3, 1), fixture(2, 1, 2, 1)]);
        let params = FdrParams::default();
        // strongest home defence in the league, faced away
        assert_eq!(fixture_fdr(&snap, 1, &snap.fixtures()[0], &params), 5.0);
        // weakest home defence in the league, faced away
        assert_eq!(fixture_fdr(&snap, 1, &snap.fixtures()[1], &params), 1.0);
    }

    #[test]
    fn home_fixture_uses_opponent_away_defence_with_bonus() {
        // team 4 away defence 1300 -> raw 4.0, minus 0.2 -> 3.8 -> 4.0
        let snap = snapshot(vec![fixture(1, 1, 1, 4)]);
        let params = FdrParams::default();
        assert_eq!(fixture_fdr(&snap, 1, &snap.fixtures()[0], &params), 4.0);

        // a bonus large enough to cross a half step is visible
        let big = FdrParams {
            home_attack_bonus: 0.3,
            ..FdrParams::default()
        };
        assert_eq!(fixture_fdr(&snap, 1, &snap.fixtures()[0], &big), 3.5);
    }

    #[test]
    fn next_n_averages_and_rounds_to_half() {
        // away at 3 (5.0), away at 2 (1.0), away at 4 (home def 1100 -> 2.0)
        let snap = snapshot(vec![
            fixture(1, 1, 3, 1),
            fixture(2, 2, 2, 1),
            fixture(3, 3, 4, 1),
            fixture(4, 4, 3, 1),
        ]);
        // (5 + 1 + 2) / 3 = 2.67 -> 2.5
        assert_eq!(attack_fdr_next_n(&snap, 1, &FdrParams::default()), 2.5);
    }

    #[test]
    fn no_fixtures_is_exactly_neutral() {
        let snap = snapshot(vec![]);
        assert_eq!(attack_fdr_next_n(&snap, 1, &FdrParams::default()), 3.0);
    }

    #[test]
    fn ratings_stay_on_half_steps() {
        let snap = snapshot(vec![
            fixture(1, 1, 1, 2),
            fixture(2, 2, 3, 1),
            fixture(3, 3, 1, 4),
        ]);
        for team_id in 1..=4 {
            let fdr = attack_fdr_next_n(&snap, team_id, &FdrParams::default());
            assert!((1.0..=5.0).contains(&fdr));
            assert_eq!((fdr * 2.0).fract(), 0.0, "fdr {fdr} not on a half step");
        }
    }
}
