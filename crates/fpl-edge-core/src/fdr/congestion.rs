// Schedule congestion: how many matches each team plays inside a day
// horizon and how little rest falls between them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::signal::{round_to, Signal};
use crate::snapshot::LeagueSnapshot;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CongestionParams {
    pub horizon_days: i64,
    /// Gaps shorter than this many days count as back-to-backs.
    pub back_to_back_days: f64,
    /// Score per match inside the horizon.
    pub base_per_game: f64,
    /// Score per back-to-back.
    pub rest_penalty: f64,
}

impl Default for CongestionParams {
    fn default() -> Self {
        Self {
            horizon_days: 14,
            back_to_back_days: 3.0,
            base_per_game: 2.0,
            rest_penalty: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamCongestion {
    pub team_id: u32,
    pub team_name: String,
    pub matches: usize,
    pub back_to_backs: usize,
    pub score: f64,
    pub first_match: Option<DateTime<Utc>>,
    pub last_match: Option<DateTime<Utc>>,
    /// Unknown with fewer than two matches.
    pub avg_rest_days: Signal<f64>,
    /// Days between consecutive matches, 2 decimals.
    pub rest_gaps: Vec<f64>,
}

/// Congestion for every team over `[now, now + horizon_days]`, most
/// congested first (ties by team id).
pub fn congestion_report(
    snapshot: &LeagueSnapshot,
    now: DateTime<Utc>,
    params: &CongestionParams,
) -> Vec<TeamCongestion> {
    let horizon = now + Duration::days(params.horizon_days.max(0));

    let mut rows: Vec<TeamCongestion> = snapshot
        .teams()
        .iter()
        .map(|team| {
            let mut times: Vec<DateTime<Utc>> = snapshot
                .fixtures()
                .iter()
                .filter(|f| !f.finished && f.involves(team.id))
                .filter_map(|f| f.kickoff)
                .filter(|t| *t >= now && *t <= horizon)
                .collect();
            times.sort();

            let gaps: Vec<f64> = times
                .windows(2)
                .map(|w| (w[1] - w[0]).num_seconds() as f64 / SECONDS_PER_DAY)
                .collect();
            let back_to_backs = gaps.iter().filter(|d| **d < params.back_to_back_days).count();
            let matches = times.len();

            let avg_rest_days = if gaps.is_empty() {
                Signal::Unknown
            } else {
                Signal::Known(round_to(gaps.iter().sum::<f64>() / gaps.len() as f64, 2))
            };

            TeamCongestion {
                team_id: team.id,
                team_name: team.name.clone(),
                matches,
                back_to_backs,
                score: matches as f64 * params.base_per_game
                    + back_to_backs as f64 * params.rest_penalty,
                first_match: times.first().copied(),
                last_match: times.last().copied(),
                avg_rest_days,
                rest_gaps: gaps.iter().map(|d| round_to(*d, 2)).collect(),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.team_id.cmp(&b.team_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fixture, Team};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap()
    }

    fn team(id: u32) -> Team {
        Team {
            id,
            name: format!("Team {id}"),
            defence_home: 1100.0,
            defence_away: 1100.0,
        }
    }

    fn fixture(id: u32, home: u32, away: u32, day_offset: i64, hours: i64) -> Fixture {
        Fixture {
            id,
            gameweek: Some(id),
            kickoff: Some(now() + Duration::days(day_offset) + Duration::hours(hours)),
            home_team: home,
            away_team: away,
            finished: false,
        }
    }

    #[test]
    fn counts_matches_and_back_to_backs() {
        let fixtures = vec![
            fixture(1, 1, 2, 1, 0),
            fixture(2, 3, 1, 3, 12), // 2.5 days after the first: back-to-back
            fixture(3, 1, 3, 8, 12), // 5 days later
            fixture(4, 2, 3, 30, 0), // outside the horizon
        ];
        let snap = LeagueSnapshot::new(vec![team(1), team(2), team(3)], fixtures, 1).unwrap();
        let report = congestion_report(&snap, now(), &CongestionParams::default());

        let first = &report[0];
        assert_eq!(first.team_id, 1);
        assert_eq!(first.matches, 3);
        assert_eq!(first.back_to_backs, 1);
        assert_eq!(first.score, 7.5);
        assert_eq!(first.rest_gaps, vec![2.5, 5.0]);
        assert_eq!(first.avg_rest_days, Signal::Known(3.75));

        let lone = report.iter().find(|r| r.team_id == 2).unwrap();
        assert_eq!(lone.matches, 1);
        assert_eq!(lone.avg_rest_days, Signal::Unknown);
        assert_eq!(lone.first_match, lone.last_match);
    }

    #[test]
    fn sorted_by_score_then_team() {
        let fixtures = vec![fixture(1, 2, 3, 2, 0)];
        let snap = LeagueSnapshot::new(vec![team(1), team(2), team(3)], fixtures, 1).unwrap();
        let ids: Vec<u32> = congestion_report(&snap, now(), &CongestionParams::default())
            .iter()
            .map(|r| r.team_id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
