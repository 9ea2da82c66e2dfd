// Validated, read-only league snapshot.
//
// Built once per ingestion cycle from strict team and fixture records. Every
// downstream component takes `&LeagueSnapshot` and assumes the structure is
// sound: all fixture teams exist and every team has finite defence ratings.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::SnapshotError;
use crate::fdr::DefenceStrengthRange;
use crate::model::{Fixture, Team};

// ---------------------------------------------------------------------------
// TeamFixtureSchedule
// ---------------------------------------------------------------------------

/// Upcoming, unfinished fixtures for one team in play order.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamFixtureSchedule {
    pub team_id: u32,
    pub fixtures: Vec<Fixture>,
}

impl TeamFixtureSchedule {
    /// Known kickoff times, ascending.
    pub fn kickoffs(&self) -> Vec<DateTime<Utc>> {
        let mut times: Vec<DateTime<Utc>> =
            self.fixtures.iter().filter_map(|f| f.kickoff).collect();
        times.sort();
        times
    }

    /// The first `n` fixtures of the schedule.
    pub fn next_n(&self, n: usize) -> &[Fixture] {
        &self.fixtures[..n.min(self.fixtures.len())]
    }
}

/// Play order: gameweek ascending (unscheduled last), then kickoff ascending
/// (unknown kickoff last), then fixture id.
pub fn play_order(a: &Fixture, b: &Fixture) -> Ordering {
    let gw = |f: &Fixture| f.gameweek.unwrap_or(u32::MAX);
    let ko = |f: &Fixture| f.kickoff.map(|t| t.timestamp_millis()).unwrap_or(i64::MAX);
    gw(a)
        .cmp(&gw(b))
        .then_with(|| ko(a).cmp(&ko(b)))
        .then_with(|| a.id.cmp(&b.id))
}

// ---------------------------------------------------------------------------
// LeagueSnapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LeagueSnapshot {
    current_gameweek: u32,
    teams: Vec<Team>,
    fixtures: Vec<Fixture>,
    defence_range: DefenceStrengthRange,
    team_index: HashMap<u32, usize>,
}

impl LeagueSnapshot {
    /// Validate teams and fixtures and compute the league defence range.
    pub fn new(
        teams: Vec<Team>,
        fixtures: Vec<Fixture>,
        current_gameweek: u32,
    ) -> Result<Self, SnapshotError> {
        if teams.is_empty() {
            return Err(SnapshotError::NoTeams);
        }

        let mut team_index = HashMap::with_capacity(teams.len());
        for (idx, team) in teams.iter().enumerate() {
            if !team.defence_home.is_finite() || !team.defence_away.is_finite() {
                return Err(SnapshotError::NonFiniteStrength { team: team.id });
            }
            if team_index.insert(team.id, idx).is_some() {
                return Err(SnapshotError::DuplicateTeam(team.id));
            }
        }

        for fixture in &fixtures {
            if fixture.home_team == fixture.away_team {
                return Err(SnapshotError::SelfFixture(fixture.id));
            }
            for team in [fixture.home_team, fixture.away_team] {
                if !team_index.contains_key(&team) {
                    return Err(SnapshotError::UnknownTeam {
                        fixture: fixture.id,
                        team,
                    });
                }
            }
        }

        let defence_range = DefenceStrengthRange::from_teams(&teams);

        Ok(Self {
            current_gameweek,
            teams,
            fixtures,
            defence_range,
            team_index,
        })
    }

    pub fn current_gameweek(&self) -> u32 {
        self.current_gameweek
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn team(&self, id: u32) -> Option<&Team> {
        self.team_index.get(&id).map(|&idx| &self.teams[idx])
    }

    pub fn defence_range(&self) -> &DefenceStrengthRange {
        &self.defence_range
    }

    /// Unfinished fixtures for `team_id` from the current gameweek on, in
    /// play order. Fixtures without a gameweek are kept and sort last.
    pub fn schedule_for(&self, team_id: u32) -> TeamFixtureSchedule {
        let mut fixtures: Vec<Fixture> = self
            .fixtures
            .iter()
            .filter(|f| f.involves(team_id))
            .filter(|f| !f.finished)
            .filter(|f| f.gameweek.map_or(true, |gw| gw >= self.current_gameweek))
            .cloned()
            .collect();
        fixtures.sort_by(play_order);
        TeamFixtureSchedule { team_id, fixtures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn team(id: u32) -> Team {
        Team {
            id,
            name: format!("Team {id}"),
            defence_home: 1100.0,
            defence_away: 1150.0,
        }
    }

    fn fixture(id: u32, gw: Option<u32>, home: u32, away: u32, finished: bool) -> Fixture {
        Fixture {
            id,
            gameweek: gw,
            kickoff: gw.map(|g| Utc.with_ymd_and_hms(2025, 8, g, 15, 0, 0).unwrap()),
            home_team: home,
            away_team: away,
            finished,
        }
    }

    #[test]
    fn rejects_unknown_team_in_fixture() {
        let err = LeagueSnapshot::new(vec![team(1), team(2)], vec![fixture(10, Some(1), 1, 3, false)], 1)
            .unwrap_err();
        assert_eq!(err, SnapshotError::UnknownTeam { fixture: 10, team: 3 });
    }

    #[test]
    fn rejects_empty_and_duplicate_teams() {
        assert_eq!(LeagueSnapshot::new(vec![], vec![], 1).unwrap_err(), SnapshotError::NoTeams);
        assert_eq!(
            LeagueSnapshot::new(vec![team(1), team(1)], vec![], 1).unwrap_err(),
            SnapshotError::DuplicateTeam(1)
        );
    }

    #[test]
    fn schedule_skips_finished_and_past_and_orders_unscheduled_last() {
        let fixtures = vec![
            fixture(1, Some(1), 1, 2, true),
            fixture(2, Some(4), 2, 1, false),
            fixture(3, None, 1, 3, false),
            fixture(4, Some(3), 3, 1, false),
            fixture(5, Some(2), 1, 3, false),
        ];
        let snapshot = LeagueSnapshot::new(vec![team(1), team(2), team(3)], fixtures, 3).unwrap();
        let ids: Vec<u32> = snapshot.schedule_for(1).fixtures.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![4, 2, 3]);
    }
}
