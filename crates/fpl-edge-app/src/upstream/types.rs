// Raw upstream records and their conversion into strict engine types.
//
// The provider sends most decimals as strings ("12.5", sometimes "12,5"),
// leaves numeric fields null, and omits whole blocks for unscheduled
// fixtures. Everything here is lenient; strictness starts at the engine
// boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use fpl_edge_core::signal::parse_decimal;
use fpl_edge_core::{
    Availability, AvailabilityStatus, Fixture, MatchHistoryEntry, Position, Signal, Team,
};

// ---------------------------------------------------------------------------
// Lenient decimals
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(f64),
    Str(String),
}

/// Accept a number, a decimal string or null.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<NumOrStr> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(NumOrStr::Num(v)) if v.is_finite() => Some(v),
        Some(NumOrStr::Num(_)) => None,
        Some(NumOrStr::Str(s)) => parse_decimal(&s).known(),
        None => None,
    })
}

/// Accept a value or null, with null reading as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Chance of playing as a whole percentage. Accepts integers, floats,
/// decimal strings or null; out-of-range values are clamped to [0, 100].
fn lenient_percent<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?.map(|v| v.round().clamp(0.0, 100.0) as u8))
}

// ---------------------------------------------------------------------------
// bootstrap-static
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBootstrap {
    #[serde(default)]
    pub elements: Vec<RawElement>,
    #[serde(default)]
    pub teams: Vec<RawTeam>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

impl RawBootstrap {
    /// Current gameweek: the event flagged current, else the next one, else
    /// the first listed, else 1.
    pub fn current_gameweek(&self) -> u32 {
        self.events
            .iter()
            .find(|e| e.is_current)
            .or_else(|| self.events.iter().find(|e| e.is_next))
            .or_else(|| self.events.first())
            .map(|e| e.id)
            .unwrap_or(1)
    }

    pub fn team_name(&self, id: u32) -> String {
        self.teams
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("Team {id}"))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawEvent {
    pub id: u32,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTeam {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub strength: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub strength_overall_home: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub strength_overall_away: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub strength_defence_home: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub strength_defence_away: Option<f64>,
}

impl RawTeam {
    pub fn to_team(&self) -> Team {
        Team {
            id: self.id,
            name: if self.name.is_empty() {
                format!("Team {}", self.id)
            } else {
                self.name.clone()
            },
            defence_home: Team::resolve_strength(
                self.strength_defence_home,
                self.strength_overall_home,
                self.strength,
            ),
            defence_away: Team::resolve_strength(
                self.strength_defence_away,
                self.strength_overall_away,
                self.strength,
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawElement {
    pub id: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub web_name: String,
    pub team: u32,
    pub element_type: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub now_cost: u32,
    /// Ownership percent; the provider sends a decimal string, sometimes a number.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub selected_by_percent: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_percent")]
    pub chance_of_playing_next_round: Option<u8>,
    /// Provider's own rolling form, used only for preselection.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub form: Option<f64>,
    /// Season minutes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub minutes: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transfers_in_event: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub transfers_out_event: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cost_change_event: i32,
}

impl RawElement {
    pub fn position(&self) -> Option<Position> {
        Position::from_element_type(self.element_type)
    }

    pub fn ownership(&self) -> Signal<f64> {
        self.selected_by_percent.into()
    }

    pub fn availability(&self) -> Availability {
        Availability {
            status: AvailabilityStatus::from_code(&self.status),
            chance_next_round: self.chance_of_playing_next_round,
        }
    }

    pub fn net_transfers(&self) -> i64 {
        self.transfers_in_event - self.transfers_out_event
    }
}

// ---------------------------------------------------------------------------
// fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawFixture {
    pub id: u32,
    #[serde(default)]
    pub event: Option<u32>,
    #[serde(default)]
    pub kickoff_time: Option<DateTime<Utc>>,
    pub team_h: u32,
    pub team_a: u32,
    #[serde(default)]
    pub finished: bool,
}

impl RawFixture {
    pub fn to_fixture(&self) -> Fixture {
        Fixture {
            id: self.id,
            gameweek: self.event,
            kickoff: self.kickoff_time,
            home_team: self.team_h,
            away_team: self.team_a,
            finished: self.finished,
        }
    }
}

// ---------------------------------------------------------------------------
// element-summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawElementSummary {
    #[serde(default)]
    pub history: Vec<RawHistoryEntry>,
}

impl RawElementSummary {
    pub fn to_history(&self) -> Vec<MatchHistoryEntry> {
        self.history.iter().map(RawHistoryEntry::to_entry).collect()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHistoryEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub minutes: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_points: i32,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_goals: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_assists: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub expected_goal_involvements: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub threat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub creativity: Option<f64>,
    #[serde(default)]
    pub was_home: bool,
    #[serde(default)]
    pub opponent_team: u32,
}

impl RawHistoryEntry {
    pub fn to_entry(&self) -> MatchHistoryEntry {
        MatchHistoryEntry {
            minutes: self.minutes,
            points: self.total_points,
            expected_goals: self.expected_goals,
            expected_assists: self.expected_assists,
            expected_goal_involvements: self.expected_goal_involvements,
            threat: self.threat.unwrap_or(0.0),
            creativity: self.creativity.unwrap_or(0.0),
            was_home: self.was_home,
            opponent_team: self.opponent_team,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_entry_accepts_string_decimals_and_nulls() {
        let json = r#"{
            "minutes": 90, "total_points": 7,
            "expected_goals": "0.45", "expected_assists": null,
            "threat": "31,0", "creativity": 12.5,
            "was_home": true, "opponent_team": 4
        }"#;
        let raw: RawHistoryEntry = serde_json::from_str(json).unwrap();
        let entry = raw.to_entry();
        assert_eq!(entry.expected_goals, Some(0.45));
        assert_eq!(entry.expected_assists, None);
        assert_eq!(entry.expected_goal_involvements, None);
        assert_eq!(entry.threat, 31.0);
        assert_eq!(entry.creativity, 12.5);
        assert!(entry.has_expected_data());
    }

    #[test]
    fn team_strength_falls_back() {
        let json = r#"{"id": 3, "name": "Chelsea", "strength": 4,
            "strength_overall_home": 1200, "strength_defence_away": 1300}"#;
        let team = serde_json::from_str::<RawTeam>(json).unwrap().to_team();
        assert_eq!(team.defence_home, 1200.0);
        assert_eq!(team.defence_away, 1300.0);
    }

    #[test]
    fn element_fields() {
        let json = r#"{"id": 9, "web_name": "Saka", "team": 1, "element_type": 3,
            "now_cost": 101, "selected_by_percent": "35,2", "status": "d",
            "chance_of_playing_next_round": 50, "form": "6.3", "minutes": 810,
            "transfers_in_event": 52000, "transfers_out_event": 4000,
            "cost_change_event": 1}"#;
        let el: RawElement = serde_json::from_str(json).unwrap();
        assert_eq!(el.position(), Some(Position::Midfielder));
        assert_eq!(el.ownership(), Signal::Known(35.2));
        assert_eq!(el.availability().status, AvailabilityStatus::Doubtful);
        assert_eq!(el.form, Some(6.3));
        assert_eq!(el.net_transfers(), 48_000);
    }

    #[test]
    fn element_accepts_numeric_ownership_and_nulls() {
        let json = r#"{"elements": [{"id": 4, "web_name": "Haaland", "team": 13,
            "element_type": 4, "now_cost": 145, "selected_by_percent": 35.2,
            "status": "a", "chance_of_playing_next_round": null, "form": 7,
            "minutes": null, "transfers_in_event": null, "transfers_out_event": 900,
            "cost_change_event": null}]}"#;
        let bootstrap: RawBootstrap = serde_json::from_str(json).unwrap();
        let el = &bootstrap.elements[0];
        assert_eq!(el.ownership(), Signal::Known(35.2));
        assert_eq!(el.chance_of_playing_next_round, None);
        assert_eq!(el.minutes, 0);
        assert_eq!(el.net_transfers(), -900);
        assert_eq!(el.cost_change_event, 0);
    }

    #[test]
    fn chance_of_playing_accepts_strings_and_floats() {
        let el: RawElement = serde_json::from_str(
            r#"{"id": 1, "team": 1, "element_type": 2, "chance_of_playing_next_round": "75"}"#,
        )
        .unwrap();
        assert_eq!(el.chance_of_playing_next_round, Some(75));
        let el: RawElement = serde_json::from_str(
            r#"{"id": 1, "team": 1, "element_type": 2, "chance_of_playing_next_round": 25.0}"#,
        )
        .unwrap();
        assert_eq!(el.chance_of_playing_next_round, Some(25));
        assert_eq!(el.ownership(), Signal::Unknown);
    }

    #[test]
    fn history_entry_tolerates_null_minutes() {
        let raw: RawHistoryEntry =
            serde_json::from_str(r#"{"minutes": null, "total_points": null}"#).unwrap();
        assert_eq!(raw.to_entry().minutes, 0);
        assert_eq!(raw.to_entry().points, 0);
    }

    #[test]
    fn current_gameweek_selection() {
        let mut bootstrap = RawBootstrap::default();
        assert_eq!(bootstrap.current_gameweek(), 1);
        bootstrap.events = vec![
            RawEvent { id: 1, is_current: false, is_next: false },
            RawEvent { id: 2, is_current: false, is_next: true },
        ];
        assert_eq!(bootstrap.current_gameweek(), 2);
        bootstrap.events[0].is_current = true;
        assert_eq!(bootstrap.current_gameweek(), 1);
    }

    #[test]
    fn unscheduled_fixture_parses() {
        let json = r#"{"id": 300, "event": null, "kickoff_time": null,
            "team_h": 1, "team_a": 2, "finished": false}"#;
        let fixture = serde_json::from_str::<RawFixture>(json).unwrap().to_fixture();
        assert_eq!(fixture.gameweek, None);
        assert_eq!(fixture.kickoff, None);
    }
}
