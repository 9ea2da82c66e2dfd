// Core domain records: positions, availability, teams, fixtures, match
// history and the per-player signal bundle produced each ingestion cycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::signal::Signal;

/// Flat strength used when a team carries no usable rating at all.
pub const NEUTRAL_STRENGTH: f64 = 3.0;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Squad positions under the single scoring ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "DEF")]
    Defender,
    #[serde(rename = "MID")]
    Midfielder,
    #[serde(rename = "FWD")]
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Map the upstream numeric element type (1-4) to a position.
    pub fn from_element_type(element_type: u8) -> Option<Self> {
        match element_type {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    /// Parse a position string. Accepts abbreviations ("GK", "GKP", "DEF",
    /// "MID", "FWD") and full names ("Goalkeeper", "forward", ...).
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "GKP" | "GOALKEEPER" => Some(Position::Goalkeeper),
            "DEF" | "DEFENDER" => Some(Position::Defender),
            "MID" | "MIDFIELDER" => Some(Position::Midfielder),
            "FWD" | "FW" | "FORWARD" => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Upstream availability status for the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Doubtful,
    Injured,
    Suspended,
    Unavailable,
}

impl AvailabilityStatus {
    /// Parse the single-letter upstream status code. Unknown codes are
    /// treated as available.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "d" => AvailabilityStatus::Doubtful,
            "i" => AvailabilityStatus::Injured,
            "s" => AvailabilityStatus::Suspended,
            "n" | "u" => AvailabilityStatus::Unavailable,
            _ => AvailabilityStatus::Available,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Availability {
    pub status: AvailabilityStatus,
    /// Chance of playing next round in percent, when the provider sets one.
    pub chance_next_round: Option<u8>,
}

// ---------------------------------------------------------------------------
// Teams and fixtures
// ---------------------------------------------------------------------------

/// A team with its home and away defensive strength already resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub defence_home: f64,
    pub defence_away: f64,
}

impl Team {
    /// Resolve one defensive context: specific defence rating, then the
    /// overall rating for the same context, then the flat team strength,
    /// then `NEUTRAL_STRENGTH`. Non-finite values are skipped.
    pub fn resolve_strength(defence: Option<f64>, overall: Option<f64>, flat: Option<f64>) -> f64 {
        [defence, overall, flat]
            .into_iter()
            .flatten()
            .find(|v| v.is_finite())
            .unwrap_or(NEUTRAL_STRENGTH)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u32,
    /// Gameweek the fixture belongs to. `None` for unscheduled fixtures.
    pub gameweek: Option<u32>,
    pub kickoff: Option<DateTime<Utc>>,
    pub home_team: u32,
    pub away_team: u32,
    pub finished: bool,
}

impl Fixture {
    pub fn involves(&self, team_id: u32) -> bool {
        self.home_team == team_id || self.away_team == team_id
    }

    /// The opponent of `team_id` and whether `team_id` plays at home.
    pub fn opponent_of(&self, team_id: u32) -> Option<(u32, bool)> {
        if self.home_team == team_id {
            Some((self.away_team, true))
        } else if self.away_team == team_id {
            Some((self.home_team, false))
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Match history
// ---------------------------------------------------------------------------

/// One past appearance (or non-appearance) for a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MatchHistoryEntry {
    pub minutes: u32,
    pub points: i32,
    pub expected_goals: Option<f64>,
    pub expected_assists: Option<f64>,
    pub expected_goal_involvements: Option<f64>,
    /// Attacking threat index, used only for the proxy xG rate.
    pub threat: f64,
    /// Chance-creation index, used only for the proxy xA rate.
    pub creativity: f64,
    pub was_home: bool,
    pub opponent_team: u32,
}

impl MatchHistoryEntry {
    pub fn played(&self) -> bool {
        self.minutes > 0
    }

    pub fn has_expected_data(&self) -> bool {
        self.expected_goals.is_some()
            || self.expected_assists.is_some()
            || self.expected_goal_involvements.is_some()
    }

    /// Expected involvements for this match, falling back to xG + xA.
    pub fn expected_involvements(&self) -> f64 {
        self.expected_goal_involvements.unwrap_or_else(|| {
            self.expected_goals.unwrap_or(0.0) + self.expected_assists.unwrap_or(0.0)
        })
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Where the xG/xA rates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum XgSource {
    /// Genuine expected-goals data.
    Direct,
    /// Derived from the threat/creativity indices.
    Proxy,
    /// No played minutes in the window.
    #[default]
    None,
}

/// Per-90 expected goal rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct XgiRates {
    pub xg90: Signal<f64>,
    pub xa90: Signal<f64>,
    pub xgi90: Signal<f64>,
    pub source: XgSource,
}

/// Derived signals, rebuilt wholesale each ingestion cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PlayerSignals {
    /// 0-100.
    pub form: f64,
    /// 0.0-1.0, higher is safer.
    pub minutes_risk: f64,
    /// 1.0-5.0 in half steps.
    pub fdr_attack_next3: Signal<f64>,
    pub xgi: XgiRates,
    /// Net transfers this gameweek per 1,000 managers.
    pub momentum: f64,
    /// Price movement this gameweek in tenths.
    pub price_change_event: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub team_id: u32,
    pub team_name: String,
    pub position: Position,
    /// Price in tenths of a million (55 = 5.5).
    pub price_tenths: u32,
    /// Ownership percentage.
    pub ownership: Signal<f64>,
    pub availability: Availability,
    pub signals: PlayerSignals,
}

impl Player {
    /// Price in millions.
    pub fn price(&self) -> f64 {
        self.price_tenths as f64 / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_parsing_accepts_names_and_codes() {
        assert_eq!(Position::from_str_pos("Forward"), Some(Position::Forward));
        assert_eq!(Position::from_str_pos("gkp"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_str_pos("MID"), Some(Position::Midfielder));
        assert_eq!(Position::from_str_pos("winger"), None);
        assert_eq!(Position::from_element_type(2), Some(Position::Defender));
        assert_eq!(Position::from_element_type(9), None);
    }

    #[test]
    fn strength_fallback_chain() {
        assert_eq!(Team::resolve_strength(Some(1200.0), Some(1100.0), Some(4.0)), 1200.0);
        assert_eq!(Team::resolve_strength(None, Some(1100.0), Some(4.0)), 1100.0);
        assert_eq!(Team::resolve_strength(Some(f64::NAN), None, Some(4.0)), 4.0);
        assert_eq!(Team::resolve_strength(None, None, None), NEUTRAL_STRENGTH);
    }

    #[test]
    fn opponent_lookup() {
        let f = Fixture {
            id: 1,
            gameweek: Some(3),
            kickoff: None,
            home_team: 7,
            away_team: 9,
            finished: false,
        };
        assert_eq!(f.opponent_of(7), Some((9, true)));
        assert_eq!(f.opponent_of(9), Some((7, false)));
        assert_eq!(f.opponent_of(1), None);
    }

    #[test]
    fn involvement_falls_back_to_goals_plus_assists() {
        let entry = MatchHistoryEntry {
            minutes: 90,
            expected_goals: Some(0.3),
            expected_assists: Some(0.1),
            ..Default::default()
        };
        assert!((entry.expected_involvements() - 0.4).abs() < 1e-12);
        assert!(entry.has_expected_data());
        assert!(!MatchHistoryEntry::default().has_expected_data());
    }

    #[test]
    fn status_codes() {
        assert_eq!(AvailabilityStatus::from_code("i"), AvailabilityStatus::Injured);
        assert_eq!(AvailabilityStatus::from_code("u"), AvailabilityStatus::Unavailable);
        assert_eq!(AvailabilityStatus::from_code("?"), AvailabilityStatus::Available);
    }
}
