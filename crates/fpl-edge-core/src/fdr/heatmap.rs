// Per-round fixture difficulty grid, one row per team.

use serde::{Deserialize, Serialize};

use crate::fdr::{fixture_fdr, FdrParams, NEUTRAL_FDR};
use crate::signal::{round_to, Signal};
use crate::snapshot::{play_order, LeagueSnapshot};

pub const MIN_HORIZON: u32 = 1;
pub const MAX_HORIZON: u32 = 10;

/// One team's fixture in one round. Blank rounds carry no opponent and an
/// unknown rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub gameweek: u32,
    pub opponent_id: Option<u32>,
    pub opponent_name: Option<String>,
    pub is_home: Option<bool>,
    pub fdr: Signal<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub team_id: u32,
    pub team_name: String,
    pub cells: Vec<HeatmapCell>,
    /// Mean rating across the horizon, blank rounds counted as 3.
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureHeatmap {
    pub current_gameweek: u32,
    pub horizon: u32,
    pub rows: Vec<HeatmapRow>,
}

/// Build the heatmap for rounds `[current, current + horizon)`.
///
/// The horizon is clamped to [1, 10]. When a team plays twice in a round
/// the earlier fixture fills the cell. Rows are sorted easiest first, ties
/// by team id.
pub fn fixture_heatmap(snapshot: &LeagueSnapshot, horizon: u32, params: &FdrParams) -> FixtureHeatmap {
    let horizon = horizon.clamp(MIN_HORIZON, MAX_HORIZON);
    let current = snapshot.current_gameweek();

    let mut upcoming: Vec<_> = snapshot
        .fixtures()
        .iter()
        .filter(|f| !f.finished)
        .filter(|f| f.gameweek.is_some_and(|gw| gw >= current && gw < current + horizon))
        .collect();
    upcoming.sort_by(|a, b| play_order(a, b));

    let mut rows: Vec<HeatmapRow> = snapshot
        .teams()
        .iter()
        .map(|team| {
            let cells: Vec<HeatmapCell> = (current..current + horizon)
                .map(|gw| {
                    let fixture = upcoming
                        .iter()
                        .find(|f| f.gameweek == Some(gw) && f.involves(team.id));
                    match fixture.and_then(|f| f.opponent_of(team.id).map(|o| (f, o))) {
                        Some((f, (opponent_id, is_home))) => HeatmapCell {
                            gameweek: gw,
                            opponent_id: Some(opponent_id),
                            opponent_name: snapshot.team(opponent_id).map(|t| t.name.clone()),
                            is_home: Some(is_home),
                            fdr: Signal::Known(fixture_fdr(snapshot, team.id, f, params)),
                        },
                        None => HeatmapCell {
                            gameweek: gw,
                            opponent_id: None,
                            opponent_name: None,
                            is_home: None,
                            fdr: Signal::Unknown,
                        },
                    }
                })
                .collect();

            let total: f64 = cells.iter().map(|c| c.fdr.or(NEUTRAL_FDR)).sum();
            let average = round_to(total / cells.len() as f64, 1);

            HeatmapRow {
                team_id: team.id,
                team_name: team.name.clone(),
                cells,
                average,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.average
            .partial_cmp(&b.average)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.team_id.cmp(&b.team_id))
    });

    FixtureHeatmap {
        current_gameweek: current,
        horizon,
        rows,
    }
}
