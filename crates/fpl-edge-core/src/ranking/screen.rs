// Screening with a relaxation ladder.
//
// A screen applies a `PlayerFilter` to the (position-scoped) pool. When
// nothing survives and relaxation is enabled, the filters are loosened one
// fixed step at a time, each step keeping the earlier ones, until at least
// one player survives. The final step drops every filter, so the result is
// only empty when the position-scoped pool is.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Player;
use crate::ranking::{tie_break, PlayerFilter};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// Form points removed from the floor by the form step.
const FORM_RELAX_STEP: f64 = 5.0;
/// Ownership ceiling (percent) the ownership step raises to.
const RELAXED_OWNERSHIP_CEILING: f64 = 40.0;
/// Minutes-risk floor the minutes step lowers to.
const RELAXED_MINUTES_FLOOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenSort {
    /// Form descending.
    #[default]
    Form,
    /// Headline FDR ascending, unknown last.
    Fdr,
    /// Minutes risk descending.
    MinutesRisk,
    /// Ownership ascending, unknown last.
    Ownership,
}

impl ScreenSort {
    pub fn compare(&self, a: &Player, b: &Player) -> Ordering {
        let primary = match self {
            ScreenSort::Form => b
                .signals
                .form
                .partial_cmp(&a.signals.form)
                .unwrap_or(Ordering::Equal),
            ScreenSort::Fdr => {
                let fdr = |p: &Player| p.signals.fdr_attack_next3.or(f64::INFINITY);
                fdr(a).partial_cmp(&fdr(b)).unwrap_or(Ordering::Equal)
            }
            ScreenSort::MinutesRisk => b
                .signals
                .minutes_risk
                .partial_cmp(&a.signals.minutes_risk)
                .unwrap_or(Ordering::Equal),
            ScreenSort::Ownership => {
                let own = |p: &Player| p.ownership.or(f64::INFINITY);
                own(a).partial_cmp(&own(b)).unwrap_or(Ordering::Equal)
            }
        };
        primary.then_with(|| tie_break(a, b))
    }
}

/// One point on the relaxation ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenStage {
    AsRequested,
    DropFdr,
    LowerFormFloor,
    RaiseOwnershipCeiling,
    LowerMinutesRiskFloor,
    Unfiltered,
}

impl ScreenStage {
    /// Relaxation steps in the order they are applied.
    pub const LADDER: [ScreenStage; 5] = [
        ScreenStage::DropFdr,
        ScreenStage::LowerFormFloor,
        ScreenStage::RaiseOwnershipCeiling,
        ScreenStage::LowerMinutesRiskFloor,
        ScreenStage::Unfiltered,
    ];

    /// Loosen `filter` for this step. `Unfiltered` is handled by the caller.
    fn relax(&self, filter: &mut PlayerFilter) {
        match self {
            ScreenStage::AsRequested | ScreenStage::Unfiltered => {}
            ScreenStage::DropFdr => filter.max_fdr = None,
            ScreenStage::LowerFormFloor => {
                filter.min_form = filter.min_form.map(|f| (f - FORM_RELAX_STEP).max(0.0));
            }
            ScreenStage::RaiseOwnershipCeiling => {
                filter.max_ownership = filter
                    .max_ownership
                    .map(|own| own.max(RELAXED_OWNERSHIP_CEILING));
            }
            ScreenStage::LowerMinutesRiskFloor => {
                filter.min_minutes_risk = filter
                    .min_minutes_risk
                    .map(|r| r.min(RELAXED_MINUTES_FLOOR));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    pub stage: ScreenStage,
    pub survivors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenCriteria {
    pub filter: PlayerFilter,
    pub sort: ScreenSort,
    /// Clamped to [1, 100].
    pub limit: usize,
    /// Walk the relaxation ladder when the requested filters leave nothing.
    pub relax: bool,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            filter: PlayerFilter::default(),
            sort: ScreenSort::default(),
            limit: DEFAULT_LIMIT,
            relax: true,
        }
    }
}

impl ScreenCriteria {
    /// Typical differential screen: low ownership, good form, kind fixtures
    /// and a regular starter.
    pub fn differentials() -> Self {
        Self {
            filter: PlayerFilter {
                max_ownership: Some(15.0),
                min_form: Some(60.0),
                max_fdr: Some(3.8),
                min_minutes_risk: Some(0.6),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenOutcome {
    pub players: Vec<Player>,
    /// Size of the position-scoped pool.
    pub pool_size: usize,
    /// Relaxation steps that were needed, in order.
    pub steps_applied: Vec<ScreenStage>,
    /// Survivors at each stage tried, starting with `AsRequested`.
    pub stage_counts: Vec<StageCount>,
}

fn sorted_top(mut players: Vec<&Player>, sort: ScreenSort, limit: usize) -> Vec<Player> {
    players.sort_by(|a, b| sort.compare(a, b));
    players.into_iter().take(limit).cloned().collect()
}

/// Screen the pool with the criteria, relaxing when needed.
pub fn screen_players(pool: &[Player], criteria: &ScreenCriteria) -> ScreenOutcome {
    let limit = criteria.limit.clamp(1, MAX_LIMIT);
    let scoped: Vec<&Player> = pool
        .iter()
        .filter(|p| criteria.filter.passes_position(p))
        .collect();

    let mut filter = criteria.filter.clone();
    let mut survivors: Vec<&Player> = scoped.iter().copied().filter(|p| filter.matches(p)).collect();
    let mut stage_counts = vec![StageCount {
        stage: ScreenStage::AsRequested,
        survivors: survivors.len(),
    }];
    let mut steps_applied = Vec::new();

    if criteria.relax {
        for stage in ScreenStage::LADDER {
            if !survivors.is_empty() {
                break;
            }
            if stage == ScreenStage::Unfiltered {
                survivors = scoped.clone();
            } else {
                stage.relax(&mut filter);
                survivors = scoped.iter().copied().filter(|p| filter.matches(p)).collect();
            }
            debug!(?stage, survivors = survivors.len(), "screen relaxed");
            steps_applied.push(stage);
            stage_counts.push(StageCount {
                stage,
                survivors: survivors.len(),
            });
        }
    }

    ScreenOutcome {
        players: sorted_top(survivors, criteria.sort, limit),
        pool_size: scoped.len(),
        steps_applied,
        stage_counts,
    }
}
