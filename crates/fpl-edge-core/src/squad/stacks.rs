// Team stacks and the ownership template.
//
// A stack is two or more players from one club. In-form attacks with kind
// fixtures are worth doubling up on; defences facing hard fixtures are not.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fdr::NEUTRAL_FDR;
use crate::model::{Player, Position};
use crate::ranking::tie_break;
use crate::signal::round_to;

pub const MAX_STACKS: usize = 50;
pub const MAX_TEMPLATE: usize = 50;

const ATTACKERS_AVERAGED: usize = 3;
const SAMPLE_PLAYERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackParams {
    /// Average form of a club's top three attackers needed for a double-up.
    pub min_form_avg: f64,
    pub max_attack_fdr: f64,
    /// Fixture difficulty at which a defensive double is advised against.
    pub min_defence_fdr: f64,
    /// Clamped to [1, 50].
    pub limit: usize,
}

impl Default for StackParams {
    fn default() -> Self {
        Self {
            min_form_avg: 60.0,
            max_attack_fdr: 3.2,
            min_defence_fdr: 3.5,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackKind {
    /// Double up on this club's attack.
    Attack,
    /// Avoid doubling up on this club's defence.
    AvoidDefence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackPlayer {
    pub player_id: u32,
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSuggestion {
    pub kind: StackKind,
    pub team_id: u32,
    pub team_name: String,
    /// Rounded average form of the top three attackers; 0 without any.
    pub form_avg: f64,
    /// Club attack FDR over the next fixtures, 1 decimal.
    pub fdr: f64,
    pub players: Vec<StackPlayer>,
}

fn by_form(a: &Player, b: &Player) -> Ordering {
    b.signals
        .form
        .partial_cmp(&a.signals.form)
        .unwrap_or(Ordering::Equal)
        .then_with(|| tie_break(a, b))
}

fn sample(players: &[&Player]) -> Vec<StackPlayer> {
    players
        .iter()
        .take(SAMPLE_PLAYERS)
        .map(|p| StackPlayer {
            player_id: p.id,
            name: p.name.clone(),
            position: p.position,
        })
        .collect()
}

/// Attack stacks first by form average, then defences to avoid by
/// difficulty. Clubs are grouped by team id.
pub fn team_stacks(pool: &[Player], params: &StackParams) -> Vec<StackSuggestion> {
    let mut clubs: BTreeMap<u32, Vec<&Player>> = BTreeMap::new();
    for p in pool {
        clubs.entry(p.team_id).or_default().push(p);
    }

    let mut suggestions = Vec::new();
    for (team_id, players) in clubs {
        let Some(first) = players.first() else {
            continue;
        };
        let team_name = first.team_name.clone();
        let fdr = round_to(first.signals.fdr_attack_next3.or(NEUTRAL_FDR), 1);

        let mut attackers: Vec<&Player> = players
            .iter()
            .filter(|p| matches!(p.position, Position::Midfielder | Position::Forward))
            .copied()
            .collect();
        attackers.sort_by(|a, b| by_form(a, b));
        attackers.truncate(ATTACKERS_AVERAGED);
        let form_avg = if attackers.is_empty() {
            0.0
        } else {
            (attackers.iter().map(|p| p.signals.form).sum::<f64>() / attackers.len() as f64).round()
        };

        if form_avg >= params.min_form_avg && fdr <= params.max_attack_fdr {
            suggestions.push(StackSuggestion {
                kind: StackKind::Attack,
                team_id,
                team_name: team_name.clone(),
                form_avg,
                fdr,
                players: sample(&attackers),
            });
        }

        if fdr >= params.min_defence_fdr {
            let mut defenders: Vec<&Player> = players
                .iter()
                .filter(|p| matches!(p.position, Position::Goalkeeper | Position::Defender))
                .copied()
                .collect();
            defenders.sort_by(|a, b| by_form(a, b));
            if defenders.len() >= SAMPLE_PLAYERS {
                suggestions.push(StackSuggestion {
                    kind: StackKind::AvoidDefence,
                    team_id,
                    team_name,
                    form_avg,
                    fdr,
                    players: sample(&defenders),
                });
            }
        }
    }

    suggestions.sort_by(|a, b| {
        let rank = |s: &StackSuggestion| match s.kind {
            StackKind::Attack => (0, -s.form_avg),
            StackKind::AvoidDefence => (1, -s.fdr),
        };
        let (a_kind, a_key) = rank(a);
        let (b_kind, b_key) = rank(b);
        a_kind
            .cmp(&b_kind)
            .then_with(|| a_key.partial_cmp(&b_key).unwrap_or(Ordering::Equal))
            .then_with(|| a.team_id.cmp(&b.team_id))
    });
    suggestions.truncate(params.limit.clamp(1, MAX_STACKS));
    suggestions
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePlayer {
    pub player_id: u32,
    pub name: String,
    pub team_name: String,
    pub position: Position,
    /// Unknown ownership counts as 0.
    pub ownership: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateGap {
    /// Most-owned players, highest first.
    pub template: Vec<TemplatePlayer>,
    /// Template players not in `owned`; the whole template when nothing is
    /// owned.
    pub missing: Vec<TemplatePlayer>,
}

/// The `limit` most-owned players (clamped to [1, 50]) and which of them
/// the squad lacks.
pub fn template_gap(pool: &[Player], owned: &[u32], limit: usize) -> TemplateGap {
    let mut players: Vec<&Player> = pool.iter().collect();
    players.sort_by(|a, b| {
        b.ownership
            .or(0.0)
            .partial_cmp(&a.ownership.or(0.0))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    players.truncate(limit.clamp(1, MAX_TEMPLATE));

    let template: Vec<TemplatePlayer> = players
        .iter()
        .map(|p| TemplatePlayer {
            player_id: p.id,
            name: p.name.clone(),
            team_name: p.team_name.clone(),
            position: p.position,
            ownership: p.ownership.or(0.0),
        })
        .collect();
    let missing = template
        .iter()
        .filter(|t| !owned.contains(&t.player_id))
        .cloned()
        .collect();

    TemplateGap { template, missing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::test_support::{player, with_signals};
    use crate::signal::Signal;

    fn club(team_id: u32, name: &str, first_id: u32, forms: &[f64], fdr: f64) -> Vec<Player> {
        // two keepers/defenders, then attackers with the given forms
        let mut out = Vec::new();
        for i in 0..2 {
            let mut p = with_signals(player(first_id + i, Position::Defender, 50), 40.0, 0.9, 0.1, Some(fdr));
            p.team_id = team_id;
            p.team_name = name.into();
            out.push(p);
        }
        for (i, form) in forms.iter().enumerate() {
            let mut p = with_signals(
                player(first_id + 2 + i as u32, Position::Midfielder, 70),
                *form,
                0.9,
                0.3,
                Some(fdr),
            );
            p.team_id = team_id;
            p.team_name = name.into();
            out.push(p);
        }
        out
    }

    #[test]
    fn attack_and_avoid_suggestions() {
        let mut pool = club(1, "Reds", 1, &[80.0, 70.0, 61.0, 10.0], 2.5);
        pool.extend(club(2, "Blues", 20, &[90.0, 90.0, 90.0], 3.8));
        pool.extend(club(3, "Greens", 40, &[75.0, 75.0, 70.0], 3.0));

        let stacks = team_stacks(&pool, &StackParams::default());
        let summary: Vec<(StackKind, u32)> = stacks.iter().map(|s| (s.kind, s.team_id)).collect();
        assert_eq!(
            summary,
            vec![
                (StackKind::Attack, 3),
                (StackKind::Attack, 1),
                (StackKind::AvoidDefence, 2),
            ]
        );

        // (80 + 70 + 61) / 3 = 70.33
        let reds = &stacks[1];
        assert_eq!(reds.form_avg, 70.0);
        assert_eq!(reds.fdr, 2.5);
        assert_eq!(
            reds.players.iter().map(|p| p.player_id).collect::<Vec<_>>(),
            vec![3, 4]
        );
        assert!(stacks[2]
            .players
            .iter()
            .all(|p| p.position == Position::Defender));
    }

    #[test]
    fn unknown_fdr_is_neutral_and_limit_is_clamped() {
        let mut pool = club(1, "Reds", 1, &[80.0, 80.0], 3.0);
        for p in &mut pool {
            p.signals.fdr_attack_next3 = Signal::Unknown;
        }
        let stacks = team_stacks(&pool, &StackParams { limit: 0, ..Default::default() });
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].fdr, 3.0);
        assert_eq!(stacks[0].kind, StackKind::Attack);
    }

    #[test]
    fn template_and_missing() {
        let mut pool: Vec<Player> = (1..=5).map(|id| player(id, Position::Forward, 80)).collect();
        for (p, own) in pool.iter_mut().zip([5.0, 40.0, 25.0, 60.0, 1.0]) {
            p.ownership = Signal::Known(own);
        }
        pool[4].ownership = Signal::Unknown;

        let gap = template_gap(&pool, &[4], 3);
        let ids = |v: &[TemplatePlayer]| v.iter().map(|t| t.player_id).collect::<Vec<_>>();
        assert_eq!(ids(&gap.template), vec![4, 2, 3]);
        assert_eq!(ids(&gap.missing), vec![2, 3]);

        let all = template_gap(&pool, &[], 100);
        assert_eq!(all.template.len(), 5);
        assert_eq!(all.missing, all.template);
        assert_eq!(all.template[4].ownership, 0.0);
    }
}
