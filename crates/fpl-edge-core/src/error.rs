// Engine error types.
//
// Missing or partial inputs never produce an error; these cover genuinely
// required inputs and structurally broken snapshots only.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("no captaincy candidates supplied")]
    NoCandidates,

    #[error("squad needs at least {needed} known players, got {found}")]
    SquadTooSmall { needed: usize, found: usize },
}

#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("snapshot contains no teams")]
    NoTeams,

    #[error("duplicate team id {0}")]
    DuplicateTeam(u32),

    #[error("fixture {fixture} references unknown team {team}")]
    UnknownTeam { fixture: u32, team: u32 },

    #[error("fixture {0} pairs a team with itself")]
    SelfFixture(u32),

    #[error("team {team} has a non-finite defence strength")]
    NonFiniteStrength { team: u32 },
}
