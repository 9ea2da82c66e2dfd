// Library root for the scoring and valuation engine. Everything here is
// synchronous and pure over a validated `LeagueSnapshot`; tunables travel as
// per-call parameter structs.

pub mod error;
pub mod fdr;
pub mod market;
pub mod model;
pub mod normalizer;
pub mod ranking;
pub mod signal;
pub mod simulator;
pub mod snapshot;
pub mod squad;
pub mod valuation;

pub use error::{EngineError, SnapshotError};
pub use model::{
    Availability, AvailabilityStatus, Fixture, MatchHistoryEntry, Player, PlayerSignals, Position,
    Team, XgSource, XgiRates,
};
pub use signal::Signal;
pub use snapshot::{LeagueSnapshot, TeamFixtureSchedule};
