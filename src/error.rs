use thiserror::Error;

pub type Result<T> = std::result::Result<T, FplError>;

/// Errors surfaced by the analysis operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FplError {
    /// The upstream data source failed or timed out.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// Fuzzy name resolution found nobody.
    #[error("no player found matching '{0}'")]
    PlayerNotFound(String),

    /// The pool cannot fill a legal 15-man squad.
    #[error("not enough eligible players to form a full squad ({admitted}/{required})")]
    InsufficientPlayerPool { admitted: usize, required: usize },

    /// No affordable, club-legal, same-position candidate exists for this player.
    #[error("no legal replacement for player {player_id}")]
    NoLegalReplacement { player_id: u32 },

    #[error("unknown position '{0}', use GKP/DEF/MID/FWD")]
    UnknownPosition(String),

    #[error("no manager team linked (set FPL_TEAM_ID)")]
    TeamNotLinked,

    #[error("could not determine the current gameweek")]
    NoCurrentGameweek,
}

impl FplError {
    pub(crate) fn unavailable(err: anyhow::Error) -> Self {
        FplError::DataUnavailable(format!("{err:#}"))
    }
}
