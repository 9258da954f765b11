use rbp_auth::AdjustChipsError;

/// Failure mode of any Matchmaking Queue operation (spec.md §4.5).
#[derive(Debug)]
pub enum MatchmakingError {
    /// `queue_type` isn't one of the modes this process matches.
    UnknownQueue,
    /// The per-queue lock could not be acquired within the wait budget.
    LockTimeout,
    /// spec.md §4.5 "reject if user already in any queue or seated at an
    /// active cash table".
    AlreadyQueued,
    SeatedElsewhere,
    NotQueued,
    Chips(AdjustChipsError),
    Database(tokio_postgres::Error),
    /// A table-hosting failure from `Casino::create_table` -- always an
    /// outage/bug, not a typed condition a caller branches on (SPEC_FULL.md
    /// §7).
    Hosting(anyhow::Error),
}

impl From<tokio_postgres::Error> for MatchmakingError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::Database(err)
    }
}

impl From<AdjustChipsError> for MatchmakingError {
    fn from(err: AdjustChipsError) -> Self {
        Self::Chips(err)
    }
}

impl From<anyhow::Error> for MatchmakingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Hosting(err)
    }
}

impl std::fmt::Display for MatchmakingError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::UnknownQueue => write!(f, "unrecognized queue type"),
            Self::LockTimeout => write!(f, "could not acquire queue lock in time"),
            Self::AlreadyQueued => write!(f, "already queued for a match"),
            Self::SeatedElsewhere => write!(f, "already seated at an active cash table"),
            Self::NotQueued => write!(f, "not currently queued"),
            Self::Chips(e) => write!(f, "{e}"),
            Self::Database(e) => write!(f, "database error: {e}"),
            Self::Hosting(e) => write!(f, "hosting error: {e}"),
        }
    }
}
impl std::error::Error for MatchmakingError {}
