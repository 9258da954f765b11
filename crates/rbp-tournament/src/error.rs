use rbp_auth::AdjustChipsError;
use rbp_records::RegistrationError;

/// Failure mode of any Tournament Coordinator operation (spec.md §4.4).
#[derive(Debug)]
pub enum TournamentError {
    /// The per-tournament lock could not be acquired within the wait
    /// budget -- the caller should retry, not treat this as a permanent
    /// rejection (spec.md §5 "distributed lock... TTL ~30s").
    LockTimeout,
    NotFound,
    /// Raised by `Cancel` when the requester isn't the tournament's
    /// creator (spec.md §4.4 "Cancel (creator only...)").
    Forbidden,
    InvalidState(&'static str),
    Registration(RegistrationError),
    Chips(AdjustChipsError),
    Database(tokio_postgres::Error),
    /// A table-hosting failure from `Casino::create_tournament_table` --
    /// always an outage/bug, not a typed condition a caller branches on
    /// (SPEC_FULL.md §7).
    Hosting(anyhow::Error),
}

impl From<tokio_postgres::Error> for TournamentError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::Database(err)
    }
}

impl From<RegistrationError> for TournamentError {
    fn from(err: RegistrationError) -> Self {
        Self::Registration(err)
    }
}

impl From<AdjustChipsError> for TournamentError {
    fn from(err: AdjustChipsError) -> Self {
        Self::Chips(err)
    }
}

impl From<anyhow::Error> for TournamentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Hosting(err)
    }
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::LockTimeout => write!(f, "could not acquire tournament lock in time"),
            Self::NotFound => write!(f, "tournament not found"),
            Self::Forbidden => write!(f, "only the tournament's creator may perform this operation"),
            Self::InvalidState(reason) => write!(f, "{reason}"),
            Self::Registration(e) => write!(f, "{e}"),
            Self::Chips(e) => write!(f, "{e}"),
            Self::Database(e) => write!(f, "database error: {e}"),
            Self::Hosting(e) => write!(f, "hosting error: {e}"),
        }
    }
}
impl std::error::Error for TournamentError {}
