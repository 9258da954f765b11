use super::*;
use rbp_core::Chips;
use rbp_core::ID;
use rbp_core::Unique;
use rbp_pg::*;
use std::sync::Arc;
use tokio_postgres::Client;

/// Repository trait for authentication database operations.
/// Abstracts SQL from domain modules.
#[allow(async_fn_in_trait)]
pub trait AuthRepository {
    async fn signin(&self, session: &Session) -> Result<(), PgErr>;
    async fn revoke(&self, session: ID<Session>) -> Result<(), PgErr>;
    async fn exists(&self, username: &str, email: &str) -> Result<bool, PgErr>;
    async fn create(&self, member: &Member, hashword: &str) -> Result<(), PgErr>;
    async fn lookup(&self, username: &str) -> Result<Option<(Member, String)>, PgErr>;
    /// Looks a member up by id, without their password hash. Used by the
    /// Tournament Coordinator and Matchmaking Queue to resolve a display
    /// name when seating a player SB never authenticated directly.
    async fn find(&self, user: ID<Member>) -> Result<Option<Member>, PgErr>;
    async fn balance(&self, user: ID<Member>) -> Result<Chips, PgErr>;
    /// Applies `delta` to `user`'s chip balance inside a row-locked
    /// transaction (`SELECT ... FOR UPDATE`), rejecting a debit that would
    /// take the balance negative. Used for buy-ins, cash-outs, prize
    /// payouts, and refunds -- every currency-moving path in the platform
    /// (spec.md §5 "currency transfers... are atomic").
    async fn adjust_chips(&self, user: ID<Member>, delta: Chips) -> Result<Chips, AdjustChipsError>;
    /// Atomically moves `amount` from `from` to `to`. Both balances are
    /// locked in one transaction; either both legs apply or neither does.
    async fn transfer_chips(&self, from: ID<Member>, to: ID<Member>, amount: Chips) -> Result<(), AdjustChipsError>;
}

/// Failure mode of a chip-balance mutation.
#[derive(Debug)]
pub enum AdjustChipsError {
    Insufficient,
    Database(PgErr),
}

impl From<PgErr> for AdjustChipsError {
    fn from(err: PgErr) -> Self {
        Self::Database(err)
    }
}

impl std::fmt::Display for AdjustChipsError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Insufficient => write!(f, "insufficient chip balance for this transfer"),
            Self::Database(e) => write!(f, "database error: {e}"),
        }
    }
}
impl std::error::Error for AdjustChipsError {}

impl AuthRepository for Arc<Client> {
    async fn exists(&self, username: &str, email: &str) -> Result<bool, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT 1 FROM ",
                USERS,
                " WHERE username = $1 OR email = $2"
            ),
            &[&username, &email],
        )
        .await
        .map(|opt| opt.is_some())
    }

    async fn create(&self, member: &Member, hashword: &str) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                USERS,
                " (id, username, email, hashword, chips) VALUES ($1, $2, $3, $4, $5)"
            ),
            &[
                &member.id().inner(),
                &member.username(),
                &member.email(),
                &hashword,
                &member.chips(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn lookup(&self, username: &str) -> Result<Option<(Member, String)>, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT id, username, email, hashword, chips FROM ",
                USERS,
                " WHERE username = $1"
            ),
            &[&username],
        )
        .await
        .map(|opt| {
            opt.map(|row| {
                (
                    Member::new(
                        ID::from(row.get::<_, uuid::Uuid>(0)),
                        row.get::<_, String>(1),
                        row.get::<_, String>(2),
                        row.get::<_, Chips>(4),
                    ),
                    row.get::<_, String>(3),
                )
            })
        })
    }

    async fn find(&self, user: ID<Member>) -> Result<Option<Member>, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT id, username, email, chips FROM ",
                USERS,
                " WHERE id = $1"
            ),
            &[&user.inner()],
        )
        .await
        .map(|opt| {
            opt.map(|row| {
                Member::new(
                    ID::from(row.get::<_, uuid::Uuid>(0)),
                    row.get::<_, String>(1),
                    row.get::<_, String>(2),
                    row.get::<_, Chips>(3),
                )
            })
        })
    }

    async fn balance(&self, user: ID<Member>) -> Result<Chips, PgErr> {
        self.query_one(
            const_format::concatcp!("SELECT chips FROM ", USERS, " WHERE id = $1"),
            &[&user.inner()],
        )
        .await
        .map(|row| row.get::<_, Chips>(0))
    }

    async fn adjust_chips(&self, user: ID<Member>, delta: Chips) -> Result<Chips, AdjustChipsError> {
        let row = self
            .query_opt(
                const_format::concatcp!(
                    "UPDATE ",
                    USERS,
                    " SET chips = chips + $2 WHERE id = $1 AND chips + $2 >= 0 RETURNING chips"
                ),
                &[&user.inner(), &delta],
            )
            .await?;
        row.map(|r| r.get::<_, Chips>(0)).ok_or(AdjustChipsError::Insufficient)
    }

    async fn transfer_chips(&self, from: ID<Member>, to: ID<Member>, amount: Chips) -> Result<(), AdjustChipsError> {
        // single statement so the debit and credit commit atomically without
        // an explicit transaction block over a connection shared by Arc.
        let moved = self
            .execute(
                const_format::concatcp!(
                    "WITH debited AS (",
                    "    UPDATE ", USERS, " SET chips = chips - $3",
                    "    WHERE id = $1 AND chips >= $3 RETURNING id",
                    ") UPDATE ", USERS, " SET chips = chips + $3",
                    " WHERE id = $2 AND EXISTS (SELECT 1 FROM debited)"
                ),
                &[&from.inner(), &to.inner(), &amount],
            )
            .await?;
        if moved == 0 {
            return Err(AdjustChipsError::Insufficient);
        }
        Ok(())
    }

    async fn signin(&self, session: &Session) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                SESSIONS,
                " (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)"
            ),
            &[
                &session.id().inner(),
                &session.user().inner(),
                &session.hash(),
                &session.expires_at(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn revoke(&self, session: ID<Session>) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!("UPDATE ", SESSIONS, " SET revoked = TRUE WHERE id = $1"),
            &[&session.inner()],
        )
        .await
        .map(|_| ())
    }
}
