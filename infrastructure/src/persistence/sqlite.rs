//! SQLite-backed persistence gateway.
//!
//! Implements the idempotency and transactionality contracts of the
//! [`PersistenceGateway`] port:
//!
//! - message appends are keyed on `(group_id, seq_no)` and re-submission
//!   is a no-op,
//! - a consensus verdict and the group state it produced are written in
//!   one transaction, as are a comment and the COMMENTED transition,
//! - every write is retried with bounded backoff on transient SQLite
//!   errors before surfacing a fatal [`PersistenceError`].

use async_trait::async_trait;
use seminar_application::{retry_with_backoff, PersistenceError, PersistenceGateway, RetryPolicy};
use seminar_domain::{
    ConsensusVerdict, DiscussionGroup, FinalEvaluation, GroupId, GroupStatus, Message, PlanId,
    TeacherComment,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use tracing::info;

/// Detect transient SQLite errors worth retrying.
///
/// The predicate is intentionally narrow to avoid retrying genuine SQL
/// or constraint errors.
fn is_transient(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => {
            let msg = db.message();
            msg.contains("database is locked") || msg.contains("database table is locked")
        }
        _ => false,
    }
}

fn to_gateway_error(e: sqlx::Error) -> PersistenceError {
    if is_transient(&e) {
        PersistenceError::Exhausted(e.to_string())
    } else {
        PersistenceError::Fatal(e.to_string())
    }
}

/// SQLite adapter for the persistence gateway
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl SqliteStore {
    /// Open (and create if missing) the database at `database_url`.
    ///
    /// Handles both `sqlite:./foo.db` and bare path forms, creating the
    /// parent directory when needed.
    pub async fn connect(database_url: &str, retry: RetryPolicy) -> Result<Self, PersistenceError> {
        let file_path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        if let Some(parent) = std::path::Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PersistenceError::Fatal(e.to_string()))?;
            }
        }

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(file_path)
                .create_if_missing(true),
        )
        .await
        .map_err(to_gateway_error)?;

        Ok(Self { pool, retry })
    }

    /// Create the tables if they do not exist.
    pub async fn migrate(&self) -> Result<(), PersistenceError> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS discussion_groups (
                id            INTEGER PRIMARY KEY,
                plan_id       TEXT    NOT NULL,
                status        TEXT    NOT NULL,
                turn_count    INTEGER NOT NULL,
                status_reason TEXT,
                created_at    TEXT    NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS messages (
                group_id   INTEGER NOT NULL,
                seq_no     INTEGER NOT NULL,
                speaker_id TEXT    NOT NULL,
                text       TEXT    NOT NULL,
                created_at TEXT    NOT NULL,
                PRIMARY KEY (group_id, seq_no)
            )",
            "CREATE TABLE IF NOT EXISTS consensus_verdicts (
                group_id   INTEGER NOT NULL,
                seq_no     INTEGER NOT NULL,
                consensus  INTEGER NOT NULL,
                rationale  TEXT    NOT NULL,
                created_at TEXT    NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS consensus_verdicts_group
                ON consensus_verdicts (group_id)",
            "CREATE TABLE IF NOT EXISTS teacher_comments (
                group_id   INTEGER PRIMARY KEY,
                text       TEXT    NOT NULL,
                created_at TEXT    NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS final_evaluations (
                plan_id     TEXT PRIMARY KEY,
                summary     TEXT NOT NULL,
                feasibility TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(to_gateway_error)?;
        }

        info!("sqlite schema ready");
        Ok(())
    }

    async fn upsert_group_once(
        pool: &SqlitePool,
        group: &DiscussionGroup,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::upsert_group_tx(&mut tx, group).await?;
        tx.commit().await
    }

    async fn upsert_group_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        group: &DiscussionGroup,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO discussion_groups (id, plan_id, status, turn_count, status_reason, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 turn_count = excluded.turn_count,
                 status_reason = excluded.status_reason",
        )
        .bind(group.id.value())
        .bind(group.plan_id.as_str())
        .bind(group.status.as_str())
        .bind(group.turn_count as i64)
        .bind(group.status_reason.as_deref())
        .bind(chrono::Utc::now())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn append_message_once(
        pool: &SqlitePool,
        message: &Message,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO messages (group_id, seq_no, speaker_id, text, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(group_id, seq_no) DO NOTHING",
        )
        .bind(message.group_id.value())
        .bind(message.seq.value() as i64)
        .bind(message.speaker.as_str())
        .bind(&message.text)
        .bind(message.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    async fn record_verdict_once(
        pool: &SqlitePool,
        group: &DiscussionGroup,
        verdict: &ConsensusVerdict,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(
            "INSERT INTO consensus_verdicts (group_id, seq_no, consensus, rationale, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(verdict.group_id.value())
        .bind(verdict.seq.value() as i64)
        .bind(verdict.consensus)
        .bind(&verdict.rationale)
        .bind(verdict.created_at)
        .execute(&mut *tx)
        .await?;
        Self::upsert_group_tx(&mut tx, group).await?;
        tx.commit().await
    }

    async fn save_comment_once(
        pool: &SqlitePool,
        group: &DiscussionGroup,
        comment: &TeacherComment,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(
            "INSERT INTO teacher_comments (group_id, text, created_at)
             VALUES (?, ?, ?)
             ON CONFLICT(group_id) DO NOTHING",
        )
        .bind(comment.group_id.value())
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&mut *tx)
        .await?;
        Self::upsert_group_tx(&mut tx, group).await?;
        tx.commit().await
    }

    async fn save_evaluation_once(
        pool: &SqlitePool,
        evaluation: &FinalEvaluation,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO final_evaluations (plan_id, summary, feasibility, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(plan_id) DO NOTHING",
        )
        .bind(evaluation.plan_id.as_str())
        .bind(&evaluation.summary)
        .bind(evaluation.feasibility.as_str())
        .bind(evaluation.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for SqliteStore {
    async fn upsert_group(&self, group: &DiscussionGroup) -> Result<(), PersistenceError> {
        retry_with_backoff(&self.retry, "upsert_group", is_transient, || {
            Self::upsert_group_once(&self.pool, group)
        })
        .await
        .map_err(to_gateway_error)
    }

    async fn append_message(&self, message: &Message) -> Result<(), PersistenceError> {
        retry_with_backoff(&self.retry, "append_message", is_transient, || {
            Self::append_message_once(&self.pool, message)
        })
        .await
        .map_err(to_gateway_error)
    }

    async fn record_verdict(
        &self,
        group: &DiscussionGroup,
        verdict: &ConsensusVerdict,
    ) -> Result<(), PersistenceError> {
        retry_with_backoff(&self.retry, "record_verdict", is_transient, || {
            Self::record_verdict_once(&self.pool, group, verdict)
        })
        .await
        .map_err(to_gateway_error)
    }

    async fn save_comment(
        &self,
        group: &DiscussionGroup,
        comment: &TeacherComment,
    ) -> Result<(), PersistenceError> {
        retry_with_backoff(&self.retry, "save_comment", is_transient, || {
            Self::save_comment_once(&self.pool, group, comment)
        })
        .await
        .map_err(to_gateway_error)
    }

    async fn comment_for_group(
        &self,
        group_id: GroupId,
    ) -> Result<Option<TeacherComment>, PersistenceError> {
        let row = sqlx::query(
            "SELECT group_id, text, created_at FROM teacher_comments WHERE group_id = ?",
        )
        .bind(group_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(to_gateway_error)?;

        Ok(row.map(|row| TeacherComment {
            group_id: GroupId::new(row.get("group_id")),
            text: row.get("text"),
            created_at: row.get("created_at"),
        }))
    }

    async fn commented_groups(&self, plan_id: &PlanId) -> Result<Vec<GroupId>, PersistenceError> {
        let rows = sqlx::query(
            "SELECT id FROM discussion_groups WHERE plan_id = ? AND status = ? ORDER BY id",
        )
        .bind(plan_id.as_str())
        .bind(GroupStatus::Commented.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(to_gateway_error)?;

        Ok(rows
            .into_iter()
            .map(|row| GroupId::new(row.get("id")))
            .collect())
    }

    async fn comments_for_plan(
        &self,
        plan_id: &PlanId,
    ) -> Result<Vec<TeacherComment>, PersistenceError> {
        let rows = sqlx::query(
            "SELECT c.group_id, c.text, c.created_at
             FROM teacher_comments c
             JOIN discussion_groups g ON g.id = c.group_id
             WHERE g.plan_id = ?
             ORDER BY c.group_id",
        )
        .bind(plan_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(to_gateway_error)?;

        Ok(rows
            .into_iter()
            .map(|row| TeacherComment {
                group_id: GroupId::new(row.get("group_id")),
                text: row.get("text"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn save_evaluation(&self, evaluation: &FinalEvaluation) -> Result<(), PersistenceError> {
        retry_with_backoff(&self.retry, "save_evaluation", is_transient, || {
            Self::save_evaluation_once(&self.pool, evaluation)
        })
        .await
        .map_err(to_gateway_error)
    }

    async fn evaluation_exists(&self, plan_id: &PlanId) -> Result<bool, PersistenceError> {
        let row = sqlx::query("SELECT 1 FROM final_evaluations WHERE plan_id = ?")
            .bind(plan_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(to_gateway_error)?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seminar_domain::{Feasibility, PersonaId, SeqNo, StopCause};
    use tempfile::TempDir;

    async fn store() -> (TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("test.db").display());
        let store = SqliteStore::connect(&url, RetryPolicy::default())
            .await
            .unwrap();
        store.migrate().await.unwrap();
        (dir, store)
    }

    fn group(id: i64) -> DiscussionGroup {
        DiscussionGroup::new(
            GroupId::new(id),
            PlanId::new("lp-1"),
            vec![PersonaId::new("S001"), PersonaId::new("S002")],
        )
    }

    fn message(group: i64, seq: u32, text: &str) -> Message {
        Message::new(
            GroupId::new(group),
            SeqNo::new(seq),
            PersonaId::new("S001"),
            text,
        )
    }

    #[tokio::test]
    async fn test_message_append_is_idempotent() {
        let (_dir, store) = store().await;
        store.upsert_group(&group(1)).await.unwrap();

        store.append_message(&message(1, 1, "original")).await.unwrap();
        store.append_message(&message(1, 1, "replayed")).await.unwrap();

        let row = sqlx::query("SELECT COUNT(*) AS n, MIN(text) AS t FROM messages")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        let n: i64 = row.get("n");
        let t: String = row.get("t");
        assert_eq!(n, 1);
        assert_eq!(t, "original");
    }

    #[tokio::test]
    async fn test_verdict_and_status_written_together() {
        let (_dir, store) = store().await;
        let mut g = group(1);
        store.upsert_group(&g).await.unwrap();

        g.record_turn().unwrap();
        g.record_turn().unwrap();
        g.reach_consensus().unwrap();
        let verdict = ConsensusVerdict::new(g.id, SeqNo::new(2), true, "converged");
        store.record_verdict(&g, &verdict).await.unwrap();

        let row = sqlx::query("SELECT status, turn_count FROM discussion_groups WHERE id = 1")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        let status: String = row.get("status");
        assert_eq!(status, "consensus");
        let turns: i64 = row.get("turn_count");
        assert_eq!(turns, 2);

        let verdicts = sqlx::query("SELECT consensus FROM consensus_verdicts WHERE group_id = 1")
            .fetch_all(&store.pool)
            .await
            .unwrap();
        assert_eq!(verdicts.len(), 1);
    }

    #[tokio::test]
    async fn test_comment_unique_per_group() {
        let (_dir, store) = store().await;
        let mut g = group(1);
        g.time_out(StopCause::TurnCap).unwrap();
        g.mark_commented().unwrap();

        let first = TeacherComment::new(g.id, "first");
        store.save_comment(&g, &first).await.unwrap();
        let second = TeacherComment::new(g.id, "second");
        store.save_comment(&g, &second).await.unwrap();

        let stored = store.comment_for_group(g.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "first");
    }

    #[tokio::test]
    async fn test_commented_groups_and_ordering() {
        let (_dir, store) = store().await;

        // Insert out of id order to prove the read side sorts.
        for id in [2, 1, 3] {
            let mut g = group(id);
            g.time_out(StopCause::TurnCap).unwrap();
            g.mark_commented().unwrap();
            let comment = TeacherComment::new(g.id, format!("comment {}", id));
            store.save_comment(&g, &comment).await.unwrap();
        }
        // A still-active group is not part of the barrier set.
        store.upsert_group(&group(4)).await.unwrap();

        let plan = PlanId::new("lp-1");
        let commented = store.commented_groups(&plan).await.unwrap();
        assert_eq!(
            commented,
            vec![GroupId::new(1), GroupId::new(2), GroupId::new(3)]
        );

        let comments = store.comments_for_plan(&plan).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["comment 1", "comment 2", "comment 3"]);
    }

    #[tokio::test]
    async fn test_evaluation_unique_per_plan() {
        let (_dir, store) = store().await;
        let plan = PlanId::new("lp-1");

        let first = FinalEvaluation::new(plan.clone(), "looks good", Feasibility::Feasible);
        store.save_evaluation(&first).await.unwrap();
        assert!(store.evaluation_exists(&plan).await.unwrap());

        let second = FinalEvaluation::new(plan.clone(), "second opinion", Feasibility::Infeasible);
        store.save_evaluation(&second).await.unwrap();

        let row = sqlx::query("SELECT COUNT(*) AS n, MIN(summary) AS s FROM final_evaluations")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        let n: i64 = row.get("n");
        let s: String = row.get("s");
        assert_eq!(n, 1);
        assert_eq!(s, "looks good");
    }

    #[tokio::test]
    async fn test_status_reason_round_trips() {
        let (_dir, store) = store().await;
        let mut g = group(1);
        g.time_out(StopCause::QuotaExceeded("429".to_string())).unwrap();
        store.upsert_group(&g).await.unwrap();

        let row = sqlx::query("SELECT status_reason FROM discussion_groups WHERE id = 1")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        let reason: Option<String> = row.get("status_reason");
        assert!(reason.unwrap().contains("quota"));
    }
}
