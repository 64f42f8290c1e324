//! All-or-nothing removal of an entity together with every row that
//! references it.
//!
//! Foreign keys are declared `NO ACTION`, so the store refuses any delete
//! that would orphan rows. The executor therefore removes dependents
//! deepest-first inside a single transaction, and only commits once the
//! root row itself is gone.

use sea_orm::sea_query::{DeleteStatement, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryTrait, TransactionTrait,
};
use std::fmt;
use tracing::{debug, info, warn};

use super::error::is_lock_contention;
use crate::domain::{AnimeId, ThreadId, UserId};
use crate::entities::{anime, forum_comments, forum_threads, user_anime_list, users};

/// Root of a cascading delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeTarget {
    Anime(AnimeId),
    User(UserId),
    Thread(ThreadId),
}

impl CascadeTarget {
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Anime(_) => "anime",
            Self::User(_) => "user",
            Self::Thread(_) => "thread",
        }
    }

    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Anime(id) => id.value(),
            Self::User(id) => id.value(),
            Self::Thread(id) => id.value(),
        }
    }

    /// Delete statements in execution order. The last step removes the root.
    pub(crate) fn steps(self) -> Vec<CascadeStep> {
        match self {
            Self::Anime(id) => {
                let id = id.value();
                vec![
                    CascadeStep::dependent(
                        "forum_comments",
                        forum_comments::Entity::delete_many()
                            .filter(
                                forum_comments::Column::ThreadId
                                    .in_subquery(threads_where(forum_threads::Column::AnimeId.eq(id))),
                            )
                            .into_query(),
                    ),
                    CascadeStep::dependent(
                        "forum_threads",
                        forum_threads::Entity::delete_many()
                            .filter(forum_threads::Column::AnimeId.eq(id))
                            .into_query(),
                    ),
                    CascadeStep::dependent(
                        "user_anime_list",
                        user_anime_list::Entity::delete_many()
                            .filter(user_anime_list::Column::AnimeId.eq(id))
                            .into_query(),
                    ),
                    CascadeStep::root(
                        "anime",
                        anime::Entity::delete_many()
                            .filter(anime::Column::Id.eq(id))
                            .into_query(),
                    ),
                ]
            }
            Self::User(id) => {
                let id = id.value();
                vec![
                    CascadeStep::dependent(
                        "forum_comments",
                        forum_comments::Entity::delete_many()
                            .filter(forum_comments::Column::UserId.eq(id))
                            .into_query(),
                    ),
                    // Other users' replies inside the user's threads
                    CascadeStep::dependent(
                        "forum_comments",
                        forum_comments::Entity::delete_many()
                            .filter(
                                forum_comments::Column::ThreadId
                                    .in_subquery(threads_where(forum_threads::Column::UserId.eq(id))),
                            )
                            .into_query(),
                    ),
                    CascadeStep::dependent(
                        "forum_threads",
                        forum_threads::Entity::delete_many()
                            .filter(forum_threads::Column::UserId.eq(id))
                            .into_query(),
                    ),
                    CascadeStep::dependent(
                        "user_anime_list",
                        user_anime_list::Entity::delete_many()
                            .filter(user_anime_list::Column::UserId.eq(id))
                            .into_query(),
                    ),
                    CascadeStep::root(
                        "users",
                        users::Entity::delete_many()
                            .filter(users::Column::Id.eq(id))
                            .into_query(),
                    ),
                ]
            }
            Self::Thread(id) => {
                let id = id.value();
                vec![
                    CascadeStep::dependent(
                        "forum_comments",
                        forum_comments::Entity::delete_many()
                            .filter(forum_comments::Column::ThreadId.eq(id))
                            .into_query(),
                    ),
                    CascadeStep::root(
                        "forum_threads",
                        forum_threads::Entity::delete_many()
                            .filter(forum_threads::Column::Id.eq(id))
                            .into_query(),
                    ),
                ]
            }
        }
    }
}

impl fmt::Display for CascadeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

fn threads_where(cond: sea_orm::sea_query::SimpleExpr) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(forum_threads::Column::Id)
        .from(forum_threads::Entity)
        .and_where(cond)
        .to_owned()
}

#[derive(Debug, Clone)]
pub(crate) struct CascadeStep {
    table: &'static str,
    statement: DeleteStatement,
    root: bool,
}

impl CascadeStep {
    pub(crate) const fn dependent(table: &'static str, statement: DeleteStatement) -> Self {
        Self {
            table,
            statement,
            root: false,
        }
    }

    pub(crate) const fn root(table: &'static str, statement: DeleteStatement) -> Self {
        Self {
            table,
            statement,
            root: true,
        }
    }
}

/// Rows removed by a committed cascade, per table.
#[derive(Debug, Clone)]
pub struct CascadeReport {
    pub target: CascadeTarget,
    pub deleted: Vec<(&'static str, u64)>,
}

impl CascadeReport {
    const fn new(target: CascadeTarget) -> Self {
        Self {
            target,
            deleted: Vec::new(),
        }
    }

    fn record(&mut self, table: &'static str, rows: u64) {
        if let Some(entry) = self.deleted.iter_mut().find(|(t, _)| *t == table) {
            entry.1 += rows;
        } else {
            self.deleted.push((table, rows));
        }
    }

    #[must_use]
    pub fn rows_for(&self, table: &str) -> u64 {
        self.deleted
            .iter()
            .find(|(t, _)| *t == table)
            .map_or(0, |(_, rows)| *rows)
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.deleted.iter().map(|(_, rows)| rows).sum()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    #[error("{0} not found")]
    NotFound(CascadeTarget),

    /// Another writer held the lock; nothing was removed.
    #[error("{0} is being modified concurrently, retry later")]
    Conflict(CascadeTarget),

    #[error("Failed to delete {target} at {table}: {source}")]
    OperationFailed {
        target: CascadeTarget,
        table: &'static str,
        #[source]
        source: DbErr,
    },
}

impl CascadeError {
    fn from_db(target: CascadeTarget, table: &'static str, source: DbErr) -> Self {
        if is_lock_contention(&source) {
            Self::Conflict(target)
        } else {
            Self::OperationFailed {
                target,
                table,
                source,
            }
        }
    }
}

/// Deletes `target` and everything referencing it in one transaction.
pub async fn delete_cascade(
    conn: &DatabaseConnection,
    target: CascadeTarget,
) -> Result<CascadeReport, CascadeError> {
    run_cascade(conn, target, target.steps()).await
}

pub(crate) async fn run_cascade(
    conn: &DatabaseConnection,
    target: CascadeTarget,
    steps: Vec<CascadeStep>,
) -> Result<CascadeReport, CascadeError> {
    let txn = conn
        .begin()
        .await
        .map_err(|e| CascadeError::from_db(target, "begin", e))?;

    let backend = txn.get_database_backend();
    let mut report = CascadeReport::new(target);

    for step in steps {
        let result = match txn.execute(backend.build(&step.statement)).await {
            Ok(result) => result,
            Err(e) => {
                rollback(txn, target).await;
                return Err(CascadeError::from_db(target, step.table, e));
            }
        };

        let rows = result.rows_affected();
        debug!(%target, table = step.table, rows, "Cascade step executed");

        if step.root && rows == 0 {
            rollback(txn, target).await;
            return Err(CascadeError::NotFound(target));
        }

        report.record(step.table, rows);
    }

    txn.commit()
        .await
        .map_err(|e| CascadeError::from_db(target, "commit", e))?;

    info!(
        %target,
        deleted = ?report.deleted,
        "Cascade delete committed"
    );

    Ok(report)
}

async fn rollback(txn: DatabaseTransaction, target: CascadeTarget) {
    if let Err(e) = txn.rollback().await {
        // The handle is consumed either way; the connection discards the transaction.
        warn!(%target, error = %e, "Cascade rollback failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{self, Seed};
    use sea_orm::PaginatorTrait;
    use sea_orm::sea_query::Alias;

    async fn counts(conn: &DatabaseConnection) -> (u64, u64, u64, u64, u64) {
        (
            anime::Entity::find().count(conn).await.unwrap(),
            users::Entity::find().count(conn).await.unwrap(),
            forum_threads::Entity::find().count(conn).await.unwrap(),
            forum_comments::Entity::find().count(conn).await.unwrap(),
            user_anime_list::Entity::find().count(conn).await.unwrap(),
        )
    }

    /// anime 10 with thread 5, comments 1 and 2, and user 3 watching it;
    /// anime 11 with its own thread and watchlist entry.
    async fn seed(conn: &DatabaseConnection) {
        let seed = Seed::new(conn);
        seed.user(3, "viewer").await;
        seed.user(4, "poster").await;
        seed.anime(10, "Cowboy Bebop").await;
        seed.anime(11, "Trigun").await;
        seed.thread(5, Some(10), 4).await;
        seed.thread(6, Some(11), 4).await;
        seed.comment(1, 5, 3, None).await;
        seed.comment(2, 5, 4, Some(1)).await;
        seed.comment(7, 6, 3, None).await;
        seed.watch(3, 10).await;
        seed.watch(3, 11).await;
    }

    #[tokio::test]
    async fn test_anime_cascade_removes_dependents() {
        let store = testing::memory_store().await;
        seed(&store.conn).await;

        let report = delete_cascade(&store.conn, CascadeTarget::Anime(AnimeId::new(10)))
            .await
            .unwrap();

        assert_eq!(report.rows_for("forum_comments"), 2);
        assert_eq!(report.rows_for("forum_threads"), 1);
        assert_eq!(report.rows_for("user_anime_list"), 1);
        assert_eq!(report.rows_for("anime"), 1);

        assert!(anime::Entity::find_by_id(10).one(&store.conn).await.unwrap().is_none());
        assert!(forum_threads::Entity::find_by_id(5).one(&store.conn).await.unwrap().is_none());
        assert!(
            user_anime_list::Entity::find_by_id((3, 10))
                .one(&store.conn)
                .await
                .unwrap()
                .is_none()
        );

        // anime 11 and its dependents are untouched
        assert!(anime::Entity::find_by_id(11).one(&store.conn).await.unwrap().is_some());
        assert!(forum_threads::Entity::find_by_id(6).one(&store.conn).await.unwrap().is_some());
        assert!(forum_comments::Entity::find_by_id(7).one(&store.conn).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found_and_rolls_back() {
        let store = testing::memory_store().await;
        seed(&store.conn).await;
        let before = counts(&store.conn).await;

        for _ in 0..2 {
            let err = delete_cascade(&store.conn, CascadeTarget::Anime(AnimeId::new(999)))
                .await
                .unwrap_err();
            assert!(matches!(err, CascadeError::NotFound(_)));
        }

        assert_eq!(counts(&store.conn).await, before);
    }

    #[tokio::test]
    async fn test_failing_step_leaves_everything_in_place() {
        let store = testing::memory_store().await;
        seed(&store.conn).await;
        let before = counts(&store.conn).await;

        let target = CascadeTarget::Anime(AnimeId::new(10));
        let mut steps = target.steps();
        steps.insert(
            2,
            CascadeStep::dependent(
                "missing_table",
                Query::delete()
                    .from_table(Alias::new("missing_table"))
                    .to_owned(),
            ),
        );

        let err = run_cascade(&store.conn, target, steps).await.unwrap_err();
        assert!(matches!(
            err,
            CascadeError::OperationFailed {
                table: "missing_table",
                ..
            }
        ));

        // The comment and thread deletes that ran first were rolled back
        assert_eq!(counts(&store.conn).await, before);
    }

    #[tokio::test]
    async fn test_failing_user_step_leaves_everything_in_place() {
        let store = testing::memory_store().await;
        seed(&store.conn).await;
        let before = counts(&store.conn).await;

        let target = CascadeTarget::User(UserId::new(4));
        let mut steps = target.steps();
        // Just ahead of the root delete, after every dependent step has run
        let root = steps.len() - 1;
        steps.insert(
            root,
            CascadeStep::dependent(
                "missing_table",
                Query::delete()
                    .from_table(Alias::new("missing_table"))
                    .to_owned(),
            ),
        );

        let err = run_cascade(&store.conn, target, steps).await.unwrap_err();
        assert!(matches!(err, CascadeError::OperationFailed { .. }));

        assert_eq!(counts(&store.conn).await, before);
        assert!(users::Entity::find_by_id(4).one(&store.conn).await.unwrap().is_some());
        assert!(forum_comments::Entity::find_by_id(7).one(&store.conn).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_cascades_of_one_root_succeed_once() {
        let (store, path) = testing::file_store(4).await;
        seed(&store.conn).await;

        let target = CascadeTarget::Anime(AnimeId::new(10));
        let (first, second) = tokio::join!(
            delete_cascade(&store.conn, target),
            delete_cascade(&store.conn, target)
        );

        let results = [first, second];
        let committed = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(committed, 1, "{results:?}");
        for result in &results {
            if let Err(e) = result {
                assert!(
                    matches!(e, CascadeError::NotFound(_) | CascadeError::Conflict(_)),
                    "unexpected loser: {e:?}"
                );
            }
        }

        let (anime, _, threads, comments, watchlist) = counts(&store.conn).await;
        assert_eq!((anime, threads, comments, watchlist), (1, 1, 1, 1));

        testing::remove_file_store(store, path).await;
    }

    #[tokio::test]
    async fn test_user_cascade_clears_foreign_replies() {
        let store = testing::memory_store().await;
        seed(&store.conn).await;

        // user 4 authored both threads; user 3 commented in them
        let report = delete_cascade(&store.conn, CascadeTarget::User(UserId::new(4)))
            .await
            .unwrap();

        assert_eq!(report.rows_for("users"), 1);
        assert_eq!(report.rows_for("forum_threads"), 2);
        assert_eq!(report.rows_for("forum_comments"), 3);

        let (anime, users, threads, comments, watchlist) = counts(&store.conn).await;
        // the seeded admin account and user 3 remain
        assert_eq!((anime, users, threads, comments, watchlist), (2, 2, 0, 0, 2));
    }

    #[tokio::test]
    async fn test_user_cascade_nulls_replies_to_removed_comments() {
        let store = testing::memory_store().await;
        let seed = Seed::new(&store.conn);
        seed.user(12, "author").await;
        seed.user(13, "commenter").await;
        seed.user(14, "replier").await;
        seed.thread(1, None, 12).await;
        seed.comment(1, 1, 13, None).await;
        seed.comment(2, 1, 14, Some(1)).await;

        delete_cascade(&store.conn, CascadeTarget::User(UserId::new(13)))
            .await
            .unwrap();

        let reply = forum_comments::Entity::find_by_id(2)
            .one(&store.conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.parent_comment_id, None);
    }

    #[tokio::test]
    async fn test_thread_cascade() {
        let store = testing::memory_store().await;
        seed(&store.conn).await;

        let report = delete_cascade(&store.conn, CascadeTarget::Thread(ThreadId::new(5)))
            .await
            .unwrap();
        assert_eq!(report.rows_for("forum_comments"), 2);
        assert_eq!(report.total(), 3);

        let (anime, _, threads, comments, _) = counts(&store.conn).await;
        assert_eq!((anime, threads, comments), (2, 1, 1));
    }

    #[test]
    fn test_lock_contention_maps_to_conflict() {
        let target = CascadeTarget::User(UserId::new(1));
        let err = CascadeError::from_db(target, "users", DbErr::Custom("database is locked".into()));
        assert!(matches!(err, CascadeError::Conflict(_)));
        assert_eq!(target.to_string(), "user 1");
    }
}
