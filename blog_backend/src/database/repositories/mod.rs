mod comments;
mod posts;
mod users;

use super::models::{CommentRecord, NewComment, NewPost, PostRecord, UserRecord};
use anyhow::Result;
use rusqlite::Connection;

pub trait UserRepository {
    fn create(&self, username: &str, is_staff: bool, created_at: &str) -> Result<UserRecord>;
    fn get(&self, id: i64) -> Result<Option<UserRecord>>;
    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;
    fn list(&self) -> Result<Vec<UserRecord>>;
}

pub trait PostRepository {
    fn create(&self, post: &NewPost) -> Result<PostRecord>;
    fn get_by_slug(&self, slug: &str) -> Result<Option<PostRecord>>;
    fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>>;
    fn update(&self, id: i64, title: &str, content: &str, modified_at: &str) -> Result<()>;
    fn delete(&self, id: i64) -> Result<()>;
}

pub trait CommentRepository {
    /// Inserts the row and returns it with the id the store assigned.
    fn create(&self, comment: &NewComment) -> Result<CommentRecord>;
    fn get(&self, id: i64) -> Result<Option<CommentRecord>>;
    fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>>;
    fn list_top_level_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>>;
    fn list_replies(&self, parent_id: i64) -> Result<Vec<CommentRecord>>;
    /// Counts rows whose path equals `exact` or starts with `prefix`.
    fn count_by_path(&self, exact: &str, prefix: &str) -> Result<usize>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn users(&self) -> impl UserRepository + '_ {
        users::SqliteUserRepository { conn: self.conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }
}

/// True when `err` came from a UNIQUE constraint. Foreign key and NOT NULL
/// failures share the primary constraint code, so only the extended code
/// tells them apart.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(failure, _))
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
