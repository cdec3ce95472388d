use crate::database::models::{CommentRecord, NewComment};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteCommentRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

// NULL paths from older rows read back as top-level.
const COMMENT_COLUMNS: &str = "id, post_id, parent_id, user_id, display_name, content, \
     COALESCE(thread_path, '') AS thread_path, created_at, modified_at";

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get(0)?,
        post_id: row.get(1)?,
        parent_id: row.get(2)?,
        user_id: row.get(3)?,
        display_name: row.get(4)?,
        content: row.get(5)?,
        thread_path: row.get(6)?,
        created_at: row.get(7)?,
        modified_at: row.get(8)?,
    })
}

impl<'conn> SqliteCommentRepository<'conn> {
    fn query_list(&self, sql: &str, key: i64) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![key], map_comment)?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }
}

impl<'conn> super::CommentRepository for SqliteCommentRepository<'conn> {
    fn create(&self, comment: &NewComment) -> Result<CommentRecord> {
        self.conn.execute(
            r#"
            INSERT INTO comments (post_id, parent_id, user_id, display_name, content, thread_path, created_at, modified_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![
                comment.post_id,
                comment.parent_id,
                comment.user_id,
                comment.display_name,
                comment.content,
                comment.thread_path,
                comment.created_at
            ],
        )?;
        Ok(CommentRecord {
            id: self.conn.last_insert_rowid(),
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            user_id: comment.user_id,
            display_name: comment.display_name.clone(),
            content: comment.content.clone(),
            thread_path: comment.thread_path.clone(),
            created_at: comment.created_at.clone(),
            modified_at: comment.created_at.clone(),
        })
    }

    fn get(&self, id: i64) -> Result<Option<CommentRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
                params![id],
                map_comment,
            )
            .optional()?)
    }

    fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>> {
        self.query_list(
            &format!(
                r#"
                SELECT {COMMENT_COLUMNS}
                FROM comments
                WHERE post_id = ?1
                ORDER BY created_at ASC, id ASC
                "#
            ),
            post_id,
        )
    }

    fn list_top_level_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>> {
        self.query_list(
            &format!(
                r#"
                SELECT {COMMENT_COLUMNS}
                FROM comments
                WHERE post_id = ?1 AND parent_id IS NULL
                ORDER BY created_at ASC, id ASC
                "#
            ),
            post_id,
        )
    }

    fn list_replies(&self, parent_id: i64) -> Result<Vec<CommentRecord>> {
        self.query_list(
            &format!(
                r#"
                SELECT {COMMENT_COLUMNS}
                FROM comments
                WHERE parent_id = ?1
                ORDER BY created_at ASC, id ASC
                "#
            ),
            parent_id,
        )
    }

    fn count_by_path(&self, exact: &str, prefix: &str) -> Result<usize> {
        // substr keeps the match literal; LIKE would need escaping
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM comments
            WHERE thread_path = ?1
               OR substr(thread_path, 1, length(?2)) = ?2
            "#,
            params![exact, prefix],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
