use crate::database::models::{NewPost, PostRecord};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const POST_COLUMNS: &str = "id, slug, title, content, owner_id, created_at, modified_at";

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        owner_id: row.get(4)?,
        created_at: row.get(5)?,
        modified_at: row.get(6)?,
    })
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, post: &NewPost) -> Result<PostRecord> {
        self.conn.execute(
            r#"
            INSERT INTO posts (slug, title, content, owner_id, created_at, modified_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
            params![
                post.slug,
                post.title,
                post.content,
                post.owner_id,
                post.created_at
            ],
        )?;
        Ok(PostRecord {
            id: self.conn.last_insert_rowid(),
            slug: post.slug.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            owner_id: post.owner_id,
            created_at: post.created_at.clone(),
            modified_at: post.created_at.clone(),
        })
    }

    fn get_by_slug(&self, slug: &str) -> Result<Option<PostRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = ?1"),
                params![slug],
                map_post,
            )
            .optional()?)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "#
        ))?;
        let rows = stmt.query_map(params![limit as i64], map_post)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }

    fn update(&self, id: i64, title: &str, content: &str, modified_at: &str) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE posts
            SET title = ?1, content = ?2, modified_at = ?3
            WHERE id = ?4
            "#,
            params![title, content, modified_at, id],
        )?;
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<()> {
        // cascades to comments
        let deleted = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        tracing::debug!(post_id = id, deleted, "post row deleted");
        Ok(())
    }
}
