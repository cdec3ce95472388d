use crate::database::models::UserRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteUserRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        is_staff: row.get::<_, i64>(2)? != 0,
        created_at: row.get(3)?,
    })
}

impl<'conn> super::UserRepository for SqliteUserRepository<'conn> {
    fn create(&self, username: &str, is_staff: bool, created_at: &str) -> Result<UserRecord> {
        self.conn.execute(
            r#"
            INSERT INTO users (username, is_staff, created_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![username, if is_staff { 1 } else { 0 }, created_at],
        )?;
        Ok(UserRecord {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            is_staff,
            created_at: created_at.to_string(),
        })
    }

    fn get(&self, id: i64) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, username, is_staff, created_at FROM users WHERE id = ?1",
                params![id],
                map_user,
            )
            .optional()?)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, username, is_staff, created_at FROM users WHERE username = ?1",
                params![username],
                map_user,
            )
            .optional()?)
    }

    fn list(&self) -> Result<Vec<UserRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username, is_staff, created_at FROM users ORDER BY username ASC")?;
        let rows = stmt.query_map([], map_user)?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}
