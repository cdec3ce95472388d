use crate::database::models::UserRecord;
use crate::database::repositories::{is_unique_violation, UserRepository};
use crate::database::Database;
use crate::error::{BlogError, Result};
use crate::utils::now_utc_iso;
use serde::{Deserialize, Serialize};

/// Whoever is acting right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrentUser {
    Anonymous,
    Authenticated(UserRecord),
}

impl CurrentUser {
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            CurrentUser::Anonymous => None,
            CurrentUser::Authenticated(user) => Some(user),
        }
    }
}

/// Who a comment is attributed to. Resolved once, at creation, into the
/// stored `user_id` and `display_name` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    Authenticated {
        user: UserRecord,
        display_name: Option<String>,
    },
    Anonymous {
        display_name: String,
    },
}

impl Author {
    /// Builds the author for `current`. Logged-in users may still override
    /// their display name; anonymous submitters without one get `fallback`.
    pub fn for_current(current: &CurrentUser, display_name: Option<String>, fallback: &str) -> Self {
        let display_name = display_name.filter(|name| !name.trim().is_empty());
        match current {
            CurrentUser::Authenticated(user) => Author::Authenticated {
                user: user.clone(),
                display_name,
            },
            CurrentUser::Anonymous => Author::Anonymous {
                display_name: display_name.unwrap_or_else(|| fallback.to_string()),
            },
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Author::Authenticated { user, .. } => Some(user.id),
            Author::Anonymous { .. } => None,
        }
    }

    /// The name stored on the comment. Authenticated users get their
    /// username unless they supplied something else.
    pub fn display_name(&self) -> &str {
        match self {
            Author::Authenticated {
                display_name: Some(name),
                ..
            } => name.as_str(),
            Author::Authenticated { user, .. } => user.username.as_str(),
            Author::Anonymous { display_name } => display_name.as_str(),
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    database: Database,
}

impl UserService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_user(&self, username: &str, is_staff: bool) -> Result<UserRecord> {
        let username = username.trim();
        if username.is_empty() {
            return Err(BlogError::Validation("username must not be blank".into()));
        }
        let created_at = now_utc_iso();
        let user = self
            .database
            .with_repositories(|repos| repos.users().create(username, is_staff, &created_at))
            .map_err(|err| {
                if is_unique_violation(&err) {
                    BlogError::Conflict(format!("username {username} already taken"))
                } else {
                    BlogError::Storage(err)
                }
            })?;
        tracing::info!(user_id = user.id, username = %user.username, is_staff, "user created");
        Ok(user)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.database
            .with_repositories(|repos| repos.users().find_by_username(username))
            .map_err(BlogError::from)
    }

    pub fn get(&self, id: i64) -> Result<Option<UserRecord>> {
        self.database
            .with_repositories(|repos| repos.users().get(id))
            .map_err(BlogError::from)
    }

    pub fn list_users(&self) -> Result<Vec<UserRecord>> {
        self.database
            .with_repositories(|repos| repos.users().list())
            .map_err(BlogError::from)
    }

    /// Maps an optional username onto the acting identity.
    pub fn resolve(&self, username: Option<&str>) -> Result<CurrentUser> {
        let Some(username) = username else {
            return Ok(CurrentUser::Anonymous);
        };
        self.find_by_username(username)?
            .map(CurrentUser::Authenticated)
            .ok_or_else(|| BlogError::not_found("user", username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    fn user(name: &str) -> UserRecord {
        UserRecord {
            id: 7,
            username: name.into(),
            is_staff: false,
            created_at: now_utc_iso(),
        }
    }

    #[test]
    fn authenticated_author_defaults_to_username() {
        let current = CurrentUser::Authenticated(user("monkey"));
        let author = Author::for_current(&current, None, "Anonymous");
        assert_eq!(author.display_name(), "monkey");
        assert_eq!(author.user_id(), Some(7));

        let blank = Author::for_current(&current, Some("  ".into()), "Anonymous");
        assert_eq!(blank.display_name(), "monkey");

        let named = Author::for_current(&current, Some("Mr. Monkey".into()), "Anonymous");
        assert_eq!(named.display_name(), "Mr. Monkey");
        assert_eq!(named.user_id(), Some(7));
    }

    #[test]
    fn anonymous_author_uses_supplied_name_or_fallback() {
        let named = Author::for_current(&CurrentUser::Anonymous, Some("visitor".into()), "Anonymous");
        assert_eq!(named.display_name(), "visitor");
        assert_eq!(named.user_id(), None);

        let unnamed = Author::for_current(&CurrentUser::Anonymous, None, "Anonymous");
        assert_eq!(unnamed.display_name(), "Anonymous");
    }

    #[test]
    fn duplicate_username_is_a_conflict() {
        let service = UserService::new(database::in_memory());
        service.create_user("monkey", true).expect("create user");
        let err = service.create_user("monkey", false).unwrap_err();
        assert!(matches!(err, BlogError::Conflict(_)), "got {err:?}");
    }

    #[test]
    fn blank_username_is_rejected() {
        let service = UserService::new(database::in_memory());
        for username in ["", "   ", "\t\n"] {
            let err = service.create_user(username, false).unwrap_err();
            assert!(matches!(err, BlogError::Validation(_)), "got {err:?}");
        }
        assert!(service.list_users().unwrap().is_empty());

        let user = service.create_user("  monkey ", false).expect("create user");
        assert_eq!(user.username, "monkey");
    }

    #[test]
    fn resolve_maps_usernames_to_identities() {
        let service = UserService::new(database::in_memory());
        let created = service.create_user("monkey", false).expect("create user");

        assert_eq!(service.resolve(None).unwrap(), CurrentUser::Anonymous);
        assert_eq!(
            service.resolve(Some("monkey")).unwrap(),
            CurrentUser::Authenticated(created)
        );
        assert!(service.resolve(Some("nobody")).unwrap_err().is_not_found());
    }
}
