use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_ANONYMOUS_NAME: &str = "Anonymous";

#[derive(Debug, Clone)]
pub struct BlogConfig {
    pub paths: BlogPaths,
    /// Username the shell starts logged in as, if any.
    pub default_user: Option<String>,
    pub anonymous_name: String,
}

impl BlogConfig {
    pub fn from_env() -> Result<Self> {
        let paths = match non_empty_var("BLOG_HOME") {
            Some(home) => BlogPaths::from_base_dir(home)?,
            None => BlogPaths::discover()?,
        };
        let default_user = non_empty_var("BLOG_USER");
        let anonymous_name =
            non_empty_var("BLOG_ANON_NAME").unwrap_or_else(|| DEFAULT_ANONYMOUS_NAME.to_string());
        Ok(Self {
            paths,
            default_user,
            anonymous_name,
        })
    }

    pub fn new(paths: BlogPaths) -> Self {
        Self {
            paths,
            default_user: None,
            anonymous_name: DEFAULT_ANONYMOUS_NAME.to_string(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[derive(Debug, Clone)]
pub struct BlogPaths {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl BlogPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("blog.db");
        let logs_dir = base.join("logs");

        Ok(Self {
            data_dir,
            db_path,
            logs_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_base_dir() {
        let paths = BlogPaths::from_base_dir("/srv/blog").expect("paths");
        assert_eq!(paths.data_dir, PathBuf::from("/srv/blog/data"));
        assert_eq!(paths.db_path, PathBuf::from("/srv/blog/data/blog.db"));
        assert_eq!(paths.logs_dir, PathBuf::from("/srv/blog/logs"));
    }
}
