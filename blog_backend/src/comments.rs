use crate::database::models::{CommentRecord, NewComment};
use crate::database::repositories::{CommentRepository, PostRepository};
use crate::database::Database;
use crate::error::{BlogError, Result};
use crate::identity::Author;
use crate::thread_path::{descendant_prefix, direct_children_path, ThreadPath};
use crate::utils::now_utc_iso;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentFilter {
    #[default]
    All,
    /// Only comments without a parent; replies are not flattened in.
    TopLevelOnly,
}

#[derive(Debug, Clone)]
pub struct CreateCommentInput {
    pub post_slug: String,
    pub parent_id: Option<i64>,
    pub author: Author,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub user_id: Option<i64>,
    pub display_name: String,
    pub content: String,
    pub thread_path: String,
    pub depth: usize,
    pub created_at: String,
    pub modified_at: String,
}

impl CommentView {
    pub fn from_record(record: CommentRecord) -> Result<Self> {
        let depth = ThreadPath::decode(Some(&record.thread_path))?.depth();
        Ok(Self {
            id: record.id,
            post_id: record.post_id,
            parent_id: record.parent_id,
            user_id: record.user_id,
            display_name: record.display_name,
            content: record.content,
            thread_path: record.thread_path,
            depth,
            created_at: record.created_at,
            modified_at: record.modified_at,
        })
    }

    pub fn is_top_level(&self) -> bool {
        self.depth == 0
    }
}

fn views(records: Vec<CommentRecord>) -> Result<Vec<CommentView>> {
    records.into_iter().map(CommentView::from_record).collect()
}

#[derive(Clone)]
pub struct CommentService {
    database: Database,
}

impl CommentService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Stores a new comment, computing its thread path from the parent.
    /// The parent lookup and the insert share one lock on the store.
    pub fn create_comment(&self, input: CreateCommentInput) -> Result<CommentView> {
        let created_at = now_utc_iso();
        let stored = self.database.with_repositories(|repos| {
            let post = repos
                .posts()
                .get_by_slug(&input.post_slug)?
                .ok_or_else(|| BlogError::not_found("post", &input.post_slug))?;

            let comments = repos.comments();
            let thread_path = match input.parent_id {
                None => ThreadPath::root(),
                Some(parent_id) => {
                    let parent = comments
                        .get(parent_id)?
                        .filter(|parent| parent.post_id == post.id)
                        .ok_or_else(|| BlogError::not_found("comment", parent_id))?;
                    ThreadPath::decode(Some(&parent.thread_path))?.child_of(parent.id)
                }
            };

            let record = comments.create(&NewComment {
                post_id: post.id,
                parent_id: input.parent_id,
                user_id: input.author.user_id(),
                display_name: input.author.display_name().to_string(),
                content: input.content.clone(),
                thread_path: thread_path.encode(),
                created_at: created_at.clone(),
            })?;
            Ok::<_, BlogError>(record)
        })?;

        tracing::info!(
            comment_id = stored.id,
            post_id = stored.post_id,
            parent_id = ?stored.parent_id,
            thread_path = %stored.thread_path,
            "comment created"
        );
        CommentView::from_record(stored)
    }

    pub fn get_comment(&self, id: i64) -> Result<CommentView> {
        let record = self.load(id)?;
        CommentView::from_record(record)
    }

    pub fn list_for_post(&self, post_id: i64, filter: CommentFilter) -> Result<Vec<CommentView>> {
        let records = self.database.with_repositories(|repos| {
            let comments = repos.comments();
            match filter {
                CommentFilter::All => comments.list_for_post(post_id),
                CommentFilter::TopLevelOnly => comments.list_top_level_for_post(post_id),
            }
        })?;
        views(records)
    }

    /// Direct replies to `id`, oldest first.
    pub fn replies(&self, id: i64) -> Result<Vec<CommentView>> {
        let records = self
            .database
            .with_repositories(|repos| repos.comments().list_replies(id))?;
        views(records)
    }

    pub fn depth(&self, id: i64) -> Result<usize> {
        Ok(self.get_comment(id)?.depth)
    }

    /// Counts every comment under a top-level comment, at any depth.
    pub fn descendants_count(&self, id: i64) -> Result<usize> {
        let comment = self.load(id)?;
        if !ThreadPath::decode(Some(&comment.thread_path))?.is_root() {
            return Err(BlogError::InvalidOperation(format!(
                "descendants_count is only defined for top-level comments; comment {id} has path {:?}",
                comment.thread_path
            )));
        }
        let count = self.database.with_repositories(|repos| {
            repos
                .comments()
                .count_by_path(&direct_children_path(comment.id), &descendant_prefix(comment.id))
        })?;
        Ok(count)
    }

    fn load(&self, id: i64) -> Result<CommentRecord> {
        self.database
            .with_repositories(|repos| repos.comments().get(id))?
            .ok_or_else(|| BlogError::not_found("comment", id))
    }
}
