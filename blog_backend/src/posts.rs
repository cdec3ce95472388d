use crate::comments::{CommentFilter, CommentService, CommentView};
use crate::database::models::{NewPost, PostRecord, UserRecord};
use crate::database::repositories::{is_unique_violation, PostRepository};
use crate::database::Database;
use crate::error::{BlogError, Result};
use crate::identity::CurrentUser;
use crate::utils::now_utc_iso;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    /// Caller-chosen URL key; must be unique across posts.
    pub slug: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePostInput {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetails {
    pub post: PostRecord,
    pub comments: Vec<CommentView>,
}

#[derive(Clone)]
pub struct PostService {
    database: Database,
}

impl PostService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_post(&self, current: &CurrentUser, input: CreatePostInput) -> Result<PostRecord> {
        let owner = require_staff(current)?;
        let new_post = NewPost {
            slug: input.slug,
            title: input.title,
            content: input.content,
            owner_id: owner.id,
            created_at: now_utc_iso(),
        };
        let post = self
            .database
            .with_repositories(|repos| repos.posts().create(&new_post))
            .map_err(|err| {
                if is_unique_violation(&err) {
                    BlogError::Conflict(format!("slug {} already in use", new_post.slug))
                } else {
                    BlogError::Storage(err)
                }
            })?;
        tracing::info!(post_id = post.id, slug = %post.slug, owner_id = owner.id, "post created");
        Ok(post)
    }

    pub fn get_post(&self, slug: &str) -> Result<PostRecord> {
        self.database
            .with_repositories(|repos| repos.posts().get_by_slug(slug))?
            .ok_or_else(|| BlogError::not_found("post", slug))
    }

    /// Newest first.
    pub fn list_posts(&self, limit: usize) -> Result<Vec<PostRecord>> {
        Ok(self
            .database
            .with_repositories(|repos| repos.posts().list_recent(limit))?)
    }

    /// The post plus all its comments in creation order.
    pub fn get_post_details(&self, slug: &str) -> Result<PostDetails> {
        let post = self.get_post(slug)?;
        let comments =
            CommentService::new(self.database.clone()).list_for_post(post.id, CommentFilter::All)?;
        Ok(PostDetails { post, comments })
    }

    pub fn update_post(
        &self,
        current: &CurrentUser,
        slug: &str,
        input: UpdatePostInput,
    ) -> Result<PostRecord> {
        let modified_at = now_utc_iso();
        let updated = self.database.with_repositories(|repos| {
            let posts = repos.posts();
            let post = posts
                .get_by_slug(slug)?
                .ok_or_else(|| BlogError::not_found("post", slug))?;
            require_owner(current, &post)?;
            posts.update(post.id, &input.title, &input.content, &modified_at)?;
            Ok::<_, BlogError>(PostRecord {
                title: input.title.clone(),
                content: input.content.clone(),
                modified_at: modified_at.clone(),
                ..post
            })
        })?;
        tracing::info!(post_id = updated.id, slug = %updated.slug, "post updated");
        Ok(updated)
    }

    /// Removes the post together with every comment on it.
    pub fn delete_post(&self, current: &CurrentUser, slug: &str) -> Result<()> {
        let post_id = self.database.with_repositories(|repos| {
            let posts = repos.posts();
            let post = posts
                .get_by_slug(slug)?
                .ok_or_else(|| BlogError::not_found("post", slug))?;
            require_owner(current, &post)?;
            posts.delete(post.id)?;
            Ok::<_, BlogError>(post.id)
        })?;
        tracing::info!(post_id, slug = %slug, "post deleted");
        Ok(())
    }
}

fn require_staff(current: &CurrentUser) -> Result<&UserRecord> {
    match current.user() {
        Some(user) if user.is_staff => Ok(user),
        Some(user) => Err(BlogError::PermissionDenied(format!(
            "{} is not allowed to create posts",
            user.username
        ))),
        None => Err(BlogError::PermissionDenied(
            "anonymous users cannot create posts".into(),
        )),
    }
}

fn require_owner(current: &CurrentUser, post: &PostRecord) -> Result<()> {
    match current.user() {
        Some(user) if user.id == post.owner_id => Ok(()),
        _ => Err(BlogError::PermissionDenied(format!(
            "only the owner may modify post {}",
            post.slug
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::CreateCommentInput;
    use crate::database;
    use crate::identity::{Author, UserService};

    struct Fixture {
        db: Database,
        posts: PostService,
        owner: CurrentUser,
        other_staff: CurrentUser,
        reader: CurrentUser,
    }

    fn setup() -> Fixture {
        let db = database::in_memory();
        let users = UserService::new(db.clone());
        let owner = users.create_user("monkey", true).expect("owner");
        let other = users.create_user("gorilla", true).expect("other staff");
        let reader = users.create_user("reader", false).expect("reader");
        Fixture {
            posts: PostService::new(db.clone()),
            db,
            owner: CurrentUser::Authenticated(owner),
            other_staff: CurrentUser::Authenticated(other),
            reader: CurrentUser::Authenticated(reader),
        }
    }

    fn input(slug: &str) -> CreatePostInput {
        CreatePostInput {
            slug: slug.into(),
            title: "My Blog Post".into(),
            content: "Monkeys".into(),
        }
    }

    #[test]
    fn staff_can_create_and_fetch_by_slug() {
        let fx = setup();
        let created = fx
            .posts
            .create_post(&fx.owner, input("my-blog-post"))
            .expect("create post");
        let fetched = fx.posts.get_post("my-blog-post").expect("fetch post");
        assert_eq!(created, fetched);
        assert_eq!(fetched.created_at, fetched.modified_at);
    }

    #[test]
    fn non_staff_and_anonymous_cannot_create() {
        let fx = setup();
        for current in [&fx.reader, &CurrentUser::Anonymous] {
            let err = fx.posts.create_post(current, input("nope")).unwrap_err();
            assert!(matches!(err, BlogError::PermissionDenied(_)), "got {err:?}");
        }
        assert!(fx.posts.get_post("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn duplicate_slug_is_a_conflict() {
        let fx = setup();
        fx.posts
            .create_post(&fx.owner, input("my-blog-post"))
            .expect("create post");
        let err = fx
            .posts
            .create_post(&fx.other_staff, input("my-blog-post"))
            .unwrap_err();
        assert!(matches!(err, BlogError::Conflict(_)), "got {err:?}");
    }

    #[test]
    fn missing_owner_row_is_not_reported_as_a_conflict() {
        let fx = setup();
        let ghost = CurrentUser::Authenticated(UserRecord {
            id: 4242,
            username: "ghost".into(),
            is_staff: true,
            created_at: now_utc_iso(),
        });
        let err = fx.posts.create_post(&ghost, input("fresh")).unwrap_err();
        assert!(matches!(err, BlogError::Storage(_)), "got {err:?}");
        assert!(fx.posts.get_post("fresh").unwrap_err().is_not_found());
    }

    #[test]
    fn only_owner_can_edit() {
        let fx = setup();
        fx.posts
            .create_post(&fx.owner, input("my-blog-post"))
            .expect("create post");
        let edit = UpdatePostInput {
            title: "Edited".into(),
            content: "Fewer monkeys".into(),
        };

        let err = fx
            .posts
            .update_post(&fx.other_staff, "my-blog-post", edit.clone())
            .unwrap_err();
        assert!(matches!(err, BlogError::PermissionDenied(_)));

        let updated = fx
            .posts
            .update_post(&fx.owner, "my-blog-post", edit)
            .expect("owner edit");
        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.slug, "my-blog-post");
        assert_eq!(fx.posts.get_post("my-blog-post").unwrap(), updated);
    }

    #[test]
    fn delete_cascades_to_comments() {
        let fx = setup();
        let post = fx
            .posts
            .create_post(&fx.owner, input("my-blog-post"))
            .expect("create post");
        let comments = CommentService::new(fx.db.clone());
        let root = comments
            .create_comment(CreateCommentInput {
                post_slug: "my-blog-post".into(),
                parent_id: None,
                author: Author::Anonymous {
                    display_name: "visitor".into(),
                },
                content: "hi".into(),
            })
            .expect("comment");

        let err = fx.posts.delete_post(&fx.reader, "my-blog-post").unwrap_err();
        assert!(matches!(err, BlogError::PermissionDenied(_)));

        fx.posts
            .delete_post(&fx.owner, "my-blog-post")
            .expect("delete post");
        assert!(fx.posts.get_post("my-blog-post").unwrap_err().is_not_found());
        assert!(comments.get_comment(root.id).unwrap_err().is_not_found());
        assert!(comments
            .list_for_post(post.id, CommentFilter::All)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn list_posts_is_newest_first() {
        let fx = setup();
        fx.posts.create_post(&fx.owner, input("first")).unwrap();
        fx.posts.create_post(&fx.owner, input("second")).unwrap();
        let slugs: Vec<String> = fx
            .posts
            .list_posts(10)
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(slugs, vec!["second".to_string(), "first".to_string()]);
    }
}
