use blog_backend::bootstrap;
use blog_backend::comments::{CommentFilter, CommentService, CommentView, CreateCommentInput};
use blog_backend::config::{BlogConfig, BlogPaths};
use blog_backend::database::Database;
use blog_backend::identity::{Author, CurrentUser, UserService};
use blog_backend::posts::{CreatePostInput, PostService};
use blog_backend::thread_path::ThreadPath;
use blog_backend::BlogError;
use tempfile::{tempdir, TempDir};

struct TestBlog {
    _dir: TempDir,
    database: Database,
    staff: CurrentUser,
}

fn setup() -> TestBlog {
    let dir = tempdir().expect("tempdir");
    let config = BlogConfig::new(BlogPaths::from_base_dir(dir.path()).expect("paths"));
    let resources = bootstrap::initialize(&config).expect("bootstrap");
    assert!(resources.database_initialized);
    let staff = UserService::new(resources.database.clone())
        .create_user("monkey", true)
        .expect("create user");
    TestBlog {
        _dir: dir,
        database: resources.database,
        staff: CurrentUser::Authenticated(staff),
    }
}

fn comment(service: &CommentService, slug: &str, parent: Option<&CommentView>) -> CommentView {
    service
        .create_comment(CreateCommentInput {
            post_slug: slug.into(),
            parent_id: parent.map(|p| p.id),
            author: Author::Anonymous {
                display_name: "visitor".into(),
            },
            content: "Monkeys".into(),
        })
        .expect("create comment")
}

#[test]
fn reply_chain_builds_paths_depths_and_counts() {
    let blog = setup();
    let posts = PostService::new(blog.database.clone());
    let comments = CommentService::new(blog.database.clone());

    let post = posts
        .create_post(
            &blog.staff,
            CreatePostInput {
                slug: "a-test-post".into(),
                title: "A Test Post".into(),
                content: "Too many monkeys".into(),
            },
        )
        .expect("create post");

    let c1 = comment(&comments, &post.slug, None);
    let c2 = comment(&comments, &post.slug, Some(&c1));
    let c3 = comment(&comments, &post.slug, Some(&c2));

    assert_eq!(c1.thread_path, "");
    assert_eq!(c2.thread_path, format!("{}", c1.id));
    assert_eq!(c3.thread_path, format!("{};{}", c1.id, c2.id));

    assert_eq!(comments.depth(c1.id).unwrap(), 0);
    assert_eq!(comments.depth(c2.id).unwrap(), 1);
    assert_eq!(comments.depth(c3.id).unwrap(), 2);
    assert_eq!(comments.descendants_count(c1.id).unwrap(), 2);

    for id in [c2.id, c3.id] {
        let err = comments.descendants_count(id).unwrap_err();
        assert!(matches!(err, BlogError::InvalidOperation(_)), "got {err:?}");
    }

    let decoded = ThreadPath::decode(Some(&c3.thread_path)).unwrap();
    assert_eq!(decoded.ancestors(), &[c1.id, c2.id]);
}

#[test]
fn root_with_branching_children_counts_whole_subtree() {
    let blog = setup();
    let posts = PostService::new(blog.database.clone());
    let comments = CommentService::new(blog.database.clone());
    posts
        .create_post(
            &blog.staff,
            CreatePostInput {
                slug: "branching".into(),
                title: "Branching".into(),
                content: "Trees".into(),
            },
        )
        .expect("create post");

    let root = comment(&comments, "branching", None);
    let a = comment(&comments, "branching", Some(&root));
    let b = comment(&comments, "branching", Some(&root));
    let a1 = comment(&comments, "branching", Some(&a));

    assert_eq!(comments.descendants_count(root.id).unwrap(), 3);
    for (child, parent) in [(&a, &root), (&b, &root), (&a1, &a)] {
        assert_eq!(child.depth, parent.depth + 1);
        let parent_path = ThreadPath::decode(Some(&parent.thread_path)).unwrap();
        assert_eq!(
            ThreadPath::decode(Some(&child.thread_path)).unwrap(),
            parent_path.child_of(parent.id)
        );
    }

    let post = posts.get_post("branching").unwrap();
    let top = comments
        .list_for_post(post.id, CommentFilter::TopLevelOnly)
        .unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, root.id);
    let replies: Vec<i64> = comments.replies(root.id).unwrap().iter().map(|c| c.id).collect();
    assert_eq!(replies, vec![a.id, b.id]);
}

#[test]
fn data_survives_reopening_the_database() {
    let dir = tempdir().expect("tempdir");
    let config = BlogConfig::new(BlogPaths::from_base_dir(dir.path()).expect("paths"));
    let root_id = {
        let resources = bootstrap::initialize(&config).expect("bootstrap");
        let staff = UserService::new(resources.database.clone())
            .create_user("monkey", true)
            .expect("create user");
        PostService::new(resources.database.clone())
            .create_post(
                &CurrentUser::Authenticated(staff),
                CreatePostInput {
                    slug: "persisted".into(),
                    title: "Persisted".into(),
                    content: "Still here".into(),
                },
            )
            .expect("create post");
        let comments = CommentService::new(resources.database);
        let root = comment(&comments, "persisted", None);
        comment(&comments, "persisted", Some(&root));
        root.id
    };

    let reopened = bootstrap::initialize(&config).expect("reopen");
    assert!(!reopened.database_initialized);
    let comments = CommentService::new(reopened.database);
    assert_eq!(comments.descendants_count(root_id).unwrap(), 1);
}
