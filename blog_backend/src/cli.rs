use crate::comments::{CommentFilter, CommentService, CommentView, CreateCommentInput};
use crate::config::BlogConfig;
use crate::database::Database;
use crate::error::BlogError;
use crate::identity::{Author, CurrentUser, UserService};
use crate::posts::{CreatePostInput, PostService, UpdatePostInput};
use anyhow::{Context, Result};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Run the interactive shell for managing posts and comments.
pub async fn run_cli(config: BlogConfig, database: Database) -> Result<()> {
    let users = UserService::new(database.clone());
    let current = users
        .resolve(config.default_user.as_deref())
        .context("failed to resolve BLOG_USER")?;

    let mut session = CliSession {
        users,
        posts: PostService::new(database.clone()),
        comments: CommentService::new(database),
        current,
        nick: None,
        anonymous_name: config.anonymous_name,
    };

    println!("Blog shell ready. Type 'help' for a list of commands.");
    session.print_whoami();

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        print!("blog> ");
        io::stdout().flush()?;

        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            println!("Exiting");
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let tokens = match shell_words::split(trimmed) {
            Ok(tokens) if !tokens.is_empty() => tokens,
            Ok(_) => continue,
            Err(err) => {
                println!("Unable to parse command: {err}");
                continue;
            }
        };

        match session.handle_command(&tokens) {
            Ok(LoopAction::Continue) => {}
            Ok(LoopAction::Exit) => break,
            Err(err) => {
                println!("Error: {err:#}");
            }
        }
    }

    Ok(())
}

struct CliSession {
    users: UserService,
    posts: PostService,
    comments: CommentService,
    current: CurrentUser,
    nick: Option<String>,
    anonymous_name: String,
}

enum LoopAction {
    Continue,
    Exit,
}

impl CliSession {
    fn handle_command(&mut self, tokens: &[String]) -> Result<LoopAction, BlogError> {
        let command = tokens[0].as_str();
        match command {
            "help" => self.print_help(),
            "whoami" => self.print_whoami(),
            "login" => {
                let Some(username) = tokens.get(1) else {
                    println!("Usage: login <username>");
                    return Ok(LoopAction::Continue);
                };
                self.current = self.users.resolve(Some(username.as_str()))?;
                self.print_whoami();
            }
            "logout" => {
                self.current = CurrentUser::Anonymous;
                self.print_whoami();
            }
            "nick" => {
                if tokens.len() < 2 {
                    println!("Usage: nick NAME");
                    return Ok(LoopAction::Continue);
                }
                self.nick = Some(tokens[1..].join(" "));
                self.print_whoami();
            }
            "add-user" => {
                let Some(username) = tokens.get(1) else {
                    println!("Usage: add-user <username> [--staff]");
                    return Ok(LoopAction::Continue);
                };
                let is_staff = tokens[2..].iter().any(|flag| flag == "--staff");
                let user = self.users.create_user(username, is_staff)?;
                println!("Created user {} (id {}, staff: {})", user.username, user.id, user.is_staff);
            }
            "users" => {
                for user in self.users.list_users()? {
                    let staff = if user.is_staff { " [staff]" } else { "" };
                    println!("{:>4}  {}{}", user.id, user.username, staff);
                }
            }
            "posts" | "list-posts" => {
                let limit = tokens
                    .get(1)
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(20);
                self.list_posts(limit)?;
            }
            "new-post" => {
                if tokens.len() < 4 {
                    println!("Usage: new-post SLUG \"title\" \"content\"");
                    return Ok(LoopAction::Continue);
                }
                let post = self.posts.create_post(
                    &self.current,
                    CreatePostInput {
                        slug: tokens[1].clone(),
                        title: tokens[2].clone(),
                        content: tokens[3..].join(" "),
                    },
                )?;
                println!("Created post {} ({})", post.slug, post.id);
            }
            "edit-post" => {
                if tokens.len() < 4 {
                    println!("Usage: edit-post SLUG \"title\" \"content\"");
                    return Ok(LoopAction::Continue);
                }
                let post = self.posts.update_post(
                    &self.current,
                    &tokens[1],
                    UpdatePostInput {
                        title: tokens[2].clone(),
                        content: tokens[3..].join(" "),
                    },
                )?;
                println!("Updated post {} at {}", post.slug, post.modified_at);
            }
            "delete-post" => {
                let Some(slug) = tokens.get(1) else {
                    println!("Usage: delete-post SLUG");
                    return Ok(LoopAction::Continue);
                };
                self.posts.delete_post(&self.current, slug)?;
                println!("Deleted post {slug} and its comments");
            }
            "view-post" | "post" => {
                let Some(slug) = tokens.get(1) else {
                    println!("Usage: view-post SLUG");
                    return Ok(LoopAction::Continue);
                };
                self.view_post(slug)?;
            }
            "comment" => {
                if tokens.len() < 3 {
                    println!("Usage: comment SLUG \"message\"");
                    return Ok(LoopAction::Continue);
                }
                self.create_comment(&tokens[1], None, tokens[2..].join(" "))?;
            }
            "reply" => {
                if tokens.len() < 4 {
                    println!("Usage: reply SLUG PARENT_ID \"message\"");
                    return Ok(LoopAction::Continue);
                }
                let Ok(parent_id) = tokens[2].parse::<i64>() else {
                    println!("PARENT_ID must be a comment id");
                    return Ok(LoopAction::Continue);
                };
                self.create_comment(&tokens[1], Some(parent_id), tokens[3..].join(" "))?;
            }
            "comment-info" => {
                let Some(id) = tokens.get(1).and_then(|raw| raw.parse::<i64>().ok()) else {
                    println!("Usage: comment-info ID");
                    return Ok(LoopAction::Continue);
                };
                self.comment_info(id)?;
            }
            "export" => {
                let Some(slug) = tokens.get(1) else {
                    println!("Usage: export SLUG");
                    return Ok(LoopAction::Continue);
                };
                let details = self.posts.get_post_details(slug)?;
                let json = serde_json::to_string_pretty(&details).map_err(anyhow::Error::from)?;
                println!("{json}");
            }
            "quit" | "exit" => return Ok(LoopAction::Exit),
            "clear" => print!("\x1B[2J\x1B[1;1H"),
            other => {
                println!("Unknown command '{other}'. Type 'help' for a list of commands.");
            }
        }
        Ok(LoopAction::Continue)
    }

    fn print_help(&self) {
        println!("Available commands:");
        println!("  help                         Show this help message");
        println!("  whoami                       Show who you are acting as");
        println!("  login <username>             Act as an existing user");
        println!("  logout                       Act anonymously");
        println!("  nick NAME                    Display name for comments");
        println!("  add-user <username> [--staff]  Register a user");
        println!("  users                        List registered users");
        println!("  posts [N]                    List recent posts (default 20)");
        println!("  new-post SLUG TITLE CONTENT  Create a post (staff only)");
        println!("  edit-post SLUG TITLE CONTENT Edit one of your posts");
        println!("  delete-post SLUG             Delete one of your posts and its comments");
        println!("  view-post SLUG               Show a post with its comment threads");
        println!("  comment SLUG MSG             Comment on a post");
        println!("  reply SLUG PARENT_ID MSG     Reply to a comment");
        println!("  comment-info ID              Show depth, path and descendant count");
        println!("  export SLUG                  Print a post and its comments as JSON");
        println!("  clear                        Clear the screen");
        println!("  quit                         Exit the shell");
    }

    fn print_whoami(&self) {
        match &self.current {
            CurrentUser::Authenticated(user) => {
                let staff = if user.is_staff { " (staff)" } else { "" };
                println!("Logged in as {}{}", user.username, staff);
            }
            CurrentUser::Anonymous => {
                let name = self.nick.as_deref().unwrap_or(&self.anonymous_name);
                println!("Anonymous, commenting as {name}");
            }
        }
    }

    fn list_posts(&self, limit: usize) -> Result<(), BlogError> {
        let posts = self.posts.list_posts(limit)?;
        if posts.is_empty() {
            println!("No posts yet.");
            return Ok(());
        }
        for post in posts {
            println!("{:<24} {}  ({})", post.slug, post.title, post.created_at);
        }
        Ok(())
    }

    fn view_post(&self, slug: &str) -> Result<(), BlogError> {
        let post = self.posts.get_post(slug)?;
        let owner = self
            .users
            .get(post.owner_id)?
            .map(|user| user.username)
            .unwrap_or_else(|| format!("user #{}", post.owner_id));
        println!("{}", post.title);
        println!("by {owner} on {}", post.created_at);
        println!();
        println!("{}", post.content);
        println!();

        let roots = self
            .comments
            .list_for_post(post.id, CommentFilter::TopLevelOnly)?;
        if roots.is_empty() {
            println!("No comments.");
            return Ok(());
        }
        for root in &roots {
            self.print_thread(root)?;
        }
        Ok(())
    }

    fn print_thread(&self, comment: &CommentView) -> Result<(), BlogError> {
        let indent = "  ".repeat(comment.depth);
        println!(
            "{indent}[{}] {}: {}",
            comment.id, comment.display_name, comment.content
        );
        for reply in self.comments.replies(comment.id)? {
            self.print_thread(&reply)?;
        }
        Ok(())
    }

    fn create_comment(
        &self,
        slug: &str,
        parent_id: Option<i64>,
        content: String,
    ) -> Result<(), BlogError> {
        let author = Author::for_current(&self.current, self.nick.clone(), &self.anonymous_name);
        let comment = self.comments.create_comment(CreateCommentInput {
            post_slug: slug.to_string(),
            parent_id,
            author,
            content,
        })?;
        println!(
            "Comment {} posted as {} (depth {})",
            comment.id, comment.display_name, comment.depth
        );
        Ok(())
    }

    fn comment_info(&self, id: i64) -> Result<(), BlogError> {
        let comment = self.comments.get_comment(id)?;
        println!("Comment {} on post {}", comment.id, comment.post_id);
        println!("  author:      {}", comment.display_name);
        println!("  depth:       {}", comment.depth);
        println!("  thread path: {:?}", comment.thread_path);
        if comment.is_top_level() {
            println!("  descendants: {}", self.comments.descendants_count(id)?);
        }
        println!("  replies:     {}", self.comments.replies(id)?.len());
        Ok(())
    }
}
