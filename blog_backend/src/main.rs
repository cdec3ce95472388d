use anyhow::Result;
use blog_backend::bootstrap;
use blog_backend::cli;
use blog_backend::config::BlogConfig;
use blog_backend::identity::UserService;
use blog_backend::telemetry;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Blog backend with threaded comments")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the interactive shell for posts and comments
    Cli,
    /// Register a user without entering the shell
    AddUser {
        username: String,
        /// Allow this user to write posts
        #[arg(long)]
        staff: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();

    let config = BlogConfig::from_env()?;
    let resources = bootstrap::initialize(&config)?;

    match args.command.unwrap_or(Command::Cli) {
        Command::Cli => cli::run_cli(config, resources.database).await,
        Command::AddUser { username, staff } => {
            let user = UserService::new(resources.database).create_user(&username, staff)?;
            println!("Created user {} (id {})", user.username, user.id);
            Ok(())
        }
    }
}
