mod output;
mod theme;

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use murmur::{
    DocumentStore, Facade, MemoryStore, MurmurConfig, RedisStore, SortOrder,
    api::{Response, TokenView},
};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

use output::{GlobalOptions, OutputFormat, OutputManager};

const ENVIRONMENT_VARIABLES: &str = "\
Environment variables:
  MURMUR_CONFIG     Path to the TOML configuration file
  MURMUR_REDIS_URL  Redis connection URL (falls back to REDIS_URL)
  MURMUR_PREFIX     Key namespace prefix
  MURMUR_SECRET     Token signing secret
  MURMUR_TOKEN_TTL  Token lifetime in seconds
  MURMUR_TOKEN      Session token used by mutating commands
  RUST_LOG          Log filter (e.g. murmur=debug)";

#[derive(Parser)]
#[command(name = "murmur")]
#[command(version)]
#[command(about = "Publish posts, follow users and like posts")]
#[command(after_long_help = ENVIRONMENT_VARIABLES)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "MURMUR_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Session token for mutating commands
    #[arg(long, global = true, env = "MURMUR_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Use a throwaway in-process store instead of Redis
    #[arg(long, global = true)]
    memory: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and print its session token
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Exchange credentials for a session token
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Publish a post as the token's user
    Publish {
        title: String,
        #[arg(default_value = "")]
        content: String,
    },
    /// Like a post, or remove an existing like
    Like { post_id: String },
    /// Follow a user
    Follow { user_id: String },
    /// Stop following a user
    Unfollow { user_id: String },
    /// List posts by insertion order
    Posts {
        /// Page size
        #[arg(long, default_value_t = 10)]
        first: u64,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,
        /// asc, desc, 1 or -1
        #[arg(long, default_value = "desc", allow_negative_numbers = true)]
        order: SortOrder,
    },
    /// Show one post
    Post { id: String },
    /// Show one user
    User { id: String },
    /// Users following a user
    Followers { user_id: String },
    /// Users a user follows
    Following { user_id: String },
    /// Posts written by a user
    UserPosts { user_id: String },
    /// Users who liked a post
    Likers { post_id: String },
    /// Author of a post
    Author { post_id: String },
    /// Dispatch raw JSON envelopes, one per line
    ///
    /// Reads the ENVELOPE argument, or --file, or stdin. A token returned by
    /// `register` or `login` becomes the credential of later envelopes that
    /// carry no `authorization` field.
    Call {
        envelope: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output,
        no_color: cli.no_color,
    });

    match run(cli, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

async fn run(cli: Cli, output: &OutputManager) -> Result<()> {
    let config = MurmurConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let token = cli.token.unwrap_or_default();

    if cli.memory {
        output.warning("using an in-process store; nothing is persisted");
        let facade = Facade::new(MemoryStore::new(), config.signer());
        execute(&facade, cli.command, token, output).await
    } else {
        let store = RedisStore::connect(&config.redis.url, config.redis.prefix.clone())
            .await
            .with_context(|| format!("failed to connect to {}", config.redis.url))?;
        log::debug!("connected to {} with prefix '{}'", config.redis.url, store.prefix());
        let facade = Facade::new(store, config.signer());
        execute(&facade, cli.command, token, output).await
    }
}

async fn execute<S: DocumentStore>(
    facade: &Facade<S>,
    command: Commands,
    token: String,
    output: &OutputManager,
) -> Result<()> {
    match command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            let session = facade.register(&username, &email, &password).await?;
            output.success(&format!("Registered {username}"));
            output.display(&session)?;
        }
        Commands::Login { username, password } => {
            let session: TokenView = facade.login(&username, &password).await?;
            output.success(&format!("Logged in as {username}"));
            output.display(&session)?;
        }
        Commands::Publish { title, content } => {
            let post = facade.publish_post(&title, &content, &token).await?;
            output.success("Post published");
            output.display(&post)?;
        }
        Commands::Like { post_id } => {
            let post = facade.like_post(&post_id, &token).await?;
            output.display(&post)?;
        }
        Commands::Follow { user_id } => {
            let user = facade.follow_user(&user_id, &token).await?;
            output.success(&format!("Now following {user_id}"));
            output.display(&user)?;
        }
        Commands::Unfollow { user_id } => {
            let user = facade.unfollow_user(&user_id, &token).await?;
            output.success(&format!("No longer following {user_id}"));
            output.display(&user)?;
        }
        Commands::Posts { first, page, order } => {
            let posts = facade.get_posts(first, Some(page), Some(order)).await?;
            output.display(&posts)?;
            if first > 0 {
                let pages = facade.count_pages(first).await?;
                output.info(&format!("page {} of {pages}", page.max(1)));
            }
        }
        Commands::Post { id } => match facade.get_post(&id).await? {
            Some(post) => output.display(&post)?,
            None => bail!("Post not found"),
        },
        Commands::User { id } => match facade.get_user(&id).await? {
            Some(user) => output.display(&user)?,
            None => bail!("User not found"),
        },
        Commands::Followers { user_id } => output.display(&facade.get_followers(&user_id).await?)?,
        Commands::Following { user_id } => output.display(&facade.get_following(&user_id).await?)?,
        Commands::UserPosts { user_id } => output.display(&facade.get_user_posts(&user_id).await?)?,
        Commands::Likers { post_id } => output.display(&facade.get_post_likers(&post_id).await?)?,
        Commands::Author { post_id } => output.display(&facade.get_post_author(&post_id).await?)?,
        Commands::Call { envelope, file } => {
            let lines = read_envelopes(envelope, file).await?;
            call(facade, lines, token, output).await?;
        }
    }
    Ok(())
}

async fn read_envelopes(envelope: Option<String>, file: Option<PathBuf>) -> Result<Vec<String>> {
    let content = match (envelope, file) {
        (Some(envelope), _) => envelope,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut content = String::new();
            while let Some(line) = lines.next_line().await? {
                content.push_str(&line);
                content.push('\n');
            }
            content
        }
    };
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

async fn call<S: DocumentStore>(
    facade: &Facade<S>,
    lines: Vec<String>,
    mut token: String,
    output: &OutputManager,
) -> Result<()> {
    let mut failures = 0usize;
    for line in lines {
        let mut envelope: Value = serde_json::from_str(&line).with_context(|| format!("invalid JSON: {line}"))?;
        if let Value::Object(fields) = &mut envelope
            && !fields.contains_key("authorization")
            && !token.is_empty()
        {
            fields.insert("authorization".to_string(), Value::String(token.clone()));
        }

        let response = facade.dispatch_json(&envelope.to_string()).await;
        if let Response::Data(data) = &response
            && let Some(issued) = data.get("token").and_then(Value::as_str)
        {
            token = issued.to_string();
        }
        if response.is_error() {
            failures += 1;
        }
        println!("{}", serde_json::to_string(&response)?);
    }
    if failures > 0 {
        output.warning(&format!("{failures} request(s) failed"));
    }
    Ok(())
}
