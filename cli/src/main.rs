//! `vidshare`: terminal front end for the video platform.
//!
//! Every invocation restores the saved session cookies and cached profile,
//! runs one command through the page layer, and writes the session back.

mod render;
mod session_file;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;
use vidshare_client::config::{ClientConfig, normalize_api_url};
use vidshare_client::net::api::{ApiClient, ProfileUpdate, RegisterForm, UploadForm};
use vidshare_client::net::error::ApiError;
use vidshare_client::net::transport::{FileUpload, ReqwestTransport};
use vidshare_client::pages::PageError;
use vidshare_client::pages::account;
use vidshare_client::pages::channel::ChannelPage;
use vidshare_client::pages::feed::{FeedController, FeedKind};
use vidshare_client::pages::library::{HistoryPage, SubscriptionsPage};
use vidshare_client::pages::watch::WatchPage;
use vidshare_client::state::auth::AuthStore;
use vidshare_client::state::page::{ErrorNotice, PageState};
use vidshare_client::state::profile_cache::ProfileCache;

use crate::session_file::SessionFile;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}\nrun `vidshare login` to sign in again")]
    SessionExpired(String),
    #[error("{0}")]
    Page(PageError),
    #[error("{0}")]
    Api(ApiError),
    #[error("{}", .0.message)]
    Notice(ErrorNotice),
    #[error("session file {path}: {source}")]
    SessionFile { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<PageError> for CliError {
    fn from(err: PageError) -> Self {
        if err.is_session_expired() { Self::SessionExpired(err.to_string()) } else { Self::Page(err) }
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        if err.is_session_expired() { Self::SessionExpired(err.to_string()) } else { Self::Api(err) }
    }
}

#[derive(Parser, Debug)]
#[command(name = "vidshare", about = "Browse, watch, and upload videos from the terminal")]
struct Cli {
    /// API root including the version prefix.
    #[arg(long, env = "VIDSHARE_API_URL")]
    base_url: Option<String>,

    /// Where the signed-in profile is cached; the session file sits beside it.
    #[arg(long, env = "VIDSHARE_PROFILE_CACHE")]
    profile_cache: Option<PathBuf>,

    /// Print loaded records as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        email: String,
        #[arg(long, env = "VIDSHARE_PASSWORD")]
        password: String,
    },
    Logout,
    Register {
        #[arg(long)]
        fullname: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "VIDSHARE_PASSWORD")]
        password: String,
        #[arg(long)]
        avatar: Option<PathBuf>,
        #[arg(long)]
        cover_image: Option<PathBuf>,
    },
    /// Show the signed-in user, re-fetched from the backend.
    Whoami,
    Home {
        /// Number of pages to load.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    Trending {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show a video with its comments, optionally recording playback.
    Watch {
        video_id: String,
        /// Seconds of playback to record in watch history.
        #[arg(long)]
        watched: Option<f64>,
        /// Record the video as watched to the end.
        #[arg(long)]
        completed: bool,
    },
    Like {
        video_id: String,
    },
    Dislike {
        video_id: String,
    },
    Comment {
        video_id: String,
        content: String,
    },
    LikeComment {
        video_id: String,
        comment_id: String,
    },
    Channel {
        username: String,
    },
    /// Subscribe to a channel, or unsubscribe when already subscribed.
    Subscribe {
        username: String,
    },
    History,
    ClearHistory,
    Liked {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    Subscriptions,
    YourVideos {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    Upload {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        video: PathBuf,
        #[arg(long)]
        thumbnail: PathBuf,
        /// Length in seconds.
        #[arg(long)]
        duration: f64,
    },
    UpdateProfile {
        #[arg(long)]
        fullname: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        avatar: Option<PathBuf>,
        #[arg(long)]
        cover_image: Option<PathBuf>,
    },
    ChangePassword {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        token: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: failed to read .env: {e}");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = config_for(&cli)?;
    let transport = Arc::new(ReqwestTransport::new(&config)?);
    let session = SessionFile::beside(&config.profile_cache);
    if let Some(header) = session.load().await.map_err(|e| session_error(&session, e))? {
        transport.restore_cookies(&header)?;
    }

    let api = ApiClient::with_transport(transport.clone());
    let auth = Arc::new(AuthStore::new(api, ProfileCache::new(config.profile_cache.clone())));
    auth.restore().await;
    let watcher = auth.spawn_expiry_watcher();

    let result = dispatch(&auth, cli.command, cli.json).await;
    let persisted = persist_session(&auth, &transport, &session).await;
    watcher.abort();
    persisted?;
    result
}

fn config_for(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.base_url {
        config.api_url = normalize_api_url(url)?;
    }
    if let Some(path) = &cli.profile_cache {
        config.profile_cache.clone_from(path);
    }
    tracing::debug!(api_url = %config.api_url, cache = %config.profile_cache.display(), "config loaded");
    Ok(config)
}

/// Keep the cookie jar for the next invocation, or drop it once signed out.
async fn persist_session(auth: &AuthStore, transport: &ReqwestTransport, session: &SessionFile) -> Result<(), CliError> {
    let saved = match transport.cookie_header() {
        Some(header) if auth.is_authenticated() => session.save(&header).await,
        _ => session.clear().await,
    };
    saved.map_err(|e| session_error(session, e))
}

fn session_error(session: &SessionFile, source: std::io::Error) -> CliError {
    CliError::SessionFile { path: session.path().to_path_buf(), source }
}

// =============================================================================
// DISPATCH
// =============================================================================

async fn dispatch(auth: &AuthStore, command: Command, json: bool) -> Result<(), CliError> {
    let now = OffsetDateTime::now_utc();
    match command {
        Command::Login { email, password } => {
            let user = auth.login(&email, &password).await?;
            println!("Logged in as {}", render::user_line(&user));
        }
        Command::Logout => {
            auth.logout().await;
            println!("Logged out");
        }
        Command::Register { fullname, username, email, password, avatar, cover_image } => {
            let form = RegisterForm {
                fullname,
                username,
                email,
                password,
                avatar: read_optional(avatar.as_deref()).await?,
                cover_image: read_optional(cover_image.as_deref()).await?,
            };
            match account::register(auth, &form).await {
                Ok(message) => println!("{message}"),
                Err(err) if account::is_already_registered(&err) => {
                    println!("{err}. Log in with `vidshare login {}`.", form.email);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Whoami => {
            if auth.is_authenticated() {
                let user = auth.refresh_user().await?;
                emit_value(json, &user, vec![render::user_line(&user)])?;
            } else {
                println!("Not logged in");
            }
        }
        Command::Home { pages } => feed(auth, FeedKind::Home, pages, json, now).await?,
        Command::Trending { pages } => feed(auth, FeedKind::Trending, pages, json, now).await?,
        Command::Search { query, pages } => feed(auth, FeedKind::Search(query), pages, json, now).await?,
        Command::Liked { pages } => feed(auth, FeedKind::Liked, pages, json, now).await?,
        Command::YourVideos { pages } => feed(auth, FeedKind::YourVideos, pages, json, now).await?,
        Command::Watch { video_id, watched, completed } => {
            let page = WatchPage::load(auth, &video_id).await;
            emit(json, &page.state, |video| video, |video| {
                let mut lines = render::video_detail(video, now);
                lines.push(String::new());
                lines.push(format!("{} comments", page.comments.len()));
                lines.extend(page.comments.iter().map(|c| render::comment_line(c, now)));
                lines
            })?;
            let mut reporter = page.reporter();
            if let Some(position) = watched {
                reporter.progress(auth, position).await;
            }
            if completed {
                let duration = page.video().and_then(|v| v.duration).unwrap_or_default();
                reporter.ended(auth, duration).await;
            }
        }
        Command::Like { video_id } => {
            let mut page = loaded_watch_page(auth, &video_id).await?;
            page.like(auth).await?;
            print_reactions(&page);
        }
        Command::Dislike { video_id } => {
            let mut page = loaded_watch_page(auth, &video_id).await?;
            page.dislike(auth).await?;
            print_reactions(&page);
        }
        Command::Comment { video_id, content } => {
            let mut page = loaded_watch_page(auth, &video_id).await?;
            page.add_comment(auth, &content).await?;
            if let Some(comment) = page.comments.first() {
                println!("{}", render::comment_line(comment, now));
            }
        }
        Command::LikeComment { video_id, comment_id } => {
            let mut page = loaded_watch_page(auth, &video_id).await?;
            page.like_comment(auth, &comment_id).await?;
            if let Some(comment) = page.comments.iter().find(|c| c.id == comment_id) {
                println!("{}", render::comment_line(comment, now));
            }
        }
        Command::Channel { username } => {
            let page = ChannelPage::load(auth, &username).await;
            emit(json, &page.state, |view| &view.videos, |view| {
                let mut lines = render::channel_header(&view.profile);
                lines.push(String::new());
                lines.extend(view.videos.iter().map(|v| render::video_line(v, now)));
                lines
            })?;
        }
        Command::Subscribe { username } => {
            let mut page = ChannelPage::load(auth, &username).await;
            if let PageState::Failed(notice) = &page.state {
                return Err(CliError::Notice(notice.clone()));
            }
            let subscribed = page.toggle_subscription(auth).await?;
            println!("{} @{username}", if subscribed { "Subscribed to" } else { "Unsubscribed from" });
        }
        Command::History => {
            let page = HistoryPage::load(auth).await;
            emit(json, &page.state, Vec::as_slice, |items| {
                items.iter().map(|item| render::history_line(item, now)).collect()
            })?;
        }
        Command::ClearHistory => {
            let mut page = HistoryPage::load(auth).await;
            page.clear(auth).await?;
            println!("Watch history cleared");
        }
        Command::Subscriptions => {
            let page = SubscriptionsPage::load(auth).await;
            emit(json, &page.state, Vec::as_slice, |channels| {
                channels.iter().map(|c| render::subscription_line(c, now)).collect()
            })?;
        }
        Command::Upload { title, description, video, thumbnail, duration } => {
            let form = UploadForm {
                title,
                description,
                video_file: FileUpload::from_path(&video).await?,
                thumbnail: FileUpload::from_path(&thumbnail).await?,
                duration,
            };
            println!("{}", account::upload(auth, &form).await?);
        }
        Command::UpdateProfile { fullname, email, avatar, cover_image } => {
            let current = auth.current_user();
            let update = ProfileUpdate {
                fullname: fullname.or_else(|| current.as_ref().map(|u| u.fullname.clone())).unwrap_or_default(),
                email: email.or_else(|| current.as_ref().map(|u| u.email.clone())).unwrap_or_default(),
                avatar: read_optional(avatar.as_deref()).await?,
                cover_image: read_optional(cover_image.as_deref()).await?,
            };
            println!("{}", account::update_profile(auth, &update).await?);
        }
        Command::ChangePassword { old, new, confirm } => {
            println!("{}", account::change_password(auth, &old, &new, &confirm).await?);
        }
        Command::ForgotPassword { email } => {
            println!("{}", account::forgot_password(auth, &email).await?);
        }
        Command::ResetPassword { token, new, confirm } => {
            println!("{}", account::reset_password(auth, &token, &new, &confirm).await?);
        }
    }
    Ok(())
}

async fn feed(auth: &AuthStore, kind: FeedKind, pages: u32, json: bool, now: OffsetDateTime) -> Result<(), CliError> {
    let mut controller = FeedController::new(kind);
    controller.load(auth).await;
    for _ in 1..pages {
        if !controller.has_more() || controller.load_more(auth).await? == 0 {
            break;
        }
    }
    emit(json, &controller.state, |feed| feed.items.as_slice(), |feed| {
        let mut lines: Vec<_> = feed.items.iter().map(|v| render::video_line(v, now)).collect();
        if feed.has_more {
            lines.push(format!("(more available: --pages {})", feed.page + 1));
        }
        lines
    })
}

async fn loaded_watch_page(auth: &AuthStore, video_id: &str) -> Result<WatchPage, CliError> {
    let page = WatchPage::load(auth, video_id).await;
    match &page.state {
        PageState::Failed(notice) => Err(CliError::Notice(notice.clone())),
        _ => Ok(page),
    }
}

fn print_reactions(page: &WatchPage) {
    if let Some(video) = page.video() {
        println!("{}: {} likes, {} dislikes", video.title, video.likes, video.dislikes);
    }
}

async fn read_optional(path: Option<&Path>) -> Result<Option<FileUpload>, CliError> {
    match path {
        Some(path) => Ok(Some(FileUpload::from_path(path).await?)),
        None => Ok(None),
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Print a page's content, or its message when there is nothing to show.
fn emit<T, S>(
    json: bool,
    state: &PageState<T>,
    project: impl Fn(&T) -> &S,
    lines: impl Fn(&T) -> Vec<String>,
) -> Result<(), CliError>
where
    S: Serialize + ?Sized,
{
    match state {
        PageState::Loaded(value) => emit_value(json, project(value), lines(value)),
        PageState::Failed(notice) if notice.session_expired => {
            Err(CliError::SessionExpired(notice.message.clone()))
        }
        PageState::Failed(notice) => Err(CliError::Notice(notice.clone())),
        other => {
            print_lines(&render::page_lines(other, |_| Vec::new()));
            Ok(())
        }
    }
}

fn emit_value<S: Serialize + ?Sized>(json: bool, value: &S, lines: Vec<String>) -> Result<(), CliError> {
    if json {
        print_json(value)
    } else {
        print_lines(&lines);
        Ok(())
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

fn print_json<S: Serialize + ?Sized>(value: &S) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
