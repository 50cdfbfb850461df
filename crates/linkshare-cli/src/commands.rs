use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use linkshare_remote::{JournalConfig, JournaledRemote};
use linkshare_sdk::{
    build_link, FeedTab, Millis, PostId, Record, Session, SessionConfig, SessionStatus, ViewMode,
};
use serde::Serialize;
use serde_json::json;

use crate::cli::*;

const JOURNAL_FILE: &str = "remote.journal";
const CONFIG_FILE: &str = "linkshare.toml";

/// Everything a command needs besides its own arguments.
struct Env {
    data_dir: PathBuf,
    config: SessionConfig,
    format: OutputFormat,
}

impl Env {
    fn open_remote(&self) -> anyhow::Result<Arc<JournaledRemote>> {
        let path = self.data_dir.join(JOURNAL_FILE);
        let remote = JournaledRemote::open(&path, JournalConfig::default())
            .with_context(|| format!("opening remote journal {}", path.display()))?;
        Ok(Arc::new(remote))
    }

    /// Open a session and take in everything the remote already holds.
    fn open_session(&self, mode: ViewMode) -> anyhow::Result<Session> {
        let remote = self.open_remote()?;
        let mut session = Session::open(remote, self.config.clone(), mode)?;
        session.pump();
        Ok(session)
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostView<'a> {
    #[serde(flatten)]
    record: &'a Record,
    link: String,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let env = Env {
        config: load_config(cli.config_file.as_deref(), &cli.data_dir)?,
        data_dir: cli.data_dir,
        format: cli.format,
    };
    match cli.command {
        Command::Post(args) => cmd_post(&env, args),
        Command::Like(args) => cmd_like(&env, args),
        Command::Feed(args) => cmd_feed(&env, args),
        Command::Open(args) => cmd_open(&env, args),
        Command::Link(args) => cmd_link(&env, args),
        Command::Compact => cmd_compact(&env),
        Command::Config => cmd_config(&env),
    }
}

/// An explicit `--config` must exist; otherwise `linkshare.toml` in the
/// data directory is used when present.
fn load_config(explicit: Option<&Path>, data_dir: &Path) -> anyhow::Result<SessionConfig> {
    if let Some(path) = explicit {
        return SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    let implicit = data_dir.join(CONFIG_FILE);
    if implicit.exists() {
        return SessionConfig::load(&implicit)
            .with_context(|| format!("loading config {}", implicit.display()));
    }
    Ok(SessionConfig::default())
}

fn cmd_post(env: &Env, args: PostArgs) -> anyhow::Result<()> {
    let mut session = env.open_session(ViewMode::LiveFeed)?;
    let record = session.create_post(&args.content, &args.author)?;
    let link = session.share_link(&record.id);

    if env.json() {
        println!("{}", serde_json::to_string_pretty(&PostView { record: &record, link })?);
    } else {
        println!("{} Posted {}", "✓".green().bold(), record.id.to_string().yellow());
        println!("  Share: {}", link.blue());
    }
    Ok(())
}

fn cmd_like(env: &Env, args: LikeArgs) -> anyhow::Result<()> {
    let id = PostId::parse(args.id)?;
    let mut session = env.open_session(ViewMode::LiveFeed)?;
    let count = session.like_post(&id)?;

    if env.json() {
        println!("{}", json!({ "id": id, "likeCount": count }));
    } else {
        println!("{} Liked {} ({} {})", "♥".red().bold(), id.to_string().yellow(), count, plural(count, "like"));
    }
    Ok(())
}

fn cmd_feed(env: &Env, args: FeedArgs) -> anyhow::Result<()> {
    let session = env.open_session(ViewMode::LiveFeed)?;
    let tab = FeedTab::from(args.tab);
    let rows = session.view(tab, &args.query);

    if env.json() {
        let posts: Vec<PostView<'_>> = rows.iter().map(|r| post_view(&session, r)).collect();
        let out = json!({
            "tab": tab,
            "status": session.status(),
            "count": posts.len(),
            "posts": posts,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", tab.heading().bold());
    println!("{}", tab.subtitle(&args.query, &env.config.projection).dimmed());
    if session.status() == SessionStatus::Offline {
        println!("{}", "Remote store unavailable; showing local posts only.".red());
    }
    println!();
    if rows.is_empty() {
        println!("  {}", tab.empty_message(&args.query));
    }
    for record in &rows {
        print_post(&session, record);
    }
    Ok(())
}

fn cmd_open(env: &Env, args: OpenArgs) -> anyhow::Result<()> {
    let mode = ViewMode::from_link(&args.link);
    if mode.is_live() {
        return cmd_feed(
            env,
            FeedArgs {
                tab: TabArg::Home,
                query: String::new(),
            },
        );
    }

    let session = env.open_session(mode)?;
    let post = session.home().into_iter().next();

    if env.json() {
        let out = json!({
            "status": session.status(),
            "post": post.as_ref().map(|r| post_view(&session, r)),
            "exitLink": session.exit_link(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match (session.status(), &post) {
        (SessionStatus::Ready, Some(record)) => {
            println!("{}", "Shared Post".bold());
            println!();
            print_post(&session, record);
        }
        (SessionStatus::Offline, _) => println!("{}", "Remote store unavailable.".red()),
        (SessionStatus::Loading, _) => println!("{}", "Still loading.".dimmed()),
        _ => println!("{}", "Post not found".red().bold()),
    }
    println!("View all posts: {}", session.exit_link().blue());
    Ok(())
}

fn cmd_link(env: &Env, args: LinkArgs) -> anyhow::Result<()> {
    let id = PostId::parse(args.id)?;
    let link = build_link(&env.config.share, &id);
    if env.json() {
        println!("{}", json!({ "id": id, "link": link }));
    } else {
        println!("{link}");
    }
    Ok(())
}

fn cmd_compact(env: &Env) -> anyhow::Result<()> {
    let remote = env.open_remote()?;
    let before = remote.journal().offset();
    let frames = remote.compact()?;
    let after = remote.journal().offset();

    if env.json() {
        println!("{}", json!({ "frames": frames, "bytesBefore": before, "bytesAfter": after }));
    } else {
        println!(
            "{} Compacted journal: {} {}, {} -> {} bytes",
            "✓".green().bold(),
            frames,
            plural(frames as u64, "node"),
            before,
            after
        );
    }
    Ok(())
}

fn cmd_config(env: &Env) -> anyhow::Result<()> {
    if env.json() {
        println!("{}", serde_json::to_string_pretty(&env.config)?);
    } else {
        print!("{}", env.config.to_toml_string()?);
    }
    Ok(())
}

fn post_view<'a>(session: &Session, record: &'a Record) -> PostView<'a> {
    PostView {
        record,
        link: session.share_link(&record.id),
    }
}

fn print_post(session: &Session, record: &Record) {
    println!("{}  {}", record.author.purple().bold(), format_time(record.created_at).dimmed());
    println!("  {}", record.content);
    println!(
        "  {} {}  {}",
        "♥".red(),
        record.like_count,
        session.share_link(&record.id).dimmed()
    );
    println!();
}

fn format_time(at: Millis) -> String {
    i64::try_from(at.as_u64())
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| at.to_string())
}

fn plural(n: u64, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(dir: &tempfile::TempDir) -> Env {
        Env {
            data_dir: dir.path().to_path_buf(),
            config: SessionConfig::default(),
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn posts_persist_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let env = env(&dir);

        cmd_post(
            &env,
            PostArgs {
                author: "alice".into(),
                content: "hi".into(),
            },
        )
        .unwrap();

        let session = env.open_session(ViewMode::LiveFeed).unwrap();
        let home = session.home();
        assert_eq!(home.len(), 1);
        assert_eq!(home[0].author, "alice");
    }

    #[test]
    fn like_survives_and_each_run_is_a_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let env = env(&dir);
        let id = env
            .open_session(ViewMode::LiveFeed)
            .unwrap()
            .create_post("hi", "alice")
            .unwrap()
            .id;

        cmd_like(&env, LikeArgs { id: id.to_string() }).unwrap();
        cmd_like(&env, LikeArgs { id: id.to_string() }).unwrap();

        let session = env.open_session(ViewMode::SingleShared(id)).unwrap();
        assert_eq!(session.status(), SessionStatus::Ready);
        assert_eq!(session.home()[0].like_count, 2);
    }

    #[test]
    fn like_of_unknown_post_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cmd_like(&env(&dir), LikeArgs { id: "missing".into() }).is_err());
    }

    #[test]
    fn open_reports_missing_post() {
        let dir = tempfile::tempdir().unwrap();
        let env = env(&dir);
        cmd_open(&env, OpenArgs { link: "http://localhost:8080/?post=nope".into() }).unwrap();
        let session = env.open_session(ViewMode::from_link("http://localhost:8080/?post=nope")).unwrap();
        assert_eq!(session.status(), SessionStatus::NotFound);
    }

    #[test]
    fn compact_keeps_posts() {
        let dir = tempfile::tempdir().unwrap();
        let env = env(&dir);
        let mut session = env.open_session(ViewMode::LiveFeed).unwrap();
        let record = session.create_post("hi", "alice").unwrap();
        session.like_post(&record.id).unwrap();
        drop(session);

        cmd_compact(&env).unwrap();
        let session = env.open_session(ViewMode::LiveFeed).unwrap();
        assert_eq!(session.home()[0].like_count, 1);
    }

    #[test]
    fn config_file_in_data_dir_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "retention_cap = 2\n").unwrap();
        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config.retention_cap, 2);

        assert!(load_config(Some(&dir.path().join("absent.toml")), dir.path()).is_err());
        let empty = tempfile::tempdir().unwrap();
        assert_eq!(load_config(None, empty.path()).unwrap(), SessionConfig::default());
    }

    #[test]
    fn time_renders_or_falls_back() {
        assert!(format_time(Millis::new(1000)).starts_with("19"));
        assert_eq!(format_time(Millis::new(u64::MAX)), Millis::new(u64::MAX).to_string());
    }

    #[test]
    fn plural_words() {
        assert_eq!(plural(1, "like"), "like");
        assert_eq!(plural(2, "like"), "likes");
    }
}
