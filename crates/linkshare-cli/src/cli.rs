use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use linkshare_sdk::FeedTab;

#[derive(Parser)]
#[command(
    name = "linkshare",
    about = "LinkShare: share short posts by link",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Directory holding the shared remote journal
    #[arg(long, global = true, default_value = ".linkshare")]
    pub data_dir: PathBuf,

    /// Session configuration file (TOML)
    #[arg(long = "config", global = true)]
    pub config_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum TabArg {
    Home,
    Recent,
    Trending,
    Search,
}

impl From<TabArg> for FeedTab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Home => FeedTab::Home,
            TabArg::Recent => FeedTab::Recent,
            TabArg::Trending => FeedTab::Trending,
            TabArg::Search => FeedTab::Search,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Publish a new post
    Post(PostArgs),
    /// Like a post
    Like(LikeArgs),
    /// Show a feed
    Feed(FeedArgs),
    /// Open a share link
    Open(OpenArgs),
    /// Print the share link for a post
    Link(LinkArgs),
    /// Rewrite the remote journal to one entry per post
    Compact,
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct PostArgs {
    #[arg(short, long)]
    pub author: String,
    #[arg(short, long)]
    pub content: String,
}

#[derive(Args)]
pub struct LikeArgs {
    pub id: String,
}

#[derive(Args)]
pub struct FeedArgs {
    #[arg(short, long, value_enum, default_value = "home")]
    pub tab: TabArg,
    /// Author to search for (search tab)
    #[arg(short, long, default_value = "")]
    pub query: String,
}

#[derive(Args)]
pub struct OpenArgs {
    pub link: String,
}

#[derive(Args)]
pub struct LinkArgs {
    pub id: String,
}
