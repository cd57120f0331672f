use crate::model::{TimeWindow, LEADERBOARD_YEAR};
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "locboard")]
#[command(about = "GitHub line contribution dashboard and leaderboard")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Path to the stats database", default_value = "locboard.db")]
    pub store: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a token, capture the user profile, and issue a session id
    Login {
        #[arg(long, help = "GitHub personal access token")]
        token: String,
    },
    /// Revoke a session id
    Logout {
        #[arg(long, help = "Session id issued by login")]
        session: String,
    },
    /// Scan every repository and update the stored stats
    Analyze {
        #[arg(long, help = "Session id issued by login")]
        session: Option<String>,

        #[arg(long, help = "GitHub personal access token (bypasses the session store)")]
        token: Option<String>,

        #[arg(long, help = "Analyze a public user without authenticating")]
        username: Option<String>,

        #[arg(
            long,
            value_delimiter = ',',
            help = "Author emails to match, comma-separated (public mode only)"
        )]
        emails: Vec<String>,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Show the top contributors by net lines
    Leaderboard {
        #[arg(long, value_enum, default_value_t = WindowArg::AllTime, help = "Ranking window")]
        window: WindowArg,

        #[arg(long, default_value_t = 10, help = "Number of entries")]
        limit: u32,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Show the stored stats for one user
    User {
        #[arg(help = "GitHub username")]
        username: String,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Find users by username prefix
    Search {
        #[arg(help = "Username prefix, case-insensitive")]
        pattern: String,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum WindowArg {
    #[value(name = "all-time")]
    AllTime,
    #[value(name = "year-2024")]
    Year2024,
}

impl From<WindowArg> for TimeWindow {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::AllTime => TimeWindow::AllTime,
            WindowArg::Year2024 => TimeWindow::Year(LEADERBOARD_YEAR),
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Login { token } => crate::auth::exec_login(&self.common, token),
            Commands::Logout { session } => crate::auth::exec_logout(&self.common, &session),
            Commands::Analyze {
                session,
                token,
                username,
                emails,
                json,
            } => crate::analyze::exec(
                &self.common,
                session.as_deref(),
                token,
                username.as_deref(),
                &emails,
                json,
            ),
            Commands::Leaderboard { window, limit, json } => {
                crate::board::exec_leaderboard(&self.common, window.into(), limit, json)
            }
            Commands::User { username, json } => {
                crate::board::exec_user(&self.common, &username, json)
            }
            Commands::Search { pattern, json } => {
                crate::board::exec_search(&self.common, &pattern, json)
            }
        }
    }
}
