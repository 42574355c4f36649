use clap::{Args, Parser, Subcommand};

/// Agency Portal - marketing site, client portal and mail relay
#[derive(Parser, Clone)]
#[command(name = "agency_portal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Agency website and role-gated client portal")]
#[command(long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, default_value = ".env")]
    pub config: String,

    /// Server port override
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Server host override
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the web server (default action)
    Serve,
    /// Sign in, inspect or end a session stored on disk
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommands {
    /// Sign in and persist the session token
    Login(LoginArgs),
    /// Resync from the stored token and print the current user
    Whoami,
    /// End the session, locally even if the backend is unreachable
    Logout,
    /// Request a new account (does not sign in)
    Register(RegisterArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn is_server_mode(&self) -> bool {
        matches!(self.command, None | Some(Commands::Serve))
    }
}
