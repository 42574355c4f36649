// `session` subcommands: one Session Store per process, persisted to a file
use anyhow::{anyhow, Result};
use std::sync::Arc;

use crate::cli::SessionCommands;
use crate::config::AppConfig;
use crate::gateway::{AuthGateway, HttpAuthGateway};
use crate::models::auth_types::RegisterRequest;
use crate::models::principal::Principal;
use crate::session::{FileTokenStorage, SessionStore};

fn describe(p: &Principal) -> String {
    let mut line = format!("{} <{}> role={} status={:?}", p.name, p.email, p.role, p.status);
    if p.awaiting_approval() {
        line.push_str(" (awaiting approval)");
    }
    line
}

pub fn command_name(action: &SessionCommands) -> &'static str {
    match action {
        SessionCommands::Login(_) => "session login",
        SessionCommands::Whoami => "session whoami",
        SessionCommands::Logout => "session logout",
        SessionCommands::Register(_) => "session register",
    }
}

pub async fn run_session(action: &SessionCommands, cfg: &AppConfig) -> Result<()> {
    let gateway: Arc<dyn AuthGateway> =
        Arc::new(HttpAuthGateway::new(&cfg.api.base_url, cfg.api.timeout)?);
    let storage = Arc::new(FileTokenStorage::new(cfg.session.file_path.clone()));
    let store = SessionStore::new(gateway, storage);

    tokio::select! {
        result = run_with_store(action, &store) => result,
        _ = tokio::signal::ctrl_c() => {
            store.detach();
            Err(anyhow!("interrupted"))
        }
    }
}

pub async fn run_with_store(action: &SessionCommands, store: &SessionStore) -> Result<()> {
    match action {
        SessionCommands::Login(args) => {
            let principal = store
                .login(&args.email, &args.password)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Signed in as {}", describe(&principal));
            println!("Landing page: {}", principal.role.landing());
        }
        SessionCommands::Whoami => {
            store.initialize().await;
            match store.principal() {
                Some(p) => println!("{}", describe(&p)),
                None => println!("Not signed in"),
            }
        }
        SessionCommands::Logout => {
            store.logout().await;
            println!("Signed out");
        }
        SessionCommands::Register(args) => {
            let request = RegisterRequest {
                name: args.name.trim().to_string(),
                email: args.email.trim().to_lowercase(),
                password: args.password.clone(),
            };
            let message = store
                .register(&request)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("{}", message);
        }
    }
    Ok(())
}
