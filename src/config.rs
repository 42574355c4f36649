use anyhow::{anyhow, Result};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub fn is_origin_allowed(rules: &[CorsRule], origin: &str) -> bool {
    for rule in rules {
        if origin_matches(&rule.origin, origin) {
            return rule.action == CorsAction::Allow;
        }
    }
    false
}

fn origin_matches(pattern: &str, origin: &str) -> bool {
    // Wildcard pattern to anchored regex
    let mut re_pat = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => re_pat.push_str(".*"),
            _ => re_pat.push_str(&regex::escape(&ch.to_string())),
        }
    }
    re_pat.push('$');
    Regex::new(&re_pat)
        .map(|re| re.is_match(origin))
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct CorsRule {
    pub origin: String,
    pub action: CorsAction,
    pub methods: Vec<String>,
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CorsAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub relay: RelayConfig,
    pub static_dir: String,
    pub hsts_enabled: bool,
    pub cors_rules: Vec<CorsRule>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
}

/// Where the agency REST backend lives.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl: Duration,
    pub cookie_secure: bool,
    pub cookie_domain: Option<String>,
    /// Token file used by the CLI session commands.
    pub file_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_from: String,
    pub mail_to: String,
    pub min_interval: Duration,
}

pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    if let Some(n) = s.strip_suffix("ms") {
        return Ok(Duration::from_millis(n.trim().parse()?));
    }
    if let Some(n) = s.strip_suffix('s') {
        return Ok(Duration::from_secs(n.trim().parse()?));
    }
    if let Some(n) = s.strip_suffix('m') {
        let n: u64 = n.trim().parse()?;
        return n
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| anyhow!("Duration out of range: {}", s));
    }
    if let Some(n) = s.strip_suffix('h') {
        let n: u64 = n.trim().parse()?;
        return n
            .checked_mul(3600)
            .map(Duration::from_secs)
            .ok_or_else(|| anyhow!("Duration out of range: {}", s));
    }
    Err(anyhow!("Invalid duration format: {}", s))
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_duration(key: &str, default: Duration) -> Duration {
    match std::env::var(key) {
        Ok(raw) => parse_duration(&raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring {}={:?}: {}", key, raw, e);
            default
        }),
        Err(_) => default,
    }
}

/// Load `.env` (if present) and build the config from the environment.
pub fn load_config_from_file(config_path: &str) -> AppConfig {
    let abs_config_path = Path::new(config_path)
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(config_path));

    if Path::new(config_path).exists() {
        match dotenvy::from_filename(config_path) {
            Ok(_) => tracing::info!("✓ Loaded .env file from: {}", abs_config_path.display()),
            Err(e) => tracing::warn!("Failed to load .env file from {}: {}", abs_config_path.display(), e),
        }
    } else {
        tracing::warn!(".env file not found at: {} (using defaults)", abs_config_path.display());
    }

    from_env()
}

pub fn from_env() -> AppConfig {
    let server = ServerConfig {
        host: env_string("HOST", "127.0.0.1"),
        port: std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080),
        name: env_string("SERVER_NAME", "agency_portal"),
    };

    let api = ApiConfig {
        base_url: env_string("API_BASE_URL", "http://127.0.0.1:8081/api"),
        timeout: env_duration("API_TIMEOUT", Duration::from_secs(5)),
    };

    let session = SessionConfig {
        cookie_name: env_string("SESSION_COOKIE_NAME", "portal_session"),
        ttl: env_duration("SESSION_TTL", Duration::from_secs(12 * 3600)),
        cookie_secure: env_bool("COOKIE_SECURE", true),
        cookie_domain: env_optional("COOKIE_DOMAIN"),
        file_path: PathBuf::from(env_string("SESSION_FILE", ".agency_portal/session.json")),
    };

    let relay = RelayConfig {
        mail_api_url: env_optional("MAIL_API_URL"),
        mail_api_key: env_optional("MAIL_API_KEY"),
        mail_from: env_string("MAIL_FROM", "Website <noreply@localhost>"),
        mail_to: env_string("MAIL_TO", "hello@localhost"),
        min_interval: env_duration("RELAY_MIN_INTERVAL", Duration::from_secs(60)),
    };

    AppConfig {
        server,
        api,
        session,
        relay,
        static_dir: env_string("STATIC_DIR", "./static"),
        hsts_enabled: env_bool("HSTS_ENABLED", false),
        cors_rules: load_cors_rules(".env_cors"),
    }
}

pub fn load_cors_rules(path: &str) -> Vec<CorsRule> {
    let abs_cors_path = Path::new(path)
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(path));

    if !Path::new(path).exists() {
        tracing::warn!(".env_cors file not found at: {} (cross-origin form posts disabled)", abs_cors_path.display());
        return Vec::new();
    }

    match fs::read_to_string(path) {
        Ok(s) => {
            tracing::info!("✓ Loaded .env_cors file from: {}", abs_cors_path.display());
            parse_cors_rules(&s)
        }
        Err(e) => {
            tracing::error!("Failed to read .env_cors file from {}: {}", abs_cors_path.display(), e);
            Vec::new()
        }
    }
}

/// One rule per line: `origin [ALLOW|DENY] [METHODS] [HEADERS]`.
pub fn parse_cors_rules(content: &str) -> Vec<CorsRule> {
    let mut rules = Vec::new();
    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let origin = match parts.next() {
            Some(o) => o.to_string(),
            None => continue,
        };
        let action = match parts.next().unwrap_or("ALLOW").to_uppercase().as_str() {
            "DENY" => CorsAction::Deny,
            _ => CorsAction::Allow,
        };
        let methods = split_list(parts.next().unwrap_or("ALL"), str::to_uppercase);
        let headers = split_list(parts.next().unwrap_or("ALL"), str::to_lowercase);

        rules.push(CorsRule {
            origin,
            action,
            methods,
            headers,
        });
    }
    rules
}

fn split_list(raw: &str, normalize: fn(&str) -> String) -> Vec<String> {
    if raw.eq_ignore_ascii_case("ALL") {
        return vec!["ALL".to_string()];
    }
    raw.split(',')
        .map(|s| normalize(s.trim()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Union of a list field across ALLOW rules; `None` means any value is allowed.
fn allowed_union(rules: &[CorsRule], field: fn(&CorsRule) -> &Vec<String>) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for rule in rules.iter().filter(|r| r.action == CorsAction::Allow) {
        for item in field(rule) {
            if item == "ALL" {
                return None;
            }
            if !out.contains(item) {
                out.push(item.clone());
            }
        }
    }
    Some(out)
}

pub fn allowed_methods(rules: &[CorsRule]) -> Option<Vec<String>> {
    allowed_union(rules, |r| &r.methods)
}

pub fn allowed_headers(rules: &[CorsRule]) -> Option<Vec<String>> {
    allowed_union(rules, |r| &r.headers)
}
