use once_cell::sync::Lazy;
use regex::Regex;

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email regex"));

pub const MAX_NAME_LEN: usize = 128;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MAX_MESSAGE_LEN: usize = 5000;

pub fn email(s: &str) -> bool {
    RE_EMAIL.is_match(s)
}

pub fn validate_email_strict(email_str: &str) -> Result<(), String> {
    if !email(email_str) {
        return Err("Invalid email format".into());
    }
    if email_str.len() > 254 {
        return Err("Email too long".into());
    }
    let Some((local, domain)) = email_str.split_once('@') else {
        return Err("Invalid email format".into());
    };
    if local.is_empty() || local.len() > 64 {
        return Err("Invalid email local part".into());
    }
    if domain.is_empty() || !domain.contains('.') {
        return Err("Invalid email domain".into());
    }
    Ok(())
}

/// Login only checks presence; the backend judges the credentials.
pub fn login_form(email: &str, password: &str) -> Result<(), String> {
    if email.trim().is_empty() || password.is_empty() {
        return Err("Please enter your email and password.".into());
    }
    Ok(())
}

pub fn register_form(name: &str, email: &str, password: &str) -> Result<(), String> {
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err("Please fill in every field.".into());
    }
    if name.len() > MAX_NAME_LEN {
        return Err("Name is too long".into());
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err("Password must be less than 128 characters".into());
    }
    validate_email_strict(email)
}

/// Contact and feedback submissions.
pub fn relay_message(name: &str, email: &str, message: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name is required".into());
    }
    if email.trim().is_empty() {
        return Err("email is required".into());
    }
    if message.trim().is_empty() {
        return Err("message is required".into());
    }
    if name.len() > MAX_NAME_LEN {
        return Err("name is too long".into());
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err("message is too long".into());
    }
    validate_email_strict(email.trim())
}
