// src/models/auth_types.rs
use serde::{Deserialize, Serialize};

use super::principal::Principal;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `POST /auth/login` answer. Some backends only set a cookie, hence the optional token.
#[derive(Debug, Deserialize, Clone)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    pub user: Principal,
}

/// `GET /auth/me` answer.
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityResponse {
    pub user: Principal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Login form as posted by the browser; `next` carries the remembered destination.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NextQuery {
    pub next: Option<String>,
}
