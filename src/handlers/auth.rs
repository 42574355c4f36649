// handlers/auth.rs
use actix_web::{get, http::header, http::StatusCode, post, web, HttpRequest, HttpResponse, Result};

use crate::errors::AuthError;
use crate::middleware::guard::{post_login_target, remember_destination};
use crate::models::auth_types::{LoginForm, NextQuery, RegisterForm, RegisterRequest};
use crate::state::PortalState;
use crate::validation as v;
use crate::views;

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn status_of(err: &AuthError) -> StatusCode {
    StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::BAD_GATEWAY)
}

#[get("/login")]
pub async fn login_page(query: web::Query<NextQuery>) -> HttpResponse {
    let next = query.next.as_deref().and_then(remember_destination);
    html(StatusCode::OK, views::login_page(None, next.as_deref(), ""))
}

#[post("/login")]
pub async fn login(
    state: web::Data<PortalState>,
    req: HttpRequest,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let next = form.next.as_deref().and_then(remember_destination);

    if let Err(e) = v::login_form(&form.email, &form.password) {
        return Ok(html(
            StatusCode::BAD_REQUEST,
            views::login_page(Some(&e), next.as_deref(), &form.email),
        ));
    }

    let (store, storage) = state.session_for(&req);
    match store.login(&form.email, &form.password).await {
        Ok(principal) => {
            let target = post_login_target(next.as_deref(), principal.role);
            let mut resp = HttpResponse::SeeOther()
                .insert_header((header::LOCATION, target))
                .finish();
            if let Some(cookie) = storage.pending_cookie() {
                resp.add_cookie(&cookie)?;
            }
            Ok(resp)
        }
        Err(err) => {
            if err.is_transport() {
                tracing::warn!("Login failed against auth service: {}", err);
            }
            Ok(html(
                status_of(&err),
                views::login_page(Some(&err.user_message()), next.as_deref(), &form.email),
            ))
        }
    }
}

#[get("/register")]
pub async fn register_page() -> HttpResponse {
    html(StatusCode::OK, views::register_page(None, "", ""))
}

#[post("/register")]
pub async fn register(
    state: web::Data<PortalState>,
    req: HttpRequest,
    form: web::Form<RegisterForm>,
) -> HttpResponse {
    let form = form.into_inner();
    let name = form.name.trim().to_string();
    let email = form.email.trim().to_lowercase();

    if let Err(e) = v::register_form(&name, &email, &form.password) {
        return html(StatusCode::BAD_REQUEST, views::register_page(Some(&e), &name, &email));
    }

    let (store, _storage) = state.session_for(&req);
    let request = RegisterRequest {
        name: name.clone(),
        email: email.clone(),
        password: form.password,
    };
    match store.register(&request).await {
        Ok(message) => html(StatusCode::CREATED, views::register_done(&message)),
        Err(err) => {
            if err.is_transport() {
                tracing::warn!("Registration failed against auth service: {}", err);
            }
            html(
                status_of(&err),
                views::register_page(Some(&err.user_message()), &name, &email),
            )
        }
    }
}

/// Always ends logged out, whatever the backend says.
#[post("/logout")]
pub async fn logout(state: web::Data<PortalState>, req: HttpRequest) -> Result<HttpResponse> {
    let (store, storage) = state.session_for(&req);
    store.logout().await;

    let mut resp = HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/login"))
        .finish();
    if let Some(cookie) = storage.pending_cookie() {
        resp.add_cookie(&cookie)?;
    }
    Ok(resp)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login_page)
        .service(login)
        .service(register_page)
        .service(register)
        .service(logout);
}
