// Route Guard: admits or redirects navigation into a protected subtree
use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::models::principal::{Principal, Role, SessionState};
use crate::state::PortalState;
use crate::views;

const AUTH_PAGES: [&str; 2] = ["/login", "/register"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Session not resolved yet: show only a placeholder.
    Loading,
    /// Not logged in; `next` is where to return after login.
    Login { next: Option<String> },
    /// Logged in, wrong role: send to the principal's own landing.
    Landing(Role),
    AwaitingApproval(Principal),
    Granted(Principal),
}

/// Admission decision for a request to `requested` behind a guard requiring `required`
/// (empty = any authenticated role).
pub fn admit(state: &SessionState, required: &[Role], requested: &str) -> Admission {
    if !state.resolved {
        return Admission::Loading;
    }
    let Some(principal) = &state.principal else {
        return Admission::Login {
            next: remember_destination(requested),
        };
    };
    if !required.is_empty() && !required.contains(&principal.role) {
        return Admission::Landing(principal.role);
    }
    if principal.awaiting_approval() {
        return Admission::AwaitingApproval(principal.clone());
    }
    Admission::Granted(principal.clone())
}

fn path_only(target: &str) -> &str {
    target.split(['?', '#']).next().unwrap_or(target)
}

pub fn is_auth_page(target: &str) -> bool {
    let path = path_only(target).trim_end_matches('/');
    AUTH_PAGES
        .iter()
        .any(|page| path == *page || path.starts_with(&format!("{}/", page)))
}

// Local absolute path only: no scheme, no protocol-relative `//host`.
fn is_local_path(target: &str) -> bool {
    let bytes = target.as_bytes();
    bytes.first() == Some(&b'/')
        && !matches!(bytes.get(1), Some(b'/') | Some(b'\\'))
        && !target.chars().any(char::is_control)
}

/// Destination worth returning to after login; auth pages are dropped to avoid loops.
pub fn remember_destination(target: &str) -> Option<String> {
    if is_local_path(target) && !is_auth_page(target) {
        Some(target.to_string())
    } else {
        None
    }
}

/// Where to send a principal right after a successful login.
pub fn post_login_target(next: Option<&str>, role: Role) -> String {
    next.map(str::trim)
        .and_then(remember_destination)
        .unwrap_or_else(|| role.landing().to_string())
}

pub fn login_location(next: Option<&str>) -> String {
    match next {
        Some(n) => format!("/login?next={}", urlencoding::encode(n)),
        None => "/login".to_string(),
    }
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

impl Admission {
    /// The admitted principal, or the response that replaces the guarded content.
    pub fn into_response(self) -> Result<Principal, HttpResponse> {
        match self {
            Admission::Granted(principal) => Ok(principal),
            Admission::Loading => Err(HttpResponse::Ok()
                .insert_header((header::RETRY_AFTER, "1"))
                .insert_header((header::CACHE_CONTROL, "no-store"))
                .content_type("text/html; charset=utf-8")
                .body(views::loading_page())),
            Admission::Login { next } => Err(see_other(&login_location(next.as_deref()))),
            Admission::Landing(role) => Err(see_other(role.landing())),
            Admission::AwaitingApproval(principal) => Err(HttpResponse::Ok()
                .insert_header((header::CACHE_CONTROL, "no-store"))
                .content_type("text/html; charset=utf-8")
                .body(views::pending_page(&principal))),
        }
    }
}

/// Guard middleware. `RequireAuth::any()` admits every authenticated role.
pub struct RequireAuth {
    roles: Rc<[Role]>,
}

impl RequireAuth {
    pub fn any() -> Self {
        Self {
            roles: Rc::from(Vec::new()),
        }
    }

    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect::<Vec<_>>().into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthMiddleware {
            service: Rc::new(service),
            roles: Rc::clone(&self.roles),
        }))
    }
}

pub struct RequireAuthMiddleware<S> {
    service: Rc<S>,
    roles: Rc<[Role]>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let roles = Rc::clone(&self.roles);

        Box::pin(async move {
            let Some(state) = req.app_data::<web::Data<PortalState>>().cloned() else {
                tracing::error!("RequireAuth mounted without PortalState");
                let (req, _pl) = req.into_parts();
                let resp = HttpResponse::InternalServerError().finish();
                return Ok(ServiceResponse::new(req, resp).map_into_right_body());
            };

            // One request is one application load: resync before deciding anything
            let (store, storage) = state.session_for(req.request());
            store.initialize().await;

            let requested = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| req.path().to_string());
            let admission = admit(&store.snapshot(), &roles, &requested);
            tracing::debug!(path = %requested, ?admission, "route guard decision");

            let mut res = match admission.into_response() {
                Ok(principal) => {
                    req.extensions_mut().insert(principal);
                    service.call(req).await?.map_into_left_body()
                }
                Err(resp) => {
                    let (req, _pl) = req.into_parts();
                    ServiceResponse::new(req, resp).map_into_right_body()
                }
            };

            if let Some(cookie) = storage.pending_cookie() {
                if let Err(e) = res.response_mut().add_cookie(&cookie) {
                    tracing::warn!("Failed to update session cookie: {}", e);
                }
            }
            Ok(res)
        })
    }
}

/// Handlers behind `RequireAuth` take the admitted principal as an argument.
impl FromRequest for Principal {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Principal>()
                .cloned()
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("not authenticated")),
        )
    }
}
