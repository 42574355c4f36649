// Role Router: admin / developer / client trees, each behind its own guard
use actix_web::{web, HttpResponse};

use crate::middleware::guard::RequireAuth;
use crate::models::principal::{Principal, Role};
use crate::views;

fn page(principal: &Principal, title: &str, content: &str) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(("Cache-Control", "no-store"))
        .content_type("text/html; charset=utf-8")
        .body(views::portal_page(principal, title, content))
}

async fn dashboard(principal: Principal) -> HttpResponse {
    let intro = match principal.role {
        Role::Admin => "Overview of clients, projects and outstanding invoices.",
        Role::Developer => "Projects assigned to you and their latest discussion.",
        Role::Client => "Your projects, files and invoices in one place.",
    };
    page(&principal, "Dashboard", &format!("<p>{}</p>", intro))
}

async fn projects(principal: Principal) -> HttpResponse {
    page(&principal, "Projects", r#"<section class="projects"></section>"#)
}

async fn project(principal: Principal, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    page(
        &principal,
        &format!("Project {}", id),
        &format!(
            r#"<section class="project" data-project="{id}">
<h2>Discussion</h2><div class="thread"></div>
<h2>Files</h2><div class="files"></div>
</section>"#,
            id = views::escape(&id)
        ),
    )
}

async fn users(principal: Principal) -> HttpResponse {
    page(&principal, "Users", r#"<section class="users"></section>"#)
}

async fn invoices(principal: Principal) -> HttpResponse {
    page(&principal, "Invoices", r#"<section class="invoices"></section>"#)
}

async fn files(principal: Principal) -> HttpResponse {
    page(&principal, "Files", r#"<section class="files"></section>"#)
}

async fn settings(principal: Principal) -> HttpResponse {
    page(
        &principal,
        "Settings",
        &format!(
            r#"<dl><dt>Name</dt><dd>{}</dd><dt>Email</dt><dd>{}</dd><dt>Role</dt><dd>{}</dd></dl>"#,
            views::escape(&principal.name),
            views::escape(&principal.email),
            principal.role
        ),
    )
}

async fn account(principal: Principal) -> HttpResponse {
    page(
        &principal,
        "Account",
        &format!(
            r#"<p>Signed in as {} ({}). <a href="{}">Go to your dashboard</a></p>"#,
            views::escape(&principal.email),
            principal.role,
            principal.role.landing()
        ),
    )
}

/// Mount all portal trees.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(RequireAuth::roles([Role::Admin]))
            .route("", web::get().to(dashboard))
            .route("/", web::get().to(dashboard))
            .route("/users", web::get().to(users))
            .route("/projects", web::get().to(projects))
            .route("/project/{id}", web::get().to(project))
            .route("/invoices", web::get().to(invoices))
            .route("/settings", web::get().to(settings)),
    )
    .service(
        web::scope("/dev")
            .wrap(RequireAuth::roles([Role::Developer]))
            .route("", web::get().to(dashboard))
            .route("/", web::get().to(dashboard))
            .route("/projects", web::get().to(projects))
            .route("/project/{id}", web::get().to(project))
            .route("/settings", web::get().to(settings)),
    )
    .service(
        web::scope("/client")
            .wrap(RequireAuth::roles([Role::Client]))
            .route("", web::get().to(dashboard))
            .route("/", web::get().to(dashboard))
            .route("/projects", web::get().to(projects))
            .route("/project/{id}", web::get().to(project))
            .route("/invoices", web::get().to(invoices))
            .route("/files", web::get().to(files))
            .route("/settings", web::get().to(settings)),
    )
    .service(
        web::scope("/account")
            .wrap(RequireAuth::any())
            .route("", web::get().to(account)),
    );
}
