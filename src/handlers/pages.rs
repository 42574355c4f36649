// Public marketing pages. No session lookups happen here.
use actix_web::{get, web, HttpResponse};

use crate::views;

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

#[get("/")]
pub async fn home() -> HttpResponse {
    html(views::home_page())
}

#[get("/services")]
pub async fn services() -> HttpResponse {
    html(views::services_page())
}

#[get("/pricing")]
pub async fn pricing() -> HttpResponse {
    html(views::pricing_page())
}

#[get("/projects")]
pub async fn projects() -> HttpResponse {
    html(views::projects_page())
}

#[get("/contact")]
pub async fn contact() -> HttpResponse {
    html(views::contact_page())
}

#[get("/thanks")]
pub async fn thanks() -> HttpResponse {
    html(views::thanks_page())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(thanks)
        .service(services)
        .service(pricing)
        .service(projects)
        .service(contact);
}
