// Contact and feedback endpoints
use actix_web::{http::header, http::StatusCode, post, web, Either, HttpRequest, HttpResponse};

use crate::relay::{Channel, Relay, RelayError, Submission};
use crate::types::{ErrorResponse, OkResponse};
use crate::views;

type Body = Either<web::Json<Submission>, web::Form<Submission>>;

fn status_of(err: &RelayError) -> StatusCode {
    match err {
        RelayError::Invalid(_) => StatusCode::BAD_REQUEST,
        RelayError::TooSoon(_) => StatusCode::TOO_MANY_REQUESTS,
        RelayError::NotConfigured | RelayError::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn user_message(err: &RelayError) -> String {
    match err {
        RelayError::Invalid(msg) => msg.clone(),
        RelayError::TooSoon(_) => "Please wait a moment before sending another message.".into(),
        RelayError::NotConfigured | RelayError::Delivery(_) => {
            "Your message could not be sent. Please try again later.".into()
        }
    }
}

fn with_retry_after(mut builder: actix_web::HttpResponseBuilder, err: &RelayError) -> actix_web::HttpResponseBuilder {
    if let RelayError::TooSoon(secs) = err {
        builder.insert_header((header::RETRY_AFTER, secs.to_string()));
    }
    builder
}

fn json_response(result: Result<(), RelayError>) -> HttpResponse {
    match result {
        Ok(()) => HttpResponse::Created().json(OkResponse { ok: true }),
        Err(err) => with_retry_after(HttpResponse::build(status_of(&err)), &err)
            .json(ErrorResponse::with_message(err.code(), user_message(&err))),
    }
}

/// Browser form posts: redirect on success, re-render the form on failure.
fn form_response(action: &str, sub: &Submission, result: Result<(), RelayError>) -> HttpResponse {
    match result {
        Ok(()) => HttpResponse::SeeOther()
            .insert_header((header::LOCATION, "/thanks"))
            .finish(),
        Err(err) => with_retry_after(HttpResponse::build(status_of(&err)), &err)
            .content_type("text/html; charset=utf-8")
            .body(views::message_form(
                action,
                Some(&user_message(&err)),
                &sub.name,
                &sub.email,
                &sub.message,
            )),
    }
}

async fn relay_submission(relay: &Relay, req: &HttpRequest, channel: Channel, body: Body) -> HttpResponse {
    let peer = req.connection_info().realip_remote_addr().map(str::to_string);
    let (sub, from_form) = match body {
        Either::Left(json) => (json.into_inner(), false),
        Either::Right(form) => (form.into_inner(), true),
    };

    let result = relay
        .submit(channel, sub.clone(), peer.as_deref())
        .await
        .map(|_| ());
    if let Err(e) = &result {
        tracing::debug!(?channel, "Submission rejected: {}", e);
    }

    if from_form {
        let action = match channel {
            Channel::Contact => "/contact",
            Channel::Feedback => "/feedback",
        };
        form_response(action, &sub, result)
    } else {
        json_response(result)
    }
}

#[post("/contact")]
pub async fn contact(relay: web::Data<Relay>, req: HttpRequest, body: Body) -> HttpResponse {
    relay_submission(&relay, &req, Channel::Contact, body).await
}

#[post("/feedback")]
pub async fn feedback(relay: web::Data<Relay>, req: HttpRequest, body: Body) -> HttpResponse {
    relay_submission(&relay, &req, Channel::Feedback, body).await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(contact).service(feedback);
}
