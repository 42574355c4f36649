// HTML rendering. Presentation only: no access decisions are made here.
use crate::models::principal::{Principal, Role};

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const SITE_NAV: &str = r#"<nav class="site">
  <a href="/">Home</a> <a href="/services">Services</a> <a href="/pricing">Pricing</a>
  <a href="/projects">Projects</a> <a href="/contact">Contact</a> <a href="/login">Client login</a>
</nav>"#;

pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/assets/site.css">
</head>
<body>
{nav}
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
        nav = SITE_NAV,
        body = body
    )
}

pub fn loading_page() -> String {
    layout(
        "Loading",
        r#"<div class="loading" aria-busy="true"><meta http-equiv="refresh" content="1">Checking your session&hellip;</div>"#,
    )
}

pub fn login_page(error: Option<&str>, next: Option<&str>, email: &str) -> String {
    let error_html = error
        .map(|e| format!(r#"<p class="error" role="alert">{}</p>"#, escape(e)))
        .unwrap_or_default();
    let next_html = next
        .map(|n| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(n)))
        .unwrap_or_default();
    layout(
        "Sign in",
        &format!(
            r#"<h1>Sign in</h1>
{error_html}
<form method="post" action="/login">
  {next_html}
  <label>Email <input type="email" name="email" value="{email}" autocomplete="username"></label>
  <label>Password <input type="password" name="password" autocomplete="current-password"></label>
  <button type="submit">Sign in</button>
</form>
<p>New client? <a href="/register">Request an account</a></p>"#,
            email = escape(email)
        ),
    )
}

pub fn register_page(error: Option<&str>, name: &str, email: &str) -> String {
    let error_html = error
        .map(|e| format!(r#"<p class="error" role="alert">{}</p>"#, escape(e)))
        .unwrap_or_default();
    layout(
        "Request an account",
        &format!(
            r#"<h1>Request an account</h1>
{error_html}
<form method="post" action="/register">
  <label>Name <input name="name" value="{name}"></label>
  <label>Email <input type="email" name="email" value="{email}"></label>
  <label>Password <input type="password" name="password" autocomplete="new-password"></label>
  <button type="submit">Register</button>
</form>
<p>Already have an account? <a href="/login">Sign in</a></p>"#,
            name = escape(name),
            email = escape(email)
        ),
    )
}

pub fn register_done(message: &str) -> String {
    layout(
        "Registration received",
        &format!(
            r#"<h1>Registration received</h1>
<p>{}</p>
<p>New accounts are reviewed by our team before the portal opens up. <a href="/login">Back to sign in</a></p>"#,
            escape(message)
        ),
    )
}

pub fn pending_page(principal: &Principal) -> String {
    layout(
        "Awaiting Approval",
        &format!(
            r#"<h1>Awaiting Approval</h1>
<p>Thanks, {name}. Your account ({email}) has been created and is waiting for an admin to approve it.</p>
<p>We will email you as soon as your projects are ready to view.</p>
{logout}"#,
            name = escape(&principal.name),
            email = escape(&principal.email),
            logout = LOGOUT_FORM
        ),
    )
}

const LOGOUT_FORM: &str =
    r#"<form method="post" action="/logout" class="logout"><button type="submit">Log out</button></form>"#;

fn portal_nav(role: Role) -> &'static str {
    match role {
        Role::Admin => {
            r#"<a href="/admin">Dashboard</a> <a href="/admin/users">Users</a> <a href="/admin/projects">Projects</a> <a href="/admin/invoices">Invoices</a> <a href="/admin/settings">Settings</a>"#
        }
        Role::Developer => {
            r#"<a href="/dev">Dashboard</a> <a href="/dev/projects">Projects</a> <a href="/dev/settings">Settings</a>"#
        }
        Role::Client => {
            r#"<a href="/client">Dashboard</a> <a href="/client/projects">Projects</a> <a href="/client/invoices">Invoices</a> <a href="/client/files">Files</a> <a href="/client/settings">Settings</a>"#
        }
    }
}

/// Portal shell: current principal, role navigation and logout.
pub fn portal_page(principal: &Principal, title: &str, content: &str) -> String {
    let avatar = principal
        .avatar_url
        .as_deref()
        .map(|u| format!(r#"<img class="avatar" src="{}" alt="">"#, escape(u)))
        .unwrap_or_default();
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | Portal</title>
<link rel="stylesheet" href="/assets/portal.css">
</head>
<body>
<header class="portal">
  {avatar}<span class="who">{name} &lt;{email}&gt;</span>
  <nav>{nav} <a href="/account">Account</a></nav>
  {logout}
</header>
<main>
<h1>{title}</h1>
{content}
</main>
</body>
</html>"#,
        title = escape(title),
        avatar = avatar,
        name = escape(&principal.name),
        email = escape(&principal.email),
        nav = portal_nav(principal.role),
        logout = LOGOUT_FORM,
        content = content
    )
}

pub fn home_page() -> String {
    layout(
        "Web design & development",
        r#"<h1>Websites that work as hard as you do</h1>
<p>We design, build and look after fast, accessible websites for small businesses.</p>
<p><a href="/contact">Start a project</a></p>"#,
    )
}

pub fn services_page() -> String {
    layout(
        "Services",
        r#"<h1>Services</h1>
<ul>
  <li>Website design and branding</li>
  <li>Custom development and integrations</li>
  <li>Hosting, maintenance and support</li>
  <li>Search engine optimisation</li>
</ul>"#,
    )
}

pub fn pricing_page() -> String {
    layout(
        "Pricing",
        r#"<h1>Pricing</h1>
<table>
  <tr><th>Starter</th><td>One-page site, two revision rounds</td></tr>
  <tr><th>Business</th><td>Up to ten pages, CMS, analytics</td></tr>
  <tr><th>Custom</th><td>Web applications and integrations, quoted per project</td></tr>
</table>"#,
    )
}

pub fn projects_page() -> String {
    layout(
        "Projects",
        r#"<h1>Recent projects</h1>
<p>A selection of sites we have launched for our clients.</p>"#,
    )
}

pub fn contact_page() -> String {
    message_form("/contact", None, "", "", "")
}

/// Contact or feedback form, optionally re-rendered with an error and the submitted values.
pub fn message_form(action: &str, error: Option<&str>, name: &str, email: &str, message: &str) -> String {
    let heading = if action == "/feedback" { "Send feedback" } else { "Contact us" };
    let error_html = error
        .map(|e| format!(r#"<p class="error" role="alert">{}</p>"#, escape(e)))
        .unwrap_or_default();
    layout(
        heading,
        &format!(
            r#"<h1>{heading}</h1>
{error_html}
<form method="post" action="{action}">
  <label>Name <input name="name" value="{name}" required></label>
  <label>Email <input type="email" name="email" value="{email}" required></label>
  <label>Message <textarea name="message" required>{message}</textarea></label>
  <label class="hp" aria-hidden="true">Website <input name="website" tabindex="-1" autocomplete="off"></label>
  <button type="submit">Send</button>
</form>"#,
            action = escape(action),
            name = escape(name),
            email = escape(email),
            message = escape(message)
        ),
    )
}

pub fn thanks_page() -> String {
    layout(
        "Thank you",
        r#"<h1>Thank you</h1>
<p>Your message is on its way. We usually reply within one working day.</p>
<p><a href="/">Back home</a></p>"#,
    )
}

pub fn not_found_page() -> String {
    layout(
        "Not found",
        r#"<h1>Page not found</h1><p><a href="/">Back home</a></p>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::principal::AccountStatus;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn login_page_keeps_next_and_escapes_it() {
        let html = login_page(Some("Invalid email or password."), Some("/client?x=\"1\""), "a@b.test");
        assert!(html.contains(r#"name="next" value="/client?x=&quot;1&quot;""#));
        assert!(html.contains("Invalid email or password."));
    }

    #[test]
    fn portal_shell_shows_identity_and_logout() {
        let p = Principal {
            id: "1".into(),
            name: "Cleo <script>".into(),
            email: "cleo@client.test".into(),
            role: Role::Client,
            status: AccountStatus::Active,
            avatar_url: None,
        };
        let html = portal_page(&p, "Dashboard", "<p>hi</p>");
        assert!(html.contains("Cleo &lt;script&gt;"));
        assert!(html.contains(r#"action="/logout""#));
        assert!(html.contains(r#"href="/client/invoices""#));
        assert!(!html.contains(r#"href="/admin/users""#));
    }

    #[test]
    fn message_form_keeps_values() {
        let html = message_form("/feedback", Some("message is required"), "Nia", "nia@client.test", "<b>");
        assert!(html.contains(r#"action="/feedback""#));
        assert!(html.contains(r#"value="nia@client.test""#));
        assert!(html.contains("&lt;b&gt;</textarea>"));
        assert!(html.contains("message is required"));
    }
}
