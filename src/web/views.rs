//! Server-rendered pages.
//!
//! Pages are plain functions from a [`PageContext`] (plus page data) to
//! HTML. Every interpolated value goes through [`escape`].

use std::fmt::Write as _;

use axum::response::Html;
use time::{macros::format_description, OffsetDateTime};

use super::csrf::CSRF_FIELD;
use super::page::PageContext;
use super::validator::Validator;
use crate::auth::dto::{LoginForm, SignupForm};
use crate::users::{Role, User};

// ---- display helpers ----

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// e.g. "02 Jan 2006 at 15:04", in UTC.
pub fn human_date(t: OffsetDateTime) -> String {
    let fmt = format_description!("[day] [month repr:short] [year] at [hour]:[minute]");
    t.to_offset(time::UtcOffset::UTC)
        .format(&fmt)
        .unwrap_or_default()
}

pub fn role_display(role: Role) -> &'static str {
    match role {
        Role::Student => "Student",
        Role::Lawyer => "Lawyer",
        Role::Recruiter => "Recruiter",
    }
}

// ---- layout ----

fn csrf_input(ctx: &PageContext) -> String {
    format!(
        r#"<input type="hidden" name="{CSRF_FIELD}" value="{}">"#,
        escape(&ctx.csrf_token)
    )
}

fn nav(ctx: &PageContext) -> String {
    let mut nav = String::from(r#"<nav><a href="/">Home</a> <a href="/about">About</a>"#);
    match (&ctx.user, ctx.is_authenticated) {
        (Some(user), true) => {
            let _ = write!(
                nav,
                r#" <a href="{}">Dashboard</a>"#,
                user.role.dashboard_path()
            );
            if matches!(user.role, Role::Student | Role::Lawyer) {
                nav.push_str(r#" <a href="/moot/setup">Moot Court</a>"#);
            }
            let _ = write!(
                nav,
                r#" <a href="/user/account">Account</a> <form action="/user/logout" method="POST">{}<button>Logout</button></form>"#,
                csrf_input(ctx)
            );
        }
        _ => nav.push_str(r#" <a href="/user/signup">Signup</a> <a href="/user/login">Login</a>"#),
    }
    nav.push_str("</nav>");
    nav
}

fn layout(title: &str, ctx: &PageContext, main: &str) -> Html<String> {
    let flash = ctx
        .flash
        .as_deref()
        .map(|f| format!(r#"<div class="flash">{}</div>"#, escape(f)))
        .unwrap_or_default();
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} - Lawbook</title></head>
<body>
<header><h1><a href="/">Lawbook</a></h1></header>
{nav}
<main>
{flash}
{main}
</main>
<footer>Lawbook &copy; {year}</footer>
</body>
</html>"#,
        title = escape(title),
        nav = nav(ctx),
        year = ctx.current_year,
    ))
}

fn field_error(v: &Validator, key: &str) -> String {
    v.field_error(key)
        .map(|e| format!(r#"<label class="error">{}</label>"#, escape(e)))
        .unwrap_or_default()
}

fn non_field_errors(v: &Validator) -> String {
    v.non_field_errors
        .iter()
        .map(|e| format!(r#"<div class="error">{}</div>"#, escape(e)))
        .collect()
}

// ---- pages ----

pub fn home(ctx: &PageContext) -> Html<String> {
    layout(
        "Home",
        ctx,
        "<h2>Welcome to Lawbook</h2><p>Practice, network and prepare for moot court.</p>",
    )
}

pub fn about(ctx: &PageContext) -> Html<String> {
    layout(
        "About",
        ctx,
        "<h2>About</h2><p>Lawbook connects law students, practising lawyers and recruiters.</p>",
    )
}

pub fn signup(ctx: &PageContext, form: &SignupForm, v: &Validator) -> Html<String> {
    let options: String = Role::ALL
        .iter()
        .map(|role| {
            let selected = if form.role == role.as_str() { " selected" } else { "" };
            format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                role.as_str(),
                role_display(*role)
            )
        })
        .collect();
    let main = format!(
        r#"<h2>Signup</h2>
<form action="/user/signup" method="POST" novalidate>
{csrf}
<div><label>Name:</label>{name_err}<input type="text" name="name" value="{name}"></div>
<div><label>Email:</label>{email_err}<input type="email" name="email" value="{email}"></div>
<div><label>Password:</label>{password_err}<input type="password" name="password"></div>
<div><label>Role:</label>{role_err}<select name="role"><option value="">Select a role</option>{options}</select></div>
<div><input type="submit" value="Signup"></div>
</form>"#,
        csrf = csrf_input(ctx),
        name_err = field_error(v, "name"),
        name = escape(&form.name),
        email_err = field_error(v, "email"),
        email = escape(&form.email),
        password_err = field_error(v, "password"),
        role_err = field_error(v, "role"),
    );
    layout("Signup", ctx, &main)
}

pub fn login(ctx: &PageContext, form: &LoginForm, v: &Validator) -> Html<String> {
    let main = format!(
        r#"<h2>Login</h2>
<form action="/user/login" method="POST" novalidate>
{csrf}
{errors}
<div><label>Email:</label>{email_err}<input type="email" name="email" value="{email}"></div>
<div><label>Password:</label>{password_err}<input type="password" name="password"></div>
<div><input type="submit" value="Login"></div>
</form>"#,
        csrf = csrf_input(ctx),
        errors = non_field_errors(v),
        email_err = field_error(v, "email"),
        email = escape(&form.email),
        password_err = field_error(v, "password"),
    );
    layout("Login", ctx, &main)
}

pub fn account(ctx: &PageContext, user: &User) -> Html<String> {
    let main = format!(
        r#"<h2>Your Account</h2>
<table>
<tr><th>Name</th><td>{name}</td></tr>
<tr><th>Email</th><td>{email}</td></tr>
<tr><th>Role</th><td>{role}</td></tr>
<tr><th>Email verified</th><td>{verified}</td></tr>
<tr><th>Joined</th><td>{joined}</td></tr>
</table>"#,
        name = escape(&user.name),
        email = escape(&user.email),
        role = role_display(user.role),
        verified = if user.email_verified { "Yes" } else { "No" },
        joined = human_date(user.created_at),
    );
    layout("Account", ctx, &main)
}

fn greeting(ctx: &PageContext) -> String {
    ctx.user
        .as_ref()
        .map(|u| format!("<p>Welcome back, {}.</p>", escape(&u.name)))
        .unwrap_or_default()
}

pub fn student_dashboard(ctx: &PageContext) -> Html<String> {
    let main = format!(
        r#"<h2>Student Dashboard</h2>{}<p><a href="/moot/setup">Start a moot court practice</a></p>"#,
        greeting(ctx)
    );
    layout("Student Dashboard", ctx, &main)
}

pub fn lawyer_dashboard(ctx: &PageContext) -> Html<String> {
    let main = format!(
        r#"<h2>Lawyer Dashboard</h2>{}<p><a href="/moot/setup">Judge a moot court session</a></p>"#,
        greeting(ctx)
    );
    layout("Lawyer Dashboard", ctx, &main)
}

pub fn recruiter_dashboard(ctx: &PageContext, students: &[User]) -> Html<String> {
    let rows: String = if students.is_empty() {
        "<p>No students have signed up yet.</p>".into()
    } else {
        let items: String = students
            .iter()
            .map(|s| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape(&s.name),
                    escape(&s.email),
                    human_date(s.created_at)
                )
            })
            .collect();
        format!("<table><tr><th>Name</th><th>Email</th><th>Joined</th></tr>{items}</table>")
    };
    let main = format!(
        "<h2>Recruiter Dashboard</h2>{}<h3>Recent students</h3>{rows}",
        greeting(ctx)
    );
    layout("Recruiter Dashboard", ctx, &main)
}

pub fn moot_setup(ctx: &PageContext) -> Html<String> {
    layout(
        "Moot Court Setup",
        ctx,
        r#"<h2>Moot Court Setup</h2><p>Choose a case and your side, then begin.</p><p><a href="/moot/session">Begin session</a></p>"#,
    )
}

pub fn moot_session(ctx: &PageContext) -> Html<String> {
    layout(
        "Moot Court Session",
        ctx,
        "<h2>Moot Court Session</h2><p>The bench is ready. Present your opening submission.</p>",
    )
}
