//! Form validation: submitted form DTOs into domain drafts.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use inkwell_core::FieldErrors;
use inkwell_core::domain::{MAX_TITLE_LEN, Post, PostDraft, ProfileDraft, User};
use inkwell_shared::dto::{CommentForm, PostForm, ProfileForm, RegistrationForm};

const REQUIRED: &str = "This field is required.";
const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;

/// Datetime layouts accepted for `pub_date` besides RFC 3339.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Value of `pub_date` as rendered back into the post form.
const PUB_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// An optional foreign key: empty means none.
fn parse_choice(raw: &str, field: &str, errors: &mut FieldErrors) -> Option<Uuid> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "Select a valid choice.");
            None
        }
    }
}

/// A ticked HTML checkbox submits its value; an unticked one submits nothing.
fn checkbox(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !matches!(v, "" | "false" | "off" | "0"))
}

pub fn validate_post(form: &PostForm) -> Result<PostDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = form.title.trim();
    if title.is_empty() {
        errors.add("title", REQUIRED);
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.add(
            "title",
            format!("Ensure this value has at most {} characters.", MAX_TITLE_LEN),
        );
    }

    let text = form.text.trim();
    if text.is_empty() {
        errors.add("text", REQUIRED);
    }

    let raw_date = form.pub_date.trim();
    let pub_date = if raw_date.is_empty() {
        errors.add("pub_date", REQUIRED);
        None
    } else {
        let parsed = parse_pub_date(raw_date);
        if parsed.is_none() {
            errors.add("pub_date", "Enter a valid date/time.");
        }
        parsed
    };

    let location_id = parse_choice(&form.location, "location", &mut errors);
    let category_id = parse_choice(&form.category, "category", &mut errors);

    match pub_date {
        Some(pub_date) if errors.is_empty() => Ok(PostDraft {
            title: title.to_string(),
            text: text.to_string(),
            pub_date,
            is_published: checkbox(form.is_published.as_deref()),
            location_id,
            category_id,
        }),
        _ => Err(errors),
    }
}

/// The post form prefilled from a stored post.
pub fn post_form_from(post: &Post) -> PostForm {
    PostForm {
        title: post.title.clone(),
        text: post.text.clone(),
        pub_date: post.pub_date.format(PUB_DATE_FORMAT).to_string(),
        location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
        category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
        is_published: post.is_published.then(|| "on".to_string()),
    }
}

pub fn validate_comment(form: &CommentForm) -> Result<String, FieldErrors> {
    let text = form.text.trim();
    if text.is_empty() {
        return Err(FieldErrors::single("text", REQUIRED));
    }
    Ok(text.to_string())
}

fn check_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username.chars().count() > MAX_USERNAME_LEN
        || !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    if !email.is_empty() && !email.contains('@') {
        errors.add("email", "Enter a valid email address.");
    }
}

pub fn validate_profile(form: &ProfileForm) -> Result<ProfileDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = form.username.trim();
    let email = form.email.trim();
    check_username(username, &mut errors);
    check_email(email, &mut errors);

    errors.into_result(ProfileDraft {
        username: username.to_string(),
        email: email.to_string(),
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
    })
}

/// The profile form prefilled from the stored user.
pub fn profile_form_from(user: &User) -> ProfileForm {
    ProfileForm {
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

/// A validated registration: username, email and the plain password to hash.
#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn validate_registration(form: &RegistrationForm) -> Result<Registration, FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = form.username.trim();
    let email = form.email.trim();
    check_username(username, &mut errors);
    check_email(email, &mut errors);

    if form.password1.is_empty() {
        errors.add("password1", REQUIRED);
    } else if form.password1.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password1",
            format!(
                "This password is too short. It must contain at least {} characters.",
                MIN_PASSWORD_LEN
            ),
        );
    }
    if form.password1 != form.password2 {
        errors.add("password2", "The two password fields didn't match.");
    }

    errors.into_result(Registration {
        username: username.to_string(),
        email: email.to_string(),
        password: form.password1.clone(),
    })
}
