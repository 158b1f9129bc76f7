use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Loose email shape check: something, an `@`, something, a dot, something.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));

/// Exactly ten ASCII digits.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern is valid"));

/// Characters accepted as the "special character" of a password.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Minimum password length, counted in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Form field a validation message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    EmployeeName,
    Email,
    PhoneNumber,
    Address,
    Password,
    ConfirmPassword,
    OldPassword,
    NewPassword,
    TaskName,
}

impl Field {
    /// Wire-style key, matching the backend's JSON field names.
    pub fn key(&self) -> &'static str {
        match self {
            Field::EmployeeName => "employeeName",
            Field::Email => "email",
            Field::PhoneNumber => "phoneNumber",
            Field::Address => "address",
            Field::Password => "password",
            Field::ConfirmPassword => "confirmPassword",
            Field::OldPassword => "oldPassword",
            Field::NewPassword => "newPassword",
            Field::TaskName => "taskName",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single failed rule, attached to the field it applies to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn long_enough(p: &str) -> bool {
    p.chars().count() >= MIN_PASSWORD_LENGTH
}

fn has_uppercase(p: &str) -> bool {
    p.chars().any(|c| c.is_ascii_uppercase())
}

fn has_lowercase(p: &str) -> bool {
    p.chars().any(|c| c.is_ascii_lowercase())
}

fn has_digit(p: &str) -> bool {
    p.chars().any(|c| c.is_ascii_digit())
}

fn has_special(p: &str) -> bool {
    p.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c))
}

fn has_no_whitespace(p: &str) -> bool {
    !p.chars().any(char::is_whitespace)
}

/// Ordered password rules. Evaluation stops at the first failure.
const PASSWORD_RULES: [(fn(&str) -> bool, &str); 6] = [
    (long_enough, "Password must be at least 8 characters long."),
    (has_uppercase, "Password must contain at least one uppercase letter."),
    (has_lowercase, "Password must contain at least one lowercase letter."),
    (has_digit, "Password must contain at least one number."),
    (has_special, "Password must contain at least one special character."),
    (has_no_whitespace, "Password cannot contain spaces."),
];

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if !email.is_empty() && EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::new(Field::Email, "Valid email is required"))
    }
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(ValidationError::new(
            Field::PhoneNumber,
            "Valid phone number is required",
        ))
    }
}

/// Check a password against the strength rules, reporting only the first rule
/// that fails.
pub fn password_strength(password: &str) -> Result<(), &'static str> {
    match PASSWORD_RULES.iter().find(|(check, _)| !check(password)) {
        Some((_, message)) => Err(*message),
        None => Ok(()),
    }
}

/// Validate a password for the given field. Empty input gets its own message.
pub fn validate_password(field: Field, password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new(field, "Password is required"));
    }
    password_strength(password).map_err(|message| ValidationError::new(field, message))
}

/// Compare the confirmation field against the primary password.
/// Cheap enough to run on every keystroke.
pub fn validate_confirm_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password == confirm {
        Ok(())
    } else {
        Err(ValidationError::new(
            Field::ConfirmPassword,
            "Passwords do not match",
        ))
    }
}

/// Reject only the empty string; whitespace counts as a value.
pub fn validate_required(field: Field, value: &str, message: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::new(field, message))
    } else {
        Ok(())
    }
}
