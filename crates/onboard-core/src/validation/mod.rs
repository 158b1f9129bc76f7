//! Local form validation shared by sign-up, profile update and password change.
//!
//! Rules are pure functions returning structured results so every screen
//! reports the same messages for the same input.

pub mod forms;
pub mod rules;

pub use forms::{
    validate_profile, validate_signup, validate_task_name, PasswordChange, SignupFields,
    ValidationErrors,
};
pub use rules::{
    password_strength, validate_confirm_password, validate_email, validate_password,
    validate_phone, Field, ValidationError,
};
