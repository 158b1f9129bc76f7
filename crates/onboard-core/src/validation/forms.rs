use std::fmt;

use super::rules::{
    validate_confirm_password, validate_email, validate_password, validate_phone,
    validate_required, Field, ValidationError,
};

/// All field errors produced by one form submission, in field order.
/// At most one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a rule. Later failures on a field that already
    /// has a message are ignored.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            if self.get(e.field).is_none() {
                self.0.push(e);
            }
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing failed, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(e: ValidationError) -> Self {
        Self(vec![e])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Fields collected by the sign-up screen that need local checks.
#[derive(Debug, Clone, Default)]
pub struct SignupFields<'a> {
    pub employee_name: &'a str,
    pub email: &'a str,
    pub phone_number: &'a str,
    pub address: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

pub fn validate_signup(fields: &SignupFields<'_>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(validate_required(
        Field::EmployeeName,
        fields.employee_name,
        "Name is required",
    ));
    errors.check(validate_email(fields.email));
    errors.check(validate_phone(fields.phone_number));
    errors.check(validate_password(Field::Password, fields.password));
    errors.check(validate_required(
        Field::Address,
        fields.address,
        "Address is required",
    ));
    errors.check(validate_confirm_password(
        fields.password,
        fields.confirm_password,
    ));
    errors.into_result()
}

/// Contact details editable from the profile screen.
pub fn validate_profile(
    employee_name: &str,
    email: &str,
    phone_number: &str,
    address: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.check(validate_required(
        Field::EmployeeName,
        employee_name,
        "Name is required",
    ));
    errors.check(validate_email(email));
    errors.check(validate_phone(phone_number));
    errors.check(validate_required(Field::Address, address, "Address is required"));
    errors.into_result()
}

/// Input of the change-password dialog.
#[derive(Debug, Clone, Default)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.old_password.is_empty() {
            errors.check(Err(ValidationError::new(
                Field::OldPassword,
                "Current password is required",
            )));
        }
        errors.check(validate_password(Field::NewPassword, &self.new_password));
        if !self.old_password.is_empty() && self.new_password == self.old_password {
            errors.check(Err(ValidationError::new(
                Field::NewPassword,
                "New password must be different from the current password.",
            )));
        }
        errors.check(validate_confirm_password(
            &self.new_password,
            &self.confirm_password,
        ));
        errors.into_result()
    }
}

/// Blank task names are rejected after trimming.
pub fn validate_task_name(task_name: &str) -> Result<(), ValidationError> {
    validate_required(Field::TaskName, task_name.trim(), "Task name is required")
}
