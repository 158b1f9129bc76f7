use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{opt_id_string, Department};
use crate::validation::{validate_profile, validate_signup, SignupFields, ValidationErrors};

/// Benefit checkboxes offered at sign-up.
pub const BENEFIT_OPTIONS: [&str; 3] = ["Health Insurance", "Newsletter", "Work From Home"];

/// Employee record as returned by `GET /api/employees/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default, deserialize_with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    /// Present on some backend responses; sent back unchanged on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub department: Department,
    #[serde(default = "default_is_male")]
    pub is_male: bool,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub check_box_options: Vec<String>,
}

fn default_is_male() -> bool {
    true
}

impl Employee {
    /// Check the editable contact fields before sending an update.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate_profile(
            &self.employee_name,
            &self.email,
            &self.phone_number,
            &self.address,
        )
    }

    pub fn gender_display(&self) -> &'static str {
        if self.is_male {
            "Male"
        } else {
            "Female"
        }
    }
}

/// Body of `POST /api/employees`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub employee_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub password: String,
    pub department: Department,
    pub is_male: bool,
    pub date_of_birth: NaiveDate,
    pub photo_url: String,
    pub resume_url: String,
    pub check_box_options: Vec<String>,
}

impl Registration {
    /// A blank form with the sign-up screen's defaults: department IT,
    /// male, born yesterday.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            employee_name: String::new(),
            email: String::new(),
            phone_number: String::new(),
            address: String::new(),
            password: String::new(),
            department: Department::default(),
            is_male: true,
            date_of_birth: today.pred_opt().unwrap_or(today),
            photo_url: String::new(),
            resume_url: String::new(),
            check_box_options: Vec::new(),
        }
    }

    /// Run every local rule. `confirm_password` is not part of the payload.
    pub fn validate(&self, confirm_password: &str) -> Result<(), ValidationErrors> {
        validate_signup(&SignupFields {
            employee_name: &self.employee_name,
            email: &self.email,
            phone_number: &self.phone_number,
            address: &self.address,
            password: &self.password,
            confirm_password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_employee_response() {
        let json = r#"{"id": 12, "employeeName": "Jane Doe", "email": "jane@example.com",
            "phoneNumber": "5551234567", "address": "1 Main St", "department": "SALES",
            "isMale": false, "dateOfBirth": "1990-04-01", "photoUrl": null,
            "resumeUrl": "https://files.example.com/cv.pdf",
            "checkBoxOptions": ["Newsletter"]}"#;
        let e: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(e.id.as_deref(), Some("12"));
        assert_eq!(e.department, Department::Sales);
        assert!(!e.is_male);
        assert_eq!(e.gender_display(), "Female");
        assert_eq!(e.date_of_birth, NaiveDate::from_ymd_opt(1990, 4, 1));
        assert_eq!(e.photo_url, None);
        assert_eq!(e.check_box_options, vec!["Newsletter".to_string()]);
        assert!(e.validate().is_ok());
    }

    #[test]
    fn test_sparse_employee_uses_defaults() {
        let e: Employee = serde_json::from_str(r#"{"id": "7"}"#).unwrap();
        assert_eq!(e.department, Department::It);
        assert!(e.is_male);
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_registration_serializes_camel_case() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut r = Registration::blank(today);
        r.employee_name = "Jane".to_string();
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["employeeName"], "Jane");
        assert_eq!(v["department"], "IT");
        assert_eq!(v["isMale"], true);
        assert_eq!(v["dateOfBirth"], "2024-02-29");
        assert!(v["checkBoxOptions"].as_array().unwrap().is_empty());
    }
}
