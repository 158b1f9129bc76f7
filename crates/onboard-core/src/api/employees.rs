//! Typed access to the employee resources: profile, password, to-dos and
//! file upload.
//!
//! Every call here is authenticated. Any 401 is reported to the
//! [`SessionController`] before the error is returned, so the whole app drops
//! back to the signed-out screens.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{multipart, Method, Response, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::client::{ApiClient, RequestOptions};
use super::ApiError;
use crate::auth::SessionController;
use crate::models::{Employee, Todo, TodoDraft};
use crate::validation::{Field, PasswordChange, ValidationError};

/// Backend text identifying a wrong current password.
const WRONG_PASSWORD_MARKER: &str = "Current password is incorrect";

/// Length of the random part of uploaded file names.
const UPLOAD_SUFFIX_LEN: usize = 5;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "fileUrl")]
    file_url: String,
}

/// Which profile document an upload replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileDocument {
    Photo,
    Resume,
}

#[derive(Clone)]
pub struct EmployeeApi {
    client: ApiClient,
    session: Arc<SessionController>,
}

impl EmployeeApi {
    pub fn new(client: ApiClient, session: Arc<SessionController>) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    /// Forward auth failures to the session before handing the error back.
    fn observe<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(ref e) = result {
            if matches!(e, ApiError::AuthExpired | ApiError::MissingCredential) {
                self.session.expire();
            }
        }
        result
    }

    /// Id of the signed-in employee, from the stored credential.
    pub fn user_id(&self) -> Result<String, ApiError> {
        let credential = self
            .session
            .store()
            .load()?
            .ok_or(ApiError::MissingCredential);
        self.observe(credential).map(|c| c.user_id)
    }

    fn employee_url(&self, user_id: &str) -> String {
        self.client.url(&format!("/api/employees/{}", user_id))
    }

    fn todos_url(&self, user_id: &str) -> String {
        self.client.url(&format!("/api/employees/{}/todos", user_id))
    }

    async fn send(&self, url: &str, options: RequestOptions) -> Result<Response, ApiError> {
        let result = match self.client.request(url, options).await {
            Ok(response) => ApiClient::check_response(response).await,
            Err(e) => Err(e),
        };
        self.observe(result)
    }

    // ===== Profile =====

    /// Fetch the signed-in employee's record
    pub async fn profile(&self) -> Result<Employee, ApiError> {
        let user_id = self.user_id()?;
        let response = self.send(&self.employee_url(&user_id), RequestOptions::get()).await?;
        ApiClient::parse_json(response).await
    }

    /// Replace the signed-in employee's record. Contact fields are validated
    /// locally first.
    pub async fn update_profile(&self, employee: &Employee) -> Result<Employee, ApiError> {
        employee.validate()?;
        let user_id = self.user_id()?;
        let result: Result<Employee, ApiError> = self
            .client
            .put_json(&self.employee_url(&user_id), employee)
            .await;
        let updated = self.observe(result)?;
        info!(user_id = %user_id, "Profile updated");
        Ok(updated)
    }

    /// Change the password. A wrong current password comes back as a
    /// validation error on that field.
    pub async fn update_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        change.validate()?;
        let user_id = self.user_id()?;
        let url = Url::parse_with_params(
            &self.client.url(&format!("/api/employees/{}/updatePassword", user_id)),
            &[
                ("oldPassword", change.old_password.as_str()),
                ("newPassword", change.new_password.as_str()),
            ],
        )
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let result = self
            .client
            .request(url.as_str(), RequestOptions::method(Method::PUT))
            .await;
        let response = self.observe(result)?;
        if response.status().is_success() {
            info!(user_id = %user_id, "Password updated");
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() != 401 && body.contains(WRONG_PASSWORD_MARKER) {
            let error = ValidationError::new(Field::OldPassword, WRONG_PASSWORD_MARKER);
            return Err(ApiError::Validation(error.into()));
        }
        self.observe(Err(ApiError::from_status(status, &body)))
    }

    // ===== To-dos =====

    pub async fn todos(&self) -> Result<Vec<Todo>, ApiError> {
        let user_id = self.user_id()?;
        let response = self.send(&self.todos_url(&user_id), RequestOptions::get()).await?;
        let todos: Vec<Todo> = ApiClient::parse_json(response).await?;
        debug!(count = todos.len(), "Fetched todos");
        Ok(todos)
    }

    pub async fn add_todo(&self, draft: &TodoDraft) -> Result<(), ApiError> {
        let user_id = self.user_id()?;
        let options = RequestOptions::method(Method::POST).with_json(draft)?;
        self.send(&self.todos_url(&user_id), options).await?;
        Ok(())
    }

    pub async fn update_todo(&self, todo_id: &str, draft: &TodoDraft) -> Result<(), ApiError> {
        let user_id = self.user_id()?;
        let url = format!("{}/{}", self.todos_url(&user_id), todo_id);
        let options = RequestOptions::method(Method::PUT).with_json(draft)?;
        self.send(&url, options).await?;
        Ok(())
    }

    pub async fn delete_todo(&self, todo_id: &str) -> Result<(), ApiError> {
        let user_id = self.user_id()?;
        let url = format!("{}/{}", self.todos_url(&user_id), todo_id);
        self.send(&url, RequestOptions::delete()).await?;
        Ok(())
    }

    // ===== Uploads =====

    /// Upload a local file and return the URL the backend stored it under.
    pub async fn upload_file(&self, path: &Path) -> Result<String, ApiError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| ApiError::InvalidRequest("file has no extension".to_string()))?;
        let bytes = tokio::fs::read(path).await?;
        let file_name = upload_file_name(&extension);

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(&content_type_for(&extension))
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let result = match self
            .client
            .upload(&self.client.url("/api/upload/direct"), form)
            .await
        {
            Ok(response) => ApiClient::check_response(response).await,
            Err(e) => Err(e),
        };
        let response = match self.observe(result) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, file = %path.display(), "Upload failed");
                return Err(e);
            }
        };
        let uploaded: UploadResponse = ApiClient::parse_json(response).await?;
        info!(file_name = %file_name, url = %uploaded.file_url, "File uploaded");
        Ok(uploaded.file_url)
    }

    /// Upload a photo or resume and point the profile at it.
    pub async fn attach_document(
        &self,
        kind: ProfileDocument,
        path: &Path,
    ) -> Result<Employee, ApiError> {
        let file_url = self.upload_file(path).await?;
        let mut employee = self.profile().await?;
        match kind {
            ProfileDocument::Photo => employee.photo_url = Some(file_url),
            ProfileDocument::Resume => employee.resume_url = Some(file_url),
        }
        self.update_profile(&employee).await
    }
}

/// `<unix-millis>_<random>.<ext>`
fn upload_file_name(extension: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(UPLOAD_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!(
        "{}_{}.{}",
        Utc::now().timestamp_millis(),
        suffix.to_lowercase(),
        extension
    )
}

fn content_type_for(extension: &str) -> String {
    if extension == "pdf" {
        "application/pdf".to_string()
    } else {
        format!("image/{}", extension)
    }
}
