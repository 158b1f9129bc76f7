//! Subcommand handlers.
//!
//! Library errors are turned into the short messages the user should see;
//! the full error goes to the log.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::{debug, warn};

use onboard_core::api::{ApiError, ProfileDocument};
use onboard_core::auth::{AuthFlowError, Keychain, SessionState};
use onboard_core::models::{Department, Employee, Registration, Todo, TodoDraft, BENEFIT_OPTIONS};
use onboard_core::validation::{PasswordChange, ValidationErrors};
use onboard_core::{App, Config};

use crate::prompt;
use crate::{Commands, ProfileCommand, TodoCommand};

pub async fn run(command: Commands, app: &App, config: &mut Config) -> Result<()> {
    match command {
        Commands::Signup => signup(app, config).await,
        Commands::Signin { email, remember } => signin(app, config, email, remember).await,
        Commands::Logout { forget } => logout(app, config, forget),
        Commands::Status => status(app, config),
        Commands::Profile(cmd) => profile(app, cmd).await,
        Commands::Password => change_password(app, config).await,
        Commands::Todos(cmd) => todos(app, cmd).await,
        Commands::Departments { query } => {
            departments(query.as_deref());
            Ok(())
        }
    }
}

// ============================================================================
// Error presentation
// ============================================================================

fn describe_validation(errors: &ValidationErrors) -> anyhow::Error {
    let lines: Vec<String> = errors
        .iter()
        .map(|e| format!("  {}: {}", e.field, e.message))
        .collect();
    anyhow!("Please fix the following:\n{}", lines.join("\n"))
}

fn flow_error(e: AuthFlowError) -> anyhow::Error {
    debug!(error = ?e, "Auth flow failed");
    match &e {
        AuthFlowError::Validation(errors) => describe_validation(errors),
        AuthFlowError::AutoSignInFailed(_) => {
            anyhow!("Your account was created, but signing in failed. Try `onboard signin`.")
        }
        _ => anyhow!(e.user_message()),
    }
}

fn api_error(e: ApiError) -> anyhow::Error {
    debug!(error = ?e, "Request failed");
    match &e {
        ApiError::Validation(errors) => describe_validation(errors),
        // The session watcher already printed the expiry notice.
        ApiError::AuthExpired => anyhow!("Run `onboard signin` to continue."),
        _ => anyhow!(e.user_message()),
    }
}

fn remember_email(config: &mut Config, email: &str) {
    config.last_email = Some(email.to_string());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
}

// ============================================================================
// Session
// ============================================================================

async fn signup(app: &App, config: &mut Config) -> Result<()> {
    let mut form = Registration::blank(Utc::now().date_naive());
    form.employee_name = prompt::line("Full name")?;
    form.email = prompt::line("Email")?;
    form.phone_number = prompt::line("Phone number (10 digits)")?;
    form.address = prompt::line("Address")?;
    form.department = prompt_department(form.department)?;
    let gender = prompt::line_or("Gender (male/female)", "male")?;
    form.is_male = !matches!(gender.to_lowercase().as_str(), "f" | "female");
    form.date_of_birth = prompt_date("Date of birth (YYYY-MM-DD)", form.date_of_birth)?;
    for option in BENEFIT_OPTIONS {
        if prompt::confirm(&format!("Opt in to {}?", option))? {
            form.check_box_options.push(option.to_string());
        }
    }
    form.password = prompt::password("Password")?;
    let confirm = prompt::password("Confirm password")?;

    app.auth.sign_up(&form, &confirm).await.map_err(flow_error)?;
    remember_email(config, &form.email);
    println!("Welcome, {}! You are signed in.", form.employee_name);
    Ok(())
}

async fn signin(
    app: &App,
    config: &mut Config,
    email: Option<String>,
    remember: bool,
) -> Result<()> {
    let email = match (email, config.last_email.as_deref()) {
        (Some(email), _) => email,
        (None, Some(last)) => prompt::line_or("Email", last)?,
        (None, None) => prompt::line("Email")?,
    };

    let remembered = Keychain::recall(&email);
    let password = match &remembered {
        Some(password) => password.clone(),
        None => prompt::password("Password")?,
    };

    let password = match app.auth.sign_in(&email, &password).await {
        Ok(_) => password,
        Err(AuthFlowError::InvalidCredentials) if remembered.is_some() => {
            eprintln!("The remembered password was rejected.");
            let password = prompt::password("Password")?;
            app.auth.sign_in(&email, &password).await.map_err(flow_error)?;
            password
        }
        Err(e) => return Err(flow_error(e)),
    };

    if remember || remembered.as_deref().is_some_and(|p| p != password) {
        if let Err(e) = Keychain::remember(&email, &password) {
            warn!(error = %e, "Failed to remember password");
            eprintln!("Could not save the password to the keychain.");
        }
    }
    remember_email(config, &email);
    println!("Signed in as {}", email);
    Ok(())
}

fn logout(app: &App, config: &Config, forget: bool) -> Result<()> {
    app.auth.logout().map_err(flow_error)?;
    if forget {
        if let Some(email) = &config.last_email {
            Keychain::forget(email)?;
        }
    }
    println!("Signed out.");
    Ok(())
}

fn status(app: &App, config: &Config) -> Result<()> {
    println!("Backend: {}", app.config.api_url());
    match app.session.state() {
        SessionState::Authenticated => {
            let credential = app
                .session
                .store()
                .load()
                .context("Failed to read saved session")?;
            match credential {
                Some(credential) => println!("Signed in (employee {})", credential.user_id),
                None => println!("Signed in"),
            }
        }
        SessionState::Unauthenticated => println!("Not signed in"),
    }
    if let Some(email) = &config.last_email {
        println!("Last email: {}", email);
    }
    Ok(())
}

async fn change_password(app: &App, config: &Config) -> Result<()> {
    let change = PasswordChange {
        old_password: prompt::password("Current password")?,
        new_password: prompt::password("New password")?,
        confirm_password: prompt::password("Confirm new password")?,
    };
    app.employees
        .update_password(&change)
        .await
        .map_err(api_error)?;

    if let Some(email) = &config.last_email {
        if Keychain::recall(email).is_some() {
            if let Err(e) = Keychain::remember(email, &change.new_password) {
                warn!(error = %e, "Failed to update remembered password");
            }
        }
    }
    println!("Password changed.");
    Ok(())
}

// ============================================================================
// Profile
// ============================================================================

async fn profile(app: &App, command: ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::Show => {
            let employee = app.employees.profile().await.map_err(api_error)?;
            print_profile(&employee);
        }
        ProfileCommand::Update {
            name,
            email,
            phone,
            address,
            department,
        } => {
            let mut employee = app.employees.profile().await.map_err(api_error)?;
            let interactive = name.is_none()
                && email.is_none()
                && phone.is_none()
                && address.is_none()
                && department.is_none();

            if interactive {
                employee.employee_name = prompt::line_or("Full name", &employee.employee_name)?;
                employee.email = prompt::line_or("Email", &employee.email)?;
                employee.phone_number = prompt::line_or("Phone number", &employee.phone_number)?;
                employee.address = prompt::line_or("Address", &employee.address)?;
                employee.department = prompt_department(employee.department)?;
            } else {
                if let Some(name) = name {
                    employee.employee_name = name;
                }
                if let Some(email) = email {
                    employee.email = email;
                }
                if let Some(phone) = phone {
                    employee.phone_number = phone;
                }
                if let Some(address) = address {
                    employee.address = address;
                }
                if let Some(department) = department {
                    employee.department = Department::parse(&department)
                        .ok_or_else(|| anyhow!("Unknown department: {}", department))?;
                }
            }

            let updated = app
                .employees
                .update_profile(&employee)
                .await
                .map_err(api_error)?;
            println!("Profile updated.\n");
            print_profile(&updated);
        }
        ProfileCommand::UploadPhoto { path } => {
            let employee = app
                .employees
                .attach_document(ProfileDocument::Photo, &path)
                .await
                .map_err(api_error)?;
            println!("Photo uploaded: {}", employee.photo_url.unwrap_or_default());
        }
        ProfileCommand::UploadResume { path } => {
            let employee = app
                .employees
                .attach_document(ProfileDocument::Resume, &path)
                .await
                .map_err(api_error)?;
            println!("Resume uploaded: {}", employee.resume_url.unwrap_or_default());
        }
    }
    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

fn print_profile(employee: &Employee) {
    let birth = employee
        .date_of_birth
        .map(|d| d.format("%Y-%m-%d").to_string());
    let benefits = if employee.check_box_options.is_empty() {
        "None".to_string()
    } else {
        employee.check_box_options.join(", ")
    };

    println!("{:<15} {}", "Name:", employee.employee_name);
    println!("{:<15} {}", "Email:", employee.email);
    println!("{:<15} {}", "Phone:", employee.phone_number);
    println!("{:<15} {}", "Address:", employee.address);
    println!("{:<15} {}", "Department:", employee.department);
    println!("{:<15} {}", "Gender:", employee.gender_display());
    println!("{:<15} {}", "Date of birth:", or_dash(birth.as_deref()));
    println!("{:<15} {}", "Benefits:", benefits);
    println!("{:<15} {}", "Photo:", or_dash(employee.photo_url.as_deref()));
    println!("{:<15} {}", "Resume:", or_dash(employee.resume_url.as_deref()));
}

fn prompt_department(current: Department) -> Result<Department> {
    loop {
        let input = prompt::line_or("Department (see `onboard departments`)", current.code())?;
        match Department::parse(&input) {
            Some(department) => return Ok(department),
            None => eprintln!("Unknown department: {}", input),
        }
    }
}

fn prompt_date(label: &str, current: NaiveDate) -> Result<NaiveDate> {
    loop {
        let input = prompt::line_or(label, &current.format("%Y-%m-%d").to_string())?;
        match NaiveDate::parse_from_str(&input, "%Y-%m-%d") {
            Ok(date) => return Ok(date),
            Err(_) => eprintln!("Expected a date like 1990-01-31"),
        }
    }
}

// ============================================================================
// To-dos
// ============================================================================

async fn todos(app: &App, command: TodoCommand) -> Result<()> {
    match command {
        TodoCommand::List => {
            let todos = app.employees.todos().await.map_err(api_error)?;
            if todos.is_empty() {
                println!("No tasks yet.");
            }
            for todo in &todos {
                println!(
                    "{:>5}  [{}]  {:<16}  {}",
                    todo.id,
                    if todo.is_finished() { "x" } else { " " },
                    todo.due_display(),
                    todo.task_name
                );
            }
        }
        TodoCommand::Add { task, date, time } => {
            let user_id = app.employees.user_id().map_err(api_error)?;
            let due = parse_due(date.as_deref(), time.as_deref(), Utc::now())?;
            let draft = TodoDraft::new(&task, due, &user_id)?;
            app.employees.add_todo(&draft).await.map_err(api_error)?;
            println!("Added \"{}\"", draft.task_name);
        }
        TodoCommand::Edit {
            id,
            task,
            date,
            time,
        } => {
            let existing = find_todo(app, &id).await?;
            let user_id = app.employees.user_id().map_err(api_error)?;
            let due = parse_due(date.as_deref(), time.as_deref(), current_due(&existing))?;
            let task = task.unwrap_or_else(|| existing.task_name.clone());
            let draft = TodoDraft::edit(&existing, &task, due, &user_id)?;
            app.employees
                .update_todo(&existing.id, &draft)
                .await
                .map_err(api_error)?;
            println!("Updated \"{}\"", draft.task_name);
        }
        TodoCommand::Toggle { id } => {
            let existing = find_todo(app, &id).await?;
            let user_id = app.employees.user_id().map_err(api_error)?;
            let draft = TodoDraft::toggled(&existing, &user_id);
            app.employees
                .update_todo(&existing.id, &draft)
                .await
                .map_err(api_error)?;
            let state = if draft.completed { "done" } else { "not done" };
            println!("Marked \"{}\" {}", draft.task_name, state);
        }
        TodoCommand::Delete { id, yes } => {
            let existing = find_todo(app, &id).await?;
            if !yes && !prompt::confirm(&format!("Delete \"{}\"?", existing.task_name))? {
                println!("Kept.");
                return Ok(());
            }
            app.employees
                .delete_todo(&existing.id)
                .await
                .map_err(api_error)?;
            println!("Deleted \"{}\"", existing.task_name);
        }
    }
    Ok(())
}

async fn find_todo(app: &App, id: &str) -> Result<Todo> {
    let todos = app.employees.todos().await.map_err(api_error)?;
    todos
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| anyhow!("No task with id {}", id))
}

fn current_due(todo: &Todo) -> DateTime<Utc> {
    match (todo.date, todo.time) {
        (Some(date), time) => date.and_time(time.unwrap_or(NaiveTime::MIN)).and_utc(),
        (None, _) => Utc::now(),
    }
}

/// Combine optional `YYYY-MM-DD` and `HH:MM` inputs, filling the missing
/// half from `fallback`.
fn parse_due(
    date: Option<&str>,
    time: Option<&str>,
    fallback: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let date = match date {
        Some(d) => NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", d))?,
        None => fallback.date_naive(),
    };
    let time = match time {
        Some(t) => NaiveTime::parse_from_str(t.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(t.trim(), "%H:%M:%S"))
            .with_context(|| format!("Invalid time '{}', expected HH:MM", t))?,
        None => fallback.time(),
    };
    Ok(date.and_time(time).and_utc())
}

// ============================================================================
// Departments
// ============================================================================

fn departments(query: Option<&str>) {
    let matches = Department::search(query.unwrap_or(""));
    if matches.is_empty() {
        println!("No departments match.");
    }
    for department in matches {
        println!("{:<28} {}", department.display_name(), department.code());
    }
}
