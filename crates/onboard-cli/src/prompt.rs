//! Interactive input on the terminal.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};

/// Read one trimmed line after printing `label: `.
pub fn line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        bail!("No input for {}", label);
    }
    Ok(input.trim().to_string())
}

/// Like [`line`], but an empty answer keeps `current`.
pub fn line_or(label: &str, current: &str) -> Result<String> {
    let input = line(&format!("{} [{}]", label, current))?;
    if input.is_empty() {
        Ok(current.to_string())
    } else {
        Ok(input)
    }
}

/// Read a password without echo.
pub fn password(label: &str) -> Result<String> {
    Ok(rpassword::prompt_password(format!("{}: ", label))?)
}

/// Yes/no question; anything but y/yes is no.
pub fn confirm(label: &str) -> Result<bool> {
    let answer = line(&format!("{} [y/N]", label))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}
