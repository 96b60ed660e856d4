// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::document::{GenerationError, generate_document};
use crate::form::ChallengeForm;
use crate::validation::{ValidationResult, field, validate_collection};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("{0}")]
    FieldFormat(String),
    /// A required part of the form is missing or over its limit.
    #[error("{message}")]
    Incomplete {
        title: &'static str,
        message: String,
    },
    #[error("{0}")]
    CollectionConflict(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl BuildError {
    /// Short heading for showing the error to a user.
    pub fn title(&self) -> &'static str {
        match self {
            BuildError::FieldFormat(_) => "Validation Error",
            BuildError::Incomplete { title, .. } => *title,
            BuildError::CollectionConflict(_) => "Duplicate Values Found",
            BuildError::Generation(_) => "Error Generating YAML",
        }
    }

    /// The `<title>: <message>` line shown to the user.
    pub fn report(&self) -> String {
        format!("{}: {}", self.title(), self)
    }
}

fn check_field(result: ValidationResult, context: Option<String>) -> Result<(), BuildError> {
    result.into_result().map_err(|message| {
        BuildError::FieldFormat(match context {
            Some(context) => format!("{context}: {message}"),
            None => message,
        })
    })
}

fn require(condition: bool, title: &'static str, message: &str) -> Result<(), BuildError> {
    if condition {
        Ok(())
    } else {
        Err(BuildError::Incomplete {
            title,
            message: message.to_string(),
        })
    }
}

/// Runs every check a form has to pass before a document is generated.
///
/// Checks run in a fixed order and the first failure is returned.
pub fn validate_form(form: &ChallengeForm) -> Result<(), BuildError> {
    check_field(field::validate_challenge_name(&form.name), None)?;
    check_field(field::validate_tag(&form.tag), None)?;
    require(
        !form.description.trim().is_empty(),
        "Missing Information",
        "Please fill in the challenge description",
    )?;
    require(
        !form.instances.is_empty(),
        "Missing Service",
        "Please add at least one service",
    )?;
    require(
        !(form.is_static && form.instances.len() > 1),
        "Too Many Services",
        "Static challenges can only have one service (dummy). Please remove extra services.",
    )?;
    require(
        !form.flags.is_empty(),
        "Missing Flag",
        "Please add at least one flag",
    )?;

    for (idx, flag) in form.flags.iter().enumerate() {
        let n = idx + 1;
        check_field(
            field::validate_flag_tag(&flag.tag),
            Some(format!("Flag {n} - Tag")),
        )?;
        check_field(
            field::validate_flag_static(&flag.static_value),
            Some(format!("Flag {n} - Flag Value")),
        )?;
    }

    if !form.is_static {
        for (idx, svc) in form.instances.iter().enumerate() {
            let n = idx + 1;
            require(
                svc.dns.len() <= 1,
                "Too Many DNS Entries",
                &format!(
                    "Service {n} can only have one DNS entry. Please remove extra DNS entries."
                ),
            )?;
            for record in &svc.dns {
                check_field(
                    field::validate_dns_name(&record.name),
                    Some(format!("Service {n}, DNS Entry")),
                )?;
            }
        }
    }

    validate_collection(form)
        .into_result()
        .map_err(BuildError::CollectionConflict)
}

/// Validates `form` and, if it passes, generates the challenge document.
pub fn build_document(form: &ChallengeForm) -> Result<String, BuildError> {
    if let Err(e) = validate_form(form) {
        tracing::debug!("Form rejected ({}): {}", e.title(), e);
        return Err(e);
    }
    Ok(generate_document(form)?)
}

/// Where a generated document goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Preview,
    File(PathBuf),
}

fn write_file(path: &Path, yaml: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, yaml)
}

/// Performs the output action for a generated document.
///
/// Previews are written to `preview`, files are written to disk.
pub fn emit(yaml: &str, output: &Output, preview: &mut impl Write) -> std::io::Result<()> {
    match output {
        Output::Preview => preview.write_all(yaml.as_bytes()),
        Output::File(path) => {
            write_file(path, yaml)?;
            tracing::info!("Wrote challenge document to {}", path.to_string_lossy());
            Ok(())
        }
    }
}
