// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::form::DNS_TLD;

use super::ValidationResult;

const FLAG_PREFIXES: [&str; 2] = ["FIRE{", "DDC{"];
const FLAG_BODY_MIN: usize = 6;
const FLAG_BODY_MAX: usize = 50;
const DNS_LABEL_MAX: usize = 63;

const FLAG_EXAMPLE: &str = "Example: FIRE{example_flag_123456} or DDC{example_flag_123456}.";

fn is_tag_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'
}

fn is_flag_body_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_hostname_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
}

pub fn validate_challenge_name(name: &str) -> ValidationResult {
    if name.trim().is_empty() {
        return ValidationResult::invalid(
            "Challenge name is required. Expected: letters, numbers, spaces, hyphens, and underscores only.",
        );
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c == '_')
    {
        return ValidationResult::invalid(
            "Challenge name format is invalid. Expected: letters (a-z, A-Z), numbers (0-9), spaces, hyphens (-), and underscores (_) only. No special characters allowed.",
        );
    }
    ValidationResult::ok()
}

fn validate_tag_like(value: &str, label: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return ValidationResult::invalid(format!(
            "{label} is required. Expected: lowercase letters, numbers, hyphens, and underscores only."
        ));
    }
    if !value.chars().all(is_tag_char) {
        return ValidationResult::invalid(format!(
            "{label} format is invalid. Expected: lowercase letters (a-z), numbers (0-9), hyphens (-), and underscores (_) only. No uppercase letters, spaces, or special characters allowed."
        ));
    }
    ValidationResult::ok()
}

pub fn validate_tag(tag: &str) -> ValidationResult {
    validate_tag_like(tag, "Tag")
}

pub fn validate_flag_tag(flag_tag: &str) -> ValidationResult {
    validate_tag_like(flag_tag, "Flag tag")
}

/// Checks a flag value against `FIRE{body}` / `DDC{body}`.
///
/// Diagnostics get more specific the further the value gets: prefix first,
/// then the closing brace, then the body length, then the body characters.
pub fn validate_flag_static(flag: &str) -> ValidationResult {
    if flag.trim().is_empty() {
        return ValidationResult::invalid(
            "Flag value is required. Expected format: FIRE{...} or DDC{...} with 6-50 characters inside the braces.",
        );
    }
    let trimmed = flag.trim();

    let Some(rest) = FLAG_PREFIXES.iter().find_map(|p| trimmed.strip_prefix(p)) else {
        return ValidationResult::invalid(
            "Flag value format is invalid. Expected: Must start with 'FIRE{' or 'DDC{' (e.g., FIRE{example_flag_123456} or DDC{example_flag_123456}).",
        );
    };
    let Some(body) = rest.strip_suffix('}') else {
        return ValidationResult::invalid(
            "Flag value format is invalid. Expected: Must end with '}' (e.g., FIRE{example_flag_123456} or DDC{example_flag_123456}).",
        );
    };

    if !body.contains('}') {
        // Counted in UTF-16 code units, like the browser form the rule comes from.
        let len = body.encode_utf16().count();
        if !(FLAG_BODY_MIN..=FLAG_BODY_MAX).contains(&len) {
            return ValidationResult::invalid(format!(
                "Flag value format is invalid. Expected: Content inside braces must be 6-50 characters long. Current length: {len} characters. {FLAG_EXAMPLE}"
            ));
        }
        if body.chars().all(is_flag_body_char) {
            return ValidationResult::ok();
        }
        return ValidationResult::invalid(format!(
            "Flag value format is invalid. Expected: Content inside braces can only contain letters (a-z, A-Z), numbers (0-9), hyphens (-), and underscores (_). {FLAG_EXAMPLE}"
        ));
    }

    ValidationResult::invalid(format!(
        "Flag value format is invalid. Expected: FIRE{{...}} or DDC{{...}} with 6-50 characters inside the braces. Characters allowed: letters (a-z, A-Z), numbers (0-9), hyphens (-), and underscores (_). {FLAG_EXAMPLE}"
    ))
}

fn dns_error(detail: &str) -> ValidationResult {
    ValidationResult::invalid(format!(
        "DNS name format is invalid. Expected: {detail}. Must end with '.cfire'. Example: service1.cfire"
    ))
}

/// Checks a DNS name below the `.cfire` TLD. The first failing rule wins.
pub fn validate_dns_name(dns_name: &str) -> ValidationResult {
    let trimmed = dns_name.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid("DNS name cannot be empty");
    }
    if !trimmed.ends_with(DNS_TLD) {
        return ValidationResult::invalid(
            "DNS name format is invalid. Expected: Must end with '.cfire' (e.g., service1.cfire). The TLD must always be '.cfire'.",
        );
    }
    if trimmed.len() < DNS_TLD.len() + 1 {
        return ValidationResult::invalid(
            "DNS name format is invalid. Expected: At least 1 character before '.cfire' (minimum 7 characters total). Example: service1.cfire",
        );
    }

    let hostname = &trimmed[..trimmed.len() - DNS_TLD.len()];
    if !hostname.chars().all(is_hostname_char) {
        return ValidationResult::invalid(
            "DNS name format is invalid. Expected: Only lowercase letters (a-z), numbers (0-9), dots (.), and hyphens (-) are allowed. Must end with '.cfire'. Example: service1.cfire",
        );
    }
    if hostname.starts_with(['-', '.']) || hostname.ends_with(['-', '.']) {
        return dns_error("Cannot start or end with a hyphen (-) or dot (.)");
    }
    if hostname.contains("..") {
        return dns_error("Cannot contain consecutive dots (..)");
    }
    for label in hostname.split('.') {
        if label.is_empty() {
            return dns_error("Cannot have empty parts between dots");
        }
        if label.len() > DNS_LABEL_MAX {
            return dns_error("Each part (between dots) must be 63 characters or less");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return dns_error("Each part cannot start or end with a hyphen (-)");
        }
    }
    ValidationResult::ok()
}
