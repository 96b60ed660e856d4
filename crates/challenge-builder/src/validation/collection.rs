// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashSet;

use crate::form::{ChallengeForm, DUMMY_IMAGE, strip_registry_prefix};

use super::ValidationResult;

/// Records `value`, returning it back if it was already seen.
fn check_seen<'a>(seen: &mut HashSet<&'a str>, value: &'a str) -> Option<&'a str> {
    if seen.insert(value) { None } else { Some(value) }
}

fn duplicate_images(form: &ChallengeForm) -> Vec<String> {
    let mut seen = HashSet::new();
    form.instances
        .iter()
        .map(|i| strip_registry_prefix(i.image.trim()))
        .filter(|image| !image.is_empty() && *image != DUMMY_IMAGE)
        .filter_map(|image| check_seen(&mut seen, image))
        .map(|image| format!("Duplicate image found: \"{image}\" is used in multiple services"))
        .collect()
}

fn duplicate_flag_tags(form: &ChallengeForm) -> Vec<String> {
    let mut seen = HashSet::new();
    form.flags
        .iter()
        .map(|f| f.tag.trim())
        .filter(|tag| !tag.is_empty())
        .filter_map(|tag| check_seen(&mut seen, tag))
        .map(|tag| format!("Duplicate flag tag found: \"{tag}\" is used in multiple flags"))
        .collect()
}

fn duplicate_dns_names(form: &ChallengeForm) -> Vec<String> {
    if form.is_static {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    form.instances
        .iter()
        .flat_map(|i| i.dns.iter())
        .map(|record| record.name.trim())
        .filter(|name| !name.is_empty())
        .filter_map(|name| check_seen(&mut seen, name))
        .map(|name| format!("Duplicate DNS name found: \"{name}\" is used in multiple services"))
        .collect()
}

/// Looks for identifiers that must be unique across the whole form.
///
/// Unlike the field validators, this does not stop at the first problem:
/// every conflict found is reported, one per line.
pub fn validate_collection(form: &ChallengeForm) -> ValidationResult {
    let errors: Vec<String> = duplicate_images(form)
        .into_iter()
        .chain(duplicate_flag_tags(form))
        .chain(duplicate_dns_names(form))
        .collect();
    if errors.is_empty() {
        ValidationResult::ok()
    } else {
        ValidationResult::invalid(errors.join("\n"))
    }
}
