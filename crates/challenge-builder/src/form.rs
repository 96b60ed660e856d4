// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Registry all non-static challenge images are pulled from.
pub const REGISTRY_PREFIX: &str = "ghcr.io/campfire-security/";
/// Placeholder image used by static challenges.
pub const DUMMY_IMAGE: &str = "dummy";
/// Every DNS record must live below this TLD.
pub const DNS_TLD: &str = ".cfire";
pub const DEFAULT_POINTS: u32 = 20;
/// Image slug used when the challenge name yields nothing usable.
pub const DEFAULT_SLUG: &str = "challenge-template";

/// Canonical, sanitized form data for one generation pass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ChallengeForm {
    pub name: String,
    pub category: Category,
    /// Tag as entered, with or without a category prefix
    pub tag: String,
    pub is_static: bool,
    /// Description in Markdown format
    pub description: String,
    pub instances: Vec<ServiceInstance>,
    pub flags: Vec<Flag>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ServiceInstance {
    /// Image without the registry prefix
    pub image: String,
    #[serde(default)]
    pub dns: Vec<DnsRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordType {
    #[default]
    A,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DnsRecord {
    pub name: String,
    #[serde(rename = "type", default)]
    pub record_type: RecordType,
}

impl DnsRecord {
    pub fn a(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: RecordType::A,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Flag {
    pub tag: String,
    pub name: String,
    /// The flag itself, `FIRE{...}` or `DDC{...}`
    pub static_value: String,
    pub points: u32,
    pub category: Category,
    /// Description in Markdown format
    pub description: String,
}

impl Default for Flag {
    fn default() -> Self {
        Self {
            tag: String::new(),
            name: String::new(),
            static_value: String::new(),
            points: DEFAULT_POINTS,
            category: Category::default(),
            description: String::new(),
        }
    }
}

/// Removes control characters except tab, line feed and carriage return.
pub fn strip_control_chars(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\x00'..='\x08' | '\x0B' | '\x0C' | '\x0E'..='\x1F' | '\x7F'))
        .collect()
}

pub fn strip_registry_prefix(image: &str) -> &str {
    image.strip_prefix(REGISTRY_PREFIX).unwrap_or(image)
}

/// Derives the image slug from a challenge name.
///
/// Characters outside `[a-z0-9-_]` are dropped before whitespace runs are
/// collapsed, so spaces disappear rather than turning into hyphens.
pub fn challenge_slug(name: &str) -> String {
    let filtered: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_')
        .collect();
    let slug = filtered.split_whitespace().collect::<Vec<_>>().join("-");
    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}
