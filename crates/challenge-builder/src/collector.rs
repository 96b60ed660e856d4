// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::category::{Category, full_tag};
use crate::form::{
    ChallengeForm, DEFAULT_POINTS, DUMMY_IMAGE, DnsRecord, Flag, ServiceInstance,
    challenge_slug, strip_control_chars, strip_registry_prefix,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error(
        "Static challenges can only have one service (dummy). If this is not a static challenge, please uncheck the \"Static\" checkbox."
    )]
    StaticSingleService,
    #[error("Static challenges must have exactly one service (dummy). Cannot remove the last service.")]
    StaticLastService,
}

/// Hands out identifiers for new service cards and flag entries.
pub trait IdSequence {
    fn next_id(&mut self) -> u32;
}

/// Monotonically increasing sequence starting at 1.
#[derive(Debug, Default, Clone)]
pub struct Counter {
    last: u32,
}

impl IdSequence for Counter {
    fn next_id(&mut self) -> u32 {
        self.last += 1;
        self.last
    }
}

/// One service card as entered in the form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct InstanceCard {
    pub id: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub dns_name: String,
}

/// One flag entry as entered in the form. Points are kept as raw text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FlagCard {
    pub id: u32,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub static_value: String,
    #[serde(default = "default_points_text", deserialize_with = "points_text")]
    pub points: String,
    #[serde(default = "default_category_label")]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

fn default_points_text() -> String {
    DEFAULT_POINTS.to_string()
}

/// Accepts points written as a YAML number as well as free text.
fn points_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPoints {
        Integer(i64),
        Float(f64),
        Text(String),
    }
    Ok(match RawPoints::deserialize(deserializer)? {
        RawPoints::Integer(n) => n.to_string(),
        RawPoints::Float(n) => n.to_string(),
        RawPoints::Text(s) => s,
    })
}

fn default_category_label() -> String {
    Category::default().label().to_string()
}

/// Raw, unsanitized state of the challenge form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FormState {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_category_label")]
    pub category: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instances: Vec<InstanceCard>,
    #[serde(default)]
    pub flags: Vec<FlagCard>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: default_category_label(),
            tag: String::new(),
            is_static: false,
            description: String::new(),
            instances: Vec::new(),
            flags: Vec::new(),
        }
    }
}

fn sanitize(value: &str) -> String {
    strip_control_chars(value.trim())
}

fn parse_category(label: &str) -> Category {
    let label = strip_control_chars(label);
    Category::from_label(&label).unwrap_or_else(|| {
        tracing::warn!("Unknown category {label:?}, using {}", Category::default());
        Category::default()
    })
}

/// Parses a points value leniently.
///
/// Leading whitespace and an optional sign are accepted, and parsing stops at
/// the first non-digit. Anything without leading digits, negative, or too
/// large for `u32` yields the default of 20.
pub fn parse_points(raw: &str) -> u32 {
    let s = raw.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() || (negative && digits.bytes().any(|b| b != b'0')) {
        return DEFAULT_POINTS;
    }
    digits.parse().unwrap_or(DEFAULT_POINTS)
}

impl FormState {
    /// A fresh form with one service card, as shown when the page loads.
    pub fn initial(ids: &mut impl IdSequence) -> Self {
        let mut state = Self::default();
        // A fresh form is never static, so this cannot be rejected.
        let _ = state.add_instance(ids);
        state
    }

    fn slug(&self) -> String {
        challenge_slug(&sanitize(&self.name))
    }

    pub fn add_instance(&mut self, ids: &mut impl IdSequence) -> Result<u32, FormError> {
        if self.is_static && !self.instances.is_empty() {
            return Err(FormError::StaticSingleService);
        }
        let id = ids.next_id();
        let image = if self.is_static {
            DUMMY_IMAGE.to_string()
        } else {
            format!("{}:service{}", self.slug(), id)
        };
        self.instances.push(InstanceCard {
            id,
            image,
            dns_name: String::new(),
        });
        Ok(id)
    }

    pub fn remove_instance(&mut self, id: u32) -> Result<(), FormError> {
        if self.is_static && self.instances.len() <= 1 {
            return Err(FormError::StaticLastService);
        }
        self.instances.retain(|card| card.id != id);
        Ok(())
    }

    pub fn add_flag(&mut self, ids: &mut impl IdSequence) -> u32 {
        let id = ids.next_id();
        self.flags.push(FlagCard {
            id,
            tag: String::new(),
            name: String::new(),
            static_value: String::new(),
            points: default_points_text(),
            category: default_category_label(),
            description: String::new(),
        });
        id
    }

    pub fn remove_flag(&mut self, id: u32) {
        self.flags.retain(|flag| flag.id != id);
    }

    /// Switches between a static and a deployable challenge.
    ///
    /// Static keeps only the first service, as a `dummy` without DNS. Leaving
    /// static mode regenerates every image from the challenge name.
    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
        if is_static {
            self.instances.truncate(1);
            for card in &mut self.instances {
                card.image = DUMMY_IMAGE.to_string();
                card.dns_name.clear();
            }
        } else {
            let slug = self.slug();
            for (idx, card) in self.instances.iter_mut().enumerate() {
                card.image = format!("{}:service{}", slug, idx + 1);
            }
        }
    }

    /// Renames the challenge, refreshing images that were generated from the old name.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        if self.is_static {
            return;
        }
        let slug = self.slug();
        for (idx, card) in self.instances.iter_mut().enumerate() {
            if card.image.contains(":service") {
                card.image = format!("{}:service{}", slug, idx + 1);
            }
        }
    }

    pub fn tag_preview(&self) -> String {
        let tag = sanitize(&self.tag);
        if tag.is_empty() {
            return String::new();
        }
        format!("Full tag: {}", full_tag(parse_category(&self.category), &tag))
    }

    /// Reads the current state into a sanitized [`ChallengeForm`].
    pub fn collect(&self) -> ChallengeForm {
        let is_static = self.is_static;
        let instances = self
            .instances
            .iter()
            .map(|card| {
                let mut image = sanitize(&card.image);
                if !is_static {
                    image = strip_registry_prefix(&image).to_string();
                }
                let dns = if is_static {
                    Vec::new()
                } else {
                    Some(sanitize(&card.dns_name))
                        .filter(|name| !name.is_empty())
                        .map(DnsRecord::a)
                        .into_iter()
                        .collect()
                };
                ServiceInstance { image, dns }
            })
            .collect();
        let flags = self
            .flags
            .iter()
            .filter_map(|entry| {
                let tag = sanitize(&entry.tag);
                if tag.is_empty() {
                    tracing::debug!("Skipping flag entry {} without a tag", entry.id);
                    return None;
                }
                Some(Flag {
                    tag,
                    name: strip_control_chars(&entry.name),
                    static_value: strip_control_chars(&entry.static_value),
                    points: parse_points(&entry.points),
                    category: parse_category(&entry.category),
                    description: strip_control_chars(&entry.description),
                })
            })
            .collect();
        ChallengeForm {
            name: sanitize(&self.name),
            category: parse_category(&self.category),
            tag: sanitize(&self.tag),
            is_static,
            description: strip_control_chars(&self.description),
            instances,
            flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_monotonic() {
        let mut counter = Counter::default();
        assert_eq!(counter.next_id(), 1);
        assert_eq!(counter.next_id(), 2);
        assert_eq!(counter.next_id(), 3);
    }

    #[test]
    fn test_parse_points() {
        assert_eq!(parse_points("35"), 35);
        assert_eq!(parse_points("  12abc"), 12);
        assert_eq!(parse_points("12.9"), 12);
        assert_eq!(parse_points("+7"), 7);
        assert_eq!(parse_points("0"), 0);
        assert_eq!(parse_points("-0"), 0);
        assert_eq!(parse_points(""), 20);
        assert_eq!(parse_points("abc"), 20);
        assert_eq!(parse_points("-5"), 20);
        assert_eq!(parse_points("4294967295"), u32::MAX);
        assert_eq!(parse_points("99999999999"), 20);
        assert_eq!(parse_points("99999999999999999999abc"), 20);
    }

    #[test]
    fn test_initial_form_has_one_service() {
        let mut ids = Counter::default();
        let state = FormState::initial(&mut ids);
        assert_eq!(state.instances.len(), 1);
        assert_eq!(state.instances[0].image, "challenge-template:service1");
        assert!(state.flags.is_empty());
    }

    #[test]
    fn test_add_instance_uses_injected_ids() {
        let mut ids = Counter::default();
        let mut state = FormState {
            name: "Web".to_string(),
            ..Default::default()
        };
        assert_eq!(state.add_instance(&mut ids), Ok(1));
        assert_eq!(state.add_instance(&mut ids), Ok(2));
        state.remove_instance(1).unwrap();
        assert_eq!(state.add_instance(&mut ids), Ok(3));
        let images: Vec<_> = state.instances.iter().map(|c| c.image.as_str()).collect();
        assert_eq!(images, vec!["web:service2", "web:service3"]);
    }

    #[test]
    fn test_flags_can_be_removed() {
        let mut ids = Counter::default();
        let mut state = FormState::default();
        let first = state.add_flag(&mut ids);
        let second = state.add_flag(&mut ids);
        state.remove_flag(first);
        state.remove_flag(99);
        assert_eq!(state.flags.len(), 1);
        assert_eq!(state.flags[0].id, second);
        assert_eq!(state.flags[0].points, "20");
        assert_eq!(state.flags[0].category, "Web exploitation");
    }

    #[test]
    fn test_static_restrictions() {
        let mut ids = Counter::default();
        let mut state = FormState::initial(&mut ids);
        state.add_instance(&mut ids).unwrap();
        state.instances[0].dns_name = "web.cfire".to_string();
        state.set_static(true);
        assert_eq!(state.instances.len(), 1);
        assert_eq!(state.instances[0].image, "dummy");
        assert!(state.instances[0].dns_name.is_empty());
        assert_eq!(state.add_instance(&mut ids), Err(FormError::StaticSingleService));
        assert_eq!(state.remove_instance(1), Err(FormError::StaticLastService));
    }

    #[test]
    fn test_leaving_static_regenerates_images() {
        let mut ids = Counter::default();
        let mut state = FormState::initial(&mut ids);
        state.set_static(true);
        state.name = "pwn me".to_string();
        state.set_static(false);
        assert_eq!(state.instances[0].image, "pwnme:service1");
    }

    #[test]
    fn test_set_name_only_touches_generated_images() {
        let mut ids = Counter::default();
        let mut state = FormState::initial(&mut ids);
        state.add_instance(&mut ids).unwrap();
        state.instances[1].image = "custom:latest".to_string();
        state.set_name("Shop");
        assert_eq!(state.instances[0].image, "shop:service1");
        assert_eq!(state.instances[1].image, "custom:latest");
    }

    #[test]
    fn test_tag_preview() {
        let mut state = FormState::default();
        assert_eq!(state.tag_preview(), "");
        state.tag = "login".to_string();
        state.category = "Cryptography".to_string();
        assert_eq!(state.tag_preview(), "Full tag: cry_login");
        state.category = "Nonsense".to_string();
        assert_eq!(state.tag_preview(), "Full tag: we_login");
    }

    #[test]
    fn test_collect_sanitizes_and_normalizes() {
        let mut ids = Counter::default();
        let mut state = FormState::initial(&mut ids);
        state.name = "  Web\x07 Chall ".to_string();
        state.tag = " shop\x00 ".to_string();
        state.description = "Line one\n\tLine\x1b two\n".to_string();
        state.instances[0].image = " ghcr.io/campfire-security/shop:service1 ".to_string();
        state.instances[0].dns_name = " shop.cfire ".to_string();
        let flag_id = state.add_flag(&mut ids);
        state.flags[0].tag = " flag-1 ".to_string();
        state.flags[0].static_value = "FIRE{abcdef}".to_string();
        state.flags[0].points = "oops".to_string();
        state.add_flag(&mut ids);

        let form = state.collect();
        assert_eq!(flag_id, 2);
        assert_eq!(form.name, "Web Chall");
        assert_eq!(form.tag, "shop");
        assert_eq!(form.description, "Line one\n\tLine two\n");
        assert_eq!(form.instances[0].image, "shop:service1");
        assert_eq!(form.instances[0].dns, vec![DnsRecord::a("shop.cfire")]);
        // The entry without a tag is skipped.
        assert_eq!(form.flags.len(), 1);
        assert_eq!(form.flags[0].tag, "flag-1");
        assert_eq!(form.flags[0].points, 20);
        assert_eq!(form.flags[0].category, Category::WebExploitation);
    }

    #[test]
    fn test_collect_static_ignores_dns() {
        let state = FormState {
            is_static: true,
            instances: vec![InstanceCard {
                id: 1,
                image: "dummy".to_string(),
                dns_name: "web.cfire".to_string(),
            }],
            ..Default::default()
        };
        let form = state.collect();
        assert!(form.instances[0].dns.is_empty());
        assert_eq!(form.instances[0].image, "dummy");
    }

    #[test]
    fn test_empty_dns_is_not_collected() {
        let state = FormState {
            instances: vec![InstanceCard {
                id: 1,
                image: "web:service1".to_string(),
                dns_name: "   ".to_string(),
            }],
            ..Default::default()
        };
        assert!(state.collect().instances[0].dns.is_empty());
    }

    #[test]
    fn test_form_state_from_yaml() {
        let yaml = r#"
name: Web Chall
tag: shop
static: false
description: |
  Buy the flag.
instances:
  - id: 1
    image: shop:service1
    dns_name: shop.cfire
flags:
  - id: 2
    tag: flag-1
    name: Shop
    static_value: FIRE{abcdef}
"#;
        let state: FormState = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(state.category, "Web exploitation");
        assert_eq!(state.flags[0].points, "20");
        let form = state.collect();
        assert_eq!(form.description, "Buy the flag.\n");
        assert_eq!(form.flags[0].points, 20);
    }

    #[test]
    fn test_new_flag_card_defaults() {
        let mut ids = Counter::default();
        let mut state = FormState::default();
        let id = state.add_flag(&mut ids);
        let card: &FlagCard = &state.flags[0];
        assert_eq!(card.id, id);
        assert_eq!(card.points, "20");
        assert_eq!(card.category, "Web exploitation");
        assert!(card.tag.is_empty());
    }

    #[test]
    fn test_points_accept_numbers_and_text() {
        let yaml = r#"
flags:
  - id: 1
    points: 50
  - id: 2
    points: 12.5
  - id: 3
    points: "lots"
"#;
        let state: FormState = serde_yaml::from_str(yaml).unwrap();
        let points: Vec<_> = state.flags.iter().map(|f| parse_points(&f.points)).collect();
        assert_eq!(points, vec![50, 12, 20]);
    }
}
