// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};

/// Challenge category, as shown on the platform.
///
/// Every category owns a short prefix that is prepended to challenge tags.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[serde(rename = "Starters")]
    Starters,
    #[serde(rename = "Forensics")]
    Forensics,
    #[default]
    #[serde(rename = "Web exploitation")]
    WebExploitation,
    #[serde(rename = "Cryptography")]
    Cryptography,
    #[serde(rename = "Boot 2 Root")]
    Boot2Root,
    #[serde(rename = "Reverse Engineering")]
    ReverseEngineering,
    #[serde(rename = "Binary (PWN)")]
    BinaryPwn,
    #[serde(rename = "Misc")]
    Misc,
    #[serde(rename = "Operational Technologies")]
    OperationalTechnologies,
}

impl Category {
    /// All categories, in the order their prefixes are tried when stripping.
    pub const ALL: [Category; 9] = [
        Category::Starters,
        Category::Forensics,
        Category::WebExploitation,
        Category::Cryptography,
        Category::Boot2Root,
        Category::ReverseEngineering,
        Category::BinaryPwn,
        Category::Misc,
        Category::OperationalTechnologies,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Starters => "Starters",
            Category::Forensics => "Forensics",
            Category::WebExploitation => "Web exploitation",
            Category::Cryptography => "Cryptography",
            Category::Boot2Root => "Boot 2 Root",
            Category::ReverseEngineering => "Reverse Engineering",
            Category::BinaryPwn => "Binary (PWN)",
            Category::Misc => "Misc",
            Category::OperationalTechnologies => "Operational Technologies",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Category::Starters => "st_",
            Category::Forensics => "fr_",
            Category::WebExploitation => "we_",
            Category::Cryptography => "cry_",
            Category::Boot2Root => "b2r_",
            Category::ReverseEngineering => "re_",
            Category::BinaryPwn => "bn_",
            Category::Misc => "mi_",
            Category::OperationalTechnologies => "ot_",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Builds the final challenge tag for `category`.
///
/// If `tag` already starts with any known category prefix, that prefix is
/// removed first, so re-submitting an already prefixed tag never doubles it.
pub fn full_tag(category: Category, tag: &str) -> String {
    let tag = tag.trim();
    let suffix = Category::ALL
        .iter()
        .find_map(|c| tag.strip_prefix(c.prefix()))
        .unwrap_or(tag);
    format!("{}{}", category.prefix(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
        assert_eq!(Category::from_label("web exploitation"), None);
    }

    #[test]
    fn test_prefixes_are_unique() {
        let mut prefixes: Vec<_> = Category::ALL.iter().map(|c| c.prefix()).collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), 9);
    }

    #[test]
    fn test_full_tag_applies_prefix() {
        assert_eq!(full_tag(Category::WebExploitation, "foo"), "we_foo");
        assert_eq!(full_tag(Category::Cryptography, "rsa-1"), "cry_rsa-1");
    }

    #[test]
    fn test_full_tag_does_not_double_prefix() {
        assert_eq!(full_tag(Category::WebExploitation, "we_foo"), "we_foo");
        assert_eq!(
            full_tag(Category::WebExploitation, "we_foo"),
            full_tag(Category::WebExploitation, "foo")
        );
    }

    #[test]
    fn test_full_tag_replaces_other_prefix() {
        assert_eq!(full_tag(Category::Forensics, "we_foo"), "fr_foo");
        // Only one prefix is stripped.
        assert_eq!(full_tag(Category::Misc, "st_we_foo"), "mi_we_foo");
    }

    #[test]
    fn test_serializes_with_label() {
        let yaml = serde_yaml::to_string(&Category::BinaryPwn).unwrap();
        assert_eq!(yaml.trim(), "Binary (PWN)");
        let parsed: Category = serde_yaml::from_str("Boot 2 Root").unwrap();
        assert_eq!(parsed, Category::Boot2Root);
    }
}
