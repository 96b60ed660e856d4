// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};

pub mod collection;
pub mod field;

pub use collection::validate_collection;

/// Outcome of a validator. Validators never fail hard, they report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.valid {
            Ok(())
        } else {
            Err(self.error.unwrap_or_default())
        }
    }
}

/// The single-value fields that have a format rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Tag,
    FlagTag,
    FlagStatic,
    DnsName,
}

impl std::str::FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(FieldKind::Name),
            "tag" => Ok(FieldKind::Tag),
            "flag-tag" => Ok(FieldKind::FlagTag),
            "flag-static" => Ok(FieldKind::FlagStatic),
            "dns-name" | "dns" => Ok(FieldKind::DnsName),
            other => Err(format!(
                "Unknown field kind {other}, expected one of: name, tag, flag-tag, flag-static, dns-name"
            )),
        }
    }
}

pub fn validate_field(kind: FieldKind, raw: &str) -> ValidationResult {
    match kind {
        FieldKind::Name => field::validate_challenge_name(raw),
        FieldKind::Tag => field::validate_tag(raw),
        FieldKind::FlagTag => field::validate_flag_tag(raw),
        FieldKind::FlagStatic => field::validate_flag_static(raw),
        FieldKind::DnsName => field::validate_dns_name(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serialization() {
        assert_eq!(
            serde_json::to_string(&ValidationResult::ok()).unwrap(),
            r#"{"valid":true}"#
        );
        assert_eq!(
            serde_json::to_string(&ValidationResult::invalid("nope")).unwrap(),
            r#"{"valid":false,"error":"nope"}"#
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationResult::ok().into_result(), Ok(()));
        assert_eq!(
            ValidationResult::invalid("bad").into_result(),
            Err("bad".to_string())
        );
    }

    #[test]
    fn test_field_kind_parsing() {
        assert_eq!("flag-static".parse::<FieldKind>(), Ok(FieldKind::FlagStatic));
        assert_eq!("dns".parse::<FieldKind>(), Ok(FieldKind::DnsName));
        assert!("flag".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_validate_field_dispatch() {
        assert!(validate_field(FieldKind::Name, "My Challenge").is_valid());
        assert!(!validate_field(FieldKind::Tag, "My Challenge").is_valid());
        assert!(validate_field(FieldKind::FlagStatic, "FIRE{abcdef}").is_valid());
        assert!(validate_field(FieldKind::DnsName, "a.cfire").is_valid());
        assert!(validate_field(FieldKind::FlagTag, "flag-1").is_valid());
    }
}
