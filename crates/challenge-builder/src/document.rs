// SPDX-FileCopyrightText: 2026 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::{Category, full_tag};
use crate::form::{
    ChallengeForm, DUMMY_IMAGE, Flag, REGISTRY_PREFIX, RecordType, challenge_slug,
    strip_control_chars,
};

#[derive(Error, Debug)]
#[error("Failed to generate YAML: {0}")]
pub struct GenerationError(#[from] serde_yaml::Error);

/// The generated `challenge.yml`. Field order is the output key order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChallengeDocument {
    pub name: String,
    pub tag: String,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub secret: bool,
    /// Challenge description in Markdown format
    pub od: String,
    pub instance: Vec<InstanceEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InstanceEntry {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<Vec<DnsEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<FlagEntry>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DnsEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FlagEntry {
    pub tag: String,
    pub name: String,
    #[serde(rename = "static")]
    pub value: String,
    pub points: u32,
    pub category: Category,
    /// Flag description in Markdown format
    pub td: String,
}

impl From<&Flag> for FlagEntry {
    fn from(flag: &Flag) -> Self {
        Self {
            tag: strip_control_chars(flag.tag.trim()),
            name: strip_control_chars(&flag.name),
            value: strip_control_chars(&flag.static_value),
            points: flag.points,
            category: flag.category,
            td: strip_control_chars(&flag.description),
        }
    }
}

impl ChallengeDocument {
    pub fn from_form(form: &ChallengeForm) -> Self {
        let slug = challenge_slug(&form.name);
        let mut instance: Vec<InstanceEntry> = form
            .instances
            .iter()
            .enumerate()
            .map(|(idx, svc)| {
                if form.is_static {
                    return InstanceEntry {
                        image: DUMMY_IMAGE.to_string(),
                        dns: None,
                        flags: None,
                    };
                }
                let mut image = strip_control_chars(svc.image.trim());
                if image.is_empty() {
                    image = format!("{}:service{}", slug, idx + 1);
                }
                // At most one record per service is emitted.
                let dns = svc
                    .dns
                    .first()
                    .map(|record| strip_control_chars(record.name.trim()))
                    .filter(|name| !name.is_empty())
                    .map(|name| {
                        vec![DnsEntry {
                            name,
                            record_type: RecordType::A,
                        }]
                    });
                InstanceEntry {
                    image: format!("{REGISTRY_PREFIX}{image}"),
                    dns,
                    flags: None,
                }
            })
            .collect();

        if !form.flags.is_empty() {
            let flags = form.flags.iter().map(FlagEntry::from).collect();
            match instance.last_mut() {
                Some(last) => last.flags = Some(flags),
                None => instance.push(InstanceEntry {
                    image: if form.is_static {
                        DUMMY_IMAGE.to_string()
                    } else {
                        format!("{REGISTRY_PREFIX}{slug}:service1")
                    },
                    dns: None,
                    flags: Some(flags),
                }),
            }
        }

        Self {
            name: strip_control_chars(&form.name),
            tag: strip_control_chars(&full_tag(form.category, &form.tag)),
            is_static: form.is_static,
            secret: true,
            od: strip_control_chars(&form.description),
            instance,
        }
    }
}

const KEEP_NEWLINE_KEYS: [&str; 2] = ["od", "td"];

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Splits `line` into its key and the text after `key:`, skipping any
/// leading indentation and `- ` sequence markers.
fn split_key(line: &str) -> Option<(&str, &str)> {
    let mut rest = line.trim_start_matches(' ');
    while let Some(stripped) = rest.strip_prefix("- ") {
        rest = stripped.trim_start_matches(' ');
    }
    let (key, value) = rest.split_once(':')?;
    Some((key, value))
}

/// Turns a single-quoted scalar into its double-quoted equivalent.
///
/// Returns `None` when `value` is not exactly one single-quoted scalar.
fn requote(value: &str) -> Option<String> {
    let inner = value.strip_prefix('\'')?.strip_suffix('\'')?;
    let unescaped = inner.replace("''", "'");
    if unescaped.matches('\'').count() * 2 != inner.matches('\'').count() {
        return None;
    }
    Some(format!(
        "\"{}\"",
        unescaped.replace('\\', "\\\\").replace('"', "\\\"")
    ))
}

/// Post-processes serialized YAML.
///
/// `|-` literal block headers of `od` and `td` become plain `|`, so their
/// content keeps its final newline. Single-quoted scalars are rewritten with
/// double quotes. Block contents are left untouched.
pub fn postprocess_yaml(yaml: &str) -> String {
    let mut out = String::with_capacity(yaml.len());
    // Indentation of the key owning the block scalar we are inside of
    let mut block_owner: Option<usize> = None;
    for line in yaml.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if let Some(owner) = block_owner {
            if content.trim().is_empty() || indent_of(content) > owner {
                out.push_str(line);
                continue;
            }
            block_owner = None;
        }
        let Some((key, value)) = split_key(content) else {
            out.push_str(line);
            continue;
        };
        let head = &content[..content.len() - value.len()];
        let header = value.trim();
        if header.starts_with('|') || header.starts_with('>') {
            block_owner = Some(indent_of(content));
        }
        let is_strip_literal = header.starts_with('|')
            && header.ends_with('-')
            && header[1..header.len() - 1].chars().all(|c| c.is_ascii_digit());
        let rewritten = if KEEP_NEWLINE_KEYS.contains(&key) && is_strip_literal {
            Some(header[..header.len() - 1].to_string())
        } else {
            requote(header)
        };
        match rewritten {
            Some(header) => {
                out.push_str(head);
                out.push(' ');
                out.push_str(&header);
                out.push_str(&line[content.len()..]);
            }
            None => out.push_str(line),
        }
    }
    out
}

const PLACEHOLDER_PREFIX: &str = "literal-block-";

/// Normalizes line breaks so the text survives a round trip through a literal block.
fn literal_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace(['\r', '\u{85}', '\u{2028}', '\u{2029}'], "\n")
        .replace('\u{feff}', "")
}

/// Renders `text` as a literal block scalar whose content sits at `indent + 2`.
///
/// The result starts with the block header and ends with a line break. Text
/// without a final newline gains one, as the header never strips it.
fn render_literal(text: &str, indent: usize) -> String {
    let text = literal_text(text);
    if text.is_empty() {
        return "\"\"\n".to_string();
    }
    let body = text.trim_end_matches('\n');
    let trailing = text.len() - body.len();
    let mut out = String::from("|");
    if body
        .split('\n')
        .find(|l| !l.is_empty())
        .is_some_and(|l| l.starts_with(' '))
    {
        out.push('2');
    }
    if trailing > 1 || body.is_empty() {
        out.push('+');
    }
    out.push('\n');
    let pad = " ".repeat(indent + 2);
    for line in body.split('\n') {
        if !line.is_empty() {
            out.push_str(&pad);
            out.push_str(line);
        }
        out.push('\n');
    }
    for _ in 1..trailing {
        out.push('\n');
    }
    out
}

/// Replaces the `od`/`td` placeholder values with their literal blocks.
fn expand_literal_blocks(yaml: &str, blocks: &[String]) -> String {
    let mut out = String::with_capacity(yaml.len());
    for line in yaml.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let block = split_key(content)
            .filter(|(key, _)| KEEP_NEWLINE_KEYS.contains(key))
            .and_then(|(key, value)| {
                let idx: usize = value.trim().strip_prefix(PLACEHOLDER_PREFIX)?.parse().ok()?;
                Some((key, value, blocks.get(idx)?))
            });
        match block {
            Some((key, value, text)) => {
                let key_end = content.len() - value.len();
                let column = key_end - key.len() - 1;
                out.push_str(&content[..key_end]);
                out.push(' ');
                out.push_str(&render_literal(text, column));
            }
            None => out.push_str(line),
        }
    }
    out
}

pub fn generate_document(form: &ChallengeForm) -> Result<String, GenerationError> {
    let document = ChallengeDocument::from_form(form);
    // Long texts are swapped for placeholders, the serializer would pick a
    // quoted style for some of them.
    let mut blocks = Vec::new();
    let mut placeholder = |text: &str| {
        blocks.push(text.to_string());
        format!("{PLACEHOLDER_PREFIX}{}", blocks.len() - 1)
    };
    let mut shell = document.clone();
    shell.od = placeholder(&document.od);
    for flag in shell.instance.iter_mut().flat_map(|i| i.flags.iter_mut().flatten()) {
        flag.td = placeholder(&flag.td);
    }
    let yaml = postprocess_yaml(&serde_yaml::to_string(&shell)?);
    tracing::debug!(
        "Generated document for {} with {} instance(s)",
        document.tag,
        document.instance.len()
    );
    Ok(expand_literal_blocks(&yaml, &blocks))
}
