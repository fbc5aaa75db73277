//! Assembly version numbers.
//!
//! A version has two to four dot separated parts (`major.minor[.build[.revision]]`).
//! Each part is a 16-bit number, a `*` wildcard that a build stamp fills in, or a
//! `#` keep marker that takes the value already present in the file being updated.

use crate::domain::metadata::InvalidMetadataValue;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionPart {
    Number(u16),
    Wildcard,
    Keep,
}

impl fmt::Display for VersionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionPart::Number(n) => write!(f, "{}", n),
            VersionPart::Wildcard => f.write_str("*"),
            VersionPart::Keep => f.write_str("#"),
        }
    }
}

/// Build and revision numbers generated for wildcard version parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionStamp {
    /// Whole days since 2000-01-01, rounded up.
    pub build: u16,
    /// Seconds since midnight divided by two, rounded up.
    pub revision: u16,
}

impl VersionStamp {
    pub fn at(now: NaiveDateTime) -> Self {
        let epoch = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();

        let elapsed = (now - epoch).num_seconds().max(0);
        let days = (elapsed + 86_399) / 86_400;

        let since_midnight = i64::from(now.num_seconds_from_midnight());
        let half_seconds = (since_midnight + 1) / 2;

        Self {
            build: u16::try_from(days).unwrap_or(u16::MAX),
            revision: u16::try_from(half_seconds).unwrap_or(u16::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionNumber {
    parts: Vec<VersionPart>,
}

fn version_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"(?:\d+|#)\.(?:\d+|#)(?:\.(?:\d+|\*|#)){0,2}").expect("static version regex")
    })
}

impl VersionNumber {
    /// Parses `value`, reporting failures against `field`.
    pub fn parse_field(field: &str, value: &str) -> Result<Self, InvalidMetadataValue> {
        let trimmed = value.trim();
        let raw_parts: Vec<&str> = trimmed.split('.').collect();

        if !(2..=4).contains(&raw_parts.len()) {
            return Err(InvalidMetadataValue::new(
                field,
                value,
                "expected 2 to 4 dot separated parts",
            ));
        }

        let mut parts = Vec::with_capacity(raw_parts.len());
        for raw in raw_parts {
            let part = match raw {
                "*" => VersionPart::Wildcard,
                "#" => VersionPart::Keep,
                digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                    let n = digits.parse::<u16>().map_err(|_| {
                        InvalidMetadataValue::new(field, value, "version parts must be at most 65535")
                    })?;
                    VersionPart::Number(n)
                }
                _ => {
                    return Err(InvalidMetadataValue::new(
                        field,
                        value,
                        format!("'{}' is not a non-negative integer", raw),
                    ))
                }
            };
            parts.push(part);
        }

        if parts[..2].contains(&VersionPart::Wildcard) {
            return Err(InvalidMetadataValue::new(
                field,
                value,
                "only build and revision may be wildcards",
            ));
        }
        if parts.len() == 4 && parts[2] == VersionPart::Wildcard && parts[3] != VersionPart::Wildcard {
            return Err(InvalidMetadataValue::new(
                field,
                value,
                "a wildcard build must be followed by a wildcard revision",
            ));
        }

        Ok(Self { parts })
    }

    /// Finds the first version-looking token inside free text, e.g. `Nightly_2018.11.*`.
    pub fn extract(field: &str, text: &str) -> Result<Self, InvalidMetadataValue> {
        let token = version_token()
            .find(text)
            .ok_or_else(|| InvalidMetadataValue::new(field, text, "no version number found"))?;
        Self::parse_field(field, token.as_str())
    }

    pub fn parts(&self) -> &[VersionPart] {
        &self.parts
    }

    pub fn major(&self) -> VersionPart {
        self.parts[0]
    }

    pub fn minor(&self) -> VersionPart {
        self.parts[1]
    }

    pub fn build(&self) -> Option<VersionPart> {
        self.parts.get(2).copied()
    }

    pub fn revision(&self) -> Option<VersionPart> {
        self.parts.get(3).copied()
    }

    /// True when every part is a number.
    pub fn is_concrete(&self) -> bool {
        self.parts.iter().all(|p| matches!(p, VersionPart::Number(_)))
    }

    pub fn has_keep_markers(&self) -> bool {
        self.parts.contains(&VersionPart::Keep)
    }

    /// Replaces wildcard build/revision parts with the stamp's numbers.
    pub fn resolve_wildcards(&self, stamp: &VersionStamp) -> Self {
        let parts = self
            .parts
            .iter()
            .enumerate()
            .map(|(i, part)| match (i, part) {
                (2, VersionPart::Wildcard) => VersionPart::Number(stamp.build),
                (3, VersionPart::Wildcard) => VersionPart::Number(stamp.revision),
                (_, other) => *other,
            })
            .collect();
        Self { parts }
    }

    /// Replaces keep markers with the matching part of `existing`, or 0 when it has none.
    pub fn merge_existing(&self, existing: Option<&VersionNumber>) -> Self {
        let parts = self
            .parts
            .iter()
            .enumerate()
            .map(|(i, part)| match part {
                VersionPart::Keep => match existing.and_then(|v| v.parts.get(i)) {
                    Some(VersionPart::Number(n)) => VersionPart::Number(*n),
                    _ => VersionPart::Number(0),
                },
                other => *other,
            })
            .collect();
        Self { parts }
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

impl FromStr for VersionNumber {
    type Err = InvalidMetadataValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_field("version", s)
    }
}

impl Serialize for VersionNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Textual wildcard replacement for free-form version strings such as
/// informational or package versions: the first `.*.*` becomes
/// `.build.revision`, otherwise the first `.*` becomes `.build`.
pub fn replace_wildcards(value: &str, stamp: &VersionStamp) -> String {
    if value.contains(".*.*") {
        value.replacen(".*.*", &format!(".{}.{}", stamp.build, stamp.revision), 1)
    } else if value.contains(".*") {
        value.replacen(".*", &format!(".{}", stamp.build), 1)
    } else {
        value.to_string()
    }
}

/// True when `value` carries a `#` keep marker in any dotted segment.
pub fn has_keep_marker(value: &str) -> bool {
    value.split('.').any(|segment| segment.starts_with('#'))
}

/// Replaces `#` keep markers in a dotted free-form value with the leading
/// digits of the matching segment of `existing`.
pub fn merge_keep_markers(template: &str, existing: Option<&str>) -> String {
    if !has_keep_marker(template) {
        return template.to_string();
    }

    let existing_segments: Vec<&str> = existing.map(|e| e.split('.').collect()).unwrap_or_default();

    template
        .split('.')
        .enumerate()
        .map(|(i, segment)| match segment.strip_prefix('#') {
            Some(rest) => {
                let kept: String = existing_segments
                    .get(i)
                    .map(|s| s.chars().take_while(|c| c.is_ascii_digit()).collect())
                    .unwrap_or_default();
                let kept = if kept.is_empty() { "0".to_string() } else { kept };
                format!("{}{}", kept, rest)
            }
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}
