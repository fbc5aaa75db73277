use crate::domain::metadata::InvalidMetadataValue;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Locale tag an assembly targets. The empty tag means culture-neutral.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Culture(String);

fn locale_tag() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{2,3}(?:-[A-Za-z0-9]{2,8})*$").expect("static culture regex")
    })
}

impl Culture {
    pub fn neutral() -> Self {
        Self(String::new())
    }

    pub fn parse(value: &str) -> Result<Self, InvalidMetadataValue> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(Self::neutral());
        }
        if !locale_tag().is_match(trimmed) {
            return Err(InvalidMetadataValue::new(
                "culture",
                value,
                "expected a locale tag such as 'en' or 'en-GB'",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn is_neutral(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Culture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Culture {
    type Err = InvalidMetadataValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Culture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Culture {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
