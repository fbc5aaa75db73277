//! Value transforms applied before the descriptor is built: `$(date:FORMAT)`
//! expansion and wildcard resolution.

use crate::domain::metadata::AssemblyMetadata;
use crate::domain::model::{MetadataInput, PreparedMetadata};
use crate::domain::package::PackageMetadata;
use crate::domain::version::{replace_wildcards, VersionNumber, VersionStamp};
use crate::utils::error::Result;
use chrono::{DateTime, TimeZone};
use regex::{Captures, Regex};
use std::fmt;
use std::sync::OnceLock;

fn date_token() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\$\(date:([^)]*)\)").expect("static date token regex"))
}

// 由長到短排列，確保 "MMMM" 先於 "MM" 被比對
const MOMENT_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("A", "%p"),
    ("a", "%P"),
];

/// Translates a moment-style date format (`DD.MM.YYYY HH:mm a`) into a chrono
/// strftime string. Characters that are not tokens are kept literally.
pub fn moment_to_strftime(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut rest = format;

    'outer: while !rest.is_empty() {
        for (token, spec) in MOMENT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = tail;
                continue 'outer;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '%' {
                out.push_str("%%");
            } else {
                out.push(c);
            }
        }
        rest = chars.as_str();
    }

    out
}

/// Replaces every `$(date:FORMAT)` token in `value` with `now` rendered in FORMAT.
pub fn expand_date_tokens<Tz>(value: &str, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    date_token()
        .replace_all(value, |caps: &Captures| {
            now.format(&moment_to_strftime(&caps[1])).to_string()
        })
        .into_owned()
}

fn clean(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Expands dates, resolves wildcards and validates the raw input.
pub fn prepare<Tz>(input: &MetadataInput, now: &DateTime<Tz>) -> Result<PreparedMetadata>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let stamp = VersionStamp::at(now.naive_local());
    tracing::debug!("Version stamp: build {}, revision {}", stamp.build, stamp.revision);

    let text = |value: &Option<String>| clean(value).map(|v| expand_date_tokens(v, now));
    let stamped = |value: &Option<String>| text(value).map(|v| replace_wildcards(&v, &stamp));

    let mut builder = AssemblyMetadata::builder();

    if let Some(v) = text(&input.title) {
        builder = builder.title(v);
    }
    if let Some(v) = text(&input.configuration) {
        builder = builder.configuration(v);
    }
    if let Some(v) = text(&input.product) {
        builder = builder.product(v);
    }
    if let Some(v) = text(&input.copyright) {
        builder = builder.copyright(v);
    }
    if let Some(v) = text(&input.culture) {
        builder = builder.culture(v);
    }
    if let Some(v) = text(&input.company) {
        builder = builder.company(v);
    }
    if let Some(v) = text(&input.trademark) {
        builder = builder.trademark(v);
    }
    if let Some(v) = text(&input.description) {
        builder = builder.description(v);
    }
    if let Some(v) = stamped(&input.informational_version) {
        builder = builder.informational_version(v);
    }
    if let Some(v) = text(&input.version) {
        let version = VersionNumber::extract("version", &v)?.resolve_wildcards(&stamp);
        builder = builder.version(version.to_string());
    }
    if let Some(v) = text(&input.file_version) {
        let version = VersionNumber::extract("file_version", &v)?.resolve_wildcards(&stamp);
        builder = builder.file_version(version.to_string());
    }
    if let Some(flag) = input.com_visible {
        builder = builder.com_visible(flag);
    }
    if let Some(flag) = input.cls_compliant {
        builder = builder.cls_compliant(flag);
    }

    let assembly = builder.build()?;

    let package = PackageMetadata {
        package_id: text(&input.package_id),
        package_version: stamped(&input.package_version),
        authors: text(&input.authors),
        license_url: text(&input.license_url),
        project_url: text(&input.project_url),
        icon_url: text(&input.icon_url),
        repository_url: text(&input.repository_url),
        repository_type: text(&input.repository_type),
        tags: text(&input.tags),
        release_notes: text(&input.release_notes),
        generate_package_on_build: input.generate_package_on_build,
        require_license_acceptance: input.require_license_acceptance,
        generate_documentation_file: input.generate_documentation_file,
    };

    Ok(PreparedMetadata {
        assembly,
        package,
        build_number: stamped(&input.build_number),
        build_tag: stamped(&input.build_tag),
    })
}
