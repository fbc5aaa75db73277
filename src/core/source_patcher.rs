//! Patches assembly attributes declared in C#, Visual Basic and C++/CLI source
//! files (`AssemblyInfo.cs` and friends).

use crate::domain::metadata::{AttributeKind, MetadataAttribute};
use crate::domain::model::{AttributeChange, PatchOutcome, PatchRequest};
use crate::domain::ports::FilePatcher;
use crate::domain::version::{has_keep_marker, VersionNumber};
use crate::utils::error::{AssemblyInfoError, Result};
use regex::{Captures, Regex, RegexBuilder};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    CSharp,
    VisualBasic,
    CppCli,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    System,
    Reflection,
    InteropServices,
}

impl SourceLanguage {
    pub fn from_path(path: &str) -> Option<Self> {
        let extension = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "cs" => Some(SourceLanguage::CSharp),
            "vb" => Some(SourceLanguage::VisualBasic),
            "cpp" => Some(SourceLanguage::CppCli),
            _ => None,
        }
    }

    fn is_comment(self, line: &str) -> bool {
        let trimmed = line.trim_start();
        match self {
            SourceLanguage::VisualBasic => {
                trimmed.starts_with('\'') || trimmed.to_ascii_uppercase().starts_with("REM ")
            }
            SourceLanguage::CSharp | SourceLanguage::CppCli => {
                trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
            }
        }
    }

    fn string_pattern(self) -> &'static str {
        match self {
            SourceLanguage::VisualBasic => r#""(?:[^"]|"")*""#,
            SourceLanguage::CSharp | SourceLanguage::CppCli => r#""(?:[^"\\]|\\.)*""#,
        }
    }

    fn literal(self, kind: AttributeKind, value: &str) -> String {
        if kind.is_boolean() {
            let flag = value.eq_ignore_ascii_case("true");
            return match (self, flag) {
                (SourceLanguage::VisualBasic, true) => "True".to_string(),
                (SourceLanguage::VisualBasic, false) => "False".to_string(),
                (_, flag) => flag.to_string(),
            };
        }

        match self {
            SourceLanguage::VisualBasic => format!("\"{}\"", value.replace('"', "\"\"")),
            SourceLanguage::CSharp | SourceLanguage::CppCli => {
                format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
            }
        }
    }

    fn unquote(self, raw: &str) -> String {
        let inner = raw
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(raw);
        match self {
            SourceLanguage::VisualBasic => inner.replace("\"\"", "\""),
            SourceLanguage::CSharp | SourceLanguage::CppCli => {
                inner.replace("\\\"", "\"").replace("\\\\", "\\")
            }
        }
    }

    fn declaration(self, name: &str, literal: &str) -> String {
        match self {
            SourceLanguage::CSharp => format!("[assembly: {}({})]", name, literal),
            SourceLanguage::VisualBasic => format!("<Assembly: {}({})>", name, literal),
            SourceLanguage::CppCli => format!("[assembly:{}({})];", name, literal),
        }
    }

    fn import(self, namespace: Namespace) -> &'static str {
        match (self, namespace) {
            (SourceLanguage::CSharp, Namespace::System) => "using System;",
            (SourceLanguage::CSharp, Namespace::Reflection) => "using System.Reflection;",
            (SourceLanguage::CSharp, Namespace::InteropServices) => "using System.Runtime.InteropServices;",
            (SourceLanguage::VisualBasic, Namespace::System) => "Imports System",
            (SourceLanguage::VisualBasic, Namespace::Reflection) => "Imports System.Reflection",
            (SourceLanguage::VisualBasic, Namespace::InteropServices) => {
                "Imports System.Runtime.InteropServices"
            }
            (SourceLanguage::CppCli, Namespace::System) => "using namespace System;",
            (SourceLanguage::CppCli, Namespace::Reflection) => "using namespace System::Reflection;",
            (SourceLanguage::CppCli, Namespace::InteropServices) => {
                "using namespace System::Runtime::InteropServices;"
            }
        }
    }
}

fn namespace_of(kind: AttributeKind) -> Namespace {
    match kind {
        AttributeKind::ComVisible => Namespace::InteropServices,
        AttributeKind::ClsCompliant => Namespace::System,
        _ => Namespace::Reflection,
    }
}

fn build_regex(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| AssemblyInfoError::ProcessingError {
            message: format!("Invalid attribute pattern: {}", e),
        })
}

fn line_ending(content: &str) -> &'static str {
    if content.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Regexes locating one attribute in one language.
struct AttributeMatcher {
    language: SourceLanguage,
    // 只判斷是否存在，不在乎參數格式
    declared: Regex,
    // 擷取前綴、屬性名稱與參數
    with_value: Regex,
}

impl AttributeMatcher {
    fn new(language: SourceLanguage, kind: AttributeKind) -> Result<Self> {
        let name = regex::escape(kind.attribute_name());
        let prefix = r"([\[<]\s*assembly\s*:\s*)";
        let qualified = format!(r"((?:\w+(?:\.|::))*{}(?:Attribute)?)", name);
        let argument = if kind.is_boolean() {
            r"\w+".to_string()
        } else {
            language.string_pattern().to_string()
        };

        Ok(Self {
            language,
            declared: build_regex(&format!(r"{}{}\s*\(", prefix, qualified))?,
            with_value: build_regex(&format!(r"{}{}\s*\(\s*({})\s*\)", prefix, qualified, argument))?,
        })
    }

    fn code_lines<'a>(&'a self, content: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        content
            .split_inclusive('\n')
            .filter(move |line| !self.language.is_comment(line))
    }

    fn is_declared(&self, content: &str) -> bool {
        self.code_lines(content).any(|line| self.declared.is_match(line))
    }

    fn current_value(&self, content: &str) -> Option<String> {
        self.code_lines(content)
            .find_map(|line| self.with_value.captures(line))
            .map(|caps| self.language.unquote(&caps[3]))
    }

    /// Rewrites the argument of every uncommented declaration; returns the hit count.
    fn replace(&self, content: &str, literal: &str) -> (String, usize) {
        let mut hits = 0;
        let mut out = String::with_capacity(content.len() + literal.len());

        for line in content.split_inclusive('\n') {
            if self.language.is_comment(line) || !self.with_value.is_match(line) {
                out.push_str(line);
                continue;
            }
            let replaced = self.with_value.replace_all(line, |caps: &Captures| {
                hits += 1;
                format!("{}{}({})", &caps[1], &caps[2], literal)
            });
            out.push_str(&replaced);
        }

        (out, hits)
    }
}

fn has_import(content: &str, import: &str) -> bool {
    let wanted = import.trim_end_matches(';');
    content
        .lines()
        .map(|line| line.trim().trim_end_matches(';').trim())
        .any(|line| line.eq_ignore_ascii_case(wanted))
}

/// Resolves keep markers in version attributes against the value in the file.
fn effective_value(attribute: &MetadataAttribute, request: &PatchRequest<'_>, current: Option<&str>) -> String {
    let template = match attribute.kind {
        AttributeKind::Version => request.assembly.version(),
        AttributeKind::FileVersion => request.assembly.file_version(),
        _ => None,
    };

    match template {
        Some(version) if version.has_keep_markers() => {
            let existing = current.and_then(|c| VersionNumber::parse_field(attribute.kind.field_name(), c).ok());
            version.merge_existing(existing.as_ref()).to_string()
        }
        _ => attribute.value.clone(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceAttributePatcher;

impl SourceAttributePatcher {
    pub fn new() -> Self {
        Self
    }
}

impl FilePatcher for SourceAttributePatcher {
    fn name(&self) -> &'static str {
        "source attributes"
    }

    fn supports(&self, path: &str) -> bool {
        SourceLanguage::from_path(path).is_some()
    }

    fn patch(&self, path: &str, content: &str, request: &PatchRequest<'_>) -> Result<PatchOutcome> {
        let Some(language) = SourceLanguage::from_path(path) else {
            return Ok(PatchOutcome::Skipped {
                reason: "File is not .cs, .vb or .cpp".to_string(),
            });
        };

        let newline = line_ending(content);
        let mut content = content.to_string();
        let mut changes = Vec::new();
        let mut pending = Vec::new();

        for attribute in request.assembly.attributes() {
            if attribute.kind == AttributeKind::InformationalVersion && has_keep_marker(&attribute.value) {
                tracing::warn!("{} cannot keep parts of an informational version, skipping", attribute.value);
                continue;
            }

            let matcher = AttributeMatcher::new(language, attribute.kind)?;
            let name = attribute.kind.attribute_name();
            let current = matcher.current_value(&content);
            let value = effective_value(&attribute, request, current.as_deref());
            let literal = language.literal(attribute.kind, &value);

            if matcher.is_declared(&content) {
                let (updated, hits) = matcher.replace(&content, &literal);
                if hits == 0 {
                    tracing::warn!("{} in {} has a non-literal value, left unchanged", name, path);
                    continue;
                }
                content = updated;
                tracing::info!("{} --> {}", name, value);
                changes.push(AttributeChange {
                    name: name.to_string(),
                    value,
                    inserted: false,
                });
            } else if request.insert_attributes {
                pending.push((attribute.kind, value, literal));
            } else {
                tracing::debug!("{} not present in {}, skipping", name, path);
            }
        }

        if !pending.is_empty() {
            let mut imports: Vec<&str> = Vec::new();
            for (kind, _, _) in &pending {
                let import = language.import(namespace_of(*kind));
                if !imports.contains(&import) && !has_import(&content, import) {
                    imports.push(import);
                }
            }
            if !imports.is_empty() {
                for import in &imports {
                    tracing::info!("Adding --> {}", import);
                }
                content = format!("{}{}{}", imports.join(newline), newline, content);
            }

            if !content.is_empty() && !content.ends_with('\n') {
                content.push_str(newline);
            }
            for (kind, value, literal) in pending {
                let name = kind.attribute_name();
                tracing::info!("Adding --> {}", name);
                content.push_str(&language.declaration(name, &literal));
                content.push_str(newline);
                changes.push(AttributeChange {
                    name: name.to_string(),
                    value,
                    inserted: true,
                });
            }
        }

        Ok(PatchOutcome::Patched { content, changes })
    }
}
