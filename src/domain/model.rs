use crate::domain::metadata::AssemblyMetadata;
use crate::domain::package::{BoolOption, PackageMetadata};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum FileEncoding {
    /// Use whatever encoding the file already has.
    #[default]
    #[strum(to_string = "auto")]
    #[serde(rename = "auto")]
    Auto,
    #[strum(to_string = "utf-8", serialize = "utf8")]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[strum(to_string = "utf-16le", serialize = "utf16le", serialize = "ucs2", serialize = "ucs-2")]
    #[serde(rename = "utf-16le", alias = "utf16le")]
    Utf16Le,
    #[strum(to_string = "utf-16be", serialize = "utf16be")]
    #[serde(rename = "utf-16be", alias = "utf16be")]
    Utf16Be,
    #[strum(to_string = "iso-8859-1", serialize = "latin1", serialize = "windows-1252")]
    #[serde(rename = "iso-8859-1", alias = "latin1", alias = "windows-1252")]
    Latin1,
    #[strum(to_string = "ascii")]
    #[serde(rename = "ascii")]
    Ascii,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    #[default]
    Normal,
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `KEY=VALUE` lines.
    #[default]
    Plain,
    Json,
    /// Azure Pipelines logging commands.
    Azure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    pub insert_attributes: bool,
    pub file_encoding: FileEncoding,
    pub write_bom: bool,
    pub fail_on_warning: bool,
    pub log_level: LogLevel,
    pub output_format: OutputFormat,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            insert_attributes: false,
            file_encoding: FileEncoding::Auto,
            write_bom: false,
            fail_on_warning: false,
            log_level: LogLevel::Normal,
            output_format: OutputFormat::Plain,
        }
    }
}

/// Raw, untransformed values as supplied on the command line or in a TOML file.
/// They may still contain `$(date:...)` tokens, wildcards and keep markers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataInput {
    pub title: Option<String>,
    pub configuration: Option<String>,
    pub product: Option<String>,
    pub copyright: Option<String>,
    pub culture: Option<String>,
    pub version: Option<String>,
    pub file_version: Option<String>,
    pub informational_version: Option<String>,
    pub company: Option<String>,
    pub trademark: Option<String>,
    pub description: Option<String>,
    pub com_visible: Option<bool>,
    pub cls_compliant: Option<bool>,

    pub package_id: Option<String>,
    pub package_version: Option<String>,
    pub authors: Option<String>,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
    pub icon_url: Option<String>,
    pub repository_url: Option<String>,
    pub repository_type: Option<String>,
    pub tags: Option<String>,
    pub release_notes: Option<String>,
    pub generate_package_on_build: BoolOption,
    pub require_license_acceptance: BoolOption,
    pub generate_documentation_file: BoolOption,

    pub build_number: Option<String>,
    pub build_tag: Option<String>,
}

/// Values ready to be written: dates expanded, wildcards resolved, validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedMetadata {
    pub assembly: AssemblyMetadata,
    pub package: PackageMetadata,
    pub build_number: Option<String>,
    pub build_tag: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PatchRequest<'a> {
    pub assembly: &'a AssemblyMetadata,
    pub package: &'a PackageMetadata,
    pub insert_attributes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeChange {
    pub name: String,
    pub value: String,
    pub inserted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched {
        content: String,
        changes: Vec<AttributeChange>,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub encoding: String,
    pub changes: Vec<AttributeChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OutputVariables {
    pub version: Option<String>,
    pub file_version: Option<String>,
    pub informational_version: Option<String>,
    pub package_version: Option<String>,
    pub build_number: Option<String>,
    pub build_tag: Option<String>,
}

impl From<&PreparedMetadata> for OutputVariables {
    fn from(prepared: &PreparedMetadata) -> Self {
        Self {
            version: prepared.assembly.version().map(|v| v.to_string()),
            file_version: prepared.assembly.file_version().map(|v| v.to_string()),
            informational_version: prepared.assembly.informational_version().map(str::to_string),
            package_version: prepared.package.package_version.clone(),
            build_number: prepared.build_number.clone(),
            build_tag: prepared.build_tag.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    pub updated: Vec<FileReport>,
    pub skipped: Vec<String>,
    pub warnings: Vec<String>,
    /// Files whose update failed; the run carries on past them.
    pub failed: Vec<FileFailure>,
    pub outputs: OutputVariables,
}
