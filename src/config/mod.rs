pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::{FileEncoding, LogLevel, MetadataInput, OutputFormat, ProcessingOptions};
use crate::domain::package::BoolOption;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_patterns, validate_package_urls, validate_path, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "assembly-info")]
#[command(about = "Stamps assembly and package metadata into .NET source and project files")]
pub struct CliConfig {
    /// Root directory searched for files to update
    #[arg(long, default_value = ".")]
    pub path: String,

    /// Glob patterns of the files to update; `!pattern` excludes
    #[arg(long, value_delimiter = ',', default_value = "**/AssemblyInfo.*")]
    pub file_names: Vec<String>,

    /// Add attributes or properties that are missing from a file
    #[arg(long)]
    pub insert_attributes: bool,

    #[arg(long, default_value = "auto")]
    pub file_encoding: FileEncoding,

    /// Write a byte order mark when the encoding has one
    #[arg(long)]
    pub write_bom: bool,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub product: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub copyright: Option<String>,

    #[arg(long)]
    pub trademark: Option<String>,

    #[arg(long)]
    pub configuration: Option<String>,

    /// Culture name such as `en-GB`; empty for neutral
    #[arg(long)]
    pub culture: Option<String>,

    /// Assembly version, e.g. `1.2.*` or `#.#.5`
    #[arg(long)]
    pub version: Option<String>,

    #[arg(long)]
    pub file_version: Option<String>,

    #[arg(long)]
    pub informational_version: Option<String>,

    #[arg(long)]
    pub com_visible: Option<bool>,

    #[arg(long)]
    pub cls_compliant: Option<bool>,

    #[arg(long)]
    pub package_id: Option<String>,

    #[arg(long)]
    pub package_version: Option<String>,

    #[arg(long)]
    pub authors: Option<String>,

    #[arg(long)]
    pub license_url: Option<String>,

    #[arg(long)]
    pub project_url: Option<String>,

    #[arg(long)]
    pub icon_url: Option<String>,

    #[arg(long)]
    pub repository_url: Option<String>,

    #[arg(long)]
    pub repository_type: Option<String>,

    #[arg(long)]
    pub tags: Option<String>,

    #[arg(long)]
    pub release_notes: Option<String>,

    #[arg(long, default_value = "ignore")]
    pub generate_package_on_build: BoolOption,

    #[arg(long, default_value = "ignore")]
    pub require_license_acceptance: BoolOption,

    #[arg(long, default_value = "ignore")]
    pub generate_documentation_file: BoolOption,

    /// Build number to publish, may contain `$(date:...)` and wildcards
    #[arg(long)]
    pub build_number: Option<String>,

    #[arg(long)]
    pub build_tag: Option<String>,

    /// Treat warnings as a failed run
    #[arg(long)]
    pub fail_on_warning: bool,

    #[arg(long, default_value = "normal")]
    pub log_level: LogLevel,

    #[arg(long, default_value = "plain")]
    pub output_format: OutputFormat,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn source_path(&self) -> &str {
        &self.path
    }

    fn file_patterns(&self) -> &[String] {
        &self.file_names
    }

    fn options(&self) -> ProcessingOptions {
        ProcessingOptions {
            insert_attributes: self.insert_attributes,
            file_encoding: self.file_encoding,
            write_bom: self.write_bom,
            fail_on_warning: self.fail_on_warning,
            log_level: if self.verbose { LogLevel::Verbose } else { self.log_level },
            output_format: self.output_format,
        }
    }

    fn metadata_input(&self) -> MetadataInput {
        MetadataInput {
            title: self.title.clone(),
            configuration: self.configuration.clone(),
            product: self.product.clone(),
            copyright: self.copyright.clone(),
            culture: self.culture.clone(),
            version: self.version.clone(),
            file_version: self.file_version.clone(),
            informational_version: self.informational_version.clone(),
            company: self.company.clone(),
            trademark: self.trademark.clone(),
            description: self.description.clone(),
            com_visible: self.com_visible,
            cls_compliant: self.cls_compliant,
            package_id: self.package_id.clone(),
            package_version: self.package_version.clone(),
            authors: self.authors.clone(),
            license_url: self.license_url.clone(),
            project_url: self.project_url.clone(),
            icon_url: self.icon_url.clone(),
            repository_url: self.repository_url.clone(),
            repository_type: self.repository_type.clone(),
            tags: self.tags.clone(),
            release_notes: self.release_notes.clone(),
            generate_package_on_build: self.generate_package_on_build,
            require_license_acceptance: self.require_license_acceptance,
            generate_documentation_file: self.generate_documentation_file,
            build_number: self.build_number.clone(),
            build_tag: self.build_tag.clone(),
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("path", &self.path)?;
        validate_file_patterns("file_names", &self.file_names)?;
        validate_package_urls(&self.metadata_input())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let config = CliConfig::parse_from([
            "assembly-info",
            "--path",
            "./src",
            "--file-names",
            "**/AssemblyInfo.cs,**/*.csproj",
            "--version",
            "2.1.*",
            "--com-visible",
            "false",
            "--file-encoding",
            "utf-8",
            "--generate-package-on-build",
            "true",
            "--output-format",
            "azure",
        ]);

        assert_eq!(config.source_path(), "./src");
        assert_eq!(config.file_patterns(), ["**/AssemblyInfo.cs", "**/*.csproj"]);
        assert_eq!(config.options().file_encoding, FileEncoding::Utf8);
        assert_eq!(config.options().output_format, OutputFormat::Azure);

        let input = config.metadata_input();
        assert_eq!(input.version.as_deref(), Some("2.1.*"));
        assert_eq!(input.com_visible, Some(false));
        assert_eq!(input.cls_compliant, None);
        assert_eq!(input.generate_package_on_build, BoolOption::True);
        assert_eq!(input.require_license_acceptance, BoolOption::Ignore);
    }

    #[test]
    fn test_defaults_and_verbose_override() {
        let config = CliConfig::parse_from(["assembly-info", "--verbose"]);
        assert_eq!(config.path, ".");
        assert_eq!(config.file_names, vec!["**/AssemblyInfo.*"]);
        assert_eq!(config.options().log_level, LogLevel::Verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_urls() {
        let config = CliConfig::parse_from(["assembly-info", "--project-url", "not a url"]);
        assert!(config.validate().is_err());
    }
}
