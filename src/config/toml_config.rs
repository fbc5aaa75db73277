use crate::core::ConfigProvider;
use crate::domain::model::{FileEncoding, LogLevel, MetadataInput, OutputFormat, ProcessingOptions};
use crate::domain::package::BoolOption;
use crate::utils::error::{AssemblyInfoError, Result};
use crate::utils::validation::{
    validate_file_patterns, validate_non_empty_string, validate_package_urls, validate_path, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub package: PackageConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsConfig {
    pub insert_attributes: Option<bool>,
    pub file_encoding: Option<FileEncoding>,
    pub write_bom: Option<bool>,
    pub fail_on_warning: Option<bool>,
    pub log_level: Option<LogLevel>,
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyConfig {
    pub title: Option<String>,
    pub product: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub copyright: Option<String>,
    pub trademark: Option<String>,
    pub configuration: Option<String>,
    pub culture: Option<String>,
    pub version: Option<String>,
    pub file_version: Option<String>,
    pub informational_version: Option<String>,
    pub com_visible: Option<bool>,
    pub cls_compliant: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageConfig {
    pub id: Option<String>,
    pub version: Option<String>,
    pub authors: Option<String>,
    pub license_url: Option<String>,
    pub project_url: Option<String>,
    pub icon_url: Option<String>,
    pub repository_url: Option<String>,
    pub repository_type: Option<String>,
    pub tags: Option<String>,
    pub release_notes: Option<String>,
    #[serde(default)]
    pub generate_package_on_build: BoolOption,
    #[serde(default)]
    pub require_license_acceptance: BoolOption,
    #[serde(default)]
    pub generate_documentation_file: BoolOption,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    pub number: Option<String>,
    pub tag: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AssemblyInfoError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AssemblyInfoError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BUILD_BUILDNUMBER})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| AssemblyInfoError::ConfigError {
            message: format!("Invalid environment pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_path("source.path", &self.source.path)?;
        validate_file_patterns("source.files", &self.source.files)?;

        if let Some(id) = &self.package.id {
            validate_non_empty_string("package.id", id)?;
        }

        validate_package_urls(&self.metadata_input())
    }

    pub fn output_format(&self) -> OutputFormat {
        self.options.output_format.unwrap_or_default()
    }

    pub fn log_level(&self) -> LogLevel {
        self.options.log_level.unwrap_or_default()
    }
}

impl ConfigProvider for TomlConfig {
    fn source_path(&self) -> &str {
        &self.source.path
    }

    fn file_patterns(&self) -> &[String] {
        &self.source.files
    }

    fn options(&self) -> ProcessingOptions {
        let defaults = ProcessingOptions::default();
        ProcessingOptions {
            insert_attributes: self.options.insert_attributes.unwrap_or(defaults.insert_attributes),
            file_encoding: self.options.file_encoding.unwrap_or(defaults.file_encoding),
            write_bom: self.options.write_bom.unwrap_or(defaults.write_bom),
            fail_on_warning: self.options.fail_on_warning.unwrap_or(defaults.fail_on_warning),
            log_level: self.log_level(),
            output_format: self.output_format(),
        }
    }

    fn metadata_input(&self) -> MetadataInput {
        let assembly = &self.assembly;
        let package = &self.package;

        MetadataInput {
            title: assembly.title.clone(),
            configuration: assembly.configuration.clone(),
            product: assembly.product.clone(),
            copyright: assembly.copyright.clone(),
            culture: assembly.culture.clone(),
            version: assembly.version.clone(),
            file_version: assembly.file_version.clone(),
            informational_version: assembly.informational_version.clone(),
            company: assembly.company.clone(),
            trademark: assembly.trademark.clone(),
            description: assembly.description.clone(),
            com_visible: assembly.com_visible,
            cls_compliant: assembly.cls_compliant,
            package_id: package.id.clone(),
            package_version: package.version.clone(),
            authors: package.authors.clone(),
            license_url: package.license_url.clone(),
            project_url: package.project_url.clone(),
            icon_url: package.icon_url.clone(),
            repository_url: package.repository_url.clone(),
            repository_type: package.repository_type.clone(),
            tags: package.tags.clone(),
            release_notes: package.release_notes.clone(),
            generate_package_on_build: package.generate_package_on_build,
            require_license_acceptance: package.require_license_acceptance,
            generate_documentation_file: package.generate_documentation_file,
            build_number: self.build.number.clone(),
            build_tag: self.build.tag.clone(),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
