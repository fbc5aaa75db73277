//! The assembly metadata descriptor.
//!
//! [`AssemblyMetadata`] is an immutable record of the attributes stamped into a
//! compiled assembly: descriptive text, culture, the assembly and file versions,
//! the informational version and the COM-visibility / CLS-compliance flags.
//! Every field is optional; an unset field leaves the corresponding attribute in
//! the target file untouched.
//!
//! Values are validated once, in [`AssemblyMetadataBuilder::build`], and any
//! failure is reported as [`InvalidMetadataValue`] naming the offending field.

use crate::domain::culture::Culture;
use crate::domain::version::VersionNumber;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid metadata value for '{field}': '{value}' ({reason})")]
pub struct InvalidMetadataValue {
    pub field: String,
    pub value: String,
    pub reason: String,
}

impl InvalidMetadataValue {
    pub fn new(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// The attributes a descriptor can carry, named as the .NET attribute classes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr, Serialize, Deserialize,
)]
pub enum AttributeKind {
    #[strum(serialize = "AssemblyTitle")]
    Title,
    #[strum(serialize = "AssemblyDescription")]
    Description,
    #[strum(serialize = "AssemblyConfiguration")]
    Configuration,
    #[strum(serialize = "AssemblyCompany")]
    Company,
    #[strum(serialize = "AssemblyProduct")]
    Product,
    #[strum(serialize = "AssemblyCopyright")]
    Copyright,
    #[strum(serialize = "AssemblyTrademark")]
    Trademark,
    #[strum(serialize = "AssemblyCulture")]
    Culture,
    #[strum(serialize = "AssemblyVersion")]
    Version,
    #[strum(serialize = "AssemblyFileVersion")]
    FileVersion,
    #[strum(serialize = "AssemblyInformationalVersion")]
    InformationalVersion,
    #[strum(serialize = "ComVisible")]
    ComVisible,
    #[strum(serialize = "CLSCompliant")]
    ClsCompliant,
}

impl AttributeKind {
    pub fn attribute_name(self) -> &'static str {
        self.into()
    }

    pub fn field_name(self) -> &'static str {
        match self {
            AttributeKind::Title => "title",
            AttributeKind::Description => "description",
            AttributeKind::Configuration => "configuration",
            AttributeKind::Company => "company",
            AttributeKind::Product => "product",
            AttributeKind::Copyright => "copyright",
            AttributeKind::Trademark => "trademark",
            AttributeKind::Culture => "culture",
            AttributeKind::Version => "version",
            AttributeKind::FileVersion => "file_version",
            AttributeKind::InformationalVersion => "informational_version",
            AttributeKind::ComVisible => "com_visible",
            AttributeKind::ClsCompliant => "cls_compliant",
        }
    }

    /// Boolean attributes take an unquoted literal.
    pub fn is_boolean(self) -> bool {
        matches!(self, AttributeKind::ComVisible | AttributeKind::ClsCompliant)
    }

    pub fn is_version(self) -> bool {
        matches!(self, AttributeKind::Version | AttributeKind::FileVersion)
    }

    /// MSBuild property carrying the same value in SDK-style projects.
    pub fn msbuild_property(self) -> Option<&'static str> {
        match self {
            AttributeKind::Title => Some("AssemblyTitle"),
            AttributeKind::Description => Some("Description"),
            AttributeKind::Company => Some("Company"),
            AttributeKind::Product => Some("Product"),
            AttributeKind::Copyright => Some("Copyright"),
            AttributeKind::Culture => Some("NeutralLanguage"),
            AttributeKind::Version => Some("AssemblyVersion"),
            AttributeKind::FileVersion => Some("FileVersion"),
            AttributeKind::InformationalVersion => Some("InformationalVersion"),
            AttributeKind::Configuration
            | AttributeKind::Trademark
            | AttributeKind::ComVisible
            | AttributeKind::ClsCompliant => None,
        }
    }
}

/// One entry of the descriptor's flat attribute mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataAttribute {
    pub kind: AttributeKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    title: Option<String>,
    configuration: Option<String>,
    product: Option<String>,
    copyright: Option<String>,
    culture: Option<Culture>,
    version: Option<VersionNumber>,
    file_version: Option<VersionNumber>,
    informational_version: Option<String>,
    company: Option<String>,
    trademark: Option<String>,
    description: Option<String>,
    com_visible: Option<bool>,
    cls_compliant: Option<bool>,
}

impl AssemblyMetadata {
    pub fn builder() -> AssemblyMetadataBuilder {
        AssemblyMetadataBuilder::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn configuration(&self) -> Option<&str> {
        self.configuration.as_deref()
    }

    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    pub fn copyright(&self) -> Option<&str> {
        self.copyright.as_deref()
    }

    pub fn culture(&self) -> Option<&Culture> {
        self.culture.as_ref()
    }

    pub fn version(&self) -> Option<&VersionNumber> {
        self.version.as_ref()
    }

    pub fn file_version(&self) -> Option<&VersionNumber> {
        self.file_version.as_ref()
    }

    pub fn informational_version(&self) -> Option<&str> {
        self.informational_version.as_deref()
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn trademark(&self) -> Option<&str> {
        self.trademark.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn com_visible(&self) -> Option<bool> {
        self.com_visible
    }

    pub fn cls_compliant(&self) -> Option<bool> {
        self.cls_compliant
    }

    /// Rendered value of a single attribute, if set.
    pub fn value_of(&self, kind: AttributeKind) -> Option<String> {
        match kind {
            AttributeKind::Title => self.title.clone(),
            AttributeKind::Description => self.description.clone(),
            AttributeKind::Configuration => self.configuration.clone(),
            AttributeKind::Company => self.company.clone(),
            AttributeKind::Product => self.product.clone(),
            AttributeKind::Copyright => self.copyright.clone(),
            AttributeKind::Trademark => self.trademark.clone(),
            AttributeKind::Culture => self.culture.as_ref().map(|c| c.to_string()),
            AttributeKind::Version => self.version.as_ref().map(|v| v.to_string()),
            AttributeKind::FileVersion => self.file_version.as_ref().map(|v| v.to_string()),
            AttributeKind::InformationalVersion => self.informational_version.clone(),
            AttributeKind::ComVisible => self.com_visible.map(|b| b.to_string()),
            AttributeKind::ClsCompliant => self.cls_compliant.map(|b| b.to_string()),
        }
    }

    /// Flat attribute name to value mapping, in declaration order, set fields only.
    pub fn attributes(&self) -> Vec<MetadataAttribute> {
        AttributeKind::iter()
            .filter_map(|kind| self.value_of(kind).map(|value| MetadataAttribute { kind, value }))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes().is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssemblyMetadataBuilder {
    title: Option<String>,
    configuration: Option<String>,
    product: Option<String>,
    copyright: Option<String>,
    culture: Option<String>,
    version: Option<String>,
    file_version: Option<String>,
    informational_version: Option<String>,
    company: Option<String>,
    trademark: Option<String>,
    description: Option<String>,
    com_visible: Option<bool>,
    cls_compliant: Option<bool>,
}

impl AssemblyMetadataBuilder {
    pub fn title(mut self, value: impl Into<String>) -> Self {
        self.title = Some(value.into());
        self
    }

    pub fn configuration(mut self, value: impl Into<String>) -> Self {
        self.configuration = Some(value.into());
        self
    }

    pub fn product(mut self, value: impl Into<String>) -> Self {
        self.product = Some(value.into());
        self
    }

    pub fn copyright(mut self, value: impl Into<String>) -> Self {
        self.copyright = Some(value.into());
        self
    }

    pub fn culture(mut self, value: impl Into<String>) -> Self {
        self.culture = Some(value.into());
        self
    }

    pub fn version(mut self, value: impl Into<String>) -> Self {
        self.version = Some(value.into());
        self
    }

    pub fn file_version(mut self, value: impl Into<String>) -> Self {
        self.file_version = Some(value.into());
        self
    }

    pub fn informational_version(mut self, value: impl Into<String>) -> Self {
        self.informational_version = Some(value.into());
        self
    }

    pub fn company(mut self, value: impl Into<String>) -> Self {
        self.company = Some(value.into());
        self
    }

    pub fn trademark(mut self, value: impl Into<String>) -> Self {
        self.trademark = Some(value.into());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn com_visible(mut self, value: bool) -> Self {
        self.com_visible = Some(value);
        self
    }

    pub fn cls_compliant(mut self, value: bool) -> Self {
        self.cls_compliant = Some(value);
        self
    }

    pub fn build(self) -> Result<AssemblyMetadata, InvalidMetadataValue> {
        let culture = self.culture.as_deref().map(Culture::parse).transpose()?;
        let version = self
            .version
            .as_deref()
            .map(|v| VersionNumber::parse_field("version", v))
            .transpose()?;
        let file_version = self
            .file_version
            .as_deref()
            .map(|v| VersionNumber::parse_field("file_version", v))
            .transpose()?;

        Ok(AssemblyMetadata {
            title: self.title,
            configuration: self.configuration,
            product: self.product,
            copyright: self.copyright,
            culture,
            version,
            file_version,
            informational_version: self.informational_version,
            company: self.company,
            trademark: self.trademark,
            description: self.description,
            com_visible: self.com_visible,
            cls_compliant: self.cls_compliant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::version::VersionPart;

    #[test]
    fn test_round_trip_fields() {
        let metadata = AssemblyMetadata::builder()
            .title("Assembly Info")
            .configuration("debug")
            .product("Azure DevOps Assembly Info")
            .copyright("Copyright © 2022 Example Ltd")
            .culture("en-GB")
            .version("2018.11.8038")
            .file_version("1990.3.8038.21770")
            .informational_version("2.3.4-prerelease")
            .company("Bleddyn Richards Inc")
            .trademark("Example ® Trademark")
            .description("Sets assembly information from a build.")
            .com_visible(false)
            .cls_compliant(true)
            .build()
            .unwrap();

        assert_eq!(metadata.title(), Some("Assembly Info"));
        assert_eq!(metadata.configuration(), Some("debug"));
        assert_eq!(metadata.culture().map(|c| c.as_str()), Some("en-GB"));
        assert_eq!(
            metadata.version().unwrap().parts(),
            &[VersionPart::Number(2018), VersionPart::Number(11), VersionPart::Number(8038)]
        );
        assert_eq!(metadata.file_version().unwrap().to_string(), "1990.3.8038.21770");
        assert_eq!(metadata.informational_version(), Some("2.3.4-prerelease"));
        assert_eq!(metadata.trademark(), Some("Example ® Trademark"));
        assert_eq!(metadata.com_visible(), Some(false));
        assert_eq!(metadata.cls_compliant(), Some(true));
    }

    #[test]
    fn test_invalid_values_name_the_field() {
        let err = AssemblyMetadata::builder().file_version("1.x").build().unwrap_err();
        assert_eq!(err.field, "file_version");

        let err = AssemblyMetadata::builder().culture("not a culture").build().unwrap_err();
        assert_eq!(err.field, "culture");
    }

    #[test]
    fn test_attributes_mapping_only_contains_set_fields() {
        let metadata = AssemblyMetadata::builder()
            .title("Lib")
            .version("1.2.3.4")
            .cls_compliant(true)
            .build()
            .unwrap();

        let attributes = metadata.attributes();
        let names: Vec<&str> = attributes.iter().map(|a| a.kind.attribute_name()).collect();
        assert_eq!(names, vec!["AssemblyTitle", "AssemblyVersion", "CLSCompliant"]);
        assert_eq!(attributes[2].value, "true");
        assert!(AssemblyMetadata::default().is_empty());
    }

    #[test]
    fn test_attribute_kind_names() {
        assert_eq!(AttributeKind::ClsCompliant.to_string(), "CLSCompliant");
        assert_eq!("AssemblyFileVersion".parse::<AttributeKind>().unwrap(), AttributeKind::FileVersion);
        assert_eq!(AttributeKind::Culture.msbuild_property(), Some("NeutralLanguage"));
        assert_eq!(AttributeKind::Trademark.msbuild_property(), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let metadata = AssemblyMetadata::builder()
            .version("1.2.*")
            .culture("fr")
            .build()
            .unwrap();

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"1.2.*\""));

        let back: AssemblyMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metadata);
    }
}
