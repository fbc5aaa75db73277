use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Tri-state switch for boolean project properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BoolOption {
    True,
    False,
    /// Leave the property as it is.
    #[default]
    Ignore,
}

impl BoolOption {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            BoolOption::True => Some(true),
            BoolOption::False => Some(false),
            BoolOption::Ignore => None,
        }
    }
}

impl From<bool> for BoolOption {
    fn from(value: bool) -> Self {
        if value {
            BoolOption::True
        } else {
            BoolOption::False
        }
    }
}

/// NuGet package properties written to SDK-style project files.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub package_id: Option<String>,
    /// Free-form, e.g. `9.8.7-beta65`.
    pub package_version: Option<String>,
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

impl PackageMetadata {
    /// MSBuild property name and value for every set field.
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        let text = [
            ("PackageId", &self.package_id),
            ("Version", &self.package_version),
            ("Authors", &self.authors),
            ("PackageLicenseUrl", &self.license_url),
            ("PackageProjectUrl", &self.project_url),
            ("PackageIconUrl", &self.icon_url),
            ("RepositoryUrl", &self.repository_url),
            ("RepositoryType", &self.repository_type),
            ("PackageTags", &self.tags),
            ("PackageReleaseNotes", &self.release_notes),
        ];
        let flags = [
            ("GeneratePackageOnBuild", self.generate_package_on_build),
            ("PackageRequireLicenseAcceptance", self.require_license_acceptance),
            ("GenerateDocumentationFile", self.generate_documentation_file),
        ];

        text.into_iter()
            .filter_map(|(name, value)| value.clone().map(|v| (name, v)))
            .chain(
                flags
                    .into_iter()
                    .filter_map(|(name, flag)| flag.as_bool().map(|b| (name, b.to_string()))),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_option_parsing() {
        assert_eq!("true".parse::<BoolOption>().unwrap(), BoolOption::True);
        assert_eq!("IGNORE".parse::<BoolOption>().unwrap(), BoolOption::Ignore);
        assert!("maybe".parse::<BoolOption>().is_err());
        assert_eq!(BoolOption::False.to_string(), "false");
        assert_eq!(BoolOption::Ignore.as_bool(), None);
    }

    #[test]
    fn test_properties_skip_unset_and_ignored() {
        let package = PackageMetadata {
            package_id: Some("my-lib".to_string()),
            package_version: Some("9.8.7-beta65".to_string()),
            generate_package_on_build: BoolOption::True,
            ..Default::default()
        };

        assert_eq!(
            package.properties(),
            vec![
                ("PackageId", "my-lib".to_string()),
                ("Version", "9.8.7-beta65".to_string()),
                ("GeneratePackageOnBuild", "true".to_string()),
            ]
        );
    }
}
