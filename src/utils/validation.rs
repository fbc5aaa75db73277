use crate::core::discovery::split_patterns;
use crate::domain::model::MetadataInput;
use crate::utils::error::{AssemblyInfoError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AssemblyInfoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AssemblyInfoError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AssemblyInfoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(AssemblyInfoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(AssemblyInfoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AssemblyInfoError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// At least one pattern must select files; `!` patterns only exclude.
pub fn validate_file_patterns(field_name: &str, patterns: &[String]) -> Result<()> {
    let patterns = split_patterns(patterns);
    if !patterns.iter().any(|p| !p.starts_with('!')) {
        return Err(AssemblyInfoError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    for pattern in &patterns {
        validate_path(field_name, pattern)?;
    }
    Ok(())
}

/// License, project and icon URLs must be absolute http(s) URLs. Repository
/// URLs may be scp-style git remotes and are not checked.
pub fn validate_package_urls(input: &MetadataInput) -> Result<()> {
    let urls = [
        ("license_url", &input.license_url),
        ("project_url", &input.project_url),
        ("icon_url", &input.icon_url),
    ];

    for (field, value) in urls {
        if let Some(url) = value.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            validate_url(field, url)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("project_url", "https://example.com").is_ok());
        assert!(validate_url("project_url", "http://example.com").is_ok());
        assert!(validate_url("project_url", "").is_err());
        assert!(validate_url("project_url", "invalid-url").is_err());
        assert!(validate_url("project_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_file_patterns() {
        assert!(validate_file_patterns("file_names", &["**/AssemblyInfo.cs".to_string()]).is_ok());
        assert!(validate_file_patterns("file_names", &["!**/obj/**".to_string()]).is_err());
        assert!(validate_file_patterns("file_names", &[" , \n".to_string()]).is_err());
    }

    #[test]
    fn test_validate_package_urls() {
        let mut input = MetadataInput {
            project_url: Some("https://github.com/example/lib".to_string()),
            icon_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(validate_package_urls(&input).is_ok());

        input.repository_url = Some("git@github.com:example/lib.git".to_string());
        assert!(validate_package_urls(&input).is_ok());

        input.license_url = Some("ftp://example.com/LICENSE".to_string());
        let err = validate_package_urls(&input).unwrap_err();
        assert!(err.to_string().contains("license_url"));
    }
}
