//! Renders the run's output variables for the calling build system.

use crate::domain::model::{OutputFormat, OutputVariables};
use crate::utils::error::Result;
use serde_json::{Map, Value};

pub const VERSION_VARIABLE: &str = "AssemblyInfo.Version";
pub const FILE_VERSION_VARIABLE: &str = "AssemblyInfo.FileVersion";
pub const INFORMATIONAL_VERSION_VARIABLE: &str = "AssemblyInfo.InformationalVersion";
pub const PACKAGE_VERSION_VARIABLE: &str = "AssemblyInfo.PackageVersion";

impl OutputVariables {
    /// `(variable name, value)` for every version that was set.
    pub fn variables(&self) -> Vec<(&'static str, &str)> {
        [
            (VERSION_VARIABLE, &self.version),
            (FILE_VERSION_VARIABLE, &self.file_version),
            (INFORMATIONAL_VERSION_VARIABLE, &self.informational_version),
            (PACKAGE_VERSION_VARIABLE, &self.package_version),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.variables().is_empty() && self.build_number.is_none() && self.build_tag.is_none()
    }
}

pub fn render(outputs: &OutputVariables, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Plain => render_plain(outputs),
        OutputFormat::Json => render_json(outputs)?,
        OutputFormat::Azure => render_azure(outputs),
    };
    Ok(rendered)
}

fn render_plain(outputs: &OutputVariables) -> String {
    let mut lines: Vec<String> = outputs
        .variables()
        .into_iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    if let Some(number) = &outputs.build_number {
        lines.push(format!("BuildNumber={}", number));
    }
    if let Some(tag) = &outputs.build_tag {
        lines.push(format!("BuildTag={}", tag));
    }
    lines.join("\n")
}

fn render_json(outputs: &OutputVariables) -> Result<String> {
    let mut map = Map::new();
    for (name, value) in outputs.variables() {
        map.insert(name.to_string(), Value::String(value.to_string()));
    }
    if let Some(number) = &outputs.build_number {
        map.insert("BuildNumber".to_string(), Value::String(number.clone()));
    }
    if let Some(tag) = &outputs.build_tag {
        map.insert("BuildTag".to_string(), Value::String(tag.clone()));
    }
    Ok(serde_json::to_string_pretty(&Value::Object(map))?)
}

fn render_azure(outputs: &OutputVariables) -> String {
    let mut lines: Vec<String> = outputs
        .variables()
        .into_iter()
        .map(|(name, value)| format!("##vso[task.setvariable variable={};]{}", name, value))
        .collect();
    if let Some(number) = &outputs.build_number {
        lines.push(format!("##vso[build.updatebuildnumber]{}", number));
    }
    if let Some(tag) = &outputs.build_tag {
        lines.push(format!("##vso[build.addbuildtag]{}", tag));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs() -> OutputVariables {
        OutputVariables {
            version: Some("2018.11.8039".to_string()),
            file_version: None,
            informational_version: Some("2.3.4-prerelease".to_string()),
            package_version: None,
            build_number: Some("Build_1.2.8039".to_string()),
            build_tag: Some("release".to_string()),
        }
    }

    #[test]
    fn test_render_plain() {
        let rendered = render(&outputs(), OutputFormat::Plain).unwrap();
        assert_eq!(
            rendered,
            "AssemblyInfo.Version=2018.11.8039\nAssemblyInfo.InformationalVersion=2.3.4-prerelease\n\
             BuildNumber=Build_1.2.8039\nBuildTag=release"
        );
    }

    #[test]
    fn test_render_azure_logging_commands() {
        let rendered = render(&outputs(), OutputFormat::Azure).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "##vso[task.setvariable variable=AssemblyInfo.Version;]2018.11.8039");
        assert_eq!(lines[2], "##vso[build.updatebuildnumber]Build_1.2.8039");
        assert_eq!(lines[3], "##vso[build.addbuildtag]release");
    }

    #[test]
    fn test_render_json() {
        let rendered = render(&outputs(), OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["AssemblyInfo.Version"], "2018.11.8039");
        assert!(value.get("AssemblyInfo.FileVersion").is_none());
        assert_eq!(value["BuildTag"], "release");
    }

    #[test]
    fn test_empty_outputs() {
        assert!(OutputVariables::default().is_empty());
        assert_eq!(render(&OutputVariables::default(), OutputFormat::Plain).unwrap(), "");
    }
}
