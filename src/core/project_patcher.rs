//! Patches MSBuild properties in SDK-style project files.
//!
//! The document is read into an owned event list with `quick-xml` and written
//! back event by event, so declarations, comments and whitespace survive. Only
//! the text of the targeted properties changes, and missing properties are
//! added to the end of each targeted `PropertyGroup`.

use crate::domain::model::{AttributeChange, PatchOutcome, PatchRequest};
use crate::domain::ports::FilePatcher;
use crate::domain::metadata::AttributeKind;
use crate::domain::version::{has_keep_marker, merge_keep_markers};
use crate::utils::error::{AssemblyInfoError, Result};
use quick_xml::escape::{partial_escape, unescape};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::path::Path;

const PROJECT_EXTENSIONS: &[&str] = &["csproj", "vbproj", "fsproj", "props"];
const SDK_MARKER: &str = "Microsoft.NET.Sdk";
const PACKAGE_VERSION_PROPERTY: &str = "Version";

fn extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

#[derive(Debug)]
struct Property {
    name: String,
    start: usize,
    // 與 start 相同代表空元素 <Name />
    end: usize,
}

#[derive(Debug)]
struct PropertyGroup {
    end: usize,
    properties: Vec<Property>,
}

impl PropertyGroup {
    fn declares_target_framework(&self) -> bool {
        self.properties
            .iter()
            .any(|p| p.name == "TargetFramework" || p.name == "TargetFrameworks")
    }
}

fn read_events(content: &str) -> Result<Vec<Event<'static>>> {
    let mut reader = Reader::from_str(content);
    let mut events = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Eof => break,
            event => events.push(event.into_owned()),
        }
    }
    Ok(events)
}

/// Collects the `PropertyGroup` children of the root element.
fn property_groups(events: &[Event<'static>]) -> Vec<PropertyGroup> {
    let mut depth = 0usize;
    let mut groups = Vec::new();
    let mut group: Option<PropertyGroup> = None;
    let mut property: Option<(String, usize)> = None;

    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) => {
                let name = element_name(e);
                if depth == 1 && name == "PropertyGroup" {
                    group = Some(PropertyGroup {
                        end: i,
                        properties: Vec::new(),
                    });
                } else if depth == 2 && group.is_some() {
                    property = Some((name, i));
                }
                depth += 1;
            }
            Event::Empty(e) if depth == 2 => {
                if let Some(g) = group.as_mut() {
                    g.properties.push(Property {
                        name: element_name(e),
                        start: i,
                        end: i,
                    });
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 2 {
                    if let (Some(g), Some((name, start))) = (group.as_mut(), property.take()) {
                        g.properties.push(Property { name, start, end: i });
                    }
                } else if depth == 1 {
                    if let Some(mut g) = group.take() {
                        g.end = i;
                        groups.push(g);
                    }
                }
            }
            _ => {}
        }
    }

    groups
}

fn inner_text(events: &[Event<'static>], property: &Property) -> String {
    if property.start == property.end {
        return String::new();
    }

    let mut raw = String::new();
    for event in &events[property.start + 1..property.end] {
        match event {
            Event::Text(t) => raw.push_str(&String::from_utf8_lossy(t)),
            Event::CData(c) => raw.push_str(&String::from_utf8_lossy(c)),
            _ => {}
        }
    }
    let unescaped = unescape(&raw).map(|t| t.into_owned());
    unescaped.unwrap_or(raw).trim().to_string()
}

fn whitespace_at(events: &[Event<'static>], index: usize) -> Option<String> {
    match events.get(index) {
        Some(Event::Text(t)) if t.iter().all(u8::is_ascii_whitespace) => {
            Some(String::from_utf8_lossy(t).into_owned())
        }
        _ => None,
    }
}

fn start_of(event: &Event<'static>) -> Option<BytesStart<'static>> {
    match event {
        Event::Start(e) => Some(e.clone()),
        // <Name /> 會保留 '/' 前的空白，需重建開始標籤
        Event::Empty(e) => Some(BytesStart::new(element_name(e)).with_attributes(e.attributes().flatten())),
        _ => None,
    }
}

/// A property to write. Only version properties resolve `#` keep markers;
/// every other value is written as given.
struct WantedProperty {
    name: &'static str,
    value: String,
    keeps_parts: bool,
}

impl WantedProperty {
    fn resolve(&self, existing: Option<&str>) -> String {
        if self.keeps_parts {
            merge_keep_markers(&self.value, existing)
        } else {
            self.value.clone()
        }
    }
}

struct Replacement {
    end: usize,
    start: BytesStart<'static>,
    value: String,
}

struct Insertion {
    indent: String,
    properties: Vec<(&'static str, String)>,
}

fn write_property<W: std::io::Write>(writer: &mut Writer<W>, start: BytesStart<'_>, value: &str) -> Result<()> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    writer.write_event(Event::Start(start))?;
    if !value.is_empty() {
        writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(value))))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ProjectFilePatcher;

impl ProjectFilePatcher {
    pub fn new() -> Self {
        Self
    }

    fn wanted_properties(request: &PatchRequest<'_>) -> Vec<WantedProperty> {
        let mut wanted = Vec::new();

        for attribute in request.assembly.attributes() {
            let Some(name) = attribute.kind.msbuild_property() else {
                continue;
            };
            if attribute.kind == AttributeKind::InformationalVersion && has_keep_marker(&attribute.value) {
                tracing::warn!("{} cannot keep parts of an informational version, skipping", attribute.value);
                continue;
            }
            wanted.push(WantedProperty {
                name,
                value: attribute.value,
                keeps_parts: attribute.kind.is_version(),
            });
        }

        wanted.extend(request.package.properties().into_iter().map(|(name, value)| WantedProperty {
            name,
            keeps_parts: name == PACKAGE_VERSION_PROPERTY,
            value,
        }));
        wanted
    }
}

impl FilePatcher for ProjectFilePatcher {
    fn name(&self) -> &'static str {
        "sdk project"
    }

    fn supports(&self, path: &str) -> bool {
        extension(path).is_some_and(|e| PROJECT_EXTENSIONS.contains(&e.as_str()))
    }

    fn patch(&self, path: &str, content: &str, request: &PatchRequest<'_>) -> Result<PatchOutcome> {
        let is_props = extension(path).as_deref() == Some("props");
        let events = read_events(content)?;

        let root = events.iter().find_map(|e| match e {
            Event::Start(s) | Event::Empty(s) => Some(s),
            _ => None,
        });
        let Some(root) = root.filter(|r| element_name(r) == "Project") else {
            return Ok(PatchOutcome::Skipped {
                reason: "No <Project> root element".to_string(),
            });
        };

        if !is_props {
            let sdk = root
                .try_get_attribute("Sdk")
                .map_err(quick_xml::Error::from)?
                .map(|a| String::from_utf8_lossy(&a.value).into_owned());
            if !sdk.is_some_and(|s| s.contains(SDK_MARKER)) {
                return Ok(PatchOutcome::Skipped {
                    reason: "Project is not targeting .NET Core or .NET Standard".to_string(),
                });
            }
        }

        let groups = property_groups(&events);
        let mut targeted: Vec<&PropertyGroup> =
            groups.iter().filter(|g| g.declares_target_framework()).collect();
        if targeted.is_empty() && is_props {
            targeted.extend(groups.first());
        }
        if targeted.is_empty() {
            return Ok(PatchOutcome::Skipped {
                reason: "No PropertyGroup declares a TargetFramework".to_string(),
            });
        }

        let wanted = Self::wanted_properties(request);
        let mut replacements: HashMap<usize, Replacement> = HashMap::new();
        let mut insertions: HashMap<usize, Insertion> = HashMap::new();
        let mut changes = Vec::new();

        for group in targeted {
            let mut missing = Vec::new();

            for property_wanted in &wanted {
                let name = property_wanted.name;
                let existing: Vec<&Property> = group.properties.iter().filter(|p| p.name == name).collect();

                if existing.is_empty() {
                    if request.insert_attributes {
                        let value = property_wanted.resolve(None);
                        tracing::info!("Adding --> {}: {}", name, value);
                        changes.push(AttributeChange {
                            name: name.to_string(),
                            value: value.clone(),
                            inserted: true,
                        });
                        missing.push((name, value));
                    }
                    continue;
                }

                for property in existing {
                    let current = inner_text(&events, property);
                    let value = property_wanted.resolve(Some(current.as_str()).filter(|c| !c.is_empty()));
                    let Some(start) = start_of(&events[property.start]) else {
                        continue;
                    };
                    tracing::info!("{} --> {}", name, value);
                    changes.push(AttributeChange {
                        name: name.to_string(),
                        value: value.clone(),
                        inserted: false,
                    });
                    replacements.insert(
                        property.start,
                        Replacement {
                            end: property.end,
                            start,
                            value,
                        },
                    );
                }
            }

            if missing.is_empty() {
                continue;
            }

            // 插入在結束標籤前的空白之前，並沿用兄弟元素的縮排
            let closing = group.end.checked_sub(1).and_then(|i| whitespace_at(&events, i));
            let position = if closing.is_some() { group.end - 1 } else { group.end };
            let indent = group
                .properties
                .first()
                .and_then(|p| p.start.checked_sub(1))
                .and_then(|i| whitespace_at(&events, i))
                .or_else(|| closing.map(|c| format!("{}  ", c)))
                .unwrap_or_else(|| "\n    ".to_string());

            insertions.insert(
                position,
                Insertion {
                    indent,
                    properties: missing,
                },
            );
        }

        let mut writer = Writer::new(Vec::with_capacity(content.len() + 256));
        let mut i = 0;
        while i < events.len() {
            if let Some(insertion) = insertions.remove(&i) {
                for (name, value) in insertion.properties {
                    writer.write_event(Event::Text(BytesText::from_escaped(insertion.indent.as_str())))?;
                    write_property(&mut writer, BytesStart::new(name), &value)?;
                }
            }

            if let Some(replacement) = replacements.remove(&i) {
                write_property(&mut writer, replacement.start, &replacement.value)?;
                i = replacement.end + 1;
                continue;
            }

            writer.write_event(events[i].borrow())?;
            i += 1;
        }

        let content = String::from_utf8(writer.into_inner()).map_err(|e| AssemblyInfoError::ProcessingError {
            message: format!("Rewritten project is not valid UTF-8: {}", e),
        })?;

        Ok(PatchOutcome::Patched { content, changes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metadata::AssemblyMetadata;
    use crate::domain::package::{BoolOption, PackageMetadata};

    const CSPROJ: &str = r#"<Project Sdk="Microsoft.NET.Sdk">

  <!-- library settings -->
  <PropertyGroup>
    <TargetFramework>netstandard2.0</TargetFramework>
    <Version>1.2.3-beta4</Version>
    <Company />
    <Product>Old &amp; Busted</Product>
  </PropertyGroup>

  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json" Version="12.0.1" />
  </ItemGroup>

</Project>
"#;

    fn patch_with(
        path: &str,
        content: &str,
        assembly: &AssemblyMetadata,
        package: &PackageMetadata,
        insert: bool,
    ) -> PatchOutcome {
        let request = PatchRequest {
            assembly,
            package,
            insert_attributes: insert,
        };
        ProjectFilePatcher::new().patch(path, content, &request).unwrap()
    }

    fn patched(outcome: PatchOutcome) -> (String, Vec<AttributeChange>) {
        match outcome {
            PatchOutcome::Patched { content, changes } => (content, changes),
            PatchOutcome::Skipped { reason } => panic!("unexpected skip: {}", reason),
        }
    }

    #[test]
    fn test_updates_existing_properties_and_preserves_layout() {
        let assembly = AssemblyMetadata::builder()
            .company("Fresh & New")
            .product("Widget <Pro>")
            .build()
            .unwrap();
        let package = PackageMetadata {
            package_version: Some("#.#.9-rc1".to_string()),
            ..Default::default()
        };

        let (content, changes) = patched(patch_with("src/Lib/Lib.csproj", CSPROJ, &assembly, &package, false));

        assert!(content.contains("<Company>Fresh &amp; New</Company>"));
        assert!(content.contains("<Product>Widget &lt;Pro&gt;</Product>"));
        assert!(content.contains("<Version>1.2.9-rc1</Version>"));
        assert!(content.contains("<!-- library settings -->"));
        assert!(content.contains(r#"<PackageReference Include="Newtonsoft.Json" Version="12.0.1" />"#));
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn test_inserts_missing_properties_with_sibling_indent() {
        let assembly = AssemblyMetadata::builder()
            .version("2.0.0.1")
            .culture("en-GB")
            .build()
            .unwrap();
        let package = PackageMetadata {
            generate_package_on_build: BoolOption::True,
            require_license_acceptance: BoolOption::Ignore,
            ..Default::default()
        };

        let (content, changes) = patched(patch_with("Lib.csproj", CSPROJ, &assembly, &package, true));

        assert!(content.contains(
            "<Product>Old &amp; Busted</Product>\n    <NeutralLanguage>en-GB</NeutralLanguage>\n    \
             <AssemblyVersion>2.0.0.1</AssemblyVersion>\n    \
             <GeneratePackageOnBuild>true</GeneratePackageOnBuild>\n  </PropertyGroup>"
        ));
        assert!(!content.contains("PackageRequireLicenseAcceptance"));
        assert!(changes.iter().all(|c| c.inserted));
    }

    #[test]
    fn test_only_version_properties_keep_existing_parts() {
        let project = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
    <Description>Old</Description>
    <AssemblyVersion>3.4.5.6</AssemblyVersion>
    <InformationalVersion>2.1.5-prerelease</InformationalVersion>
  </PropertyGroup>
</Project>"#;
        let assembly = AssemblyMetadata::builder()
            .description("#1 logging library. #2 in downloads")
            .version("#.#.9.#")
            .informational_version("2.#.#-fail")
            .build()
            .unwrap();

        let (content, changes) = patched(patch_with(
            "Lib.csproj",
            project,
            &assembly,
            &PackageMetadata::default(),
            true,
        ));

        assert!(content.contains("<Description>#1 logging library. #2 in downloads</Description>"));
        assert!(content.contains("<AssemblyVersion>3.4.9.6</AssemblyVersion>"));
        assert!(content.contains("<InformationalVersion>2.1.5-prerelease</InformationalVersion>"));
        assert!(changes.iter().all(|c| c.name != "InformationalVersion"));
    }

    #[test]
    fn test_non_sdk_project_is_skipped() {
        let legacy = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="15.0" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup><TargetFrameworkVersion>v4.7.2</TargetFrameworkVersion></PropertyGroup>
</Project>"#;
        let outcome = patch_with(
            "Legacy.csproj",
            legacy,
            &AssemblyMetadata::default(),
            &PackageMetadata::default(),
            true,
        );
        assert!(matches!(outcome, PatchOutcome::Skipped { .. }));
    }

    #[test]
    fn test_props_files_use_the_first_group() {
        let props = "<Project>\n  <PropertyGroup>\n  </PropertyGroup>\n</Project>\n";
        let assembly = AssemblyMetadata::builder().company("Example Ltd").build().unwrap();

        let (content, _) = patched(patch_with(
            "Directory.Build.props",
            props,
            &assembly,
            &PackageMetadata::default(),
            true,
        ));

        assert_eq!(
            content,
            "<Project>\n  <PropertyGroup>\n    <Company>Example Ltd</Company>\n  </PropertyGroup>\n</Project>\n"
        );
    }

    #[test]
    fn test_only_target_framework_groups_are_touched() {
        let project = r#"<Project Sdk="Microsoft.NET.Sdk.Web">
  <PropertyGroup Condition="'$(Configuration)'=='Release'">
    <Product>Release</Product>
  </PropertyGroup>
  <PropertyGroup>
    <TargetFrameworks>net6.0;net8.0</TargetFrameworks>
    <Product>Main</Product>
  </PropertyGroup>
</Project>"#;
        let assembly = AssemblyMetadata::builder().product("Updated").build().unwrap();

        let (content, changes) = patched(patch_with(
            "Web.csproj",
            project,
            &assembly,
            &PackageMetadata::default(),
            false,
        ));

        assert!(content.contains("<Product>Release</Product>"));
        assert!(content.contains("<Product>Updated</Product>"));
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_supported_extensions() {
        let patcher = ProjectFilePatcher::new();
        assert!(patcher.supports("a/B.csproj"));
        assert!(patcher.supports("B.VBPROJ"));
        assert!(patcher.supports("Directory.Build.props"));
        assert!(!patcher.supports("AssemblyInfo.cs"));
    }
}
