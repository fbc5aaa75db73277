use crate::core::discovery::{split_patterns, FileMatcher};
use crate::core::encoding::{decode, detect_encoding, encode, has_bom, resolve_encoding};
use crate::core::project_patcher::ProjectFilePatcher;
use crate::core::source_patcher::SourceAttributePatcher;
use crate::core::transforms;
use crate::core::{ConfigProvider, FilePatcher, Storage};
use crate::domain::model::{
    FileFailure, FileReport, OutputVariables, PatchOutcome, PatchRequest, PreparedMetadata, ProcessingOptions, RunSummary,
};
use crate::utils::error::{AssemblyInfoError, Result};
use chrono::{DateTime, Local, TimeZone};
use std::fmt;

/// A file selected for patching and the patcher that will handle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: String,
    pub patcher: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct RunPlan {
    pub prepared: PreparedMetadata,
    pub files: Vec<PlannedFile>,
}

pub struct AssemblyInfoEngine<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    patchers: Vec<Box<dyn FilePatcher>>,
}

impl<S: Storage, C: ConfigProvider> AssemblyInfoEngine<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            patchers: vec![Box::new(SourceAttributePatcher::new()), Box::new(ProjectFilePatcher::new())],
        }
    }

    /// Registers an extra patcher, consulted after the built-in ones.
    pub fn with_patcher(mut self, patcher: impl FilePatcher + 'static) -> Self {
        self.patchers.push(Box::new(patcher));
        self
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn patcher_for(&self, path: &str) -> Option<&dyn FilePatcher> {
        self.patchers.iter().find(|p| p.supports(path)).map(|p| p.as_ref())
    }

    pub async fn plan(&self) -> Result<RunPlan> {
        self.plan_at(&Local::now()).await
    }

    /// Resolves the metadata and the file list without touching any file.
    pub async fn plan_at<Tz>(&self, now: &DateTime<Tz>) -> Result<RunPlan>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        if !self.storage.exists("").await {
            return Err(AssemblyInfoError::SourceDirectoryNotFound {
                path: self.config.source_path().to_string(),
            });
        }

        let prepared = transforms::prepare(&self.config.metadata_input(), now)?;
        log_parameters(&prepared, &self.config.options());

        let matcher = FileMatcher::new(self.config.file_patterns())?;
        let candidates = self.storage.list_files().await?;
        let matched = matcher.filter(&candidates);
        tracing::debug!("{} of {} files matched", matched.len(), candidates.len());

        if matched.is_empty() {
            return Err(AssemblyInfoError::NoFilesFound {
                patterns: split_patterns(self.config.file_patterns()).join(", "),
            });
        }

        let files = matched
            .into_iter()
            .map(|path| {
                let patcher = self.patcher_for(&path).map(|p| p.name());
                PlannedFile { path, patcher }
            })
            .collect();

        Ok(RunPlan { prepared, files })
    }

    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(&Local::now()).await
    }

    pub async fn run_at<Tz>(&self, now: &DateTime<Tz>) -> Result<RunSummary>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        tracing::info!("🚀 Starting assembly info update in {}", self.config.source_path());

        let options = self.config.options();
        let plan = self.plan_at(now).await?;
        let mut summary = RunSummary {
            outputs: OutputVariables::from(&plan.prepared),
            ..Default::default()
        };

        for file in &plan.files {
            let Some(patcher) = self.patcher_for(&file.path) else {
                let warning = format!("File type not supported, skipping: {}", file.path);
                tracing::warn!("⚠️ {}", warning);
                summary.warnings.push(warning);
                summary.skipped.push(file.path.clone());
                continue;
            };

            tracing::info!("📄 Processing: {}", file.path);
            if let Err(e) = self
                .process_file(&file.path, patcher, &plan.prepared, &options, &mut summary)
                .await
            {
                tracing::error!("❌ {}, moving to next file: {}", e, file.path);
                summary.failed.push(FileFailure {
                    path: file.path.clone(),
                    error: e.to_string(),
                });
            }
        }

        tracing::info!(
            "✅ Updated {} file(s), skipped {}, {} warning(s)",
            summary.updated.len(),
            summary.skipped.len(),
            summary.warnings.len()
        );

        if !summary.failed.is_empty() {
            return Err(AssemblyInfoError::FilesFailed {
                summary: Box::new(summary),
            });
        }

        if options.fail_on_warning && !summary.warnings.is_empty() {
            return Err(AssemblyInfoError::WarningsAsErrors {
                count: summary.warnings.len(),
            });
        }

        Ok(summary)
    }

    async fn process_file(
        &self,
        path: &str,
        patcher: &dyn FilePatcher,
        prepared: &PreparedMetadata,
        options: &ProcessingOptions,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let bytes = self.storage.read_file(path).await?;
        let detected = detect_encoding(&bytes);
        tracing::debug!("Detected file encoding: {} (BOM: {})", detected, has_bom(&bytes));

        let (encoding, mismatch) = resolve_encoding(options.file_encoding, detected);
        if let Some(warning) = mismatch {
            tracing::warn!("⚠️ {}: {}", path, warning);
            summary.warnings.push(format!("{}: {}", path, warning));
        }

        let decoded = decode(&bytes, encoding);
        if decoded.replaced > 0 {
            let warning = format!(
                "{}: {} byte sequence(s) are not valid {} and were read as U+FFFD",
                path, decoded.replaced, encoding
            );
            tracing::warn!("⚠️ {}", warning);
            summary.warnings.push(warning);
        }
        let content = decoded.text;
        let request = PatchRequest {
            assembly: &prepared.assembly,
            package: &prepared.package,
            insert_attributes: options.insert_attributes,
        };

        let (content, changes) = match patcher.patch(path, &content, &request)? {
            PatchOutcome::Patched { content, changes } => (content, changes),
            PatchOutcome::Skipped { reason } => {
                tracing::warn!("⚠️ {}, moving to next file: {}", reason, path);
                summary.warnings.push(format!("{}: {}", path, reason));
                summary.skipped.push(path.to_string());
                return Ok(());
            }
        };

        let encoded = encode(&content, encoding, options.write_bom);
        if encoded.replaced > 0 {
            let warning = format!(
                "{}: {} character(s) cannot be represented in {} and were replaced with '?'",
                path, encoded.replaced, encoding
            );
            tracing::warn!("⚠️ {}", warning);
            summary.warnings.push(warning);
        }

        self.storage.write_file(path, &encoded.bytes).await?;
        tracing::debug!("Verify file encoding: {}", detect_encoding(&encoded.bytes));

        summary.updated.push(FileReport {
            path: path.to_string(),
            encoding: encoding.to_string(),
            changes,
        });
        Ok(())
    }
}

fn log_parameters(prepared: &PreparedMetadata, options: &ProcessingOptions) {
    tracing::debug!("Insert attributes: {}", options.insert_attributes);
    tracing::debug!("File encoding: {}", options.file_encoding);
    tracing::debug!("Write BOM: {}", options.write_bom);
    tracing::debug!("Fail on warning: {}", options.fail_on_warning);

    for attribute in prepared.assembly.attributes() {
        tracing::debug!("{}: {}", attribute.kind, attribute.value);
    }
    for (name, value) in prepared.package.properties() {
        tracing::debug!("{}: {}", name, value);
    }
    if let Some(number) = &prepared.build_number {
        tracing::debug!("Build number: {}", number);
    }
    if let Some(tag) = &prepared.build_tag {
        tracing::debug!("Build tag: {}", tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{MetadataInput, PatchRequest};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStorage {
        files: Mutex<HashMap<String, Vec<u8>>>,
        missing_root: bool,
    }

    impl MemoryStorage {
        fn with(files: &[(&str, &str)]) -> Self {
            let files = files
                .iter()
                .map(|(path, text)| (path.to_string(), text.as_bytes().to_vec()))
                .collect();
            Self {
                files: Mutex::new(files),
                missing_root: false,
            }
        }

        fn get(&self, path: &str) -> Vec<u8> {
            self.files.lock().unwrap().get(path).cloned().unwrap_or_default()
        }
    }

    impl Storage for MemoryStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            Ok(self.get(path))
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.lock().unwrap().insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn exists(&self, _path: &str) -> bool {
            !self.missing_root
        }

        async fn list_files(&self) -> Result<Vec<String>> {
            Ok(self.files.lock().unwrap().keys().cloned().collect())
        }
    }

    struct TestConfig {
        patterns: Vec<String>,
        options: ProcessingOptions,
        input: MetadataInput,
    }

    impl ConfigProvider for TestConfig {
        fn source_path(&self) -> &str {
            "memory"
        }

        fn file_patterns(&self) -> &[String] {
            &self.patterns
        }

        fn options(&self) -> ProcessingOptions {
            self.options.clone()
        }

        fn metadata_input(&self) -> MetadataInput {
            self.input.clone()
        }
    }

    fn config(patterns: &str, input: MetadataInput) -> TestConfig {
        TestConfig {
            patterns: vec![patterns.to_string()],
            options: ProcessingOptions::default(),
            input,
        }
    }

    fn now() -> DateTime<chrono::FixedOffset> {
        chrono::FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2022, 1, 3, 12, 5, 30)
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_patches_matched_files() {
        let storage = MemoryStorage::with(&[
            ("Properties/AssemblyInfo.cs", "[assembly: AssemblyVersion(\"1.0.0.0\")]\n"),
            ("README.md", "# readme"),
        ]);
        let input = MetadataInput {
            version: Some("2.1.*".to_string()),
            ..Default::default()
        };
        let engine = AssemblyInfoEngine::new(storage, config("**/AssemblyInfo.cs", input));

        let summary = engine.run_at(&now()).await.unwrap();

        assert_eq!(summary.updated.len(), 1);
        assert_eq!(summary.outputs.version.as_deref(), Some("2.1.8039"));
        assert_eq!(
            engine.storage.get("Properties/AssemblyInfo.cs"),
            b"[assembly: AssemblyVersion(\"2.1.8039\")]\n".to_vec()
        );
        assert_eq!(engine.storage.get("README.md"), b"# readme".to_vec());
    }

    #[tokio::test]
    async fn test_missing_root_and_no_matches() {
        let storage = MemoryStorage {
            missing_root: true,
            ..Default::default()
        };
        let engine = AssemblyInfoEngine::new(storage, config("**/*.cs", MetadataInput::default()));
        assert!(matches!(
            engine.run_at(&now()).await,
            Err(AssemblyInfoError::SourceDirectoryNotFound { .. })
        ));

        let storage = MemoryStorage::with(&[("a.txt", "")]);
        let engine = AssemblyInfoEngine::new(storage, config("**/*.cs", MetadataInput::default()));
        assert!(matches!(
            engine.run_at(&now()).await,
            Err(AssemblyInfoError::NoFilesFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_files_warn_and_can_fail_the_run() {
        let files = [("AssemblyInfo.fs", "module AssemblyInfo")];

        let engine = AssemblyInfoEngine::new(
            MemoryStorage::with(&files),
            config("**/AssemblyInfo.*", MetadataInput::default()),
        );
        let summary = engine.run_at(&now()).await.unwrap();
        assert_eq!(summary.skipped, vec!["AssemblyInfo.fs"]);
        assert_eq!(summary.warnings.len(), 1);

        let mut strict = config("**/AssemblyInfo.*", MetadataInput::default());
        strict.options.fail_on_warning = true;
        let result = AssemblyInfoEngine::new(MemoryStorage::with(&files), strict)
            .run_at(&now())
            .await;
        assert!(matches!(result, Err(AssemblyInfoError::WarningsAsErrors { count: 1 })));
    }

    #[tokio::test]
    async fn test_plan_lists_files_with_their_patchers() {
        let storage = MemoryStorage::with(&[("src/App.csproj", "<Project />"), ("src/AssemblyInfo.vb", "")]);
        let engine = AssemblyInfoEngine::new(storage, config("**/*.csproj, **/*.vb", MetadataInput::default()));

        let plan = engine.plan_at(&now()).await.unwrap();

        assert_eq!(
            plan.files,
            vec![
                PlannedFile {
                    path: "src/App.csproj".to_string(),
                    patcher: Some("sdk project"),
                },
                PlannedFile {
                    path: "src/AssemblyInfo.vb".to_string(),
                    patcher: Some("source attributes"),
                },
            ]
        );
    }

    struct UpperCasePatcher;

    impl FilePatcher for UpperCasePatcher {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn supports(&self, path: &str) -> bool {
            path.ends_with(".txt")
        }

        fn patch(&self, _path: &str, content: &str, _request: &PatchRequest<'_>) -> Result<PatchOutcome> {
            Ok(PatchOutcome::Patched {
                content: content.to_uppercase(),
                changes: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_custom_patcher_keeps_utf16_encoding() {
        let storage = MemoryStorage::default();
        storage
            .files
            .lock()
            .unwrap()
            .insert("notes.txt".to_string(), vec![0xFF, 0xFE, b'h', 0, b'i', 0]);
        let mut cfg = config("*.txt", MetadataInput::default());
        cfg.options.write_bom = true;

        let engine = AssemblyInfoEngine::new(storage, cfg).with_patcher(UpperCasePatcher);
        let summary = engine.run_at(&now()).await.unwrap();

        assert!(summary.warnings.is_empty());
        assert_eq!(summary.updated[0].encoding, "utf-16le");
        assert_eq!(engine.storage.get("notes.txt"), vec![0xFF, 0xFE, b'H', 0, b'I', 0]);
    }

    #[tokio::test]
    async fn test_explicit_encoding_mismatch_warns() {
        let storage = MemoryStorage::with(&[("notes.txt", "héllo")]);
        let mut cfg = config("*.txt", MetadataInput::default());
        cfg.options.file_encoding = "utf-16le".parse().unwrap();
        cfg.options.fail_on_warning = true;

        let engine = AssemblyInfoEngine::new(storage, cfg).with_patcher(UpperCasePatcher);
        assert!(matches!(
            engine.run_at(&now()).await,
            Err(AssemblyInfoError::WarningsAsErrors { .. })
        ));
    }

    #[tokio::test]
    async fn test_explicit_encoding_reads_undecodable_bytes_as_replacement() {
        let storage = MemoryStorage::default();
        storage.files.lock().unwrap().insert(
            "latin.cs".to_string(),
            b"[assembly: AssemblyCopyright(\"\xA9 Old\")]\n".to_vec(),
        );
        let input = MetadataInput {
            copyright: Some("© New".to_string()),
            ..Default::default()
        };
        let mut cfg = config("*.cs", input);
        cfg.options.file_encoding = "utf-8".parse().unwrap();

        let engine = AssemblyInfoEngine::new(storage, cfg);
        let summary = engine.run_at(&now()).await.unwrap();

        assert_eq!(summary.updated.len(), 1);
        assert_eq!(summary.warnings.len(), 2);
        assert!(summary.warnings[1].contains("U+FFFD"));
        assert_eq!(
            engine.storage.get("latin.cs"),
            "[assembly: AssemblyCopyright(\"© New\")]\n".as_bytes().to_vec()
        );
    }

    #[tokio::test]
    async fn test_failed_file_does_not_stop_the_run() {
        let valid = "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    \
                     <TargetFramework>net8.0</TargetFramework>\n    <Description>Old</Description>\n  \
                     </PropertyGroup>\n</Project>\n";
        let storage = MemoryStorage::with(&[
            ("A.csproj", valid),
            ("B.csproj", "<Project Sdk=\"Microsoft.NET.Sdk\"><PropertyGroup></Project>"),
            ("C.csproj", valid),
        ]);
        let input = MetadataInput {
            description: Some("NEW".to_string()),
            version: Some("1.2.*".to_string()),
            ..Default::default()
        };
        let engine = AssemblyInfoEngine::new(storage, config("*.csproj", input));

        let summary = match engine.run_at(&now()).await {
            Err(AssemblyInfoError::FilesFailed { summary }) => summary,
            other => panic!("expected a failed file, got {:?}", other),
        };

        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].path, "B.csproj");
        let updated: Vec<&str> = summary.updated.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(updated, vec!["A.csproj", "C.csproj"]);
        assert_eq!(summary.outputs.version.as_deref(), Some("1.2.8039"));

        for path in ["A.csproj", "C.csproj"] {
            let text = String::from_utf8(engine.storage.get(path)).unwrap();
            assert!(text.contains("<Description>NEW</Description>"));
        }
    }
}
