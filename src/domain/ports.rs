use crate::domain::model::{MetadataInput, PatchOutcome, PatchRequest, ProcessingOptions};
use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    /// Every file below the storage root, as `/`-separated relative paths.
    fn list_files(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source_path(&self) -> &str;
    fn file_patterns(&self) -> &[String];
    fn options(&self) -> ProcessingOptions;
    fn metadata_input(&self) -> MetadataInput;
}

/// Rewrites one kind of file so it carries the requested metadata.
pub trait FilePatcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports(&self, path: &str) -> bool;
    fn patch(&self, path: &str, content: &str, request: &PatchRequest<'_>) -> Result<PatchOutcome>;
}
