pub mod discovery;
pub mod encoding;
pub mod engine;
pub mod outputs;
pub mod project_patcher;
pub mod source_patcher;
pub mod transforms;

pub use crate::domain::model::{PatchOutcome, PatchRequest, RunSummary};
pub use crate::domain::ports::{ConfigProvider, FilePatcher, Storage};
pub use crate::utils::error::Result;
