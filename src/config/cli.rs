use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

// 不進入建置輸出與版本控制目錄
const SKIPPED_DIRS: &[&str] = &[".git", ".vs", "bin", "obj", "node_modules"];

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            PathBuf::from(&self.base_path)
        } else {
            Path::new(&self.base_path).join(path)
        }
    }
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            let name = entry.file_name();
            if SKIPPED_DIRS.iter().any(|skip| name.to_string_lossy().eq_ignore_ascii_case(skip)) {
                continue;
            }
            collect_files(root, &path, files)?;
        } else if file_type.is_file() {
            if let Ok(relative) = path.strip_prefix(root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                files.push(parts.join("/"));
            }
        }
    }
    Ok(())
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.full_path(path))?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.full_path(path).exists()
    }

    async fn list_files(&self) -> Result<Vec<String>> {
        let root = PathBuf::from(&self.base_path);
        let mut files = Vec::new();
        collect_files(&root, &root, &mut files)?;
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_files_is_recursive_and_relative() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Lib/Properties")).unwrap();
        fs::create_dir_all(dir.path().join("Lib/obj")).unwrap();
        fs::write(dir.path().join("Lib/Properties/AssemblyInfo.cs"), "").unwrap();
        fs::write(dir.path().join("Lib/obj/AssemblyInfo.cs"), "").unwrap();
        fs::write(dir.path().join("Lib/Lib.csproj"), "").unwrap();

        let storage = LocalStorage::new(dir.path().to_string_lossy().into_owned());
        let files = storage.list_files().await.unwrap();

        assert_eq!(files, vec!["Lib/Lib.csproj", "Lib/Properties/AssemblyInfo.cs"]);
    }

    #[tokio::test]
    async fn test_read_write_and_exists() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_string_lossy().into_owned());

        assert!(storage.exists("").await);
        assert!(!storage.exists("missing.cs").await);

        storage.write_file("nested/AssemblyInfo.vb", b"Imports System").await.unwrap();
        assert_eq!(storage.read_file("nested/AssemblyInfo.vb").await.unwrap(), b"Imports System");
        assert!(!LocalStorage::new("/definitely/not/here".to_string()).exists("").await);
    }
}
