//! Glob based selection of the files to patch.

use crate::utils::error::{AssemblyInfoError, Result};
use regex::{Regex, RegexBuilder};

/// Splits raw pattern inputs on newlines and commas, trimming blanks away.
pub fn split_patterns(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|entry| entry.split(['\n', '\r', ',']))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Converts a glob (`**`, `*`, `?`) into an anchored regex over `/`-separated paths.
pub fn glob_to_regex(pattern: &str) -> String {
    let normalized = pattern.replace('\\', "/");
    let normalized = normalized.trim_start_matches("./");

    let mut regex = String::from("^");
    let mut chars = normalized.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    regex.push_str("(?:.*/)?");
                } else {
                    regex.push_str(".*");
                }
            }
            '*' => regex.push_str("[^/]*"),
            '?' => regex.push_str("[^/]"),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }

    regex.push('$');
    regex
}

#[derive(Debug, Clone)]
struct GlobRule {
    regex: Regex,
    // 沒有 '/' 的樣式只比對檔名
    basename_only: bool,
}

impl GlobRule {
    fn new(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .case_insensitive(true)
            .build()
            .map_err(|e| AssemblyInfoError::InvalidConfigValueError {
                field: "file_names".to_string(),
                value: pattern.to_string(),
                reason: format!("Invalid file pattern: {}", e),
            })?;

        Ok(Self {
            regex,
            basename_only: !pattern.contains(['/', '\\']),
        })
    }

    fn is_match(&self, path: &str) -> bool {
        if self.basename_only {
            let name = path.rsplit('/').next().unwrap_or(path);
            self.regex.is_match(name)
        } else {
            self.regex.is_match(path)
        }
    }
}

/// Include/exclude glob set. Patterns starting with `!` exclude.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    includes: Vec<GlobRule>,
    excludes: Vec<GlobRule>,
}

impl FileMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();

        for pattern in split_patterns(patterns) {
            match pattern.strip_prefix('!') {
                Some(excluded) => excludes.push(GlobRule::new(excluded.trim())?),
                None => includes.push(GlobRule::new(&pattern)?),
            }
        }

        if includes.is_empty() {
            return Err(AssemblyInfoError::MissingConfigError {
                field: "file_names".to_string(),
            });
        }

        Ok(Self { includes, excludes })
    }

    pub fn is_match(&self, path: &str) -> bool {
        let path = path.replace('\\', "/");
        self.includes.iter().any(|r| r.is_match(&path)) && !self.excludes.iter().any(|r| r.is_match(&path))
    }

    /// Matching paths from `candidates`, sorted and de-duplicated.
    pub fn filter<'a>(&self, candidates: impl IntoIterator<Item = &'a String>) -> Vec<String> {
        let mut matched: Vec<String> = candidates
            .into_iter()
            .filter(|p| self.is_match(p))
            .cloned()
            .collect();
        matched.sort();
        matched.dedup();
        matched
    }
}
