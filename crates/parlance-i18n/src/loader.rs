//! Locale file discovery and loading.
//!
//! Two layouts are understood:
//!
//! ```text
//! flat:    locales/en.json          locales/zh-CN.json
//! nested:  locales/en/common.json   locales/en/errors.json   locales/zh-CN/ui.json
//! ```
//!
//! In the nested layout every module file of a language contributes to the
//! same catalog; module names do not prefix message ids.

use crate::bundle::LocaleSource;
use crate::error::{I18nError, I18nResult};
use parlance_config::defaults::DEFAULT_MODULES;
use parlance_config::{LocaleMode, LocalesConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Summary of the locale files a loader would read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleFileStats {
    /// Layout in effect.
    pub mode: LocaleMode,
    /// Number of expected files.
    pub total_files: usize,
    /// Configured languages.
    pub languages: Vec<String>,
    /// Module names, nested layout only.
    pub modules: Vec<String>,
    /// Size in bytes of each expected file that exists.
    pub file_sizes: BTreeMap<PathBuf, u64>,
}

/// Reads locale files from disk into [`LocaleSource`]s.
#[derive(Debug, Clone)]
pub struct LocaleLoader {
    root: PathBuf,
    mode: LocaleMode,
    languages: Vec<String>,
    modules: Vec<String>,
}

impl LocaleLoader {
    /// Creates a loader.
    pub fn new(
        root: impl Into<PathBuf>,
        mode: LocaleMode,
        languages: Vec<String>,
        modules: Vec<String>,
    ) -> Self {
        Self {
            root: root.into(),
            mode,
            languages,
            modules,
        }
    }

    /// Creates a loader from the `locales` configuration section.
    pub fn from_config(config: &LocalesConfig) -> Self {
        Self::new(
            config.path.clone(),
            config.mode,
            config.languages.clone(),
            config.modules.clone(),
        )
    }

    /// Locale root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configured languages.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Module names used in the nested layout.
    pub fn modules(&self) -> Vec<String> {
        if self.modules.is_empty() {
            DEFAULT_MODULES.iter().map(ToString::to_string).collect()
        } else {
            self.modules.clone()
        }
    }

    /// The layout to use, detecting it when configured as `auto`.
    pub fn resolved_mode(&self) -> I18nResult<LocaleMode> {
        match self.mode {
            LocaleMode::Auto => {
                let probe = self.languages.first().map_or("en", String::as_str);
                detect_mode(&self.root, probe)
            }
            mode => Ok(mode),
        }
    }

    /// Every file the loader expects, whether or not it exists.
    pub fn locale_files(&self) -> I18nResult<Vec<PathBuf>> {
        Ok(self
            .expected_files(self.resolved_mode()?)
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    /// Reads every existing locale file.
    ///
    /// Missing files are skipped; unreadable or malformed files fail.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn load(&self) -> I18nResult<Vec<LocaleSource>> {
        let mode = self.resolved_mode()?;
        let mut sources = Vec::new();

        for (language, path) in self.expected_files(mode) {
            match read_source(&language, &path)? {
                Some(source) => sources.push(source),
                None if mode == LocaleMode::Flat => {
                    warn!("Locale file {} not found, skipping", path.display());
                }
                None => debug!("Module file {} not found, skipping", path.display()),
            }
        }

        debug!("Read {} locale files", sources.len());
        Ok(sources)
    }

    /// Expected files or language directories that are missing.
    pub fn validate_structure(&self) -> I18nResult<Vec<PathBuf>> {
        let mode = self.resolved_mode()?;
        let mut missing = Vec::new();

        if mode == LocaleMode::Nested {
            for language in &self.languages {
                let dir = self.root.join(language);
                if !dir.is_dir() {
                    missing.push(dir);
                }
            }
        }

        let missing_files: Vec<PathBuf> = self
            .expected_files(mode)
            .into_iter()
            .map(|(_, path)| path)
            .filter(|path| !path.is_file() && !missing.iter().any(|m| path.starts_with(m)))
            .collect();
        missing.extend(missing_files);
        Ok(missing)
    }

    /// Layout, languages, modules and sizes of the expected files.
    pub fn file_stats(&self) -> I18nResult<LocaleFileStats> {
        let mode = self.resolved_mode()?;
        let files = self.expected_files(mode);
        let file_sizes = files
            .iter()
            .filter_map(|(_, path)| fs::metadata(path).ok().map(|m| (path.clone(), m.len())))
            .collect();

        Ok(LocaleFileStats {
            mode,
            total_files: files.len(),
            languages: self.languages.clone(),
            modules: if mode == LocaleMode::Nested {
                self.modules()
            } else {
                Vec::new()
            },
            file_sizes,
        })
    }

    fn expected_files(&self, mode: LocaleMode) -> Vec<(String, PathBuf)> {
        match mode {
            LocaleMode::Nested => {
                let modules = self.modules();
                self.languages
                    .iter()
                    .flat_map(|language| {
                        modules.iter().map(move |module| {
                            (
                                language.clone(),
                                self.root.join(language).join(format!("{module}.json")),
                            )
                        })
                    })
                    .collect()
            }
            LocaleMode::Flat | LocaleMode::Auto => self
                .languages
                .iter()
                .map(|language| (language.clone(), self.root.join(format!("{language}.json"))))
                .collect(),
        }
    }
}

/// Chooses nested when `<root>/<language>` is a directory and flat when
/// `<root>/<language>.json` exists.
pub fn detect_mode(root: &Path, language: &str) -> I18nResult<LocaleMode> {
    if root.join(language).is_dir() {
        Ok(LocaleMode::Nested)
    } else if root.join(format!("{language}.json")).is_file() {
        Ok(LocaleMode::Flat)
    } else {
        Err(I18nError::UnsupportedLayout {
            path: root.to_path_buf(),
        })
    }
}

fn read_source(language: &str, path: &Path) -> I18nResult<Option<LocaleSource>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(I18nError::LocaleLoad {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let document = serde_json::from_str(&content).map_err(|e| I18nError::LocaleParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Some(LocaleSource::new(language, path, document)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlance_common::test_utils::write_locale_file;

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_flat_layout() {
        let dir = tempfile::tempdir().unwrap();
        write_locale_file(dir.path(), "en.json", r#"{"A": "a"}"#);

        let loader = LocaleLoader::new(dir.path(), LocaleMode::Flat, langs(&["en", "fr"]), vec![]);
        let sources = loader.load().unwrap();

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].language, "en");
        assert_eq!(loader.validate_structure().unwrap(), vec![dir.path().join("fr.json")]);
    }

    #[test]
    fn test_nested_layout_skips_missing_modules() {
        let dir = tempfile::tempdir().unwrap();
        write_locale_file(dir.path(), "en/common.json", r#"{"A": "a"}"#);
        write_locale_file(dir.path(), "en/errors.json", r#"{"B": "b"}"#);

        let loader = LocaleLoader::new(dir.path(), LocaleMode::Nested, langs(&["en"]), vec![]);
        assert_eq!(loader.load().unwrap().len(), 2);
        assert_eq!(loader.locale_files().unwrap().len(), 3);
        assert_eq!(
            loader.validate_structure().unwrap(),
            vec![dir.path().join("en").join("ui.json")]
        );
    }

    #[test]
    fn test_auto_detection() {
        let nested = tempfile::tempdir().unwrap();
        write_locale_file(nested.path(), "en/common.json", "{}");
        assert_eq!(detect_mode(nested.path(), "en").unwrap(), LocaleMode::Nested);

        let flat = tempfile::tempdir().unwrap();
        write_locale_file(flat.path(), "en.json", "{}");
        assert_eq!(detect_mode(flat.path(), "en").unwrap(), LocaleMode::Flat);

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            detect_mode(empty.path(), "en"),
            Err(I18nError::UnsupportedLayout { .. })
        ));
    }

    #[test]
    fn test_malformed_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_locale_file(dir.path(), "en.json", "{ not json");

        let loader = LocaleLoader::new(dir.path(), LocaleMode::Flat, langs(&["en"]), vec![]);
        assert!(matches!(loader.load(), Err(I18nError::LocaleParse { .. })));
    }

    #[test]
    fn test_file_stats() {
        let dir = tempfile::tempdir().unwrap();
        write_locale_file(dir.path(), "en/ui.json", r#"{"OK": "OK"}"#);

        let loader = LocaleLoader::new(
            dir.path(),
            LocaleMode::Auto,
            langs(&["en"]),
            langs(&["ui", "extra"]),
        );
        let stats = loader.file_stats().unwrap();

        assert_eq!(stats.mode, LocaleMode::Nested);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.modules, langs(&["ui", "extra"]));
        assert_eq!(stats.file_sizes.len(), 1);
    }
}
