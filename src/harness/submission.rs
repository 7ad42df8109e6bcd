use crate::errors::{self, Result};
use crate::language::plugin::{extension_of, LanguagePlugin};
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Files to compile together with the name of the executable they must produce.
#[derive(Clone, Debug)]
pub struct Submission {
    /// Files handed to the compiler, in order; the first one decides the language.
    pub sources: Vec<String>,
    /// Every file to materialize in the working directory, sources included.
    pub files: BTreeMap<String, Vec<u8>>,
    pub executable: String,
    pub for_evaluation: bool,
}

impl Submission {
    pub fn primary_source(&self) -> Result<&str> {
        self.sources
            .first()
            .map(String::as_str)
            .ok_or_else(|| errors::InvalidSubmission("no source files".to_string()))
    }

    /// Checks that the files stay inside the working directory and all belong to `language`.
    pub fn validate(&self, language: &dyn LanguagePlugin) -> Result<()> {
        self.primary_source()?;
        check_file_name(&self.executable)?;

        if self.files.contains_key(&self.executable) {
            return Err(errors::InvalidSubmission(format!(
                "executable name {:?} collides with an input file",
                self.executable
            )));
        }

        for name in self.files.keys() {
            check_file_name(name)?;
            if !language.accepts_file(name) {
                return Err(errors::InvalidSubmission(format!(
                    "file {name:?} is not accepted by language {}",
                    language.name()
                )));
            }
        }

        for source in &self.sources {
            if !self.files.contains_key(source) {
                return Err(errors::InvalidSubmission(format!(
                    "source {source:?} is missing from the submitted files"
                )));
            }
            let compilable = extension_of(source).map_or(false, |extension| {
                language.source_extensions().contains(&extension)
                    || language.object_extensions().contains(&extension)
            });
            if !compilable {
                return Err(errors::InvalidSubmission(format!(
                    "{source:?} cannot be passed to the compiler of {}",
                    language.name()
                )));
            }
        }

        Ok(())
    }

    /// Reads a submission from local files, named by their file names. `sources` are passed to
    /// the compiler, `extra` files are only materialized.
    pub async fn from_paths(
        sources: &[PathBuf],
        extra: &[PathBuf],
        executable: String,
        for_evaluation: bool,
    ) -> anyhow::Result<Self> {
        let mut submission = Submission {
            sources: Vec::new(),
            files: BTreeMap::new(),
            executable,
            for_evaluation,
        };

        for (path, is_source) in sources
            .iter()
            .map(|path| (path, true))
            .chain(extra.iter().map(|path| (path, false)))
        {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .with_context(|| format!("{} has no usable file name", path.display()))?
                .to_string();
            let contents = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if is_source {
                submission.sources.push(name.clone());
            }
            if submission.files.insert(name.clone(), contents).is_some() {
                anyhow::bail!("File name {name:?} is given twice");
            }
        }

        Ok(submission)
    }
}

fn check_file_name(name: &str) -> Result<()> {
    // Names end up as compiler arguments and must not read as options or response files
    if name.is_empty()
        || name.starts_with('-')
        || name.starts_with('@')
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(errors::InvalidSubmission(format!(
            "{name:?} is not a plain file name"
        )));
    }
    Ok(())
}
