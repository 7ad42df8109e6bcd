use crate::errors::{self, Result};
use crate::language::languages::{
    assembly_nasm::AssemblyNasm, c11_gcc::C11Gcc, cpp17_gpp::Cpp17Gpp, pascal_fpc::PascalFpc,
    python3_cpython::Python3Cpython, rust_rustc::RustRustc,
};
use crate::language::plugin::{extension_of, LanguagePlugin};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

pub fn builtin_languages() -> Vec<Arc<dyn LanguagePlugin>> {
    vec![
        Arc::new(AssemblyNasm),
        Arc::new(C11Gcc),
        Arc::new(Cpp17Gpp),
        Arc::new(PascalFpc),
        Arc::new(RustRustc),
        Arc::new(Python3Cpython),
    ]
}

/// Maps every source extension to the single language that claims it.
#[derive(Default)]
pub struct LanguageRegistry {
    languages: Vec<Arc<dyn LanguagePlugin>>,
    by_extension: HashMap<&'static str, usize>,
    allowed_toolchains: Option<BTreeSet<String>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that refuses languages whose pipelines run anything outside `programs`.
    pub fn with_allowed_toolchains<I, S>(programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_toolchains: Some(programs.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Registers the built-in languages, optionally restricted to the given names.
    pub fn register_builtin(&mut self, enabled: Option<&[String]>) -> Result<()> {
        for language in builtin_languages() {
            if let Some(enabled) = enabled {
                if !enabled.iter().any(|name| name == language.name()) {
                    continue;
                }
            }
            self.register(language)?;
        }
        Ok(())
    }

    /// Validates the language eagerly so that misconfiguration surfaces at startup. Nothing is
    /// changed if validation fails.
    pub fn register(&mut self, language: Arc<dyn LanguagePlugin>) -> Result<()> {
        let name = language.name();

        let mut seen = BTreeSet::new();
        for extension in language
            .source_extensions()
            .iter()
            .chain(language.header_extensions())
            .chain(language.object_extensions())
        {
            if !seen.insert(*extension) {
                return Err(errors::OverlappingExtensions {
                    language: name.to_string(),
                    extension: extension.to_string(),
                });
            }
        }

        for extension in language.source_extensions() {
            if let Some(&index) = self.by_extension.get(extension) {
                return Err(errors::AmbiguousLanguage {
                    extension: extension.to_string(),
                    existing: self.languages[index].name().to_string(),
                    new: name.to_string(),
                });
            }
        }

        self.check_pipelines(language.as_ref())?;

        let index = self.languages.len();
        for extension in language.source_extensions() {
            self.by_extension.insert(*extension, index);
        }
        debug!(
            language = name,
            extensions = ?language.source_extensions(),
            "Registered language"
        );
        self.languages.push(language);
        Ok(())
    }

    /// Runs the pipeline generator on a canonical submission to check that it is deterministic
    /// and only invokes allowed toolchains.
    fn check_pipelines(&self, language: &dyn LanguagePlugin) -> Result<()> {
        let name = language.name();
        let Some(extension) = language.source_extensions().first() else {
            return Ok(());
        };
        let sources = [format!("solution{extension}")];

        for for_evaluation in [true, false] {
            let pipeline = language.get_compilation_commands(&sources, "solution", for_evaluation);
            if pipeline != language.get_compilation_commands(&sources, "solution", for_evaluation)
            {
                return Err(errors::NondeterministicPlugin(name.to_string()));
            }

            if let Some(allowed) = &self.allowed_toolchains {
                for step in &pipeline {
                    let program = step.program().unwrap_or_default();
                    if !allowed.contains(program) {
                        return Err(errors::DisallowedToolchain {
                            language: name.to_string(),
                            program: program.to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    pub fn resolve(&self, primary_source_filename: &str) -> Result<Arc<dyn LanguagePlugin>> {
        extension_of(primary_source_filename)
            .and_then(|extension| self.by_extension.get(extension))
            .map(|&index| self.languages[index].clone())
            .ok_or_else(|| errors::UnknownLanguage {
                filename: primary_source_filename.to_string(),
            })
    }

    pub fn languages(&self) -> impl Iterator<Item = &dyn LanguagePlugin> {
        self.languages.iter().map(|language| language.as_ref())
    }
}
