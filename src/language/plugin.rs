use crate::language::command::CompilationCommand;
use std::path::Path;

/// Describes one toolchain: which files it accepts and how it turns them into an executable.
///
/// Implementations must be pure: the same arguments always yield the same pipeline, without
/// consulting the environment or referring to host paths other than the toolchain programs.
pub trait LanguagePlugin: Send + Sync {
    /// Canonical identifier, used for diagnostics and logging.
    fn name(&self) -> &'static str;

    /// Extensions (with the leading dot) accepted as primary, submittable source.
    fn source_extensions(&self) -> &'static [&'static str];

    /// Auxiliary inputs that are never compiled on their own.
    fn header_extensions(&self) -> &'static [&'static str] {
        &[]
    }

    /// Precompiled inputs that can be linked but are not compiled.
    fn object_extensions(&self) -> &'static [&'static str] {
        &[]
    }

    fn is_compiled(&self) -> bool {
        true
    }

    /// `source_filenames` is non-empty and ordered; the pipeline must produce
    /// `executable_filename`. `for_evaluation` only adds instrumentation.
    fn get_compilation_commands(
        &self,
        source_filenames: &[String],
        executable_filename: &str,
        for_evaluation: bool,
    ) -> CompilationCommand;

    fn accepts_file(&self, filename: &str) -> bool {
        extension_of(filename).map_or(false, |extension| {
            self.source_extensions().contains(&extension)
                || self.header_extensions().contains(&extension)
                || self.object_extensions().contains(&extension)
        })
    }
}

/// Returns the last extension of `filename` including the leading dot, e.g. `.asm`.
pub fn extension_of(filename: &str) -> Option<&str> {
    let extension = Path::new(filename).extension()?.to_str()?;
    // extension() is a suffix of the name, so the dot sits right before it
    Some(&filename[filename.len() - extension.len() - 1..])
}
