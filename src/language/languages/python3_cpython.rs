use crate::language::command::{CommandStep, CompilationCommand};
use crate::language::plugin::LanguagePlugin;

/// Interpreted: the pipeline only byte-compiles the sources to surface syntax errors, then
/// installs the primary source under the executable name for the runner's interpreter.
#[derive(Debug, Clone, Default)]
pub struct Python3Cpython;

impl LanguagePlugin for Python3Cpython {
    fn name(&self) -> &'static str {
        "Python 3 / CPython"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &[".py"]
    }

    fn is_compiled(&self) -> bool {
        false
    }

    fn get_compilation_commands(
        &self,
        source_filenames: &[String],
        executable_filename: &str,
        _for_evaluation: bool,
    ) -> CompilationCommand {
        let mut check = vec![
            "/usr/bin/python3".to_string(),
            "-m".to_string(),
            "py_compile".to_string(),
        ];
        check.extend(source_filenames.iter().cloned());

        let mut install = vec!["/bin/cp".to_string()];
        install.extend(source_filenames.first().cloned());
        install.push(executable_filename.to_string());

        vec![CommandStep { argv: check }, CommandStep { argv: install }]
    }
}
