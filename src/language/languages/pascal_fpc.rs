use crate::language::command::{CommandStep, CompilationCommand};
use crate::language::plugin::LanguagePlugin;

/// Free Pascal compiles a single program file; units are pulled in by the compiler itself.
#[derive(Debug, Clone, Default)]
pub struct PascalFpc;

impl LanguagePlugin for PascalFpc {
    fn name(&self) -> &'static str {
        "Pascal / fpc"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &[".pas"]
    }

    fn header_extensions(&self) -> &'static [&'static str] {
        &[".inc"]
    }

    fn get_compilation_commands(
        &self,
        source_filenames: &[String],
        executable_filename: &str,
        for_evaluation: bool,
    ) -> CompilationCommand {
        let mut argv = vec!["/usr/bin/fpc".to_string()];
        if for_evaluation {
            argv.push("-dEVAL".to_string());
        }
        argv.push("-XS".to_string());
        argv.push("-O2".to_string());
        argv.push(format!("-o{executable_filename}"));
        argv.extend(source_filenames.first().cloned());
        vec![CommandStep { argv }]
    }
}
