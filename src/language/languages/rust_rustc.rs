use crate::language::command::{CommandStep, CompilationCommand};
use crate::language::plugin::LanguagePlugin;

#[derive(Debug, Clone, Default)]
pub struct RustRustc;

impl LanguagePlugin for RustRustc {
    fn name(&self) -> &'static str {
        "Rust / rustc"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &[".rs"]
    }

    fn get_compilation_commands(
        &self,
        source_filenames: &[String],
        executable_filename: &str,
        for_evaluation: bool,
    ) -> CompilationCommand {
        let mut argv = vec!["/usr/bin/rustc".to_string()];
        if for_evaluation {
            argv.push("--cfg".to_string());
            argv.push("EVAL".to_string());
        }
        argv.extend(["--edition", "2021", "-O", "-o"].into_iter().map(String::from));
        argv.push(executable_filename.to_string());
        // Other modules are found by rustc through `mod` declarations
        argv.extend(source_filenames.first().cloned());
        vec![CommandStep { argv }]
    }
}
