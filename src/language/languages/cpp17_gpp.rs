use crate::language::command::{CommandStep, CompilationCommand};
use crate::language::plugin::LanguagePlugin;

#[derive(Debug, Clone, Default)]
pub struct Cpp17Gpp;

impl LanguagePlugin for Cpp17Gpp {
    fn name(&self) -> &'static str {
        "C++17 / g++"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &[".cpp", ".cc", ".cxx", ".c++", ".C"]
    }

    fn header_extensions(&self) -> &'static [&'static str] {
        &[".h", ".hpp", ".hxx"]
    }

    fn object_extensions(&self) -> &'static [&'static str] {
        &[".o"]
    }

    fn get_compilation_commands(
        &self,
        source_filenames: &[String],
        executable_filename: &str,
        for_evaluation: bool,
    ) -> CompilationCommand {
        let mut argv = vec!["/usr/bin/g++".to_string()];
        if for_evaluation {
            argv.push("-DEVAL".to_string());
        }
        argv.extend(
            ["-std=gnu++17", "-O2", "-pipe", "-static", "-s", "-o"]
                .into_iter()
                .map(String::from),
        );
        argv.push(executable_filename.to_string());
        argv.extend(source_filenames.iter().cloned());
        vec![CommandStep { argv }]
    }
}
