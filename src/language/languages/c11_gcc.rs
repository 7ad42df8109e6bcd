use crate::language::command::{CommandStep, CompilationCommand};
use crate::language::plugin::LanguagePlugin;

#[derive(Debug, Clone, Default)]
pub struct C11Gcc;

impl LanguagePlugin for C11Gcc {
    fn name(&self) -> &'static str {
        "C11 / gcc"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &[".c"]
    }

    fn header_extensions(&self) -> &'static [&'static str] {
        &[".h"]
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
        let mut argv = vec!["/usr/bin/gcc".to_string()];
        if for_evaluation {
            argv.push("-DEVAL".to_string());
        }
        argv.extend(
            ["-std=gnu11", "-O2", "-pipe", "-static", "-s", "-o"]
                .into_iter()
                .map(String::from),
        );
        argv.push(executable_filename.to_string());
        argv.extend(source_filenames.iter().cloned());
        // libm has to come after the objects that use it
        argv.push("-lm".to_string());
        vec![CommandStep { argv }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_only_adds_the_define() {
        let sources = ["grader.c".to_string(), "sol.c".to_string()];
        let eval = C11Gcc.get_compilation_commands(&sources, "sol", true);
        let plain = C11Gcc.get_compilation_commands(&sources, "sol", false);
        assert_eq!(eval.len(), 1);
        let mut stripped = eval[0].argv.clone();
        stripped.retain(|token| token != "-DEVAL");
        assert_eq!(stripped, plain[0].argv);
        assert_eq!(plain[0].argv.last().map(String::as_str), Some("-lm"));
    }
}
