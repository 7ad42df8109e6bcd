use crate::language::command::{CommandStep, CompilationCommand};
use crate::language::plugin::LanguagePlugin;

/// Assembly built by a script shipped with the task. Bash runs the first source as that script,
/// passing it the remaining sources and the executable name; the script assembles and links.
#[derive(Debug, Clone, Default)]
pub struct AssemblyNasm;

impl LanguagePlugin for AssemblyNasm {
    fn name(&self) -> &'static str {
        "Assembly_nasm"
    }

    fn source_extensions(&self) -> &'static [&'static str] {
        &[".asm", ".S"]
    }

    fn header_extensions(&self) -> &'static [&'static str] {
        &[".h", ".c", ".inc", ".sh"]
    }

    fn object_extensions(&self) -> &'static [&'static str] {
        &[".o"]
    }

    fn get_compilation_commands(
        &self,
        source_filenames: &[String],
        executable_filename: &str,
        _for_evaluation: bool,
    ) -> CompilationCommand {
        let mut argv = vec!["/bin/bash".to_string()];
        argv.extend(source_filenames.iter().cloned());
        argv.push(executable_filename.to_string());
        vec![CommandStep { argv }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegates_to_a_single_script_invocation() {
        let pipeline = AssemblyNasm.get_compilation_commands(&["sol.asm".to_string()], "sol", true);
        assert_eq!(pipeline, vec![CommandStep::new(["/bin/bash", "sol.asm", "sol"])]);
    }

    #[test]
    fn modes_do_not_differ() {
        let sources = ["grader.asm".to_string(), "sol.S".to_string()];
        assert_eq!(
            AssemblyNasm.get_compilation_commands(&sources, "sol", true),
            vec![CommandStep::new(["/bin/bash", "grader.asm", "sol.S", "sol"])]
        );
        assert_eq!(
            AssemblyNasm.get_compilation_commands(&sources, "sol", true),
            AssemblyNasm.get_compilation_commands(&sources, "sol", false)
        );
    }
}
