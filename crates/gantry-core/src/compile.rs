//! Compiler seam.
//!
//! Component sources are compiled by a collaborator; the build pipeline
//! only hands it the source tree, the merged libraries, and an output
//! directory. [`CommandCompiler`] adapts any `javac`-style executable.

use std::path::Path;
use std::process::Command;

use anyhow::Context;

use crate::error::GantryError;
use crate::launch::CLASSPATH_SEPARATOR;
use crate::library::LibraryFile;

/// Trait for compiling one component's sources.
pub trait Compiler: Send + Sync {
    /// Compile `source_dir` against `libraries`, writing class output
    /// under `out_dir`. Returning an error fails the whole bundle build.
    fn compile(
        &self,
        source_dir: &Path,
        out_dir: &Path,
        libraries: &[LibraryFile],
    ) -> anyhow::Result<()>;
}

/// Compiler that shells out to a `javac`-style executable:
/// `<program> -cp <libraries> -d <out_dir> <sources...>`.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    source_extension: String,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            source_extension: "java".to_string(),
        }
    }

    /// Override the source file extension the compiler picks up.
    pub fn with_source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = extension.into();
        self
    }
}

impl Compiler for CommandCompiler {
    fn compile(
        &self,
        source_dir: &Path,
        out_dir: &Path,
        libraries: &[LibraryFile],
    ) -> anyhow::Result<()> {
        let sources = crate::fs::collect_by_extension(source_dir, &self.source_extension)?;
        if sources.is_empty() {
            return Err(GantryError::input(format!(
                "no .{} sources under {}",
                self.source_extension,
                source_dir.display()
            ))
            .into());
        }

        let mut command = Command::new(&self.program);
        if !libraries.is_empty() {
            let classpath = libraries
                .iter()
                .map(|l| l.path.display().to_string())
                .collect::<Vec<_>>()
                .join(&CLASSPATH_SEPARATOR.to_string());
            command.arg("-cp").arg(classpath);
        }
        command.arg("-d").arg(out_dir);
        command.args(&sources);

        let output = command
            .output()
            .with_context(|| format!("Failed to invoke compiler: {}", self.program))?;
        if !output.status.success() {
            anyhow::bail!(
                "compiler exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}
