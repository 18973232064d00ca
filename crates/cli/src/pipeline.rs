//! Pipeline for processing Cypress files.
//!
//! Severity model: syntax errors that leave nothing to analyze and
//! internal failures abort immediately. Everything else accumulates
//! across the whole run and is printed once, in source-position order,
//! so one bad name does not hide the type error three lines below it.
//! `check` exits nonzero on any error (or, with `--strict`, on any
//! warning); `build` additionally refuses to write output files when
//! errors are present.

use cypress_codegen::emit;
use cypress_parser::{analyze, AnalyzeOutput, CypressError, DiagnosticCollector, Severity};
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug)]
pub enum PipelineError {
    Io(std::io::Error),
    /// Nothing could be parsed at all.
    Syntax(CypressError),
    /// Diagnostics were printed; the count is for the exit message.
    Rejected(usize),
    Codegen(cypress_codegen::CodegenError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Io(e) => write!(f, "I/O error: {}", e),
            PipelineError::Syntax(e) => write!(f, "{}", e),
            PipelineError::Rejected(count) => {
                write!(f, "compilation failed with {} problem(s)", count)
            }
            PipelineError::Codegen(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        PipelineError::Io(error)
    }
}

impl From<CypressError> for PipelineError {
    fn from(error: CypressError) -> Self {
        PipelineError::Syntax(error)
    }
}

impl From<cypress_codegen::CodegenError> for PipelineError {
    fn from(error: cypress_codegen::CodegenError) -> Self {
        PipelineError::Codegen(error)
    }
}

/// Analyze one file and print its diagnostics in position order.
/// Returns the analysis and the number of blocking problems.
fn analyze_file(path: &Path, strict: bool) -> PipelineResult<(AnalyzeOutput<'static>, usize)> {
    let source = fs::read_to_string(path)?;
    let output = analyze(&source)?;

    let mut collector = DiagnosticCollector::new();
    for diagnostic in &output.diagnostics {
        collector.report(diagnostic.clone());
    }
    let blocking = if strict {
        collector.error_count() + collector.warning_count()
    } else {
        collector.error_count()
    };
    for diagnostic in collector.into_sorted() {
        let stream_line = format!("{}: {}", path.display(), diagnostic.render());
        if diagnostic.severity >= Severity::Error {
            eprintln!("{}", stream_line);
        } else {
            println!("{}", stream_line);
        }
    }
    Ok((output, blocking))
}

/// Check a Cypress file for errors without generating code.
pub fn check_file(path: &Path, strict: bool) -> PipelineResult<()> {
    let (_, blocking) = analyze_file(path, strict)?;
    if blocking > 0 {
        return Err(PipelineError::Rejected(blocking));
    }
    Ok(())
}

/// Compile a Cypress file to `<stem>.h` and `<stem>.c`.
pub fn build_file(path: &Path, out_dir: Option<&Path>) -> PipelineResult<()> {
    let (output, blocking) = analyze_file(path, false)?;
    if blocking > 0 {
        return Err(PipelineError::Rejected(blocking));
    }

    let stem = module_name(path);
    let c_output = emit(output.module, &output.symbols, &stem)?;

    let dir: PathBuf = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
    };
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(format!("{}.h", stem)), &c_output.header)?;
    fs::write(dir.join(format!("{}.c", stem)), &c_output.source)?;
    Ok(())
}

/// Module name from the file stem, restricted to C-safe characters.
fn module_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string());
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true) {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_names_are_c_safe() {
        assert_eq!(module_name(Path::new("src/hello-world.cy")), "hello_world");
        assert_eq!(module_name(Path::new("3d.cy")), "_3d");
    }
}
