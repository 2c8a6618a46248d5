//! Configuration for template compilation

/// Configuration options for the template compiler
#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Drop the indentation and line break around a code block that sits
    /// alone on its line, so control flow leaves no blank lines behind
    pub trim_code_lines: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            trim_code_lines: true,
        }
    }
}

impl CompileConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether standalone code-block lines are trimmed
    pub fn with_trim_code_lines(mut self, trim: bool) -> Self {
        self.trim_code_lines = trim;
        self
    }
}
