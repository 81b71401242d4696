/// Resource limits shared by the front end and both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Combined budget for code bytes and operand stack cells.
    pub memory_size: usize,
    /// Deepest recursion allowed while parsing, generating code or interpreting.
    pub max_depth: usize,
}

impl Config {
    pub const DEFAULT_MEMORY_SIZE: usize = 1024;
    pub const DEFAULT_MAX_DEPTH: usize = 512;

    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_size: Self::DEFAULT_MEMORY_SIZE,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
