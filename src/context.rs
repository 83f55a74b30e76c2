//! Explicit execution context threaded through every component constructor.
//!
//! The original tool family kept the command line and a handful of mode
//! flags as process-global state. Here that state is an ordinary value:
//! built once at the CLI boundary and passed by reference into whatever
//! needs it, so library code never reaches for an ambient global.

/// Crate version string injected into `##gvcftools_version` header lines.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct Context {
    /// Full command line, space-joined, for the `##gvcftools_cmdline` header.
    pub cmdline: String,
    pub version: &'static str,
    /// Suppress all header output (consume and discard every header line);
    /// used when only the first of several concatenated gvcftools streams
    /// should carry a header.
    pub is_skip_header: bool,
    /// Permissive position ordering: drop regressive records instead of failing.
    pub is_murdock_mode: bool,
}

impl Context {
    pub fn new(cmdline: String) -> Self {
        Self {
            cmdline,
            version: VERSION,
            is_skip_header: false,
            is_murdock_mode: false,
        }
    }

    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Self {
        Self::new(args.into_iter().collect::<Vec<_>>().join(" "))
    }

    pub fn with_skip_header(mut self, skip: bool) -> Self {
        self.is_skip_header = skip;
        self
    }

    pub fn with_murdock_mode(mut self, murdock: bool) -> Self {
        self.is_murdock_mode = murdock;
        self
    }
}
