/// Name of the environment variable containing the path to the comparator
/// configuration file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/diffcmp/config.toml` or `$HOME/.config/diffcmp/config.toml`
///  (2) on Windows: `%APPDATA%\diffcmp\config.toml`
pub const ENV_CONFIG_PATH: &str = "DF_CONFIG_PATH";

/// Functions recognized as allocators unless configured otherwise.
pub const DEFAULT_ALLOCATORS: &[&str] = &["kmalloc", "kzalloc", "__kmalloc", "malloc"];

/// Functions recognized as memset-like primitives unless configured otherwise.
/// Entries also match their dotted overloads (`llvm.memset.p0.i64`).
pub const DEFAULT_MEMSET_FUNCTIONS: &[&str] = &["llvm.memset", "memset"];

/// Upper bound on compare/inline rounds for a single function pair.
pub const DEFAULT_MAX_INLINE_ATTEMPTS: usize = 16;
