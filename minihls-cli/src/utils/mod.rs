mod files;
mod headers;
pub mod progress;

// Export utility functions
pub use self::files::{create_dirs, default_output_name};
pub use self::headers::parse_headers;
