// HLS download pipeline: variant selection, media playlist parsing, key
// resolution, AES-128 decryption and ordered assembly into one file.

pub mod assembler;
pub mod config;
pub mod decryption;
pub mod error;
pub mod events;
pub mod key;
pub mod media;
pub mod output;
pub mod url;
pub mod variant;

// Re-exports for easier access
pub use assembler::{Assembler, AssemblyReport, AssemblyState};
pub use config::HlsConfig;
pub use decryption::{DecryptionContext, IvSource, decrypt_segment};
pub use error::{CryptoErrorKind, HlsError, KeyErrorKind};
pub use events::{AssemblyEvent, OnEvent};
pub use media::{MediaPlaylistInfo, parse_media_playlist};
pub use output::OutputStream;
pub use variant::{QualityMetric, Variant, select_variant};
