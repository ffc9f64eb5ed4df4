use std::path::PathBuf;
use std::sync::Arc;

/// Progress notifications emitted while an assembly runs.
#[derive(Debug, Clone)]
pub enum AssemblyEvent {
    VariantSelected {
        url: String,
    },
    PlaylistParsed {
        segments: usize,
        encrypted: bool,
    },
    KeyResolved {
        key_url: String,
        declared_iv: bool,
    },
    SegmentWritten {
        index: usize,
        total: usize,
        bytes: usize,
    },
    Finished {
        path: PathBuf,
        segments: usize,
        bytes_written: u64,
    },
}

pub type OnEvent = Arc<dyn Fn(AssemblyEvent) + Send + Sync>;
