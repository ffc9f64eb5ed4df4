use indicatif::{ProgressBar, ProgressStyle};
use minihls_engine::hls::AssemblyEvent;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

fn download_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {msg}\n[{elapsed_precise}] [{bar:40.green/white}] {pos}/{len} segments")
        .unwrap()
        .progress_chars("=> ")
}

/// Drives one progress bar from assembler events.
#[derive(Clone)]
pub struct ProgressManager {
    bar: Arc<Mutex<Option<ProgressBar>>>,
    bytes: Arc<Mutex<u64>>,
    disabled: bool,
}

impl ProgressManager {
    pub fn new() -> Self {
        Self {
            bar: Arc::new(Mutex::new(None)),
            bytes: Arc::new(Mutex::new(0)),
            disabled: false,
        }
    }

    pub fn new_disabled() -> Self {
        Self {
            disabled: true,
            ..Self::new()
        }
    }

    pub fn handle_event(&self, event: AssemblyEvent) {
        if self.disabled {
            return;
        }

        let mut bar = self.bar.lock().unwrap();
        match event {
            AssemblyEvent::PlaylistParsed { segments, .. } => {
                let new_bar = ProgressBar::new(segments as u64);
                new_bar.set_style(download_style());
                new_bar.set_message("Downloading segments");
                new_bar.enable_steady_tick(Duration::from_millis(500));
                *bar = Some(new_bar);
            }
            AssemblyEvent::SegmentWritten { bytes, .. } => {
                let mut total = self.bytes.lock().unwrap();
                *total += bytes as u64;
                if let Some(bar) = bar.as_ref() {
                    bar.inc(1);
                    bar.set_message(format!("Downloaded {}", indicatif::HumanBytes(*total)));
                }
            }
            AssemblyEvent::Finished { path, .. } => {
                if let Some(bar) = bar.take() {
                    bar.finish_with_message(format!("Finished {}", path.to_string_lossy()));
                }
            }
            AssemblyEvent::VariantSelected { .. } | AssemblyEvent::KeyResolved { .. } => {}
        }
    }

    /// Stop the bar without marking it finished, e.g. after an error.
    pub fn abandon(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.abandon();
        }
    }
}
