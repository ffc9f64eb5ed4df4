//! Download pipeline: master playlist → variant → media playlist → key →
//! segments → output file.
//!
//! The [`Assembler`] walks through [`AssemblyState`]s in order and stops at
//! the first error. Nothing is retried or skipped; segments already written
//! stay on disk when a later one fails.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{StreamExt, stream};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::hls::HlsError;
use crate::hls::config::HlsConfig;
use crate::hls::decryption::{DecryptionContext, IvSource};
use crate::hls::error::KeyErrorKind;
use crate::hls::events::{AssemblyEvent, OnEvent};
use crate::hls::key::{resolve_iv, resolve_key};
use crate::hls::media::{MediaPlaylistInfo, is_media_playlist, parse_media_playlist};
use crate::hls::output::OutputStream;
use crate::hls::url::{resolve_segment_url, resolve_variant_url};
use crate::hls::variant::{is_master_playlist, select_variant};
use crate::session::Fetcher;

const SUPPORTED_METHOD: &str = "AES-128";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
    Init,
    VariantResolved,
    PlaylistParsed,
    KeyResolved,
    /// Writing segment `i`
    Streaming(usize),
    Done,
    Failed,
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub media_playlist_url: Url,
    pub path: PathBuf,
    pub segments: usize,
    pub bytes_written: u64,
    pub encrypted: bool,
}

pub struct Assembler<'a> {
    fetcher: &'a dyn Fetcher,
    config: HlsConfig,
    on_event: Option<OnEvent>,
    state: AssemblyState,
}

impl<'a> Assembler<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, config: HlsConfig) -> Self {
        Self {
            fetcher,
            config,
            on_event: None,
            state: AssemblyState::Init,
        }
    }

    pub fn with_event_handler(mut self, on_event: OnEvent) -> Self {
        self.on_event = Some(on_event);
        self
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    fn transition(&mut self, next: AssemblyState) {
        debug!(from = ?self.state, to = ?next, "Assembly state change");
        self.state = next;
    }

    fn emit(&self, event: AssemblyEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(event);
        }
    }

    /// Run the whole pipeline for `master_url`, writing to `output_path`.
    pub async fn run(
        &mut self,
        master_url: &str,
        output_path: impl AsRef<Path>,
    ) -> Result<AssemblyReport, HlsError> {
        let result = self.run_inner(master_url, output_path.as_ref()).await;
        if let Err(e) = &result {
            error!(state = ?self.state, error = %e, "Assembly failed");
            self.transition(AssemblyState::Failed);
        }
        result
    }

    async fn run_inner(
        &mut self,
        master_url: &str,
        output_path: &Path,
    ) -> Result<AssemblyReport, HlsError> {
        let master_url = Url::parse(master_url.trim())
            .map_err(|e| HlsError::Url(format!("{master_url}: {e}")))?;

        let (media_url, media_text) = self.resolve_variant(&master_url).await?;
        let info = parse_media_playlist(&media_text);
        info!(
            segments = info.segments.len(),
            encrypted = info.is_encrypted(),
            "Parsed media playlist"
        );
        self.transition(AssemblyState::PlaylistParsed);
        self.emit(AssemblyEvent::PlaylistParsed {
            segments: info.segments.len(),
            encrypted: info.is_encrypted(),
        });

        let decryption = self.resolve_decryption(&info, &media_url).await?;

        let mut output = OutputStream::create(output_path).await?;
        if let Err(e) = self
            .stream_segments(&info, &media_url, decryption.as_ref(), &mut output)
            .await
        {
            warn!(
                path = %output.path().display(),
                segments = output.segments_written(),
                bytes = output.bytes_written(),
                "Leaving partial output on disk"
            );
            // The segment error is what gets reported.
            let _ = output.finish().await;
            return Err(e);
        }

        let segments = output.segments_written();
        let bytes_written = output.finish().await?;
        self.transition(AssemblyState::Done);
        info!(
            path = %output_path.display(),
            segments,
            bytes = bytes_written,
            "Assembly complete"
        );
        self.emit(AssemblyEvent::Finished {
            path: output_path.to_path_buf(),
            segments,
            bytes_written,
        });

        Ok(AssemblyReport {
            media_playlist_url: media_url,
            path: output_path.to_path_buf(),
            segments,
            bytes_written,
            encrypted: decryption.is_some(),
        })
    }

    async fn fetch_text(&self, url: &Url) -> Result<String, HlsError> {
        let body = self.fetcher.fetch(url).await?;
        String::from_utf8(body.to_vec())
            .map_err(|e| HlsError::Parse(format!("playlist {url} is not valid UTF-8: {e}")))
    }

    /// Fetch the master playlist and pick the media playlist to download.
    /// Returns the media playlist URL and its text.
    async fn resolve_variant(&mut self, master_url: &Url) -> Result<(Url, String), HlsError> {
        info!(url = %master_url, "Analysing master playlist");
        let master_text = self.fetch_text(master_url).await?;

        let resolved = if !is_master_playlist(&master_text) && is_media_playlist(&master_text) {
            info!("Input is already a media playlist, skipping variant selection");
            (master_url.clone(), master_text)
        } else {
            let variant = select_variant(&master_text)?;
            let media_url = resolve_variant_url(master_url, &variant.uri)?;
            info!(url = %media_url, metric = ?variant.metric, "Selected variant");
            let media_text = self.fetch_text(&media_url).await?;
            (media_url, media_text)
        };

        self.transition(AssemblyState::VariantResolved);
        self.emit(AssemblyEvent::VariantSelected {
            url: resolved.0.to_string(),
        });
        Ok(resolved)
    }

    /// Resolve key and IV. `None` means the stream is written as fetched.
    async fn resolve_decryption(
        &mut self,
        info: &MediaPlaylistInfo,
        media_url: &Url,
    ) -> Result<Option<DecryptionContext>, HlsError> {
        if !info.is_encrypted() {
            info!("No encryption key declared, segments are written unmodified");
            return Ok(None);
        }

        if let Some(method) = info.method.as_deref() {
            if !method.eq_ignore_ascii_case(SUPPORTED_METHOD) {
                return Err(HlsError::Key(KeyErrorKind::UnsupportedMethod(
                    method.to_string(),
                )));
            }
        }

        let key = resolve_key(self.fetcher, &info.key_uri, media_url).await?;
        let iv = IvSource::from(resolve_iv(&info.iv)?);
        if iv == IvSource::KeyAsIv {
            debug!("No IV declared, using the key as IV");
        }

        self.transition(AssemblyState::KeyResolved);
        self.emit(AssemblyEvent::KeyResolved {
            key_url: info.key_uri.clone(),
            declared_iv: matches!(iv, IvSource::Declared(_)),
        });
        Ok(Some(DecryptionContext::new(key, iv)))
    }

    /// Fetch, decrypt and append every segment in playlist order.
    ///
    /// Up to `download_concurrency` segments are in flight at once, but
    /// results are consumed in order so the file is always written
    /// sequentially.
    async fn stream_segments(
        &mut self,
        info: &MediaPlaylistInfo,
        media_url: &Url,
        decryption: Option<&DecryptionContext>,
        output: &mut OutputStream,
    ) -> Result<(), HlsError> {
        let total = info.segments.len();
        if total == 0 {
            warn!(url = %media_url, "Media playlist lists no segments");
            return Ok(());
        }

        let fetcher = self.fetcher;
        let offload = self.config.offload_decryption;
        let concurrency = self.config.download_concurrency.max(1);
        info!(total, concurrency, "Downloading segments");

        let jobs = info.segments.iter().enumerate().map(|(index, uri)| {
            let decryption = decryption.cloned();
            async move {
                let url = resolve_segment_url(media_url, uri)?;
                let data = fetch_segment(fetcher, &url, decryption, offload)
                    .await
                    .inspect_err(|e| {
                        error!(index, url = %url, error = %e, "Segment failed");
                    })?;
                Ok::<_, HlsError>((index, data))
            }
        });
        let mut results = stream::iter(jobs).buffered(concurrency);

        while let Some(result) = results.next().await {
            let (index, data) = result?;
            self.transition(AssemblyState::Streaming(index));
            output.append(&data).await?;
            debug!(index, bytes = data.len(), "Segment written");
            self.emit(AssemblyEvent::SegmentWritten {
                index,
                total,
                bytes: data.len(),
            });
        }
        Ok(())
    }
}

async fn fetch_segment(
    fetcher: &dyn Fetcher,
    url: &Url,
    decryption: Option<DecryptionContext>,
    offload: bool,
) -> Result<Bytes, HlsError> {
    let raw = fetcher.fetch(url).await?;
    let Some(context) = decryption else {
        return Ok(raw);
    };

    let plaintext = if offload {
        tokio::task::spawn_blocking(move || context.decrypt(&raw))
            .await
            .map_err(|e| HlsError::Internal(format!("decryption task failed: {e}")))??
    } else {
        context.decrypt(&raw)?
    };
    Ok(Bytes::from(plaintext))
}
