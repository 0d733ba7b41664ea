//! Audio extraction with quality fallback and an upload size ceiling.
//!
//! [`AudioFetcher`] owns the policy: try each quality in order, stage every
//! attempt in a fresh temporary directory under a random stem, reject files
//! above the platform's upload limit, and move the first acceptable file to
//! `<output_dir>/<request stem>/<sanitized title>.m4a`. The per-request
//! directory keeps concurrent fetches of the same video apart; [`release`]
//! removes it again. The actual download/transcode is
//! delegated to an [`AudioDownloader`]; [`YtDlp`] shells out to `yt-dlp`.
//!
//! [`release`]: MediaFetcher::release

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::process::Command;

use crate::config::MediaConfig;
use crate::media::link::sanitize_title;

/// Container produced by every download.
pub const AUDIO_EXT: &str = "m4a";

// ---------------------------------------------------------------------------
// MediaError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The downloader process exited unsuccessfully.
    #[error("downloader failed ({status}): {stderr}")]
    Downloader { status: String, stderr: String },

    /// The downloader reported success but produced no file.
    #[error("expected output not found: {0}")]
    MissingOutput(PathBuf),
}

// ---------------------------------------------------------------------------
// AudioQuality
// ---------------------------------------------------------------------------

/// Target audio bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioQuality {
    /// 192 kbit/s.
    High,
    /// 128 kbit/s.
    Low,
}

impl AudioQuality {
    pub fn kbps(self) -> &'static str {
        match self {
            AudioQuality::High => "192",
            AudioQuality::Low => "128",
        }
    }

    /// Qualities to try, starting with `self`.
    pub fn attempt_order(self) -> [AudioQuality; 2] {
        match self {
            AudioQuality::High => [AudioQuality::High, AudioQuality::Low],
            AudioQuality::Low => [AudioQuality::Low, AudioQuality::High],
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// URL → local audio file, or `None` when every attempt failed.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch_audio(&self, url: &str, quality: AudioQuality) -> Option<PathBuf>;

    /// Remove a file returned by [`fetch_audio`](Self::fetch_audio) once it
    /// has been uploaded. A file already gone is fine.
    async fn release(&self, path: &Path) {
        remove_quietly(path).await;
    }
}

/// Low-level download + transcode step.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    /// Title of the video behind `url`.
    async fn title(&self, url: &str) -> Result<String, MediaError>;

    /// Download `url` and convert it to `<stem>.m4a`.
    async fn download(&self, url: &str, quality: AudioQuality, stem: &Path) -> Result<(), MediaError>;
}

// ---------------------------------------------------------------------------
// YtDlp
// ---------------------------------------------------------------------------

/// Runs the `yt-dlp` executable (ffmpeg must be on `PATH` for conversion).
pub struct YtDlp {
    program: String,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, MediaError> {
        log::debug!("running {} {}", self.program, args.join(" "));
        let output = Command::new(&self.program).args(args).output().await?;
        if !output.status.success() {
            return Err(MediaError::Downloader {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl AudioDownloader for YtDlp {
    async fn title(&self, url: &str) -> Result<String, MediaError> {
        self.run(&["--no-warnings", "--skip-download", "--print", "title", url])
            .await
    }

    async fn download(&self, url: &str, quality: AudioQuality, stem: &Path) -> Result<(), MediaError> {
        let template = format!("{}.%(ext)s", stem.display());
        let bitrate = format!("{}K", quality.kbps());
        self.run(&[
            "--no-warnings",
            "-f",
            "m4a/bestaudio/best",
            "--extract-audio",
            "--audio-format",
            AUDIO_EXT,
            "--audio-quality",
            &bitrate,
            "-o",
            &template,
            url,
        ])
        .await
        .map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// AudioFetcher
// ---------------------------------------------------------------------------

pub struct AudioFetcher<D> {
    downloader: D,
    output_dir: PathBuf,
    max_bytes: u64,
}

impl AudioFetcher<YtDlp> {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(
            YtDlp::new(&config.downloader),
            config.output_dir(),
            config.max_upload_bytes,
        )
    }
}

impl<D: AudioDownloader> AudioFetcher<D> {
    pub fn new(downloader: D, output_dir: PathBuf, max_bytes: u64) -> Self {
        Self {
            downloader,
            output_dir,
            max_bytes,
        }
    }

    /// One attempt at one quality. `Ok(None)` means the result was too large.
    async fn attempt(&self, url: &str, quality: AudioQuality) -> Result<Option<PathBuf>, MediaError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        // Staging inside the output directory keeps the final rename on one
        // filesystem. Dropping the guard removes whatever is left behind.
        let staging = tempfile::Builder::new()
            .prefix("pal-dl-")
            .tempdir_in(&self.output_dir)?;
        let stem_name = random_stem();
        let stem = staging.path().join(&stem_name);

        let title = self.downloader.title(url).await?;
        log::info!("downloading \"{title}\" at {} kbit/s", quality.kbps());
        self.downloader.download(url, quality, &stem).await?;

        let extracted = stem.with_extension(AUDIO_EXT);
        let size = match tokio::fs::metadata(&extracted).await {
            Ok(meta) => meta.len(),
            Err(_) => return Err(MediaError::MissingOutput(extracted)),
        };
        log::debug!("converted file is {size} bytes");
        if size > self.max_bytes {
            log::info!(
                "{size} bytes exceeds the {} byte limit at {} kbit/s",
                self.max_bytes,
                quality.kbps()
            );
            return Ok(None);
        }

        let request_dir = self.output_dir.join(stem_name);
        tokio::fs::create_dir(&request_dir).await?;
        let destination = request_dir.join(file_name_for(&title));
        if let Err(e) = tokio::fs::rename(&extracted, &destination).await {
            let _ = tokio::fs::remove_dir(&request_dir).await;
            return Err(e.into());
        }
        Ok(Some(destination))
    }

    /// `true` when `dir` is a request directory created by this fetcher.
    fn is_request_dir(&self, dir: &Path) -> bool {
        dir.parent() == Some(self.output_dir.as_path())
    }
}

#[async_trait]
impl<D: AudioDownloader> MediaFetcher for AudioFetcher<D> {
    async fn fetch_audio(&self, url: &str, quality: AudioQuality) -> Option<PathBuf> {
        for quality in quality.attempt_order() {
            match self.attempt(url, quality).await {
                Ok(Some(path)) => return Some(path),
                Ok(None) => continue,
                Err(e) => log::warn!("audio fetch of {url} at {} kbit/s failed: {e}", quality.kbps()),
            }
        }
        log::warn!("all quality attempts failed for {url}");
        None
    }

    async fn release(&self, path: &Path) {
        remove_quietly(path).await;
        if let Some(dir) = path.parent().filter(|dir| self.is_request_dir(dir)) {
            match tokio::fs::remove_dir(dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("could not remove {}: {e}", dir.display()),
            }
        }
    }
}

/// `<sanitized title>.m4a`, reduced to a single path component.
fn file_name_for(title: &str) -> PathBuf {
    let name = sanitize_title(title);
    match Path::new(&name).file_name() {
        Some(file) => PathBuf::from(file).with_extension(AUDIO_EXT),
        None => PathBuf::from(format!("audio.{AUDIO_EXT}")),
    }
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not remove {}: {e}", path.display()),
    }
}

/// 64 hex characters derived from 32 random bytes.
fn random_stem() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("{:x}", Sha256::digest(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
