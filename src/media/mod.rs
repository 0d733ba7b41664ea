//! Audio extraction for the music channel.

pub mod fetcher;
pub mod link;

pub use fetcher::{AudioDownloader, AudioFetcher, AudioQuality, MediaError, MediaFetcher, YtDlp, AUDIO_EXT};
pub use link::{contains_video_link, extract_video_url, sanitize_title};
