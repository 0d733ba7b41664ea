//! Video-link detection and audio file naming.

use std::sync::LazyLock;

use regex::Regex;

static VIDEO_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.)?(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
    )
    .expect("valid video link pattern")
});

/// `true` when `text` contains a YouTube watch, short or embed link.
pub fn contains_video_link(text: &str) -> bool {
    VIDEO_LINK.is_match(text)
}

/// Canonical short URL for the first video link in `text`.
pub fn extract_video_url(text: &str) -> Option<String> {
    VIDEO_LINK
        .captures(text)
        .map(|caps| format!("https://youtu.be/{}", &caps[1]))
}

const DROPPED: &[char] = &['$', '(', ')', '{', '}', '[', ']', '.', ',', '\\', '\'', '"', '|', '\0'];

/// Turn a video title into a safe file stem: spaces and `/` become
/// underscores, everything lower-cased, and shell/markup punctuation dropped.
/// The result never contains a path separator.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !DROPPED.contains(c))
        .map(|c| if c == ' ' || c == '/' { '_' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_every_link_shape() {
        assert!(contains_video_link("get https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(contains_video_link("get youtu.be/dQw4w9WgXcQ please"));
        assert!(contains_video_link("https://youtube.com/embed/dQw4w9WgXcQ"));
        assert!(!contains_video_link("https://vimeo.com/123456"));
        assert!(!contains_video_link("youtu.be/short"));
    }

    #[test]
    fn extracts_canonical_url() {
        assert_eq!(
            extract_video_url("!get https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
            Some("https://youtu.be/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_video_url("no link"), None);
    }

    #[test]
    fn extracts_first_of_many() {
        let text = "youtu.be/AAAAAAAAAAA and youtu.be/BBBBBBBBBBB";
        assert_eq!(
            extract_video_url(text).as_deref(),
            Some("https://youtu.be/AAAAAAAAAAA")
        );
    }

    #[test]
    fn sanitizes_titles() {
        assert_eq!(
            sanitize_title("Rick Astley - Never Gonna Give You Up (Official Video) [4K]"),
            "rick_astley_-_never_gonna_give_you_up_official_video_4k"
        );
        assert_eq!(sanitize_title("$1,000 \"Deal\" | Ep. 3"), "1000_deal__ep_3");
    }

    #[test]
    fn separators_never_survive() {
        assert_eq!(sanitize_title("AC/DC - Thunderstruck"), "ac_dc_-_thunderstruck");
        assert_eq!(sanitize_title("/tmp/escape"), "_tmp_escape");
        assert_eq!(sanitize_title("..\\..\\boot\0"), "boot");
    }
}
