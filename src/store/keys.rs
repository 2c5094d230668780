//! Counter key derivation.
//!
//! Key namespaces:
//!
//! ```text
//! mpc:<filename>          hash: YYYYMMDD -> playcount
//! img:<digest(filename)>  hash: YYYYMMDD + cohort digit -> view count
//! com2yt:<filename>       string -> external video id
//! youtube:<video id>      hash: YYYYMMDDHHmmss -> cumulative count
//! ```
//!
//! The image family hashes the filename because the secondary store
//! restricts key character sets; the digest is the storage key only, never
//! shown to callers.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

pub const PLAY_PREFIX: &str = "mpc:";
pub const IMAGE_PREFIX: &str = "img:";
pub const VIDEO_MAP_PREFIX: &str = "com2yt:";
pub const YOUTUBE_PREFIX: &str = "youtube:";

/// Canonical entity identifier: spaces become underscores.
pub fn normalize(filename: &str) -> String {
    filename.replace(' ', "_")
}

/// Counter key for a playable media file.
pub fn play_key(filename: &str) -> String {
    format!("{PLAY_PREFIX}{}", normalize(filename))
}

/// Counter key for a static image file.
pub fn image_key(filename: &str) -> String {
    let digest = Sha256::digest(normalize(filename).as_bytes());
    format!("{IMAGE_PREFIX}{}", hex::encode(digest))
}

/// Mapping key from a file to its external video id.
pub fn video_map_key(filename: &str) -> String {
    format!("{VIDEO_MAP_PREFIX}{}", normalize(filename))
}

/// Counter key for an externally hosted video.
pub fn youtube_key(video_id: &str) -> String {
    format!("{YOUTUBE_PREFIX}{video_id}")
}

/// Hash field for one day, `YYYYMMDD`.
pub fn date_field(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Hash field for one day and image cohort, `YYYYMMDD` plus a digit.
pub fn cohort_field(date: NaiveDate, digit: u8) -> String {
    format!("{}{digit}", date_field(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_play_key_normalizes_spaces() {
        assert_eq!(
            play_key("Finally a video.webm"),
            "mpc:Finally_a_video.webm"
        );
    }

    #[test]
    fn test_image_key_is_fixed_width_digest() {
        let key = image_key("Not a video.jpg");
        assert!(key.starts_with(IMAGE_PREFIX));
        assert_eq!(key.len(), IMAGE_PREFIX.len() + 64);
        // Same entity regardless of space/underscore spelling
        assert_eq!(key, image_key("Not_a_video.jpg"));
    }

    #[test]
    fn test_date_fields() {
        let date = day("2015-01-05");
        assert_eq!(date_field(date), "20150105");
        assert_eq!(cohort_field(date, 3), "201501053");
    }
}
