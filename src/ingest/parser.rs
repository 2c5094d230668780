//! Log-line classification and decoding.
//!
//! Mediacounts lines are tab-separated with at least 17 positional columns.
//! Column 0 is the request path; the remaining designated columns are
//! counts, where `-` (or an empty column) means no data. Only paths shaped
//! like `/wikipedia/commons/<x>/<xy>/<name>` are media records; everything
//! else in the log is skipped without comment.

use percent_encoding::percent_decode_str;

use crate::error::{AppError, Result};
use crate::models::{CohortCounts, LineRecord, MediaCounts, is_playable};

const PATH_SEGMENTS: usize = 6;
const SITE_SEGMENT: &str = "wikipedia";
const REPO_SEGMENT: &str = "commons";
const PLACEHOLDER: &str = "-";

// Designated columns, 0-indexed.
const COL_PATH: usize = 0;
const COL_TOTAL_TRANSFERS: usize = 2;
const COL_ORIGINAL: usize = 3;
const COL_TRANSCODED_AUDIO: usize = 4;
const COL_IMAGE_TRANSFERS: usize = 5;
const COL_IMAGE_ORIGINAL: usize = 7;
const COL_IMAGE_SMALL: usize = 9;
const COL_IMAGE_MEDIUM: usize = 11;
const COL_IMAGE_LARGE: usize = 13;
const COL_TRANSCODED_MOVIE: usize = 16;

/// Classify one raw log line.
///
/// `Ok(None)` means the line is not a media record worth counting; `Err`
/// means a designated count column held something other than a number or
/// the no-data placeholder.
pub fn parse(line: &str) -> Result<Option<LineRecord>> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 2 {
        // Not a real record
        return Ok(None);
    }

    let Some(filename) = media_filename(fields[COL_PATH]) else {
        return Ok(None);
    };

    if fields.len() <= COL_TRANSCODED_MOVIE {
        // Media-shaped path but a truncated record
        return Ok(None);
    }

    let playable_total = count_at(&fields, COL_ORIGINAL)?
        + count_at(&fields, COL_TRANSCODED_AUDIO)?
        + count_at(&fields, COL_TRANSCODED_MOVIE)?;

    // A dead day for the file produces no increment at all.
    if playable_total == 0
        && count_at(&fields, COL_TOTAL_TRANSFERS)? == 0
        && count_at(&fields, COL_IMAGE_TRANSFERS)? == 0
    {
        return Ok(None);
    }

    if is_playable(&filename) {
        if playable_total == 0 {
            return Ok(None);
        }
        return Ok(Some(LineRecord {
            filename,
            counts: MediaCounts::Playable(playable_total),
        }));
    }

    let cohorts = CohortCounts {
        original: count_at(&fields, COL_IMAGE_ORIGINAL)?,
        small: count_at(&fields, COL_IMAGE_SMALL)?,
        medium: count_at(&fields, COL_IMAGE_MEDIUM)?,
        large: count_at(&fields, COL_IMAGE_LARGE)?,
    };
    if cohorts.is_zero() {
        return Ok(None);
    }
    Ok(Some(LineRecord {
        filename,
        counts: MediaCounts::Image(cohorts),
    }))
}

/// Recover the human filename from a media request path, or `None` when the
/// path does not match the two-level hashed directory sharding.
fn media_filename(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() != PATH_SEGMENTS {
        return None;
    }
    if segments[1] != SITE_SEGMENT || segments[2] != REPO_SEGMENT {
        return None;
    }
    if segments[3].len() != 1 || segments[4].len() != 2 {
        return None;
    }
    Some(decode_filename(segments[5]))
}

/// Percent-decode a path segment, with `+` as a literal space.
fn decode_filename(raw: &str) -> String {
    let plus_as_space = raw.replace('+', " ");
    percent_decode_str(&plus_as_space)
        .decode_utf8_lossy()
        .into_owned()
}

fn count_at(fields: &[&str], column: usize) -> Result<u64> {
    let raw = fields[column];
    if raw.is_empty() || raw == PLACEHOLDER {
        return Ok(0);
    }
    raw.parse().map_err(|_| AppError::BadCount {
        column,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a 17-column line with the given path and sparse column values.
    fn line(path: &str, columns: &[(usize, &str)]) -> String {
        let mut fields = vec![""; 17];
        fields[0] = path;
        for &(idx, value) in columns {
            fields[idx] = value;
        }
        fields.join("\t")
    }

    #[test]
    fn test_short_line_is_not_a_record() {
        assert_eq!(parse("just one field").unwrap(), None);
        assert_eq!(parse("").unwrap(), None);
    }

    #[test]
    fn test_non_media_path_yields_nothing() {
        let line = line(
            "/math/0/0/0/abcdefghijklmnopqrstuvwxyz.png",
            &[(3, "22222222"), (4, "555"), (16, "4444")],
        );
        assert_eq!(parse(&line).unwrap(), None);
    }

    #[test]
    fn test_wrong_shard_widths_yield_nothing() {
        let line = line(
            "/wikipedia/commons/ab/c/Finally+a+video.webm",
            &[(3, "10"), (16, "4444")],
        );
        assert_eq!(parse(&line).unwrap(), None);
    }

    #[test]
    fn test_playable_sums_three_columns() {
        let line = line(
            "/wikipedia/commons/a/bc/Finally+a+video.webm",
            &[(3, "578345"), (4, "1234"), (16, "4444")],
        );
        let record = parse(&line).unwrap().unwrap();
        assert_eq!(record.filename, "Finally a video.webm");
        assert_eq!(record.counts, MediaCounts::Playable(583_923));
    }

    #[test]
    fn test_placeholder_columns_read_as_zero() {
        let line = line(
            "/wikipedia/commons/a/bc/Quiet+song.ogg",
            &[(3, "-"), (4, "77"), (16, "-")],
        );
        let record = parse(&line).unwrap().unwrap();
        assert_eq!(record.counts, MediaCounts::Playable(77));
    }

    #[test]
    fn test_all_placeholder_counts_yield_nothing() {
        let line = line(
            "/wikipedia/commons/a/bc/Quiet+song.ogg",
            &[(2, "-"), (3, "-"), (4, "-"), (5, "-"), (16, "-")],
        );
        assert_eq!(parse(&line).unwrap(), None);
    }

    #[test]
    fn test_malformed_count_is_a_hard_error() {
        let line = line(
            "/wikipedia/commons/a/bc/Finally+a+video.webm",
            &[(3, "57x345"), (4, "1234"), (16, "4444")],
        );
        assert!(matches!(
            parse(&line),
            Err(AppError::BadCount { column: 3, .. })
        ));
    }

    #[test]
    fn test_static_image_reads_cohorts() {
        let line = line(
            "/wikipedia/commons/0/00/Not+a+video.jpg",
            &[(2, "120"), (7, "11"), (9, "22"), (11, "33"), (13, "44")],
        );
        let record = parse(&line).unwrap().unwrap();
        assert_eq!(record.filename, "Not a video.jpg");
        assert_eq!(
            record.counts,
            MediaCounts::Image(CohortCounts {
                original: 11,
                small: 22,
                medium: 33,
                large: 44,
            })
        );
    }

    #[test]
    fn test_static_image_with_zero_cohorts_yields_nothing() {
        let line = line(
            "/wikipedia/commons/0/00/Not+a+video.jpg",
            &[(2, "120"), (7, "0"), (9, "-")],
        );
        assert_eq!(parse(&line).unwrap(), None);
    }

    #[test]
    fn test_percent_decoding() {
        let line = line(
            "/wikipedia/commons/a/bc/100%25+cotton.webm",
            &[(3, "1")],
        );
        let record = parse(&line).unwrap().unwrap();
        assert_eq!(record.filename, "100% cotton.webm");
    }
}
