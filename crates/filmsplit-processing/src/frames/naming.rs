//! Output file naming.
//!
//! Frames are named `<stem>-out<N>.png` with `N` counting from 1. The staging
//! directory can hold files from other jobs, so a file only belongs to a job if
//! its whole name matches that job's pattern.

/// Token separating the job stem from the frame index.
pub const FRAME_TOKEN: &str = "-out";

/// Image extension of extracted frames.
pub const FRAME_EXTENSION: &str = ".png";

pub const FRAME_CONTENT_TYPE: &str = "image/png";

/// Output pattern handed to the extractor, with a `%d` frame-number placeholder.
///
/// A literal `%` in the stem is doubled so ffmpeg does not read it as a directive.
pub fn output_pattern(stem: &str) -> String {
    format!(
        "{}{}%d{}",
        stem.replace('%', "%%"),
        FRAME_TOKEN,
        FRAME_EXTENSION
    )
}

pub fn frame_file_name(stem: &str, index: u64) -> String {
    format!("{}{}{}{}", stem, FRAME_TOKEN, index, FRAME_EXTENSION)
}

/// Frame number encoded in `file_name`, if it is one of `stem`'s frames.
pub fn frame_index(file_name: &str, stem: &str) -> Option<u64> {
    let digits = file_name
        .strip_prefix(stem)?
        .strip_prefix(FRAME_TOKEN)?
        .strip_suffix(FRAME_EXTENSION)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Whether `file_name` is a frame produced for the job with file stem `stem`.
pub fn is_job_output(file_name: &str, stem: &str) -> bool {
    frame_index(file_name, stem).is_some()
}
