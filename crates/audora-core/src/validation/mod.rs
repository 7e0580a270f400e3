//! Upload validation: filename/extension allow-list, declared size range,
//! and filename sanitization used by deterministic path derivation.

use crate::error::AppError;

/// Validate that the filename carries one of the allowed audio container
/// extensions. Returns the lowercase extension on success.
pub fn validate_audio_filename(
    filename: &str,
    allowed_extensions: &[String],
) -> Result<String, AppError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| {
            AppError::InvalidInput(format!("Missing file extension (filename: {})", filename))
        })?;

    if !allowed_extensions.iter().any(|a| a == &extension) {
        return Err(AppError::InvalidInput(format!(
            "Unsupported file format '{}'. Supported: {}",
            extension,
            allowed_extensions.join(", ").to_uppercase()
        )));
    }

    Ok(extension)
}

/// Validate that a declared upload size is in `0 < size <= max` bytes.
pub fn validate_declared_size(size: i64, max: i64) -> Result<(), AppError> {
    if size <= 0 || size > max {
        return Err(AppError::SizeOutOfRange { size, max });
    }
    Ok(())
}

/// Sanitize a filename stem for use in object paths and session IDs:
/// the extension is dropped, spaces become hyphens, everything is lowercased,
/// and characters outside `[a-z0-9-_]` are removed.
pub fn sanitize_filename(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);

    stem.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Map a filename to the content type the worker metadata carries.
pub fn content_type_for_filename(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "aiff" => "audio/aiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_UPLOAD_SIZE_BYTES;

    fn allowed() -> Vec<String> {
        crate::constants::ALLOWED_AUDIO_EXTENSIONS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn accepts_allowed_extensions_case_insensitive() {
        assert_eq!(
            validate_audio_filename("track.FLAC", &allowed()).unwrap(),
            "flac"
        );
        assert_eq!(
            validate_audio_filename("song.mp3", &allowed()).unwrap(),
            "mp3"
        );
    }

    #[test]
    fn rejects_disallowed_and_missing_extensions() {
        assert!(validate_audio_filename("track.ogg", &allowed()).is_err());
        assert!(validate_audio_filename("track", &allowed()).is_err());
        assert!(validate_audio_filename("track.", &allowed()).is_err());
    }

    #[test]
    fn size_boundaries() {
        // 0 < s <= 629145600, boundary values checked explicitly
        assert!(validate_declared_size(0, MAX_UPLOAD_SIZE_BYTES).is_err());
        assert!(validate_declared_size(1, MAX_UPLOAD_SIZE_BYTES).is_ok());
        assert!(validate_declared_size(629_145_600, MAX_UPLOAD_SIZE_BYTES).is_ok());
        assert!(validate_declared_size(629_145_601, MAX_UPLOAD_SIZE_BYTES).is_err());
        assert!(validate_declared_size(-1, MAX_UPLOAD_SIZE_BYTES).is_err());
    }

    #[test]
    fn size_out_of_range_carries_limits() {
        match validate_declared_size(629_145_601, MAX_UPLOAD_SIZE_BYTES) {
            Err(AppError::SizeOutOfRange { size, max }) => {
                assert_eq!(size, 629_145_601);
                assert_eq!(max, 629_145_600);
            }
            other => panic!("expected SizeOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn sanitizes_filename_stem() {
        assert_eq!(sanitize_filename("My Track (final).flac"), "my-track-final");
        assert_eq!(sanitize_filename("noext"), "noext");
        assert_eq!(sanitize_filename("under_score.wav"), "under_score");
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for_filename("a.flac"), "audio/flac");
        assert_eq!(content_type_for_filename("a.MP3"), "audio/mpeg");
        assert_eq!(content_type_for_filename("a.bin"), "application/octet-stream");
    }
}
