//! Audio conversion and splitting via ffmpeg.
//!
//! Produces the mono MP3 asset the transcription and diarization engines
//! consume from arbitrary input media (video or audio), and splits long
//! audio into offset-tagged parts for API transcription.

use crate::error::{Result, SkaldError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Derive the episode name from a media file path (stem, no extension).
pub fn episode_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Convert any input media to mono MP3 for the processing pipeline.
///
/// Video streams are discarded (`-vn`); existing output is reused.
#[instrument(skip(output_dir), fields(input = %input.display()))]
pub async fn convert_to_mp3(input: &Path, output_dir: &Path, bitrate: &str) -> Result<PathBuf> {
    if !input.exists() {
        return Err(SkaldError::MissingData(format!(
            "Input file not found: {}",
            input.display()
        )));
    }

    std::fs::create_dir_all(output_dir)?;
    let target = output_dir.join(format!("{}.mp3", episode_name(input)));

    if target.exists() {
        info!("Using cached converted audio");
        return Ok(target);
    }

    info!("Converting {} to MP3", input.display());

    let result = Command::new("ffmpeg")
        .arg("-i").arg(input)
        .arg("-vn")
        .arg("-ac").arg("1")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-b:a").arg(bitrate)
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(&target)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(target),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SkaldError::Audio(format!("ffmpeg conversion failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SkaldError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(SkaldError::Audio(format!("ffmpeg error: {e}"))),
    }
}

/// Segments a long audio file into smaller parts for API processing.
///
/// Returns (part_path, offset_seconds) tuples. Short audio is returned
/// as-is without splitting.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    debug!("Total audio duration: {:.1}s", total_duration);

    let chunk_len = chunk_seconds as f64;

    if total_duration <= chunk_len {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut parts = Vec::new();
    let mut offset = 0.0;
    let mut idx = 0u32;

    while offset < total_duration {
        let part_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        let part_len = chunk_len.min(total_duration - offset);

        extract_segment(source, &part_path, offset, part_len).await?;

        parts.push((part_path, offset));
        offset += chunk_len;
        idx += 1;
    }

    info!("Created {} audio parts", parts.len());
    Ok(parts)
}

/// Extracts a time segment from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    // First attempt: stream copy (fast, no quality loss)
    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Ok(status) = copy_result {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding segment");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SkaldError::Audio(format!("Segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SkaldError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(SkaldError::Audio(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of an audio file using ffprobe.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SkaldError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(SkaldError::Audio(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(SkaldError::Audio("ffprobe returned error".into()));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|_| SkaldError::Audio("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| SkaldError::Audio("Could not determine audio duration".into()))
}

/// Check whether a path looks like a media file Skald can ingest.
pub fn is_media_file(path: &Path) -> bool {
    const MEDIA_EXTENSIONS: &[&str] = &[
        "mp3", "wav", "m4a", "flac", "ogg", "opus", "mp4", "avi", "mov", "mkv", "webm",
    ];

    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MEDIA_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_name() {
        assert_eq!(episode_name(Path::new("/data/ep_01.mp4")), "ep_01");
        assert_eq!(episode_name(Path::new("interview.mp3")), "interview");
    }

    #[test]
    fn test_is_media_file() {
        assert!(is_media_file(Path::new("a.mp3")));
        assert!(is_media_file(Path::new("b.MP4")));
        assert!(!is_media_file(Path::new("notes.txt")));
        assert!(!is_media_file(Path::new("no_extension")));
    }

    #[tokio::test]
    async fn test_convert_missing_input_is_missing_data() {
        let err = convert_to_mp3(
            Path::new("/nonexistent/audio.mp4"),
            Path::new("/tmp"),
            "192k",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SkaldError::MissingData(_)));
    }
}
