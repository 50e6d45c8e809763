//! Merged transcript export formatting (JSON, SRT, VTT).
//!
//! Subtitle formats carry the speaker label as a text prefix so that
//! speaker attribution survives export.

use super::{MergedTranscript, UNKNOWN_SPEAKER};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Srt,
    Vtt,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" | "webvtt" => Ok(OutputFormat::Vtt),
            _ => Err(format!("Unknown format: {}. Use json, srt, or vtt.", s)),
        }
    }
}

/// Format a merged transcript for output.
pub fn format_merged(transcript: &MergedTranscript, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(transcript).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Srt => format_srt(transcript),
        OutputFormat::Vtt => format_vtt(transcript),
    }
}

/// Cue text with speaker prefix; UNKNOWN segments stay unprefixed.
fn cue_text(speaker: &str, text: &str) -> String {
    if speaker == UNKNOWN_SPEAKER {
        text.to_string()
    } else {
        format!("{}: {}", speaker, text)
    }
}

/// Format as SRT (SubRip).
fn format_srt(transcript: &MergedTranscript) -> String {
    let mut output = String::new();

    for (i, segment) in transcript.segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end)
        ));
        output.push_str(&cue_text(&segment.speaker, &segment.text));
        output.push_str("\n\n");
    }

    output
}

/// Format as WebVTT.
fn format_vtt(transcript: &MergedTranscript) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for (i, segment) in transcript.segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_timestamp(segment.start),
            format_vtt_timestamp(segment.end)
        ));
        output.push_str(&cue_text(&segment.speaker, &segment.text));
        output.push_str("\n\n");
    }

    output
}

/// Format timestamp for SRT (00:00:00,000).
fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, ms)
}

/// Format timestamp for VTT (00:00:00.000).
fn format_vtt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0) as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::MergedSegment;

    fn sample_merged() -> MergedTranscript {
        MergedTranscript {
            file: "ep1.mp3".to_string(),
            language: "en".to_string(),
            num_speakers: 2,
            speakers: vec!["SPEAKER_00".to_string(), "SPEAKER_01".to_string()],
            segments: vec![
                MergedSegment {
                    start: 0.0,
                    end: 2.5,
                    text: "Hello world.".to_string(),
                    speaker: "SPEAKER_00".to_string(),
                    words: None,
                },
                MergedSegment {
                    start: 2.5,
                    end: 5.0,
                    text: "This is a test.".to_string(),
                    speaker: UNKNOWN_SPEAKER.to_string(),
                    words: None,
                },
            ],
        }
    }

    #[test]
    fn test_format_json() {
        let json = format_merged(&sample_merged(), OutputFormat::Json);
        assert!(json.contains("\"file\": \"ep1.mp3\""));
        assert!(json.contains("SPEAKER_00"));
    }

    #[test]
    fn test_format_srt_with_speaker_prefix() {
        let srt = format_merged(&sample_merged(), OutputFormat::Srt);
        assert!(srt.contains("1\n00:00:00,000 --> 00:00:02,500"));
        assert!(srt.contains("SPEAKER_00: Hello world."));
        // UNKNOWN stays unprefixed
        assert!(srt.contains("\nThis is a test.\n"));
    }

    #[test]
    fn test_format_vtt() {
        let vtt = format_merged(&sample_merged(), OutputFormat::Vtt);
        assert!(vtt.starts_with("WEBVTT"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:02.500"));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("srt".parse::<OutputFormat>().unwrap(), OutputFormat::Srt);
        assert_eq!("webvtt".parse::<OutputFormat>().unwrap(), OutputFormat::Vtt);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }
}
