use crate::{Error, Result};
use fileserver_core::VideoMeta;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub duration_secs: i64,
    pub width: i64,
    pub height: i64,
}

impl ProbeResult {
    pub fn into_meta(self, thumbnail_path: Option<String>) -> VideoMeta {
        VideoMeta {
            duration_secs: self.duration_secs,
            width: self.width,
            height: self.height,
            thumbnail_path,
        }
    }
}

/// Shells out to ffprobe/ffmpeg for stream metadata and thumbnails.
pub struct VideoProcessor {
    thumbnail_size: String,
}

impl VideoProcessor {
    pub fn new(thumbnail_size: String) -> Self {
        Self { thumbnail_size }
    }

    /// Probe a stored file for its first video stream.
    pub async fn probe(&self, path: &Path) -> Result<ProbeResult> {
        debug!("Probing video file: {:?}", path);

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| Error::ToolUnavailable(format!("ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(Error::ProbeFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&json, &path.display().to_string())
    }

    /// Grab a single frame one second in and scale it down to a jpeg.
    pub async fn thumbnail(&self, input: &Path, output: &Path) -> Result<()> {
        info!("Generating thumbnail for {:?} -> {:?}", input, output);

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let scale = scale_filter(&self.thumbnail_size);
        let result = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-ss", "1"])
            .arg("-i")
            .arg(input)
            .args(["-vframes", "1", "-vf", &scale])
            .arg(output)
            .output()
            .await
            .map_err(|e| Error::ToolUnavailable(format!("ffmpeg: {}", e)))?;

        if !result.status.success() {
            return Err(Error::ThumbnailFailed(
                String::from_utf8_lossy(&result.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }
}

/// `320x180` -> `scale=320:180`. A malformed size falls back to width-only
/// scaling that preserves aspect ratio.
fn scale_filter(size: &str) -> String {
    match size.split_once('x') {
        Some((w, h)) if w.parse::<u32>().is_ok() && h.parse::<u32>().is_ok() => {
            format!("scale={}:{}", w, h)
        }
        _ => "scale=320:-1".to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

fn parse_probe_output(json: &str, path: &str) -> Result<ProbeResult> {
    let parsed: FfprobeOutput = serde_json::from_str(json)?;

    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| Error::NoVideoStream(path.to_string()))?;

    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .map(|d| d.round() as i64)
        .unwrap_or(0);

    Ok(ProbeResult {
        duration_secs,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
    })
}
