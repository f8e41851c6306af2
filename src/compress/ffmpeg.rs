//! ffmpeg-backed compressor.
//!
//! Probes the input duration with ffprobe, then drives ffmpeg with
//! `-progress pipe:1` so the reported fraction tracks real transcode
//! position instead of being synthesized.

use super::{Compressor, CompressionSettings};
use async_trait::async_trait;
use reelvault_common::{CompressionError, MediaHandle};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

pub struct FfmpegCompressor {
    settings: CompressionSettings,
}

impl FfmpegCompressor {
    pub fn new(settings: CompressionSettings) -> Self {
        Self { settings }
    }

    /// Probe the input duration in seconds.
    async fn probe_duration_secs(&self, input: &Path) -> Result<f64, CompressionError> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(input)
            .output()
            .await
            .map_err(|e| CompressionError::Probe(format!("Failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(CompressionError::Probe(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .map_err(|e| CompressionError::Probe(format!("Unparseable duration: {}", e)))
    }

    fn build_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-c:v".to_string(),
            self.settings.encoder().to_string(),
        ];

        // Bitrate-targeted encode with a bounded rate envelope.
        args.extend([
            "-b:v".to_string(),
            self.settings.bitrate.to_string(),
            "-maxrate".to_string(),
            (self.settings.bitrate * 3 / 2).to_string(),
            "-bufsize".to_string(),
            (self.settings.bitrate * 3).to_string(),
        ]);

        // Scale down if needed (preserving aspect ratio).
        args.extend([
            "-vf".to_string(),
            format!(
                "scale='min({},iw)':'min({},ih)':force_original_aspect_ratio=decrease",
                self.settings.max_width, self.settings.max_height
            ),
        ]);

        // Keyframe interval for seek/startup behavior.
        let keyframe_expr = format!("expr:gte(t,n_forced*{})", self.settings.keyframe_interval);
        args.extend(["-force_key_frames".to_string(), keyframe_expr]);

        // Audio settings.
        args.extend([
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "128k".to_string(),
            "-ac".to_string(),
            "2".to_string(),
        ]);

        if self.settings.faststart {
            args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        }

        // Machine-readable progress on stdout.
        args.extend([
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-nostats".to_string(),
        ]);

        args.extend([
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ]);

        args
    }
}

#[async_trait]
impl Compressor for FfmpegCompressor {
    async fn compress(
        &self,
        input: &MediaHandle,
        on_progress: &(dyn Fn(f32) + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<MediaHandle, CompressionError> {
        tokio::fs::create_dir_all(&self.settings.output_dir).await?;

        let duration = self.probe_duration_secs(&input.local_path).await?;

        let file_stem = input
            .local_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let output_name = format!("{}_compressed.mp4", file_stem);
        let output_path = self.settings.output_dir.join(&output_name);

        let args = self.build_args(&input.local_path, &output_path);
        tracing::debug!("FFmpeg args: {:?}", args);

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CompressionError::Transcode(format!("Failed to execute ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CompressionError::Transcode("ffmpeg stdout unavailable".into()))?;
        let mut lines = BufReader::new(stdout).lines();

        let mut last_reported = 0.0f32;
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = child.kill().await;
                    return Err(CompressionError::Cancelled);
                }
                line = lines.next_line() => line?,
            };

            let Some(line) = line else { break };

            // out_time_ms is in microseconds despite the name.
            if let Some(value) = line.strip_prefix("out_time_ms=") {
                if let Ok(us) = value.trim().parse::<i64>() {
                    if us > 0 && duration > 0.0 {
                        let fraction = ((us as f64 / 1_000_000.0) / duration).min(0.99) as f32;
                        if fraction > last_reported {
                            last_reported = fraction;
                            on_progress(fraction);
                        }
                    }
                }
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(CompressionError::Transcode(format!(
                "ffmpeg exited with status: {}",
                status
            )));
        }

        on_progress(1.0);
        tracing::info!(
            input = %input.local_path.display(),
            output = %output_path.display(),
            "Compression completed"
        );

        Ok(MediaHandle::new(output_path, output_name, "video/mp4"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_faststart_and_scale() {
        let compressor = FfmpegCompressor::new(CompressionSettings::default());
        let args = compressor.build_args(Path::new("/tmp/in.mov"), Path::new("/tmp/out.mp4"));

        assert!(args.contains(&"+faststart".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"2000000".to_string()));
        assert!(args
            .iter()
            .any(|a| a.contains("min(1280,iw)") && a.contains("min(720,ih)")));
        // progress stream goes to stdout for parsing
        assert!(args.contains(&"pipe:1".to_string()));
    }

    #[test]
    fn test_build_args_without_faststart() {
        let settings = CompressionSettings {
            faststart: false,
            ..CompressionSettings::default()
        };
        let compressor = FfmpegCompressor::new(settings);
        let args = compressor.build_args(Path::new("/tmp/in.mov"), Path::new("/tmp/out.mp4"));
        assert!(!args.contains(&"-movflags".to_string()));
    }
}
