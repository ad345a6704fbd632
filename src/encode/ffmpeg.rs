use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use anyhow::Context;

use crate::config::EncodePolicy;
use crate::encode::overlay::OverlaySource;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{LyricError, LyricResult, file_label};
use crate::foundation::time::frames_for;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tif", "tiff"];
const STDERR_TAIL_LINES: usize = 20;

/// What the lyric overlay is composited over.
#[derive(Clone, Debug, PartialEq)]
pub enum Background {
    /// Generated solid color.
    Color(Rgba8),
    /// Still image held for the whole output.
    Image(PathBuf),
    /// Video; freezes on its last frame when shorter than the output.
    Video(PathBuf),
}

impl Background {
    /// Classify a media file by extension. Unknown extensions are treated as video.
    pub fn from_media(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            Self::Image(path)
        } else {
            Self::Video(path)
        }
    }
}

/// Everything the assembler needs besides the overlay frames.
#[derive(Clone, Debug)]
pub struct AssemblyPlan {
    /// Output resolution.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: u32,
    /// Output duration in seconds.
    pub duration_sec: f64,
    /// Background layer.
    pub background: Background,
    /// Audio track.
    pub audio: PathBuf,
    /// Final output path. Written only on success.
    pub output: PathBuf,
    /// Codec/quality policy.
    pub policy: EncodePolicy,
    /// `ffmpeg` binary.
    pub ffmpeg: PathBuf,
}

impl AssemblyPlan {
    /// Path ffmpeg writes to before the atomic rename.
    pub fn part_path(&self) -> PathBuf {
        let mut name = self
            .output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("output.mp4"));
        name.push(".part");
        self.output.with_file_name(name)
    }

    /// Number of output frames.
    pub fn frame_count(&self) -> u64 {
        frames_for(self.duration_sec, self.fps)
    }

    /// Encoded length in seconds: whole frames at `fps`, so the last frame lies inside `-t`.
    pub fn encoded_duration(&self) -> f64 {
        self.frame_count() as f64 / f64::from(self.fps)
    }

    /// Replace the plan's file paths in `text` with their file names.
    pub(crate) fn redact(&self, text: &str) -> String {
        let part = self.part_path();
        let mut paths: Vec<&Path> = vec![
            part.as_path(),
            self.output.as_path(),
            self.audio.as_path(),
            self.ffmpeg.as_path(),
        ];
        if let Background::Image(p) | Background::Video(p) = &self.background {
            paths.push(p.as_path());
        }
        paths.sort_by_key(|p| std::cmp::Reverse(p.as_os_str().len()));

        let mut out = text.to_owned();
        for p in paths.into_iter().filter(|p| p.is_absolute()) {
            out = out.replace(&p.display().to_string(), &file_label(p));
        }
        out
    }
}

/// Filter graph that scales/pads the background (input 1) to the canvas and overlays the lyric
/// stream (input 0) on it.
pub fn build_filter_graph(plan: &AssemblyPlan) -> String {
    let (w, h) = (plan.canvas.width, plan.canvas.height);
    let mut bg = format!(
        "[1:v]scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,fps={}",
        plan.fps
    );
    if matches!(plan.background, Background::Video(_)) {
        bg.push_str(&format!(
            ",tpad=stop_mode=clone:stop_duration={:.3}",
            plan.encoded_duration()
        ));
    }
    format!("{bg}[bg];[bg][0:v]overlay=format=auto:eof_action=pass[v]")
}

/// Full ffmpeg argument list writing to `part_path`.
///
/// Inputs: `0` raw RGBA overlay on stdin, `1` background, `2` audio.
pub fn build_ffmpeg_args(plan: &AssemblyPlan, part_path: &Path) -> Vec<OsString> {
    let (w, h) = (plan.canvas.width, plan.canvas.height);
    let fps = plan.fps.to_string();
    let duration = format!("{:.3}", plan.encoded_duration());
    let mut args: Vec<OsString> = Vec::with_capacity(64);

    push_args(&mut args, &["-y", "-loglevel", "error"]);
    push_args(
        &mut args,
        &[
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{w}x{h}"),
            "-r",
            &fps,
            "-i",
            "pipe:0",
        ],
    );

    match &plan.background {
        Background::Color(c) => push_args(
            &mut args,
            &[
                "-f",
                "lavfi",
                "-i",
                &format!("color=c={}:s={w}x{h}:r={fps}:d={duration}", c.to_ffmpeg()),
            ],
        ),
        Background::Image(p) => {
            push_args(
                &mut args,
                &["-loop", "1", "-framerate", &fps, "-t", &duration, "-i"],
            );
            args.push(p.as_os_str().to_os_string());
        }
        Background::Video(p) => {
            args.push("-i".into());
            args.push(p.as_os_str().to_os_string());
        }
    }

    args.push("-i".into());
    args.push(plan.audio.as_os_str().to_os_string());

    let policy = &plan.policy;
    push_args(
        &mut args,
        &[
            "-filter_complex",
            &build_filter_graph(plan),
            "-map",
            "[v]",
            "-map",
            "2:a:0",
            "-c:v",
            &policy.video_codec,
            "-preset",
            &policy.preset,
            "-crf",
            &policy.crf.to_string(),
            "-pix_fmt",
            &policy.pix_fmt,
            "-r",
            &fps,
            "-c:a",
            &policy.audio_codec,
            "-b:a",
            &policy.audio_bitrate,
            "-t",
            &duration,
        ],
    );
    if policy.faststart {
        push_args(&mut args, &["-movflags", "+faststart"]);
    }
    push_args(&mut args, &["-f", "mp4"]);
    args.push(part_path.as_os_str().to_os_string());
    args
}

fn push_args(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}

/// Encode the overlay over the background, mux the audio, and publish `plan.output`.
///
/// `on_progress(frames_written, total_frames)` is called whenever the whole-percent progress
/// changes. On failure or cancellation no file is left at either the output or the partial path.
#[tracing::instrument(skip_all, fields(output = %plan.output.display()))]
pub fn assemble(
    plan: &AssemblyPlan,
    overlay: &mut dyn OverlaySource,
    cancel: &CancelToken,
    on_progress: &mut dyn FnMut(u64, u64),
) -> LyricResult<()> {
    let total = overlay.frame_count();
    if total == 0 {
        return Err(LyricError::assembly("output duration is zero"));
    }
    ensure_parent_dir(&plan.output)?;

    let part = plan.part_path();
    let guard = PartFileGuard(Some(part.clone()));
    let args = build_ffmpeg_args(plan, &part);
    tracing::debug!(frames = total, ?args, "spawning ffmpeg");

    let mut child = Command::new(&plan.ffmpeg)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            tracing::warn!(tool = %plan.ffmpeg.display(), error = %e, "failed to spawn ffmpeg");
            LyricError::assembly(format!(
                "failed to spawn '{}' (is it installed and on PATH?): {e}",
                file_label(&plan.ffmpeg)
            ))
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| LyricError::assembly("failed to open ffmpeg stdin"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| LyricError::assembly("failed to open ffmpeg stderr"))?;
    let stderr_drain = std::thread::spawn(move || {
        let mut bytes = Vec::new();
        stderr.read_to_end(&mut bytes)?;
        Ok::<_, std::io::Error>(bytes)
    });

    let mut last_pct = None;
    let mut written = 0;
    for n in 0..total {
        if cancel.is_cancelled() {
            drop(stdin);
            abort(&mut child);
            let _ = stderr_drain.join();
            tracing::info!(frame = n, "assembly cancelled");
            return Err(LyricError::Cancelled);
        }

        let pixels = match overlay.frame(n) {
            Ok(p) => p,
            Err(e) => {
                drop(stdin);
                abort(&mut child);
                let _ = stderr_drain.join();
                return Err(e);
            }
        };
        if let Err(e) = stdin.write_all(pixels) {
            // ffmpeg stopped reading; its exit status decides.
            tracing::debug!(frame = n, error = %e, "ffmpeg stdin closed");
            break;
        }
        written = n + 1;

        let pct = (n + 1) * 100 / total;
        if last_pct != Some(pct) {
            last_pct = Some(pct);
            on_progress(n + 1, total);
        }
    }
    drop(stdin);

    let status = child
        .wait()
        .map_err(|e| LyricError::assembly(format!("failed to wait for ffmpeg: {e}")))?;
    let stderr_bytes = stderr_drain
        .join()
        .map_err(|_| LyricError::assembly("ffmpeg stderr drain thread panicked"))?
        .map_err(|e| LyricError::assembly(format!("ffmpeg stderr read failed: {e}")))?;

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr_bytes);
        let tail = stderr_tail(&stderr, STDERR_TAIL_LINES);
        tracing::warn!(%status, stderr = %tail, "ffmpeg failed");
        return Err(LyricError::assembly(format!(
            "ffmpeg exited with status {status}: {}",
            plan.redact(&tail)
        )));
    }
    if written < total {
        tracing::warn!(written, total, "ffmpeg finished before reading every frame");
    }

    guard.persist(&plan.output)?;
    tracing::info!(frames = written, "assembly finished");
    Ok(())
}

fn abort(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Last `n` non-empty lines of `s`, joined with `\n`.
pub(crate) fn stderr_tail(s: &str, n: usize) -> String {
    let lines: Vec<&str> = s.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Removes the partial output unless it was persisted.
struct PartFileGuard(Option<PathBuf>);

impl PartFileGuard {
    fn persist(mut self, to: &Path) -> LyricResult<()> {
        if let Some(part) = self.0.as_ref() {
            std::fs::rename(part, to).with_context(|| {
                format!(
                    "failed to move '{}' to '{}'",
                    file_label(part),
                    file_label(to)
                )
            })?;
            self.0 = None;
        }
        Ok(())
    }
}

impl Drop for PartFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> LyricResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", file_label(parent)))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
