use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use rayon::prelude::*;

use crate::config::RenderConfig;
use crate::encode::ffmpeg::{AssemblyPlan, Background, assemble};
use crate::encode::overlay::{FrameStore, OverlayStream};
use crate::encode::probe::probe_audio_duration;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{LyricError, LyricResult, strip_roots};
use crate::job::assets::AssetResolver;
use crate::job::handle::{JobOutcome, JobShared};
use crate::job::state::{JobFailure, JobId, JobStatus};
use crate::model::request::RenderRequest;
use crate::raster::text::TextRasterizer;
use crate::timeline::compositor::Timeline;

/// Progress reached when every verse frame exists.
const RASTER_SHARE: u8 = 10;
/// Progress ceiling while encoding; 100 is reserved for a published output.
const ASSEMBLY_CEILING: u8 = 99;

/// Everything a job needs from its service.
#[derive(Clone)]
pub(crate) struct JobContext {
    pub config: Arc<RenderConfig>,
    pub rasterizer: TextRasterizer,
    pub resolver: Arc<dyn AssetResolver>,
}

/// Assets a request refers to, resolved to local files.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ResolvedAssets {
    pub audio: PathBuf,
    pub background: Option<PathBuf>,
}

pub(crate) fn resolve_assets(
    resolver: &dyn AssetResolver,
    request: &RenderRequest,
) -> LyricResult<ResolvedAssets> {
    let audio = resolver.resolve_asset_path(&request.audio_path)?;
    let background = request
        .background()
        .map(|id| resolver.resolve_asset_path(id))
        .transpose()?;
    Ok(ResolvedAssets { audio, background })
}

/// File name of a job's output.
pub fn output_file_name(stem: &str, id: JobId, unique: bool) -> String {
    if unique {
        format!("{stem}-{}.mp4", id.short())
    } else {
        format!("{stem}.mp4")
    }
}

/// Drive one job to a terminal state.
pub(crate) fn run(
    id: JobId,
    request: &RenderRequest,
    ctx: &JobContext,
    shared: &JobShared,
    cancel: &CancelToken,
) {
    let outcome: JobOutcome = match execute(id, request, ctx, shared, cancel) {
        Ok(path) => {
            tracing::info!(job = %id, output = %path.display(), "job succeeded");
            Ok(path)
        }
        Err(e) => {
            tracing::warn!(job = %id, error = %e, "job failed");
            Err(public_failure(&e, &ctx.config))
        }
    };
    shared.finish(outcome);
}

/// Failure as reported to observers: deployment directories are rewritten relative to
/// themselves.
pub(crate) fn public_failure(e: &LyricError, cfg: &RenderConfig) -> JobFailure {
    let mut failure = JobFailure::from(e);
    let scratch_root = cfg.scratch_root();
    failure.message = strip_roots(
        &failure.message,
        &[
            cfg.assets_root.as_path(),
            cfg.output_dir.as_path(),
            scratch_root.as_path(),
        ],
    );
    failure
}

#[tracing::instrument(skip_all, fields(job = %id, project = %request.project_name))]
fn execute(
    id: JobId,
    request: &RenderRequest,
    ctx: &JobContext,
    shared: &JobShared,
    cancel: &CancelToken,
) -> LyricResult<PathBuf> {
    let cfg = ctx.config.as_ref();

    shared.advance(JobStatus::Rasterizing)?;
    request.validate()?;
    let assets = resolve_assets(ctx.resolver.as_ref(), request)?;
    check_cancel(cancel)?;

    let scratch_root = cfg.scratch_root();
    std::fs::create_dir_all(&scratch_root).context("failed to create scratch root")?;
    let scratch = tempfile::Builder::new()
        .prefix(&format!("job-{}-", id.short()))
        .tempdir_in(&scratch_root)
        .context("failed to create scratch dir")?;
    tracing::debug!(scratch = %scratch.path().display(), "scratch created");

    let fill = match assets.background {
        Some(_) => None,
        None => Some(request.background_color),
    };
    let frames = rasterize_all(request, ctx, scratch.path(), fill, shared, cancel)?;
    check_cancel(cancel)?;

    let audio_duration = probe_audio_duration(&cfg.tools.ffprobe, &assets.audio)?;
    let timeline = Timeline::new(&request.verses, audio_duration);
    tracing::debug!(
        audio_duration,
        total = timeline.total_duration(),
        "timeline built"
    );

    shared.advance(JobStatus::Assembling)?;
    let output = cfg.output_dir.join(output_file_name(
        &request.output_stem(),
        id,
        cfg.unique_output_names,
    ));
    let plan = AssemblyPlan {
        canvas: cfg.canvas,
        fps: cfg.fps,
        duration_sec: timeline.total_duration(),
        background: match assets.background {
            Some(p) => Background::from_media(p),
            None => Background::Color(request.background_color),
        },
        audio: assets.audio,
        output,
        policy: cfg.encode.clone(),
        ffmpeg: cfg.tools.ffmpeg.clone(),
    };
    let mut overlay = OverlayStream::new(&timeline, FrameStore::new(cfg.canvas, frames), cfg.fps);
    let span = u64::from(ASSEMBLY_CEILING - RASTER_SHARE);
    assemble(&plan, &mut overlay, cancel, &mut |done, total| {
        let pct = u64::from(RASTER_SHARE) + done * span / total.max(1);
        shared.report_progress(pct.min(u64::from(ASSEMBLY_CEILING)) as u8);
    })?;

    if let Err(e) = scratch.close() {
        tracing::warn!(error = %e, "failed to remove scratch dir");
    }
    Ok(plan.output)
}

/// Rasterize every verse in parallel into `dir/frame-NNNN.png`, returning paths by verse index.
fn rasterize_all(
    request: &RenderRequest,
    ctx: &JobContext,
    dir: &Path,
    fill: Option<Rgba8>,
    shared: &JobShared,
    cancel: &CancelToken,
) -> LyricResult<Vec<PathBuf>> {
    let pool = build_thread_pool(ctx.config.render_threads)?;
    let total = request.verses.len();
    let done = AtomicUsize::new(0);

    pool.install(|| {
        request
            .verses
            .par_iter()
            .enumerate()
            .map(|(i, verse)| {
                check_cancel(cancel)?;
                let frame = ctx.rasterizer.rasterize_verse(i, verse, fill)?;
                let path = dir.join(format!("frame-{i:04}.png"));
                frame
                    .write_png(&path)
                    .map_err(|e| LyricError::rasterization(i, e.to_string()))?;

                let n = done.fetch_add(1, Ordering::SeqCst) + 1;
                shared.report_progress((n * usize::from(RASTER_SHARE) / total.max(1)) as u8);
                Ok(path)
            })
            .collect()
    })
}

fn check_cancel(cancel: &CancelToken) -> LyricResult<()> {
    if cancel.is_cancelled() {
        Err(LyricError::Cancelled)
    } else {
        Ok(())
    }
}

fn build_thread_pool(threads: Option<usize>) -> LyricResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(LyricError::config("render_threads must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| LyricError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/job/controller.rs"]
mod tests;
