use std::sync::Arc;

use crate::config::RenderConfig;
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{LyricError, LyricResult};
use crate::job::assets::{AssetResolver, FsAssetResolver};
use crate::job::controller::{self, JobContext};
use crate::job::handle::{JobHandle, JobShared};
use crate::job::state::{JobId, JobObserver};
use crate::model::request::RenderRequest;
use crate::raster::fonts::FontBook;
use crate::raster::text::TextRasterizer;

/// Entry point for render jobs.
///
/// A service owns the deployment config, the loaded fonts and the asset resolver. Each
/// submitted request becomes an independent job running on its own worker thread.
#[derive(Clone)]
pub struct RenderService {
    ctx: JobContext,
}

impl std::fmt::Debug for RenderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderService")
            .field("config", &self.ctx.config)
            .field("fonts", self.ctx.rasterizer.fonts())
            .finish()
    }
}

impl RenderService {
    /// Service resolving assets under `config.assets_root` with fonts discovered per
    /// `config.fonts`.
    pub fn new(config: RenderConfig) -> LyricResult<Self> {
        let fonts = FontBook::load(&config.fonts);
        let resolver = Arc::new(FsAssetResolver::new(config.assets_root.clone()));
        Self::with_parts(config, fonts, resolver)
    }

    /// Service from explicit parts.
    pub fn with_parts(
        config: RenderConfig,
        fonts: FontBook,
        resolver: Arc<dyn AssetResolver>,
    ) -> LyricResult<Self> {
        config.validate()?;
        if fonts.face_count() == 0 {
            tracing::warn!("no fonts loaded; verses with text will fail to rasterize");
        }
        let rasterizer = TextRasterizer::new(config.canvas, fonts);
        Ok(Self {
            ctx: JobContext {
                config: Arc::new(config),
                rasterizer,
                resolver,
            },
        })
    }

    /// Deployment config.
    pub fn config(&self) -> &RenderConfig {
        &self.ctx.config
    }

    /// Rasterizer used by jobs of this service.
    pub fn rasterizer(&self) -> &TextRasterizer {
        &self.ctx.rasterizer
    }

    /// Validate `request` and start a job for it.
    ///
    /// Invalid requests and unresolvable assets are reported here and no job is created. Every
    /// later failure is delivered through the returned handle.
    pub fn submit(&self, request: RenderRequest) -> LyricResult<JobHandle> {
        self.submit_inner(request, None)
    }

    /// Like [`RenderService::submit`], registering `observer` before the job starts so it sees
    /// every progress event.
    pub fn submit_with_observer(
        &self,
        request: RenderRequest,
        observer: Arc<dyn JobObserver>,
    ) -> LyricResult<JobHandle> {
        self.submit_inner(request, Some(observer))
    }

    fn submit_inner(
        &self,
        request: RenderRequest,
        observer: Option<Arc<dyn JobObserver>>,
    ) -> LyricResult<JobHandle> {
        request.validate()?;
        controller::resolve_assets(self.ctx.resolver.as_ref(), &request)?;

        let id = JobId::new();
        let shared = Arc::new(JobShared::default());
        let cancel = CancelToken::new();
        let handle = JobHandle::new(id, Arc::clone(&shared), cancel.clone());
        if let Some(o) = observer {
            handle.subscribe(o);
        }

        let ctx = self.ctx.clone();
        tracing::info!(
            job = %id,
            project = %request.project_name,
            verses = request.verses.len(),
            "job submitted"
        );
        std::thread::Builder::new()
            .name(format!("lyrivid-job-{}", id.short()))
            .spawn(move || controller::run(id, &request, &ctx, &shared, &cancel))
            .map_err(|e| LyricError::Other(anyhow::anyhow!("failed to spawn job thread: {e}")))?;
        Ok(handle)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/service.rs"]
mod tests;
