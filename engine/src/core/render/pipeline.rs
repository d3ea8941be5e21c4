//! Render Orchestrator
//!
//! Drives one render request through its stages:
//!
//! ```text
//! MATERIALIZE_INPUT → PROBE → COMPILE → FETCH_OVERLAYS → EXECUTE → PERSIST → RESPOND
//!                                                                      ↓
//!                                             CLEANUP (always, every exit path)
//! ```
//!
//! Probe, overlay fetch and auto-save degrade in place (a default is
//! substituted and recorded in the [`RenderReport`]); a failing engine aborts
//! the request with the engine's diagnostic text.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use super::{
    build_render_command, compile_filter_graph, persist_output, EncodingSettings, FetchError,
    HttpImageFetcher, ImageFetcher, MediaEngine, MediaProbe, PlacedOverlay, RenderInput,
    RenderOutcome, RenderReport, RenderRequest, RenderWorkspace,
};
use crate::core::captions::compile_subtitle_document;
use crate::core::ffmpeg::{detect_ffmpeg, FFmpegRunner};
use crate::core::settings::RenderConfig;
use crate::core::{CoreError, CoreResult, Degraded, VideoInfo};

const INPUT_FILE: &str = "input.mp4";
const SUBTITLE_FILE: &str = "captions.ass";
const OUTPUT_FILE: &str = "output.mp4";

/// Renders captioned videos.
///
/// Holds only shared, immutable collaborator handles; every call to
/// [`render`](Self::render) runs an independent pipeline with its own
/// workspace, so one renderer can serve concurrent requests.
#[derive(Clone)]
pub struct CaptionRenderer {
    probe: Arc<dyn MediaProbe>,
    engine: Arc<dyn MediaEngine>,
    fetcher: Arc<dyn ImageFetcher>,
    config: Arc<RenderConfig>,
}

impl CaptionRenderer {
    pub fn new(
        probe: Arc<dyn MediaProbe>,
        engine: Arc<dyn MediaEngine>,
        fetcher: Arc<dyn ImageFetcher>,
        config: RenderConfig,
    ) -> Self {
        Self {
            probe,
            engine,
            fetcher,
            config: Arc::new(config),
        }
    }

    /// Builds the production renderer: detected FFmpeg plus an HTTP fetcher.
    pub fn from_config(config: RenderConfig) -> CoreResult<Self> {
        let info = detect_ffmpeg(config.ffmpeg_path.as_deref(), config.ffprobe_path.as_deref())?;
        let runner = Arc::new(FFmpegRunner::new(info).with_timeout(config.engine_timeout()));
        let fetcher = HttpImageFetcher::new(config.fetch_timeout())
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::new(runner.clone(), runner, Arc::new(fetcher), config))
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders `input` with the captions and overlays of `request`.
    ///
    /// Every temp file created on the way is removed before this returns,
    /// whatever the outcome.
    pub async fn render(
        &self,
        input: RenderInput,
        request: &RenderRequest,
    ) -> CoreResult<RenderOutcome> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("render", %request_id);

        async move {
            info!(
                captions = request.captions.len(),
                overlays = request.overlays.len(),
                "Starting video render"
            );

            let mut workspace =
                RenderWorkspace::create(self.config.temp_dir.as_deref(), request_id)?;
            let result = self.run_stages(&mut workspace, input, request).await;
            workspace.cleanup();

            match &result {
                Ok(outcome) => info!(
                    bytes = outcome.bytes.len(),
                    saved = ?outcome.saved_path,
                    "Render finished"
                ),
                Err(e) => error!("Render failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        workspace: &mut RenderWorkspace,
        input: RenderInput,
        request: &RenderRequest,
    ) -> CoreResult<RenderOutcome> {
        let mut report = RenderReport::default();

        // MATERIALIZE_INPUT
        let input_path = match input {
            RenderInput::Bytes(bytes) => workspace.write_file(INPUT_FILE, &bytes).await?,
            RenderInput::Path(path) => path,
        };

        // PROBE
        let probed =
            Degraded::from_result(self.probe.probe(&input_path).await, VideoInfo::fallback);
        if let Some(reason) = probed.reason() {
            warn!("Probe failed, assuming 1080x1920: {}", reason);
        }
        report.probe_degraded = probed.is_degraded();
        let video = probed.into_value();

        // COMPILE
        let document = compile_subtitle_document(
            &request.captions,
            &request.style,
            &request.offsets,
            &request.overrides,
            &video,
        );
        let subtitle_path = workspace
            .write_file(SUBTITLE_FILE, document.to_string().as_bytes())
            .await?;

        // FETCH_OVERLAYS
        let mut placed = Vec::new();
        for (index, overlay) in request.overlays.iter().enumerate() {
            let Some(src) = overlay.source() else {
                debug!(index, "Overlay has no src, skipping");
                continue;
            };

            let name = format!("overlay_{}.{}", index, overlay.image_extension());
            let fetched = Degraded::from_result(
                self.fetch_overlay(workspace, &name, src).await.map(Some),
                || None,
            );
            if let Some(reason) = fetched.reason() {
                warn!(index, "Failed to process overlay {}: {}", src, reason);
                report.dropped_overlays.push(index);
            }
            if let Some(image) = fetched.into_value() {
                placed.push(PlacedOverlay {
                    image,
                    overlay: overlay.clone(),
                });
            }
        }

        let graph = compile_filter_graph(
            &placed,
            video.width,
            &subtitle_path,
            &self.config.resolved_fonts_dir(),
        );
        debug!("Filter graph: {}", graph);

        let output_path = workspace.track(OUTPUT_FILE);
        let fps = request.fps.unwrap_or(self.config.default_fps);
        let command = build_render_command(
            &input_path,
            &graph,
            &EncodingSettings::from_config(&self.config, fps),
            &output_path,
        );

        // EXECUTE
        self.engine.execute(&command).await?;

        // PERSIST
        let saved = if self.config.auto_save {
            persist_output(&output_path, &self.config.save_dirs()).await
        } else {
            Degraded::Ok(None)
        };
        report.persist_error = saved.reason().map(String::from);
        let saved_path = saved.into_value();

        // RESPOND
        let bytes = tokio::fs::read(&output_path).await?;

        Ok(RenderOutcome {
            bytes,
            saved_path,
            report,
        })
    }

    async fn fetch_overlay(
        &self,
        workspace: &mut RenderWorkspace,
        name: &str,
        url: &str,
    ) -> Result<PathBuf, FetchError> {
        let bytes = self.fetcher.fetch(url).await?;
        Ok(workspace.write_file(name, &bytes).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::captions::{CaptionBlock, WordSpan};
    use crate::core::render::{EngineCommand, Overlay};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // =========================================================================
    // Fake collaborators
    // =========================================================================

    struct FakeProbe {
        info: Option<VideoInfo>,
    }

    #[async_trait]
    impl MediaProbe for FakeProbe {
        async fn probe(&self, _input: &Path) -> CoreResult<VideoInfo> {
            self.info
                .ok_or_else(|| CoreError::ProbeFailed("moov atom not found".to_string()))
        }
    }

    /// What the engine saw when it ran
    struct Execution {
        command: EngineCommand,
        subtitles: String,
    }

    #[derive(Default)]
    struct FakeEngine {
        stderr: Option<String>,
        runs: Mutex<Vec<Execution>>,
    }

    #[async_trait]
    impl MediaEngine for FakeEngine {
        async fn execute(&self, command: &EngineCommand) -> CoreResult<()> {
            let workspace = command.output().parent().unwrap();
            let subtitles =
                std::fs::read_to_string(workspace.join(SUBTITLE_FILE)).unwrap_or_default();
            self.runs.lock().unwrap().push(Execution {
                command: command.clone(),
                subtitles,
            });

            if let Some(stderr) = &self.stderr {
                return Err(CoreError::EngineExecutionFailed(stderr.clone()));
            }
            tokio::fs::write(command.output(), b"rendered").await?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeFetcher {
        broken: Vec<String>,
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            if self.broken.iter().any(|b| b == url) {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
            Ok(b"\x89PNG".to_vec())
        }
    }

    struct Harness {
        renderer: CaptionRenderer,
        engine: Arc<FakeEngine>,
        temp_root: TempDir,
    }

    impl Harness {
        fn new(probe: Option<VideoInfo>, engine: FakeEngine, fetcher: FakeFetcher) -> Self {
            Self::with_config(probe, engine, fetcher, |_| {})
        }

        fn with_config(
            probe: Option<VideoInfo>,
            engine: FakeEngine,
            fetcher: FakeFetcher,
            tweak: impl FnOnce(&mut RenderConfig),
        ) -> Self {
            let temp_root = TempDir::new().unwrap();
            let mut config = RenderConfig {
                temp_dir: Some(temp_root.path().to_path_buf()),
                fonts_dir: PathBuf::from("/srv/fonts"),
                auto_save: false,
                ..Default::default()
            };
            tweak(&mut config);

            let engine = Arc::new(engine);
            let renderer = CaptionRenderer::new(
                Arc::new(FakeProbe { info: probe }),
                engine.clone(),
                Arc::new(fetcher),
                config,
            );

            Self {
                renderer,
                engine,
                temp_root,
            }
        }

        fn leftover_files(&self) -> usize {
            walk(self.temp_root.path())
        }

        fn last_run(&self) -> (EngineCommand, String) {
            let runs = self.engine.runs.lock().unwrap();
            let run = runs.last().expect("engine was not invoked");
            (run.command.clone(), run.subtitles.clone())
        }
    }

    fn walk(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| {
                let path = e.unwrap().path();
                if path.is_dir() {
                    1 + walk(&path)
                } else {
                    1
                }
            })
            .sum()
    }

    fn hello_world_request() -> RenderRequest {
        RenderRequest {
            captions: vec![CaptionBlock::new(
                0,
                0.1,
                0.9,
                vec![WordSpan::new("Hello", 0.1, 0.5), WordSpan::new("World", 0.5, 0.9)],
            )],
            ..Default::default()
        }
    }

    fn overlay(src: &str) -> Overlay {
        Overlay {
            src: Some(src.to_string()),
            x: 10.0,
            y: 20.0,
            width: 100.0,
        }
    }

    fn video() -> RenderInput {
        RenderInput::Bytes(b"fake mp4".to_vec())
    }

    fn arg_after<'a>(cmd: &'a EngineCommand, flag: &str) -> Option<&'a str> {
        let args = cmd.args();
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[tokio::test]
    async fn test_hello_world_end_to_end() {
        let h = Harness::new(
            Some(VideoInfo::new(1080, 1920, 5.0)),
            FakeEngine::default(),
            FakeFetcher::default(),
        );

        let outcome = h.renderer.render(video(), &hello_world_request()).await.unwrap();
        assert_eq!(outcome.bytes, b"rendered");
        assert_eq!(outcome.saved_path, None);
        assert!(outcome.report.is_clean());

        let (command, subtitles) = h.last_run();
        let dialogues: Vec<&str> = subtitles
            .lines()
            .filter(|l| l.starts_with("Dialogue:"))
            .collect();
        assert_eq!(dialogues.len(), 1);
        assert!(dialogues[0].contains("0:00:00.10,0:00:00.90"));
        assert!(dialogues[0].ends_with("Hello World"));

        assert!(arg_after(&command, "-vf").unwrap().starts_with("subtitles='"));
        assert!(!command.args().iter().any(|a| a == "-filter_complex"));
        assert_eq!(arg_after(&command, "-r"), Some("30"));

        assert_eq!(h.leftover_files(), 0);
    }

    #[tokio::test]
    async fn test_probe_failure_uses_fallback_geometry() {
        let h = Harness::new(None, FakeEngine::default(), FakeFetcher::default());

        let outcome = h.renderer.render(video(), &hello_world_request()).await.unwrap();
        assert!(outcome.report.probe_degraded);

        let (_, subtitles) = h.last_run();
        assert!(subtitles.contains("PlayResX: 1080\nPlayResY: 1920"));
        assert!(subtitles.contains("{\\pos(540,1440)}"));
        assert_eq!(h.leftover_files(), 0);
    }

    #[tokio::test]
    async fn test_failed_overlay_is_dropped() {
        let fetcher = FakeFetcher {
            broken: vec!["https://cdn.example.com/gone.png".to_string()],
        };
        let h = Harness::new(
            Some(VideoInfo::new(1080, 1920, 5.0)),
            FakeEngine::default(),
            fetcher,
        );

        let mut request = hello_world_request();
        request.overlays = vec![
            overlay("https://cdn.example.com/gone.png"),
            overlay("https://cdn.example.com/logo.png"),
        ];

        let outcome = h.renderer.render(video(), &request).await.unwrap();
        assert_eq!(outcome.report.dropped_overlays, vec![0]);

        let (command, _) = h.last_run();
        let graph = arg_after(&command, "-filter_complex").unwrap();
        assert!(graph.starts_with(
            "[1:v]scale=385:-1[img0];[0:v][img0]overlay=38:77[v1];[v1]subtitles='"
        ));
        assert!(graph.ends_with("[outv]"));
        assert!(!graph.contains("[2:v]"));
        assert_eq!(command.args().iter().filter(|a| *a == "-i").count(), 2);

        assert_eq!(h.leftover_files(), 0);
    }

    #[tokio::test]
    async fn test_all_overlays_failing_falls_back_to_simple_chain() {
        let fetcher = FakeFetcher {
            broken: vec!["https://cdn.example.com/gone.png".to_string()],
        };
        let h = Harness::new(Some(VideoInfo::fallback()), FakeEngine::default(), fetcher);

        let mut request = hello_world_request();
        request.overlays = vec![overlay("https://cdn.example.com/gone.png")];

        h.renderer.render(video(), &request).await.unwrap();
        let (command, _) = h.last_run();
        assert!(arg_after(&command, "-vf").is_some());
    }

    #[tokio::test]
    async fn test_overlay_without_src_is_skipped_not_dropped() {
        let h = Harness::new(
            Some(VideoInfo::fallback()),
            FakeEngine::default(),
            FakeFetcher::default(),
        );

        let mut request = hello_world_request();
        request.overlays = vec![
            Overlay {
                src: None,
                x: 0.0,
                y: 0.0,
                width: 300.0,
            },
            overlay("https://cdn.example.com/logo.png"),
        ];

        let outcome = h.renderer.render(video(), &request).await.unwrap();
        assert!(outcome.report.dropped_overlays.is_empty());

        let (command, _) = h.last_run();
        assert!(arg_after(&command, "-filter_complex")
            .unwrap()
            .starts_with("[1:v]scale="));
    }

    #[tokio::test]
    async fn test_engine_failure_surfaces_stderr_and_cleans_up() {
        let stderr = "[AVFilterGraph @ 0x1] No such filter: 'subtitle'";
        let engine = FakeEngine {
            stderr: Some(stderr.to_string()),
            ..Default::default()
        };
        let h = Harness::new(Some(VideoInfo::fallback()), engine, FakeFetcher::default());

        let mut request = hello_world_request();
        request.overlays = vec![overlay("https://cdn.example.com/logo.png")];

        let err = h.renderer.render(video(), &request).await.unwrap_err();
        assert!(matches!(&err, CoreError::EngineExecutionFailed(s) if s == stderr));
        assert_eq!(h.leftover_files(), 0);
    }

    #[tokio::test]
    async fn test_request_fps_and_config_encoding() {
        let h = Harness::with_config(
            Some(VideoInfo::fallback()),
            FakeEngine::default(),
            FakeFetcher::default(),
            |config| {
                config.preset = "veryfast".to_string();
                config.crf = 20;
            },
        );

        let mut request = hello_world_request();
        request.fps = Some(24.0);

        h.renderer.render(video(), &request).await.unwrap();
        let (command, _) = h.last_run();
        assert_eq!(arg_after(&command, "-r"), Some("24"));
        assert_eq!(arg_after(&command, "-preset"), Some("veryfast"));
        assert_eq!(arg_after(&command, "-crf"), Some("20"));
        assert!(arg_after(&command, "-vf")
            .unwrap()
            .ends_with(":fontsdir=/srv/fonts'"));
    }

    #[tokio::test]
    async fn test_auto_save_copies_output() {
        let save_dir = TempDir::new().unwrap();
        let save_path = save_dir.path().to_path_buf();
        let h = Harness::with_config(
            Some(VideoInfo::fallback()),
            FakeEngine::default(),
            FakeFetcher::default(),
            move |config| {
                config.auto_save = true;
                config.auto_save_dirs = vec![save_path];
            },
        );

        let outcome = h.renderer.render(video(), &hello_world_request()).await.unwrap();
        let saved = outcome.saved_path.expect("video should be saved");
        assert!(saved.starts_with(save_dir.path()));
        assert_eq!(std::fs::read(saved).unwrap(), b"rendered");
        assert_eq!(h.leftover_files(), 0);
    }

    #[tokio::test]
    async fn test_auto_save_failure_does_not_fail_render() {
        let h = Harness::with_config(
            Some(VideoInfo::fallback()),
            FakeEngine::default(),
            FakeFetcher::default(),
            |config| {
                config.auto_save = true;
                config.auto_save_dirs = vec![PathBuf::from("/definitely/missing/Desktop")];
            },
        );

        let outcome = h.renderer.render(video(), &hello_world_request()).await.unwrap();
        assert_eq!(outcome.saved_path, None);
        assert!(outcome.report.persist_error.is_some());
        assert_eq!(outcome.bytes, b"rendered");
    }

    #[tokio::test]
    async fn test_path_input_is_left_in_place() {
        let h = Harness::new(
            Some(VideoInfo::fallback()),
            FakeEngine::default(),
            FakeFetcher::default(),
        );
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("clip.mp4");
        std::fs::write(&source, b"fake mp4").unwrap();

        h.renderer
            .render(RenderInput::Path(source.clone()), &hello_world_request())
            .await
            .unwrap();

        let (command, _) = h.last_run();
        let expected = source.to_string_lossy().to_string();
        assert_eq!(arg_after(&command, "-i"), Some(expected.as_str()));
        assert!(source.exists());
        assert_eq!(h.leftover_files(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_renders_are_isolated() {
        let h = Harness::new(
            Some(VideoInfo::fallback()),
            FakeEngine::default(),
            FakeFetcher::default(),
        );
        let request = hello_world_request();

        let (a, b) = tokio::join!(
            h.renderer.render(video(), &request),
            h.renderer.render(video(), &request)
        );
        assert!(a.is_ok() && b.is_ok());

        let runs = h.engine.runs.lock().unwrap();
        assert_eq!(runs.len(), 2);
        assert_ne!(runs[0].command.output(), runs[1].command.output());
        drop(runs);

        assert_eq!(h.leftover_files(), 0);
    }
}
