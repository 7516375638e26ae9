//! `generate_figure` handler: validation, orchestration, persistence.

use super::args::{GenerateFigureArgs, ValidatedRequest};
use super::response::ToolResponse;
use crate::config::{FiguraConfig, MAX_QA_RETRIES};
use crate::enrichment::PromptEnricher;
use crate::error::ApiError;
use crate::generation::{qa_active, FigureOrchestrator, OrchestrationRequest};
use crate::persistence::{ArtifactStore, FilenameHint, FsArtifactStore};
use crate::provider::{BackendHandles, TextBackend};
use crate::qa::{QaEvaluator, QualityGate};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const TOOL_NAME: &str = "generate_figure";

pub struct FigureTool {
    config: FiguraConfig,
    workspace_root: PathBuf,
    handles: Arc<BackendHandles>,
    store: Arc<dyn ArtifactStore>,
}

impl FigureTool {
    /// Tool backed by configured providers and a filesystem store under `output.dir`.
    pub fn new(config: FiguraConfig, workspace_root: PathBuf) -> Self {
        let handles = Arc::new(BackendHandles::new(config.providers.clone()));
        let store = Arc::new(
            FsArtifactStore::new(config.output.resolve_root(&workspace_root))
                .with_qa_sidecar(config.output.write_qa_sidecar),
        );
        Self::with_components(config, workspace_root, handles, store)
    }

    pub fn with_components(
        config: FiguraConfig,
        workspace_root: PathBuf,
        handles: Arc<BackendHandles>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            config,
            workspace_root,
            handles,
            store,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Handle raw JSON arguments. Always produces an envelope.
    pub async fn call_json(&self, raw: &str) -> ToolResponse {
        match GenerateFigureArgs::from_json(raw) {
            Ok(args) => self.call(args).await,
            Err(err) => Self::failed(ApiError::from(err)),
        }
    }

    pub async fn call(&self, args: GenerateFigureArgs) -> ToolResponse {
        match self.execute(args).await {
            Ok(response) => response,
            Err(err) => Self::failed(err),
        }
    }

    fn failed(err: ApiError) -> ToolResponse {
        error!(tool = TOOL_NAME, error_kind = err.kind(), error = %err, "Tool call failed");
        ToolResponse::failure(&err)
    }

    pub async fn execute(&self, args: GenerateFigureArgs) -> Result<ToolResponse, ApiError> {
        let request = args.validate(&self.workspace_root)?;
        let qa = qa_active(request.figure_style, request.qa, self.config.qa.enabled);
        let enrich = request
            .enhance_prompt
            .unwrap_or(self.config.enrichment.enabled);
        info!(
            tool = TOOL_NAME,
            figure_style = request.figure_style.map(|s| s.as_str()).unwrap_or("none"),
            qa,
            enrich,
            edit = request.generation.source_image.is_some(),
            "Handling figure request"
        );

        let orchestrator = self.build_orchestrator(qa, enrich).await?;
        let orchestration = OrchestrationRequest::new(request.generation.clone())
            .with_style(request.figure_style)
            .with_qa(qa)
            .with_enrichment(enrich);
        let outcome = orchestrator.run(&orchestration).await?;

        let hint = filename_hint(&request, &outcome.artifact.mime_type, outcome.artifact.generated_at);
        let saved = self.store.save(&outcome.artifact.bytes, &hint)?;
        let sidecar = match &outcome.report {
            Some(report) => match self.store.save_report(&saved, report) {
                Ok(path) => path,
                Err(err) => {
                    warn!(
                        tool = TOOL_NAME,
                        path = %saved.path.display(),
                        error = %err,
                        "QA sidecar not written; returning figure without it"
                    );
                    None
                }
            },
            None => None,
        };
        info!(
            tool = TOOL_NAME,
            path = %saved.path.display(),
            attempts = outcome.attempts,
            "Figure saved"
        );
        Ok(ToolResponse::success(outcome, saved, sidecar.as_deref()))
    }

    async fn build_orchestrator(&self, qa: bool, enrich: bool) -> Result<FigureOrchestrator, ApiError> {
        let image = self.handles.image().await?;
        let text = if qa || enrich {
            self.text_backend().await
        } else {
            None
        };

        let enricher = match (&text, enrich) {
            (Some(text), true) => Some(Arc::new(
                PromptEnricher::new(text.clone())
                    .with_limits(self.config.enrichment.temperature, self.config.enrichment.max_tokens),
            )),
            _ => None,
        };
        let gate = match (text, qa) {
            (Some(text), true) => Some(Arc::new(
                QaEvaluator::new(text).with_temperature(self.config.qa.temperature),
            ) as Arc<dyn QualityGate>),
            _ => None,
        };

        Ok(
            FigureOrchestrator::new(image, self.config.qa.max_retries.min(MAX_QA_RETRIES))
                .with_enricher(enricher)
                .with_gate(gate),
        )
    }

    async fn text_backend(&self) -> Option<Arc<dyn TextBackend>> {
        match self.handles.text().await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(
                    error = %err,
                    qa_status = "qa_unavailable",
                    "Text backend unavailable; enrichment and QA are skipped"
                );
                None
            }
        }
    }
}

fn filename_hint(
    request: &ValidatedRequest,
    backend_mime: &str,
    timestamp: chrono::DateTime<chrono::Utc>,
) -> FilenameHint {
    FilenameHint {
        filename: request.filename.clone(),
        prompt: request.generation.prompt.clone(),
        sub_dir: request.output_dir.clone(),
        backend_mime: Some(backend_mime.to_string()),
        timestamp,
    }
}
