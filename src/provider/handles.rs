//! Lazily constructed, shared backend client handles.
//!
//! Each handle is built at most once, on first use, behind a single-assignment
//! cell. Construction is pure (no network I/O), so concurrent first calls racing
//! to initialize is harmless: one value wins and every caller sees it.

use super::{ImageBackend, ProviderFactory, ProvidersConfig, TextBackend};
use crate::error::ApiError;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub struct BackendHandles {
    providers: ProvidersConfig,
    image: OnceCell<Arc<dyn ImageBackend>>,
    text: OnceCell<Arc<dyn TextBackend>>,
}

impl BackendHandles {
    pub fn new(providers: ProvidersConfig) -> Self {
        Self {
            providers,
            image: OnceCell::new(),
            text: OnceCell::new(),
        }
    }

    /// Handles with pre-built clients. A `None` text backend is still built
    /// lazily from default configuration if requested.
    pub fn with_backends(
        image: Arc<dyn ImageBackend>,
        text: Option<Arc<dyn TextBackend>>,
    ) -> Self {
        Self {
            providers: ProvidersConfig::default(),
            image: OnceCell::new_with(Some(image)),
            text: OnceCell::new_with(text),
        }
    }

    pub async fn image(&self) -> Result<Arc<dyn ImageBackend>, ApiError> {
        self.image
            .get_or_try_init(|| async {
                ProviderFactory::create_image_client(&self.providers.image)
            })
            .await
            .map(Arc::clone)
    }

    pub async fn text(&self) -> Result<Arc<dyn TextBackend>, ApiError> {
        self.text
            .get_or_try_init(|| async { ProviderFactory::create_text_client(&self.text_config()) })
            .await
            .map(Arc::clone)
    }

    fn text_config(&self) -> super::TextProviderConfig {
        let mut config = self.providers.text.clone();
        config.model = config.effective_model();
        config
    }
}
