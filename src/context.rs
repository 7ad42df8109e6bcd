use crate::config::Config;
use crate::language::registry::LanguageRegistry;
use crate::ranking::cache::ContestViewCache;
use crate::ranking::contest::ContestSource;
use crate::ranking::scheduler::RefreshScheduler;
use crate::web::templates::Templates;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Everything the ranking server shares between request handlers and the refresh scheduler.
pub struct AppContext {
    pub registry: Arc<LanguageRegistry>,
    pub cache: Arc<ContestViewCache>,
    pub templates: Templates,
    _scheduler: Option<RefreshScheduler>,
}

impl AppContext {
    pub fn new(registry: Arc<LanguageRegistry>, source: Arc<dyn ContestSource>) -> Result<Self> {
        Ok(Self {
            registry,
            cache: Arc::new(ContestViewCache::new(source)),
            templates: Templates::new()?,
            _scheduler: None,
        })
    }

    /// Starts refreshing the ranking every `interval`; the scheduler lives as long as the context.
    pub fn with_scheduler(mut self, interval: Duration) -> Self {
        self._scheduler = Some(RefreshScheduler::spawn(self.cache.clone(), interval));
        self
    }
}

pub fn build_registry(config: &Config) -> Result<LanguageRegistry> {
    let mut registry = match &config.compilation.allowed_toolchains {
        Some(programs) => LanguageRegistry::with_allowed_toolchains(programs.iter().cloned()),
        None => LanguageRegistry::new(),
    };
    registry.register_builtin(config.compilation.languages.as_deref())?;
    Ok(registry)
}
