use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::corpus::Corpus;
use crate::embed::EmbeddingService;
use crate::embed::cache::{DEFAULT_KEY_CHARS, EmbeddingCache};
use crate::embed::ollama::OllamaService;
use crate::embed::openai::{self, OpenAiService};
use crate::embed::provider::EmbeddingProvider;
use crate::search::Retriever;

const CONFIG_DIR: &str = ".ragkb";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub embed: EmbedConfig,
    pub retrieval: RetrievalConfig,
    pub corpus: CorpusConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    pub backend: EmbedBackend,
    /// Max concurrent document embedding requests (1 = sequential)
    pub max_concurrent: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EmbedBackend {
    #[serde(rename = "openai")]
    OpenAi {
        model: String,
        url: String,
        /// Environment variable holding the API key
        api_key_env: String,
    },
    #[serde(rename = "ollama")]
    Ollama { model: String, url: String },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Documents returned when the caller doesn't ask for a count
    pub top_k: usize,
    /// Characters of text that take part in the embedding cache key
    pub cache_key_chars: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// TOML file with `[[documents]]` entries (default: built-in sample set)
    pub path: Option<PathBuf>,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            backend: EmbedBackend::default(),
            max_concurrent: 4,
        }
    }
}

impl Default for EmbedBackend {
    fn default() -> Self {
        EmbedBackend::OpenAi {
            model: openai::DEFAULT_MODEL.to_string(),
            url: openai::DEFAULT_URL.to_string(),
            api_key_env: openai::DEFAULT_KEY_ENV.to_string(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            cache_key_chars: DEFAULT_KEY_CHARS,
        }
    }
}

impl EmbedBackend {
    pub fn model(&self) -> &str {
        match self {
            EmbedBackend::OpenAi { model, .. } | EmbedBackend::Ollama { model, .. } => model,
        }
    }

    pub fn service(&self) -> Arc<dyn EmbeddingService> {
        match self {
            EmbedBackend::OpenAi {
                url, api_key_env, ..
            } => Arc::new(OpenAiService::from_env(url, api_key_env)),
            EmbedBackend::Ollama { url, .. } => Arc::new(OllamaService::new(url)),
        }
    }
}

impl Config {
    /// Load config from a .ragkb/config.toml file, falling back to defaults.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = Self::path(project_root);
        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading config from {}", config_path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("parsing config from {}", config_path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn path(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_DIR).join("config.toml")
    }

    /// Write current config to disk (for `ragkb init`).
    pub fn save(&self, project_root: &Path) -> Result<()> {
        let dir = project_root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating config dir {}", dir.display()))?;
        let config_path = dir.join("config.toml");
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)
            .with_context(|| format!("writing config to {}", config_path.display()))?;
        Ok(())
    }

    /// The configured document collection. Relative paths resolve against `project_root`.
    pub fn load_corpus(&self, project_root: &Path) -> Result<Corpus> {
        match &self.corpus.path {
            Some(path) => Corpus::from_toml_file(&project_root.join(path)),
            None => Ok(Corpus::builtin()),
        }
    }

    /// Wire the configured backend, a fresh cache and the corpus into a retriever.
    pub fn retriever(&self, project_root: &Path) -> Result<Retriever> {
        let corpus = self.load_corpus(project_root)?;
        let provider = EmbeddingProvider::new(
            self.embed.backend.service(),
            Arc::new(EmbeddingCache::new(self.retrieval.cache_key_chars)),
            self.embed.backend.model(),
        );
        Ok(Retriever::new(provider, corpus.into_documents())
            .with_max_concurrent(self.embed.max_concurrent))
    }
}
