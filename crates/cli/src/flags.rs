use clap::ValueEnum;
use codechat_vector_store::EmbeddingMode;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum EmbedMode {
    Stub,
    Ollama,
}

impl EmbedMode {
    pub(crate) const fn as_domain(self) -> EmbeddingMode {
        match self {
            EmbedMode::Stub => EmbeddingMode::Stub,
            EmbedMode::Ollama => EmbeddingMode::Ollama,
        }
    }
}
