pub type GarbResult<T> = Result<T, GarbError>;

#[derive(thiserror::Error, Debug)]
pub enum GarbError {
    #[error("unknown article: {0}")]
    UnknownArticle(String),

    #[error("invalid slot: {0}")]
    InvalidSlot(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("empty draft: add at least one article before saving")]
    EmptyDraft,

    #[error("image load error: {0}")]
    ImageLoad(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GarbError {
    pub fn unknown_article(id: impl Into<String>) -> Self {
        Self::UnknownArticle(id.into())
    }

    pub fn invalid_slot(key: impl Into<String>) -> Self {
        Self::InvalidSlot(key.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn image_load(msg: impl Into<String>) -> Self {
        Self::ImageLoad(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}
