use thiserror::Error;

/// Failure reported by a [`Dom`](crate::Dom) backend.
///
/// None of these reach the page: callback boundaries log and drop them.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("document has no body")]
    MissingBody,

    #[error("failed to create <{tag}> element")]
    CreateElement { tag: String },

    #[error("failed to insert node: {0}")]
    Insert(String),

    #[error("failed to set attribute {name}: {reason}")]
    Attribute { name: String, reason: String },

    #[error("failed to register {event} listener: {reason}")]
    Listen { event: &'static str, reason: String },

    #[error("failed to observe mutations: {0}")]
    Observe(String),

    #[error("failed to show dialog: {0}")]
    ShowModal(String),
}
