//! Full-size image preview for third-party image widgets.
//!
//! Watches the page for image widget hosts, injects a preview trigger into
//! each host toolbar and drives one shared modal `<dialog>` showing the
//! clicked image at natural resolution.

pub mod augmenter;
pub mod context;
pub mod dom;
pub mod error;
pub mod matcher;
pub mod overlay;
pub mod scanner;
pub mod watcher;


// Re-exports for convenience
pub use augmenter::Augmenter;
pub use context::{Context, Settings};
pub use dom::{Callback, Dom, DomEvent, MemoryDom, NodeId, ObserveOptions};
pub use error::DomError;
pub use lightbox_types::{LightboxConfig, SignatureSpec, WatchMode};
pub use matcher::{Matcher, Signatures};
pub use overlay::{Overlay, ensure_overlay};
pub use scanner::{ScanReport, scan_host};
