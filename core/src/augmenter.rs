//! Startup
//!
//! [`Augmenter`] ties the pieces together: wait for the document to finish
//! parsing, make sure the overlay exists, scan the hosts present at that
//! moment and install the watchers the configured [`WatchMode`] calls for.

use std::rc::Rc;

use lightbox_types::{LightboxConfig, WatchMode};

use crate::context::{Context, Settings};
use crate::dom::Dom;
use crate::error::DomError;
use crate::overlay::{Overlay, ensure_overlay};
use crate::scanner::{ScanReport, scan_host};
use crate::watcher::{find_hosts, scan_all, watch_document, watch_host};

pub struct Augmenter<D: Dom> {
    ctx: Context<D>,
}

impl<D: Dom> Clone for Augmenter<D> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
        }
    }
}

impl<D: Dom> Augmenter<D> {
    pub fn new(dom: Rc<D>, config: &LightboxConfig) -> Self {
        Self {
            ctx: Context::new(dom, Settings::from_config(config)),
        }
    }

    pub fn context(&self) -> &Context<D> {
        &self.ctx
    }

    /// Initialize now, or once the document is ready if it is still loading.
    pub fn mount(&self) -> Result<(), DomError> {
        if self.ctx.dom().is_loading() {
            tracing::debug!("Document still loading, deferring lightbox setup");
            let this = self.clone();
            return self.ctx.dom().on_ready(Box::new(move || {
                if let Err(e) = this.initialize() {
                    tracing::warn!(error = %e, "Lightbox setup failed");
                }
            }));
        }
        self.initialize().map(|_| ())
    }

    /// Ensure the overlay, scan existing hosts and start watching.
    pub fn initialize(&self) -> Result<Overlay<D::Node>, DomError> {
        let ctx = &self.ctx;
        let overlay = ensure_overlay(ctx)?;

        let report = match ctx.settings().watch_mode {
            WatchMode::Document => {
                let report = scan_all(ctx, &overlay)?;
                watch_document(ctx, &overlay)?;
                report
            }
            WatchMode::PerHost => {
                let mut total = ScanReport::default();
                for host in find_hosts(ctx)? {
                    match scan_host(ctx, &host, &overlay) {
                        Ok(report) => total += report,
                        Err(e) => tracing::warn!(error = %e, ?host, "Initial host scan failed"),
                    }
                    watch_host(ctx, &host, &overlay)?;
                }
                total
            }
        };

        tracing::info!(
            hosts = report.hosts,
            triggers = report.triggers,
            mode = ?ctx.settings().watch_mode,
            "Image lightbox ready"
        );
        Ok(overlay)
    }
}
