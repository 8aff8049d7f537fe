//! Mutation-driven rescans
//!
//! The widget rebuilds its toolbar and swaps its `<img>` whenever it wants
//! to. Instead of polling, each watch registers a subtree observer whose
//! callback reruns the idempotent scan. Errors are logged and dropped here:
//! nothing ever propagates into the page.

use crate::context::Context;
use crate::dom::{Dom, ObserveOptions};
use crate::error::DomError;
use crate::overlay::Overlay;
use crate::scanner::{ScanReport, scan_host};

/// All hosts currently in the document.
pub fn find_hosts<D: Dom>(ctx: &Context<D>) -> Result<Vec<D::Node>, DomError> {
    let body = ctx.dom().body().ok_or(DomError::MissingBody)?;
    Ok(ctx.settings().hosts.all_matches(ctx.dom(), &body))
}

/// Scan every host in the document. A failing host does not stop the rest.
pub fn scan_all<D: Dom>(ctx: &Context<D>, overlay: &Overlay<D::Node>) -> Result<ScanReport, DomError> {
    let mut total = ScanReport::default();
    for host in find_hosts(ctx)? {
        match scan_host(ctx, &host, overlay) {
            Ok(report) => total += report,
            Err(e) => tracing::warn!(error = %e, ?host, "Host scan failed"),
        }
    }
    Ok(total)
}

/// Rescan `host` whenever its subtree changes.
pub fn watch_host<D: Dom>(ctx: &Context<D>, host: &D::Node, overlay: &Overlay<D::Node>) -> Result<(), DomError> {
    let on_mutation = {
        let ctx = ctx.clone();
        let host = host.clone();
        let overlay = overlay.clone();
        move || match scan_host(&ctx, &host, &overlay) {
            Ok(report) => log_rescan(&report),
            Err(e) => tracing::warn!(error = %e, "Host rescan failed"),
        }
    };
    ctx.dom()
        .observe(host, &ObserveOptions::subtree_with_src(), Box::new(on_mutation))
}

/// Rescan every host, including ones added later, whenever the body changes.
pub fn watch_document<D: Dom>(ctx: &Context<D>, overlay: &Overlay<D::Node>) -> Result<(), DomError> {
    let body = ctx.dom().body().ok_or(DomError::MissingBody)?;
    let on_mutation = {
        let ctx = ctx.clone();
        let overlay = overlay.clone();
        move || match scan_all(&ctx, &overlay) {
            Ok(report) => log_rescan(&report),
            Err(e) => tracing::warn!(error = %e, "Document rescan failed"),
        }
    };
    ctx.dom()
        .observe(&body, &ObserveOptions::subtree_with_src(), Box::new(on_mutation))
}

fn log_rescan(report: &ScanReport) {
    if report.inserted > 0 {
        tracing::debug!(
            hosts = report.hosts,
            toolbars = report.toolbars,
            inserted = report.inserted,
            "Injected preview triggers"
        );
    } else {
        tracing::trace!(hosts = report.hosts, triggers = report.triggers, "Rescanned");
    }
}
