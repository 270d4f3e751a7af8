//! Shared fixtures: a registry of stub gatherers and audits.
//!
//! Gatherer factories are named after the artifact their instances
//! produce, so every reference shape resolves to an equal definition.

#![allow(dead_code)]

use pagecheck_config::config::ConfigResolver;
use pagecheck_config::plugin::{
    AuditFactory, AuditMeta, GatherPhases, Gatherer, GathererFactory, Registry, ScoreDisplayMode,
};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct StubGatherer {
    pub artifact: &'static str,
    pub phases: GatherPhases,
}

impl StubGatherer {
    pub fn new(artifact: &'static str) -> Self {
        Self {
            artifact,
            phases: GatherPhases::ALL,
        }
    }
}

impl Gatherer for StubGatherer {
    fn name(&self) -> &str {
        self.artifact
    }

    fn phases(&self) -> GatherPhases {
        self.phases
    }
}

#[derive(Debug, Clone)]
pub struct StubGathererFactory(pub &'static str);

impl GathererFactory for StubGathererFactory {
    fn name(&self) -> &str {
        self.0
    }

    fn create(&self) -> Arc<dyn Gatherer> {
        Arc::new(StubGatherer::new(self.0))
    }
}

#[derive(Debug, Clone)]
pub struct StubAudit(pub AuditMeta);

impl AuditFactory for StubAudit {
    fn meta(&self) -> &AuditMeta {
        &self.0
    }
}

/// Built-in gatherers: short name, artifact.
pub const GATHERERS: &[(&str, &str)] = &[
    ("scripts", "Scripts"),
    ("css-usage", "CSSUsage"),
    ("viewport-dimensions", "ViewportDimensions"),
    ("runtime-exceptions", "RuntimeExceptions"),
    ("console-messages", "ConsoleMessages"),
    ("accessibility", "Accessibility"),
    ("image-usage", "ImageUsage"),
    ("link-elements", "LinkElements"),
    ("meta-elements", "MetaElements"),
    ("script-elements", "ScriptElements"),
    ("service-worker", "ServiceWorker"),
    ("offline", "Offline"),
    ("start-url", "StartUrl"),
    ("http-redirect", "HTTPRedirect"),
    ("html-without-javascript", "HTMLWithoutJavaScript"),
];

fn scored(id: &str, title: &str, artifacts: &[&str]) -> AuditMeta {
    AuditMeta::new(id, title, format!("Checks {}.", title.to_lowercase()))
        .with_failure_title(format!("{} failed", title))
        .with_required_artifacts(artifacts.iter().copied())
}

/// Built-in audits: short name, metadata.
pub fn audits() -> Vec<(&'static str, AuditMeta)> {
    vec![
        (
            "metrics/first-contentful-paint",
            scored(
                "first-contentful-paint",
                "First Contentful Paint",
                &["traces", "devtoolsLogs"],
            )
            .with_display_mode(ScoreDisplayMode::Numeric),
        ),
        (
            "viewport",
            scored("viewport", "Viewport meta tag", &["MetaElements"]),
        ),
        (
            "content-width",
            scored(
                "content-width",
                "Content sized to viewport",
                &["ViewportDimensions"],
            ),
        ),
        (
            "errors-in-console",
            scored(
                "errors-in-console",
                "No console errors",
                &["ConsoleMessages", "RuntimeExceptions"],
            ),
        ),
        (
            "service-worker",
            scored("service-worker", "Service worker", &["ServiceWorker", "URL"]),
        ),
        (
            "redirects-http",
            scored("redirects-http", "Redirects HTTP", &["HTTPRedirect"]),
        ),
        (
            "accessibility/color-contrast",
            scored("color-contrast", "Color contrast", &["Accessibility"]),
        ),
        (
            "manual/pwa-cross-browser",
            AuditMeta::new(
                "pwa-cross-browser",
                "Works across browsers",
                "Check by hand.",
            )
            .with_display_mode(ScoreDisplayMode::Manual),
        ),
        (
            "dobetterweb/js-libraries",
            scored("js-libraries", "JavaScript libraries", &["Stacks"]),
        ),
    ]
}

pub fn registry() -> Registry {
    let mut builder = Registry::builder();
    for (name, artifact) in GATHERERS {
        builder = builder.gatherer(*name, Arc::new(StubGathererFactory(*artifact)));
    }
    for (name, meta) in audits() {
        builder = builder.audit(name, Arc::new(StubAudit(meta)));
    }
    builder.build().expect("fixture registry is valid")
}

pub fn resolver() -> ConfigResolver {
    ConfigResolver::new(registry())
}

/// Options object from a JSON literal.
pub fn options(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("options must be an object, got {}", other),
    }
}
