//! Builder for packaging requests.
//!
//! # Example
//! ```ignore
//! use pdfa3pack_core::api::Packager;
//!
//! let source = std::fs::read("blank.pdf")?;
//! let invoice = std::fs::read("invoice.xml")?;
//! let output = Packager::new()
//!     .title("Invoice INV-00001")
//!     .package_with_report(&source, &invoice, "invoice.xml")?;
//! println!("{} pages, {:?}", output.report.page_count, output.report.strategy);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PackConfig;
use crate::document::PDFDocument;
use crate::embed::{
    AttachmentHelper, AttachmentRequest, EmbedStrategy, StandardAttachmentHelper, embed_attachment_with_depth,
};
use crate::error::PackResult;
use crate::graph::{ObjectGraph, import_pages_with_depth};
use crate::intent::{ProfileSource, add_output_intent};
use crate::metadata::{DocumentInfo, now_utc, synchronize};
use crate::sanity;
use crate::validate::{ConformanceChecker, StrictResult, StructuralConformanceChecker, validate_strict_with};
use crate::writer::PdfWriter;

/// Version written to every packaged document.
const PDFA3_VERSION: (u8, u8) = (1, 7);

/// What a packaging run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackReport {
    pub strategy: EmbedStrategy,
    pub profile_source: ProfileSource,
    pub page_count: usize,
    pub attachment_size: usize,
    /// Instant written to `/Info` and XMP.
    pub timestamp: DateTime<Utc>,
}

/// Packaged bytes plus the run report.
#[derive(Debug, Clone)]
pub struct PackOutput {
    pub bytes: Vec<u8>,
    pub report: PackReport,
}

/// Configures and runs packaging and strict validation.
///
/// A `Packager` holds no per-request state and can be shared between
/// threads.
#[derive(Clone)]
pub struct Packager {
    config: PackConfig,
    helper: Option<Arc<dyn AttachmentHelper>>,
    checker: Option<Arc<dyn ConformanceChecker>>,
    strict_timeout: Option<Duration>,
    title: Option<String>,
    author: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

impl fmt::Debug for Packager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packager")
            .field("config", &self.config)
            .field("helper", &self.helper.is_some())
            .field("custom_checker", &self.checker.is_some())
            .field("strict_timeout", &self.strict_timeout)
            .field("title", &self.title)
            .field("author", &self.author)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl Default for Packager {
    fn default() -> Self {
        Self::new()
    }
}

impl Packager {
    /// Default configuration, the bundled attachment helper and the
    /// built-in conformance checker.
    pub fn new() -> Self {
        let config = PackConfig::default();
        Self {
            strict_timeout: config.validation.strict_timeout(),
            config,
            helper: Some(Arc::new(StandardAttachmentHelper)),
            checker: None,
            title: None,
            author: None,
            timestamp: None,
        }
    }

    /// Replace the configuration. The strict timeout is reset from
    /// `config.validation`.
    pub fn with_config(mut self, config: PackConfig) -> Self {
        self.strict_timeout = config.validation.strict_timeout();
        self.config = config;
        self
    }

    pub fn with_helper(mut self, helper: Arc<dyn AttachmentHelper>) -> Self {
        self.helper = Some(helper);
        self
    }

    /// Always build attachments manually.
    pub fn without_helper(mut self) -> Self {
        self.helper = None;
        self
    }

    /// Use `checker` instead of the built-in structural checker.
    pub fn with_checker(mut self, checker: Arc<dyn ConformanceChecker>) -> Self {
        self.checker = Some(checker);
        self
    }

    /// Bound strict validation; `None` waits indefinitely.
    pub fn strict_timeout(mut self, limit: Option<Duration>) -> Self {
        self.strict_timeout = limit;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    /// Stamp documents with `instant` instead of the current time.
    pub fn timestamp(mut self, instant: DateTime<Utc>) -> Self {
        self.timestamp = Some(instant);
        self
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Package `attachment` into a copy of `source` as PDF/A-3B.
    pub fn package(&self, source: &[u8], attachment: &[u8], display_name: &str) -> PackResult<Vec<u8>> {
        self.package_with_report(source, attachment, display_name)
            .map(|output| output.bytes)
    }

    /// Like [`package`](Self::package), also returning what was done.
    pub fn package_with_report(
        &self,
        source: &[u8],
        attachment: &[u8],
        display_name: &str,
    ) -> PackResult<PackOutput> {
        let source = PDFDocument::new(source)?;
        let instant = self.timestamp.unwrap_or_else(now_utc);
        let max_depth = self.config.validation.max_walk_depth;

        let mut graph = ObjectGraph::new();
        let request = AttachmentRequest::new(
            Bytes::copy_from_slice(attachment),
            display_name,
            &self.config.attachment,
            instant,
        );
        let outcome = embed_attachment_with_depth(&mut graph, &request, self.helper.as_deref(), max_depth)?;
        tracing::debug!(strategy = ?outcome.strategy, name = %outcome.name, "attachment embedded");

        let page_count = import_pages_with_depth(&mut graph, &source, max_depth)?;
        tracing::debug!(pages = page_count, "pages imported");
        let (major, minor) = PDFA3_VERSION;
        graph.set_version(major, minor);

        let info = DocumentInfo::resolve(self.title.as_deref(), self.author.as_deref(), &self.config.document);
        synchronize(&mut graph, &info, &instant)?;
        let profile_source = add_output_intent(&mut graph, &self.config.output_intent)?;

        sanity::check(&graph, &request.name)?;
        let bytes = PdfWriter::new(&graph).with_max_depth(max_depth).write()?;

        tracing::info!(
            name = %request.name,
            pages = page_count,
            attachment_size = request.size(),
            bytes = bytes.len(),
            "packaged PDF/A-3B document"
        );
        Ok(PackOutput {
            bytes,
            report: PackReport {
                strategy: outcome.strategy,
                profile_source,
                page_count,
                attachment_size: request.size(),
                timestamp: instant,
            },
        })
    }

    /// Strict validation with the configured checker and timeout.
    pub fn validate_strict(&self, bytes: &[u8]) -> PackResult<StrictResult> {
        let checker = self.checker.clone().unwrap_or_else(|| {
            Arc::new(StructuralConformanceChecker::with_max_depth(
                self.config.validation.max_walk_depth,
            ))
        });
        validate_strict_with(bytes, checker, self.strict_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn packager_is_shareable() {
        assert_send_sync::<Packager>();
    }

    #[test]
    fn config_sets_strict_timeout() {
        let config = PackConfig {
            validation: ValidationConfig {
                strict_timeout_secs: 0,
                ..ValidationConfig::default()
            },
            ..PackConfig::default()
        };
        let packager = Packager::new().with_config(config);
        assert_eq!(packager.strict_timeout, None);
        let packager = packager.strict_timeout(Some(Duration::from_secs(2)));
        assert_eq!(packager.strict_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn garbage_source_is_a_syntax_error() {
        let err = Packager::new()
            .package(b"not a pdf", b"<a/>", "invoice.xml")
            .unwrap_err();
        assert_eq!(err.code(), "SYNTAX");
    }

    #[test]
    fn default_timeout_comes_from_config() {
        assert_eq!(Packager::new().strict_timeout, Some(Duration::from_secs(30)));
    }
}
