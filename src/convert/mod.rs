//! Document conversion.
//!
//! The route table only needs metadata; the HTTP layer needs rendered HTML.
//! Both go through the [`Converter`] trait so the rest of the crate never
//! depends on how documents are actually processed.

mod asciidoctor;
mod error;
pub mod scanner;

pub use asciidoctor::AsciidoctorConverter;
pub use error::ConvertError;

use std::path::Path;

use crate::routing::IncludedFile;

/// Title and dependency list of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    /// Files the document pulls in, order irrelevant, no duplicates.
    pub included_files: Vec<IncludedFile>,
}

/// Converts documents to HTML and extracts their metadata.
pub trait Converter: Send + Sync {
    /// Render a document to an HTML fragment.
    fn render(&self, path: &Path) -> Result<String, ConvertError>;

    /// Read the title and the files a document includes.
    fn metadata(&self, path: &Path) -> Result<DocumentMetadata, ConvertError>;
}
