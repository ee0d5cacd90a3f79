use scraper::Html;
use thiserror::Error;
use url::Url;

/// Errors that stop a page from being processed at all
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Empty document at {url}")]
    EmptyDocument { url: String },

    #[error("Document at {url} contains no markup")]
    NotMarkup { url: String },

    #[error("Selector engine panicked on {url}: {message}")]
    Panicked { url: String, message: String },
}

/// A fetched HTML document, parsed and ready for selector rules
///
/// `scraper::Html` is not `Send`, so a `Page` is built and consumed inside a
/// single synchronous step and never held across an `.await`.
#[derive(Debug)]
pub struct Page {
    url: Url,
    document: Html,
}

impl Page {
    /// Parses a fetched body
    ///
    /// The HTML parser recovers from almost anything, so the only structural
    /// failures are a body with nothing in it or a body with no markup.
    ///
    /// # Example
    ///
    /// ```
    /// use shelfscan::extract::Page;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://shop.example.com/p/1").unwrap();
    /// let page = Page::parse(url, "<h1>Rooibos Tea</h1>").unwrap();
    /// assert_eq!(page.url().path(), "/p/1");
    /// ```
    pub fn parse(url: Url, body: &str) -> Result<Self, ExtractionError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(ExtractionError::EmptyDocument {
                url: url.to_string(),
            });
        }
        if !trimmed.contains('<') {
            return Err(ExtractionError::NotMarkup {
                url: url.to_string(),
            });
        }

        let document = Html::parse_document(body);
        if !document.errors.is_empty() {
            tracing::trace!(
                url = %url,
                errors = document.errors.len(),
                "HTML parsed with recoverable errors"
            );
        }

        Ok(Self { url, document })
    }

    /// URL the document was served from
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn document(&self) -> &Html {
        &self.document
    }
}
