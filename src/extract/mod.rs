//! Product page extraction
//!
//! Turns one fetched product page into a [`ProductRecord`]. Every field is
//! read by an independent rule (see [`fields`]); the [`Extractor`] only
//! sequences them and decides which absences are fatal:
//!
//! - a missing or malformed embedded payload is an [`ExtractError::Parse`]
//! - a missing product name or referrer is an [`ExtractError::MissingField`]
//! - missing care instructions, brand or language simply stay `None`
//!
//! The extractor holds nothing but compiled selectors, so one instance can
//! serve any number of pages concurrently.

mod embedded;
pub mod fields;
mod record;
mod text;

pub use embedded::EmbeddedProduct;
pub use record::{Price, ProductRecord, SkuDetail, SkuMode};
pub use text::{clean_fragment, strip_non_ascii};

use fields::{build_skus, FieldSelectors, SkuContext};
use scraper::Html;
use thiserror::Error;

/// Key used in `image_urls` and `skus` when the page shows no color swatch
pub const MISSING_COLOR_KEY: &str = "None";

/// Errors that abort extraction of a single page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid selector {0}")]
    Selector(String),
}

/// Where a product page came from
///
/// The referrer travels with the request that produced the page; it is not
/// read back from response headers.
#[derive(Debug, Clone, Copy)]
pub struct PageSource<'a> {
    /// Page URL after redirects
    pub url: &'a str,

    /// Listing page that linked here, if the visit was a followed link
    pub referer: Option<&'a str>,
}

/// Stateless product page extractor
#[derive(Debug)]
pub struct Extractor {
    selectors: FieldSelectors,
    sku_mode: SkuMode,
}

impl Extractor {
    /// Creates an extractor producing skus in the given mode
    pub fn new(sku_mode: SkuMode) -> Result<Self, ExtractError> {
        Ok(Self {
            selectors: FieldSelectors::new()?,
            sku_mode,
        })
    }

    /// Parses raw HTML and extracts a record from it
    pub fn extract_html(
        &self,
        html: &str,
        source: &PageSource<'_>,
    ) -> Result<ProductRecord, ExtractError> {
        let document = Html::parse_document(html);
        self.extract(&document, source)
    }

    /// Extracts a record from an already parsed product page
    ///
    /// # Errors
    ///
    /// * [`ExtractError::Parse`] - the embedded product payload is missing,
    ///   malformed, or has no currency, price or id path
    /// * [`ExtractError::MissingField`] - no product name, or the visit has
    ///   no referring page
    pub fn extract(
        &self,
        document: &Html,
        source: &PageSource<'_>,
    ) -> Result<ProductRecord, ExtractError> {
        let s = &self.selectors;

        let product = s.embedded_product(document)?;

        let brand = s.brand(document);
        let care = s.care(document);
        let category = s.category(document);
        let description = s.description(document);

        let color = s.color(document);
        if color.is_none() {
            tracing::warn!(url = source.url, "Product page has no color swatch");
        }
        let color_key = color.as_deref().unwrap_or(MISSING_COLOR_KEY);
        let image_urls = s.image_urls(document, color_key);

        let language = s.language(document);
        let name = s.name(document)?;

        let skus = build_skus(
            &SkuContext {
                color_key,
                color: color.as_deref(),
                name: &name,
                price: &product.price,
            },
            &s.size_values(document),
            &s.size_labels(document),
            self.sku_mode,
        );

        let referer = source.referer.ok_or(ExtractError::MissingField("trail"))?;

        Ok(ProductRecord {
            brand,
            care,
            category,
            currency: product.currency,
            description,
            image_urls,
            language,
            name,
            price: product.price,
            retailer_sku: product.id,
            skus,
            trail: vec![referer.to_string()],
            url: source.url.to_string(),
        })
    }
}
