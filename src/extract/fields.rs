//! Field-level extraction rules
//!
//! Each method reads one field from a parsed product page and nothing else,
//! so the rules can be exercised independently.

use crate::extract::embedded::EmbeddedProduct;
use crate::extract::record::{Price, SkuDetail, SkuMode};
use crate::extract::text::{clean_fragment, strip_non_ascii};
use crate::extract::ExtractError;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, BTreeSet};

/// Compiled selectors for every product-page field
#[derive(Debug)]
pub struct FieldSelectors {
    body: Selector,
    html: Selector,
    care: Selector,
    breadcrumb: Selector,
    description: Selector,
    payload: Selector,
    name: Selector,
    color: Selector,
    gallery: Selector,
    size_values: Selector,
    size_labels: Selector,
}

fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{}: {}", css, e)))
}

/// Direct text-node children of every matched element, in document order
fn own_text(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .flat_map(|element| {
            element
                .children()
                .filter_map(|node| node.value().as_text().map(|text| String::from(&**text)))
        })
        .collect()
}

fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .find_map(|element| element.value().attr(attr))
        .map(str::to_string)
}

fn all_attrs(document: &Html, selector: &Selector, attr: &str) -> Vec<String> {
    document
        .select(selector)
        .filter_map(|element: ElementRef<'_>| element.value().attr(attr))
        .map(str::to_string)
        .collect()
}

impl FieldSelectors {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            body: compile("body")?,
            html: compile("html")?,
            care: compile(r#"div[id="lavado"] p"#)?,
            breadcrumb: compile(".breadcrumb-item")?,
            description: compile("div.value.content")?,
            payload: compile(r#"input[id="pdp-gtm-data"]"#)?,
            name: compile("h1.product-name")?,
            color: compile(r#"button[class="color-attribute"]"#)?,
            gallery: compile("div.px-2 [src]")?,
            size_values: compile("select.select-size [value]")?,
            size_labels: compile("select.select-size option")?,
        })
    }

    /// Embedded analytics payload; a page without one is a parse failure
    pub fn embedded_product(&self, document: &Html) -> Result<EmbeddedProduct, ExtractError> {
        let raw = first_attr(document, &self.payload, "value").ok_or_else(|| {
            ExtractError::Parse("page has no pdp-gtm-data payload".to_string())
        })?;
        EmbeddedProduct::parse(&raw)
    }

    pub fn brand(&self, document: &Html) -> Option<String> {
        first_attr(document, &self.body, "class")
    }

    pub fn care(&self, document: &Html) -> Option<String> {
        own_text(document, &self.care)
            .into_iter()
            .next()
            .filter(|text| !text.is_empty())
            .map(|text| strip_non_ascii(&text))
    }

    pub fn category(&self, document: &Html) -> BTreeSet<String> {
        document
            .select(&self.breadcrumb)
            .flat_map(|item| item.text())
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(strip_non_ascii)
            .collect()
    }

    pub fn description(&self, document: &Html) -> Vec<String> {
        own_text(document, &self.description)
            .iter()
            .map(|fragment| clean_fragment(fragment))
            .collect()
    }

    pub fn language(&self, document: &Html) -> Option<String> {
        first_attr(document, &self.html, "lang")
    }

    pub fn name(&self, document: &Html) -> Result<String, ExtractError> {
        own_text(document, &self.name)
            .into_iter()
            .next()
            .map(|name| strip_non_ascii(&name))
            .ok_or(ExtractError::MissingField("name"))
    }

    pub fn color(&self, document: &Html) -> Option<String> {
        first_attr(document, &self.color, "data-color-name")
    }

    pub fn image_urls(&self, document: &Html, color_key: &str) -> BTreeMap<String, Vec<String>> {
        let sources = all_attrs(document, &self.gallery, "src");
        BTreeMap::from([(color_key.to_string(), sources)])
    }

    pub fn size_values(&self, document: &Html) -> Vec<String> {
        all_attrs(document, &self.size_values, "value")
    }

    pub fn size_labels(&self, document: &Html) -> Vec<String> {
        own_text(document, &self.size_labels)
            .iter()
            .map(|label| label.trim().to_string())
            .collect()
    }
}

/// Everything a sku entry repeats from the page
pub struct SkuContext<'a> {
    pub color_key: &'a str,
    pub color: Option<&'a str>,
    pub name: &'a str,
    pub price: &'a Price,
}

/// Builds the size × color matrix for the page's current color
///
/// Keys always come from the option values. In [`SkuMode::Compatible`]
/// every entry's size is the last option label; [`SkuMode::Paired`] pairs
/// each value with the label at the same position. `"null"` (the size
/// picker placeholder) is the only value flagged out of stock.
pub fn build_skus(
    context: &SkuContext<'_>,
    values: &[String],
    labels: &[String],
    mode: SkuMode,
) -> BTreeMap<String, SkuDetail> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let label = match mode {
                SkuMode::Compatible => labels.last(),
                SkuMode::Paired => labels.get(index),
            };

            let detail = SkuDetail {
                color: context.color.map(str::to_string),
                name: context.name.to_string(),
                out_of_stock: value == "null",
                price: context.price.clone(),
                size: label.unwrap_or(value).clone(),
            };

            (format!("{}_{}", context.color_key, value), detail)
        })
        .collect()
}
