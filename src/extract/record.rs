//! Output record types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Price as published in the embedded analytics payload
///
/// The site emits a bare number today; a quoted amount is carried through
/// unchanged rather than reinterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(serde_json::Number),
    Label(String),
    /// `null` or any other JSON value, untouched
    Other(serde_json::Value),
}

/// One product page visit: one product in one color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Root `<body>` class attribute
    pub brand: Option<String>,

    /// Washing instructions, omitted from output when the page has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub care: Option<String>,

    /// Breadcrumb labels (set semantics)
    pub category: BTreeSet<String>,

    /// ISO currency code from the embedded payload
    pub currency: Option<String>,

    /// Description fragments in document order
    pub description: Vec<String>,

    /// Current color → gallery image sources; always exactly one entry
    pub image_urls: BTreeMap<String, Vec<String>>,

    /// `<html lang>` value
    #[serde(rename = "lang")]
    pub language: Option<String>,

    pub name: String,

    pub price: Price,

    /// Product id from the embedded payload
    pub retailer_sku: Option<String>,

    /// Keyed `"{color}_{size key}"`
    pub skus: BTreeMap<String, SkuDetail>,

    /// Referring listing page; always a single element
    pub trail: Vec<String>,

    /// Page URL after redirects
    pub url: String,
}

impl ProductRecord {
    /// The color this record was captured in
    pub fn color(&self) -> Option<&str> {
        self.image_urls.keys().next().map(String::as_str)
    }
}

/// Availability of one size in the page's current color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuDetail {
    pub color: Option<String>,
    pub name: String,
    pub out_of_stock: bool,
    pub price: Price,
    pub size: String,
}

/// How option values and option labels of the size selector are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkuMode {
    /// Every sku takes the last label as its size; matches the records the
    /// site feed has always produced
    #[default]
    Compatible,

    /// Each option value is paired with the label at the same position
    Paired,
}
