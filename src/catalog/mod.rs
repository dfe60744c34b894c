//! Product catalog types
//!
//! Products reach the canvas in two data contracts: the "live" shape produced
//! by the shopping agent's scraper, and the older "mock" shape used by the
//! canvas demo data. Both deserialize into the one [`Product`] type through
//! [`ProductShape`]; serialization always emits the live (canonical) shape.

mod lenient;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) use lenient::{product_patch, products as product_list};

/// A product shown on the canvas, buffered, or saved to the wishlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProductShape")]
pub struct Product {
    /// Stable identifier for the lifetime of the session
    pub id: String,

    pub title: String,

    /// Display price, as scraped ("$1,999")
    pub price_text: String,

    /// Source page, opened in a new browsing context by the UI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,

    pub image_urls: Vec<String>,

    /// Retailer or store name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_value: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_count: Option<u64>,

    pub pros: Vec<String>,
    pub cons: Vec<String>,

    pub specifications: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_sentiment: Option<ReviewSentiment>,

    pub key_insights_from_reviews: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_score_out_of_100: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub would_buy_again_score_out_of_100: Option<f64>,
}

/// AI-derived review sentiment breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSentiment {
    #[serde(default)]
    pub positive_score: f64,

    #[serde(default)]
    pub neutral_score: f64,

    #[serde(default)]
    pub negative_score: f64,

    /// Single-label form some scrapes emit ("positive" | "neutral" | "negative")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Product {
    /// Minimal product, mostly useful for building canvases in code
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price_text: String::new(),
            product_url: None,
            image_urls: Vec::new(),
            source: None,
            rating_value: None,
            rating_count: None,
            pros: Vec::new(),
            cons: Vec::new(),
            specifications: BTreeMap::new(),
            review_sentiment: None,
            key_insights_from_reviews: Vec::new(),
            recommendation_score_out_of_100: None,
            would_buy_again_score_out_of_100: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.product_url = Some(url.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price_text = price.into();
        self
    }
}

/// Either product contract accepted on the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProductShape {
    Live(LiveProduct),
    Mock(MockProduct),
}

/// Product as scraped and scored by the shopping agent
#[derive(Debug, Clone, Deserialize)]
pub struct LiveProduct {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub price_text: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub product_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub image_urls: Vec<String>,
    #[serde(default, alias = "retailer", deserialize_with = "lenient::optional_text")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub rating_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub rating_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub pros: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub cons: Vec<String>,
    #[serde(default, deserialize_with = "lenient::table")]
    pub specifications: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient::or_none")]
    pub review_sentiment: Option<ReviewSentiment>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub key_insights_from_reviews: Vec<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub recommendation_score_out_of_100: Option<f64>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub would_buy_again_score_out_of_100: Option<f64>,
}

/// Product in the canvas demo contract
#[derive(Debug, Clone, Deserialize)]
pub struct MockProduct {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub pros: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub cons: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient::float")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub reviews: Option<u64>,
    #[serde(default, deserialize_with = "lenient::table")]
    pub specs: BTreeMap<String, String>,
}

fn assign_id(id: Option<String>) -> String {
    match id {
        Some(id) if !id.trim().is_empty() => id,
        _ => uuid::Uuid::new_v4().to_string(),
    }
}

impl From<LiveProduct> for Product {
    fn from(live: LiveProduct) -> Self {
        Self {
            id: assign_id(live.id),
            title: live.title,
            price_text: live.price_text,
            product_url: live.product_url,
            image_urls: live.image_urls,
            source: live.source,
            rating_value: live.rating_value,
            rating_count: live.rating_count,
            pros: live.pros,
            cons: live.cons,
            specifications: live.specifications,
            review_sentiment: live.review_sentiment,
            key_insights_from_reviews: live.key_insights_from_reviews,
            recommendation_score_out_of_100: live.recommendation_score_out_of_100,
            would_buy_again_score_out_of_100: live.would_buy_again_score_out_of_100,
        }
    }
}

impl From<MockProduct> for Product {
    fn from(mock: MockProduct) -> Self {
        Self {
            id: assign_id(mock.id),
            title: mock.name,
            price_text: mock.price,
            product_url: None,
            image_urls: mock.image.into_iter().collect(),
            source: mock.source,
            rating_value: mock.rating,
            rating_count: mock.reviews,
            pros: mock.pros,
            cons: mock.cons,
            specifications: mock.specs,
            review_sentiment: None,
            key_insights_from_reviews: Vec::new(),
            recommendation_score_out_of_100: None,
            would_buy_again_score_out_of_100: None,
        }
    }
}

impl From<ProductShape> for Product {
    fn from(shape: ProductShape) -> Self {
        match shape {
            ProductShape::Live(live) => live.into(),
            ProductShape::Mock(mock) => mock.into(),
        }
    }
}

/// Ids of a product list, in order
#[cfg(test)]
pub fn ids(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.id.as_str()).collect()
}
