//! Product catalog endpoints and the storefront's client-side list shaping.

use std::cmp::Ordering;

use crate::{ApiClient, ApiRequest, Product, Result};

impl ApiClient {
    /// `GET /products`
    pub async fn products(&self) -> Result<Vec<Product>> {
        self.request_json(ApiRequest::get("/products")).await
    }

    /// `GET /products/{id}`
    pub async fn product(&self, id: &str) -> Result<Product> {
        self.request_json(ApiRequest::get(format!("/products/{id}")))
            .await
    }
}

/// Sort orders offered by the product listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Review count, descending.
    #[default]
    Popular,
    PriceLowHigh,
    PriceHighLow,
    /// Rating, descending.
    Rating,
    /// Listing id, descending; ids are creation-ordered.
    Newest,
}

/// Client-side filter applied to a fetched product list.
///
/// Mirrors the storefront sidebar: category, name search, price range and
/// tag selection all combine conjunctively. An empty tag selection matches
/// everything.
#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub tags: Vec<String>,
    pub sort_by: SortBy,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn price_range(mut self, min: f64, max: f64) -> Self {
        self.min_price = Some(min);
        self.max_price = Some(max);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Filters and sorts a product list.
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut matched: Vec<Product> = products
            .iter()
            .filter(|product| self.matches(product))
            .cloned()
            .collect();
        matched.sort_by(|a, b| self.compare(a, b));
        matched
    }

    fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if !product.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(query) = &self.search {
            let query = query.to_lowercase();
            if !product.name.to_lowercase().contains(&query) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|tag| product.tags.contains(tag)) {
            return false;
        }
        true
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self.sort_by {
            SortBy::Popular => b.reviews.cmp(&a.reviews),
            SortBy::PriceLowHigh => total_cmp(a.price, b.price),
            SortBy::PriceHighLow => total_cmp(b.price, a.price),
            SortBy::Rating => total_cmp(b.rating, a.rating),
            SortBy::Newest => b.id.cmp(&a.id),
        }
    }
}

fn total_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
