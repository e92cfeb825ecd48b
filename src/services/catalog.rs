use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::core::filters::matches_material;
use crate::models::{ArrowProduct, SpineSpecification};

pub type ProductId = u64;

/// Errors that can occur when reading or loading the arrow catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate spine {spine} in {manufacturer} {model_name}")]
    DuplicateSpine {
        manufacturer: String,
        model_name: String,
        spine: u32,
    },

    #[error("Invalid specification for {manufacturer} {model_name}: {reason}")]
    InvalidSpecification {
        manufacturer: String,
        model_name: String,
        reason: String,
    },

    #[error("Duplicate product id: {0}")]
    DuplicateProduct(ProductId),

    #[error("Product not found: {0}")]
    NotFound(ProductId),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog format: {0}")]
    Json(#[from] serde_json::Error),
}

/// Search hit returned by the catalog, without the per-spine variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub manufacturer: String,
    pub model_name: String,
    pub material: String,
    pub arrow_type: Option<String>,
    pub description: Option<String>,
    pub min_spine: u32,
    pub max_spine: u32,
    pub spine_count: usize,
}

impl ProductSummary {
    /// Whether the declared spine coverage intersects `[min, max]`
    pub fn covers(&self, min_spine: f64, max_spine: f64) -> bool {
        f64::from(self.min_spine) <= max_spine && f64::from(self.max_spine) >= min_spine
    }
}

/// Read-only access to the arrow product catalog
///
/// Implementations must be safe for concurrent reads. Timeouts and retries
/// belong to the implementation; callers treat any error as "no candidates".
pub trait CatalogStore: Send + Sync {
    /// Products whose spine coverage intersects the window, optionally
    /// filtered by a case-insensitive material substring
    fn search_by_spine_range(
        &self,
        min_spine: f64,
        max_spine: f64,
        material: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ProductSummary>, CatalogError>;

    /// All spine variants of one product
    fn get_variants(&self, product_id: ProductId) -> Result<Vec<SpineSpecification>, CatalogError>;
}

/// Catalog held in memory, loaded from JSON
///
/// Products are validated on insert, so duplicate spines never reach the
/// matching engine.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: BTreeMap<ProductId, ArrowProduct>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_products<I>(products: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = ArrowProduct>,
    {
        let mut catalog = Self::new();
        for product in products {
            catalog.insert(product)?;
        }
        Ok(catalog)
    }

    /// Parse a JSON array of products
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<ArrowProduct> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(
            "Loaded {} arrow products from {}",
            catalog.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    pub fn insert(&mut self, product: ArrowProduct) -> Result<(), CatalogError> {
        // Spine uniqueness is already guaranteed by ArrowProduct construction
        if self.products.contains_key(&product.id) {
            return Err(CatalogError::DuplicateProduct(product.id));
        }
        self.products.insert(product.id, product);
        Ok(())
    }

    pub fn get(&self, product_id: ProductId) -> Option<&ArrowProduct> {
        self.products.get(&product_id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl CatalogStore for InMemoryCatalog {
    fn search_by_spine_range(
        &self,
        min_spine: f64,
        max_spine: f64,
        material: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ProductSummary>, CatalogError> {
        let results: Vec<ProductSummary> = self
            .products
            .values()
            .filter(|product| product.spine_option_count() > 0)
            .filter(|product| matches_material(&product.material, material))
            .map(ArrowProduct::summary)
            .filter(|summary| summary.covers(min_spine, max_spine))
            .take(limit)
            .collect();

        tracing::debug!(
            "Catalog search {:.0}-{:.0} (material: {:?}) returned {} products",
            min_spine,
            max_spine,
            material,
            results.len()
        );

        Ok(results)
    }

    fn get_variants(&self, product_id: ProductId) -> Result<Vec<SpineSpecification>, CatalogError> {
        self.products
            .get(&product_id)
            .map(|product| product.spine_specifications().to_vec())
            .ok_or(CatalogError::NotFound(product_id))
    }
}
