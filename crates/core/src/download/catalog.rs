//! Catalog seam for bundle and file-list lookups.

use std::collections::HashMap;

use crate::types::{FileKey, PriceVariantId, ProductId};

/// Read-only catalog knowledge the evaluator needs.
///
/// The evaluator itself does no I/O; callers load whatever slice of the
/// catalog is relevant (usually one product plus the bundles containing it)
/// and hand it in behind this trait.
pub trait Catalog {
    /// The constituent products of a bundle, or `None` if `product_id` is
    /// not a bundle.
    fn bundle_contents(&self, product_id: ProductId) -> Option<&[ProductId]>;

    /// Number of downloadable files attached to a product (or one of its
    /// price variants). Used for file-key range checks.
    fn file_count(&self, product_id: ProductId, price_variant_id: Option<PriceVariantId>) -> u32;

    /// Whether `file_key` indexes a real file of the product.
    fn has_file(
        &self,
        product_id: ProductId,
        price_variant_id: Option<PriceVariantId>,
        file_key: FileKey,
    ) -> bool {
        file_key.as_u32() < self.file_count(product_id, price_variant_id)
    }
}

/// An in-memory catalog snapshot.
///
/// The delivery server builds one per request from the database; tests
/// build them directly.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    bundles: HashMap<ProductId, Vec<ProductId>>,
    file_counts: HashMap<(ProductId, Option<PriceVariantId>), u32>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bundle and its constituent products.
    #[must_use]
    pub fn with_bundle(mut self, bundle: ProductId, contents: Vec<ProductId>) -> Self {
        self.bundles.insert(bundle, contents);
        self
    }

    /// Register the file count for a product (or product variant).
    #[must_use]
    pub fn with_files(
        mut self,
        product_id: ProductId,
        price_variant_id: Option<PriceVariantId>,
        count: u32,
    ) -> Self {
        self.file_counts.insert((product_id, price_variant_id), count);
        self
    }
}

impl Catalog for StaticCatalog {
    fn bundle_contents(&self, product_id: ProductId) -> Option<&[ProductId]> {
        self.bundles.get(&product_id).map(Vec::as_slice)
    }

    fn file_count(&self, product_id: ProductId, price_variant_id: Option<PriceVariantId>) -> u32 {
        // Variant-specific lists win; fall back to the product-wide list.
        self.file_counts
            .get(&(product_id, price_variant_id))
            .or_else(|| self.file_counts.get(&(product_id, None)))
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_contents() {
        let catalog = StaticCatalog::new()
            .with_bundle(ProductId::new(50), vec![ProductId::new(10), ProductId::new(11)]);

        assert_eq!(
            catalog.bundle_contents(ProductId::new(50)),
            Some(&[ProductId::new(10), ProductId::new(11)][..])
        );
        assert_eq!(catalog.bundle_contents(ProductId::new(10)), None);
    }

    #[test]
    fn test_has_file_range() {
        let catalog = StaticCatalog::new().with_files(ProductId::new(10), None, 2);

        assert!(catalog.has_file(ProductId::new(10), None, FileKey::new(0)));
        assert!(catalog.has_file(ProductId::new(10), None, FileKey::new(1)));
        assert!(!catalog.has_file(ProductId::new(10), None, FileKey::new(2)));
        assert!(!catalog.has_file(ProductId::new(99), None, FileKey::new(0)));
    }

    #[test]
    fn test_variant_file_list_falls_back_to_product() {
        let catalog = StaticCatalog::new().with_files(ProductId::new(10), None, 3);
        assert!(catalog.has_file(
            ProductId::new(10),
            Some(PriceVariantId::new(1)),
            FileKey::new(2)
        ));
    }
}
