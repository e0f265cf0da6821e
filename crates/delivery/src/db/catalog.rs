//! Catalog repository: file lists and bundle membership.

use sqlx::{PgPool, Row};

use copperleaf_core::download::StaticCatalog;
use copperleaf_core::{FileKey, PriceVariantId, ProductId};

use super::RepositoryError;

/// One downloadable file of a product.
#[derive(Debug, Clone)]
pub struct ProductFile {
    /// Path relative to the configured files directory.
    pub storage_path: String,
    /// Filename offered to the browser.
    pub display_name: String,
}

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Build the catalog slice the evaluator needs for one request: the
    /// product's visible file count plus every bundle that contains it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn snapshot_for(
        &self,
        product_id: ProductId,
        price_variant_id: Option<PriceVariantId>,
    ) -> Result<StaticCatalog, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM delivery.product_files
            WHERE product_id = $1
              AND (price_variant_id IS NULL OR price_variant_id = $2)
            ",
        )
        .bind(product_id)
        .bind(price_variant_id)
        .fetch_one(self.pool)
        .await?;

        let bundle_rows = sqlx::query(
            r"
            SELECT DISTINCT bundle_product_id
            FROM delivery.bundle_items
            WHERE item_product_id = $1
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        let mut catalog = StaticCatalog::new().with_files(
            product_id,
            price_variant_id,
            u32::try_from(count).unwrap_or(0),
        );
        for row in bundle_rows {
            let bundle: ProductId = row.try_get("bundle_product_id")?;
            catalog = catalog.with_bundle(bundle, vec![product_id]);
        }

        Ok(catalog)
    }

    /// Resolve a file key against the product's visible file list.
    ///
    /// The key is a zero-based position within the files a buyer of this
    /// product (and variant) can see, ordered by `ordinal`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn file_by_key(
        &self,
        product_id: ProductId,
        price_variant_id: Option<PriceVariantId>,
        file_key: FileKey,
    ) -> Result<Option<ProductFile>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT storage_path, display_name
            FROM delivery.product_files
            WHERE product_id = $1
              AND (price_variant_id IS NULL OR price_variant_id = $2)
            ORDER BY ordinal
            LIMIT 1 OFFSET $3
            ",
        )
        .bind(product_id)
        .bind(price_variant_id)
        .bind(i64::from(file_key.as_u32()))
        .fetch_optional(self.pool)
        .await?;

        row.map(|row| {
            Ok(ProductFile {
                storage_path: row.try_get("storage_path")?,
                display_name: row.try_get("display_name")?,
            })
        })
        .transpose()
    }
}
