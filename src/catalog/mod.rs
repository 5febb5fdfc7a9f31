//! Read-only product catalog.
//!
//! The catalog is loaded once at startup and never mutated. Handlers query it
//! through [`Catalog`]; nothing else depends on how the data is stored.

mod data;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const MAX_PAGE_SIZE: usize = 50;
pub const MIN_COMPARE: usize = 2;
pub const MAX_COMPARE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Tethered display glasses (virtual monitor).
    Display,
    /// Lightweight glasses with cameras, audio or a small HUD.
    Smart,
    /// Standalone headsets aimed at business use.
    Enterprise,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: &'static str,
    pub name: &'static str,
    pub brand: &'static str,
    pub category: Category,
    pub tagline: &'static str,
    pub price_usd: u32,
    pub rating: f32,
    pub fov_degrees: u8,
    pub weight_grams: u16,
    /// Release month, `YYYY-MM`.
    pub released: &'static str,
    pub in_stock: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    Rating,
    Name,
    Newest,
}

/// Filters, ordering and pagination for [`Catalog::list`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub brand: Option<String>,
    pub category: Option<Category>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub in_stock: Option<bool>,
    pub sort: Option<SortOrder>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl ListQuery {
    fn matches(&self, product: &Product) -> bool {
        self.brand
            .as_deref()
            .is_none_or(|brand| product.brand.eq_ignore_ascii_case(brand))
            && self.category.is_none_or(|c| product.category == c)
            && self.min_price.is_none_or(|min| product.price_usd >= min)
            && self.max_price.is_none_or(|max| product.price_usd <= max)
            && self.in_stock.is_none_or(|s| product.in_stock == s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("select at least {} products to compare", MIN_COMPARE)]
    TooFew,

    #[error("at most {} products can be compared", MAX_COMPARE)]
    TooMany,

    #[error("product {0} listed more than once")]
    Duplicate(String),

    #[error("unknown product: {0}")]
    UnknownProduct(String),
}

#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The built-in product lineup.
    pub fn seeded() -> Self {
        Self::new(data::products())
    }

    pub fn all(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn list(&self, query: &ListQuery) -> ProductPage {
        let mut matched: Vec<&Product> = self.products.iter().filter(|p| query.matches(p)).collect();

        if let Some(order) = query.sort {
            matched.sort_by(|a, b| match order {
                SortOrder::PriceAsc => a.price_usd.cmp(&b.price_usd),
                SortOrder::PriceDesc => b.price_usd.cmp(&a.price_usd),
                SortOrder::Rating => b.rating.total_cmp(&a.rating),
                SortOrder::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortOrder::Newest => b.released.cmp(&a.released),
            });
        }

        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let total = matched.len();

        let products = matched
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect();

        ProductPage {
            products,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }

    /// Case-insensitive substring match over name, brand and tagline.
    pub fn search(&self, query: &str, limit: usize) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.products
            .iter()
            .filter(|p| {
                [p.name, p.brand, p.tagline]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// Products for `ids`, in the order given.
    pub fn compare(&self, ids: &[String]) -> Result<Vec<Product>, CompareError> {
        if ids.len() < MIN_COMPARE {
            return Err(CompareError::TooFew);
        }
        if ids.len() > MAX_COMPARE {
            return Err(CompareError::TooMany);
        }

        let mut products = Vec::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(CompareError::Duplicate(id.clone()));
            }
            let product = self
                .get(id)
                .ok_or_else(|| CompareError::UnknownProduct(id.clone()))?;
            products.push(product.clone());
        }
        Ok(products)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(page: &ProductPage) -> Vec<&'static str> {
        page.products.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_seed_ids_unique() {
        let catalog = Catalog::seeded();
        let mut seen: Vec<&str> = catalog.all().iter().map(|p| p.id).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), catalog.all().len());
    }

    #[test]
    fn test_filters() {
        let catalog = Catalog::seeded();

        let xreal = catalog.list(&ListQuery {
            brand: Some("xreal".into()),
            ..ListQuery::default()
        });
        assert_eq!(ids(&xreal), vec!["xreal-air-2-pro", "xreal-one"]);

        let affordable = catalog.list(&ListQuery {
            category: Some(Category::Display),
            max_price: Some(440),
            in_stock: Some(true),
            ..ListQuery::default()
        });
        assert_eq!(ids(&affordable), vec!["viture-one"]);

        let pricey = catalog.list(&ListQuery {
            min_price: Some(1000),
            ..ListQuery::default()
        });
        assert_eq!(pricey.total, 2);
    }

    #[test]
    fn test_sorting() {
        let catalog = Catalog::seeded();
        let sorted = |sort| {
            catalog.list(&ListQuery {
                sort: Some(sort),
                ..ListQuery::default()
            })
        };

        assert_eq!(ids(&sorted(SortOrder::PriceAsc))[0], "ray-ban-meta");
        assert_eq!(ids(&sorted(SortOrder::PriceDesc))[0], "hololens-2");
        assert_eq!(ids(&sorted(SortOrder::Rating))[0], "xreal-one");
        assert_eq!(ids(&sorted(SortOrder::Newest))[0], "even-realities-g1");
        assert_eq!(ids(&sorted(SortOrder::Name))[0], "even-realities-g1");
    }

    #[test]
    fn test_pagination() {
        let catalog = Catalog::seeded();
        let page = |page, limit| {
            catalog.list(&ListQuery {
                page: Some(page),
                limit: Some(limit),
                ..ListQuery::default()
            })
        };

        let second = page(2, 3);
        assert_eq!(second.total, 8);
        assert_eq!(second.total_pages, 3);
        assert_eq!(ids(&second), vec!["rokid-max", "ray-ban-meta", "even-realities-g1"]);

        assert_eq!(page(3, 3).products.len(), 2);
        assert!(page(9, 3).products.is_empty());

        // Out-of-range inputs are clamped.
        let clamped = page(0, 0);
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.limit, 1);
        assert_eq!(page(1, 500).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_search() {
        let catalog = Catalog::seeded();
        let hits: Vec<_> = catalog.search("  Dimming ", 10).iter().map(|p| p.id).collect();
        assert_eq!(hits, vec!["xreal-air-2-pro", "magic-leap-2"]);

        assert_eq!(catalog.search("xreal", 1).len(), 1);
        assert!(catalog.search("   ", 10).is_empty());
        assert!(catalog.search("holodeck", 10).is_empty());
    }

    #[test]
    fn test_compare() {
        let catalog = Catalog::seeded();
        let ids = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let picked = catalog.compare(&ids(&["rokid-max", "xreal-one"])).unwrap();
        assert_eq!(picked[0].id, "rokid-max");
        assert_eq!(picked[1].id, "xreal-one");

        assert_eq!(catalog.compare(&ids(&["rokid-max"])), Err(CompareError::TooFew));
        assert_eq!(
            catalog.compare(&ids(&["a", "b", "c", "d", "e"])),
            Err(CompareError::TooMany)
        );
        assert_eq!(
            catalog.compare(&ids(&["rokid-max", "rokid-max"])),
            Err(CompareError::Duplicate("rokid-max".into()))
        );
        assert_eq!(
            catalog.compare(&ids(&["rokid-max", "vision-pro"])),
            Err(CompareError::UnknownProduct("vision-pro".into()))
        );
    }
}
