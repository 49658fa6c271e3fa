//! Product prices and partner discounts.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::loader::ConfigError;
use crate::config::validation::ValidationError;

/// Read access to prices and discounts.
pub trait PriceLookup: Send + Sync {
    /// Unit price of `code`, if the product exists.
    fn fetch_price(&self, code: &str) -> Option<f64>;

    /// Discount rate of `partner` in `[0, 1]`, if the partner exists.
    fn fetch_discount(&self, partner: &str) -> Option<f64>;
}

/// In-memory catalog.
///
/// ```toml
/// [products]
/// aaa111 = 12.99
///
/// [partners]
/// superstore = 0.15
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Catalog {
    products: HashMap<String, f64>,
    partners: HashMap<String, f64>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, code: impl Into<String>, price: f64) -> Self {
        self.products.insert(code.into(), price);
        self
    }

    pub fn with_partner(mut self, partner: impl Into<String>, discount: f64) -> Self {
        self.partners.insert(partner.into(), discount);
        self
    }

    /// Parse and validate a TOML catalog.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let catalog: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        catalog.validate().map_err(ConfigError::Validation)?;
        Ok(catalog)
    }

    /// Every price must be finite and non-negative, every discount in `[0, 1]`.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let mut products: Vec<_> = self.products.iter().collect();
        products.sort_by(|a, b| a.0.cmp(b.0));
        for (code, &price) in products {
            if !price.is_finite() || price < 0.0 {
                errors.push(ValidationError::Price { code: code.clone(), price });
            }
        }

        let mut partners: Vec<_> = self.partners.iter().collect();
        partners.sort_by(|a, b| a.0.cmp(b.0));
        for (partner, &discount) in partners {
            if !(0.0..=1.0).contains(&discount) {
                errors.push(ValidationError::Discount {
                    partner: partner.clone(),
                    discount,
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
        let catalog = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            products = catalog.products.len(),
            partners = catalog.partners.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn partner_count(&self) -> usize {
        self.partners.len()
    }
}

impl PriceLookup for Catalog {
    fn fetch_price(&self, code: &str) -> Option<f64> {
        self.products.get(code).copied()
    }

    fn fetch_discount(&self, partner: &str) -> Option<f64> {
        self.partners.get(partner).copied()
    }
}
