//! The pricing service interface and its local implementation.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{PricingError, PricingResult};
use crate::pricing::calculator;
use crate::pricing::catalog::PriceLookup;

/// Retail and wholesale totals.
///
/// Implemented by [`LocalPricingService`] inside each price-service instance
/// and by the gateway, which dispatches to those instances.
#[async_trait]
pub trait PricingService: Send + Sync {
    async fn get_retail_total(&self, code: &str, qty: i64) -> PricingResult<f64>;

    async fn get_wholesale_total(&self, partner: &str, code: &str, qty: i64)
        -> PricingResult<f64>;
}

#[async_trait]
impl<S: PricingService + ?Sized> PricingService for Arc<S> {
    async fn get_retail_total(&self, code: &str, qty: i64) -> PricingResult<f64> {
        (**self).get_retail_total(code, qty).await
    }

    async fn get_wholesale_total(
        &self,
        partner: &str,
        code: &str,
        qty: i64,
    ) -> PricingResult<f64> {
        (**self).get_wholesale_total(partner, code, qty).await
    }
}

/// Argument checks shared by every implementation, in wire order.
pub fn validate_retail(code: &str, qty: i64) -> PricingResult<()> {
    if code.is_empty() {
        return Err(PricingError::InvalidCode);
    }
    if qty <= 0 {
        return Err(PricingError::InvalidQuantity);
    }
    Ok(())
}

pub fn validate_wholesale(partner: &str, code: &str, qty: i64) -> PricingResult<()> {
    if partner.is_empty() {
        return Err(PricingError::InvalidPartner);
    }
    validate_retail(code, qty)
}

/// Prices requests against a [`PriceLookup`].
pub struct LocalPricingService<L> {
    lookup: L,
}

impl<L: PriceLookup> LocalPricingService<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl<L: PriceLookup> PricingService for LocalPricingService<L> {
    async fn get_retail_total(&self, code: &str, qty: i64) -> PricingResult<f64> {
        validate_retail(code, qty)?;
        let price = self
            .lookup
            .fetch_price(code)
            .ok_or(PricingError::CodeNotFound)?;
        Ok(calculator::retail_total(price, qty))
    }

    async fn get_wholesale_total(
        &self,
        partner: &str,
        code: &str,
        qty: i64,
    ) -> PricingResult<f64> {
        validate_wholesale(partner, code, qty)?;
        let price = self
            .lookup
            .fetch_price(code)
            .ok_or(PricingError::CodeNotFound)?;
        let discount = self
            .lookup
            .fetch_discount(partner)
            .ok_or(PricingError::PartnerNotFound)?;
        Ok(calculator::wholesale_total(price, discount, qty))
    }
}
