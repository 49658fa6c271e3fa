//! Client for the pricing gateway's `/retail` and `/wholesale` routes.

mod client;

pub use client::{
    PricingClient, PricingResponse, RetailRequest, SdkError, WholesaleRequest,
};
