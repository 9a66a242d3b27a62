//! Core types for the tollbooth usage-metering and credit-accounting service.
//!
//! This crate provides the foundational types used throughout tollbooth:
//!
//! - **Identifiers**: [`AccountId`], [`EntryId`]
//! - **Accounts**: [`Account`]
//! - **Ledger**: [`LedgerEntry`], [`EntryKind`]
//! - **Pricing**: [`PricingConfig`], [`PriceQuote`], [`OperationKind`]
//! - **Errors**: [`MeterError`]
//!
//! # Credit Unit
//!
//! A **credit** is the internal pay-per-use currency unit. Balances are
//! stored as `i64` integer credits; fractional arithmetic only occurs inside
//! the pricing calculator and is rounded up at settlement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod pricing;

pub use account::Account;
pub use error::{MeterError, Result};
pub use ids::{AccountId, EntryId, IdError};
pub use ledger::{EntryKind, LedgerEntry};
pub use pricing::{
    ImageQuality, ImageSize, ImageStyle, LinearPricing, OperationKind, OperationOptions,
    PriceQuote, PricingConfig, TtsModel, VideoDuration, DEFAULT_FEE_PERCENT,
};
