//! Invoice records and the signed mint request that creates them.
//!
//! An [`Invoice`] is immutable after mint except for `owner` (transferred to
//! the pool on liquidation) and `escrowed` (true while it backs a loan).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, ContentHash, InvoiceId, InvoiceLendError, Result, Timestamp};

/// Domain separator of the canonical mint payload.
pub const MINT_PAYLOAD_DOMAIN: &[u8] = b"invoicelend:mint:v1:";

/// Maximum length of a currency symbol.
pub const MAX_CURRENCY_LEN: usize = 12;

/// An upper-case alphanumeric currency symbol such as `USDC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validate and normalize a symbol.
    ///
    /// # Errors
    /// Returns `InvalidCurrency` unless the symbol is 1–12 ASCII alphanumerics.
    pub fn new(symbol: &str) -> Result<Self> {
        let valid = !symbol.is_empty()
            && symbol.len() <= MAX_CURRENCY_LEN
            && symbol.bytes().all(|b| b.is_ascii_alphanumeric());
        if !valid {
            return Err(InvoiceLendError::InvalidCurrency(symbol.to_string()));
        }
        Ok(Self(symbol.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Currency {
    type Error = InvoiceLendError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fields a trust backend signs before an invoice can be minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    pub owner: Address,
    pub metadata_hash: ContentHash,
    pub face_value: Amount,
    pub currency: Currency,
    pub due_date: Timestamp,
    pub risk_score: u32,
}

impl MintRequest {
    /// Canonical signing payload for ed25519 verification.
    ///
    /// Format: `"invoicelend:mint:v1:" || owner(32) || metadata_hash(32) ||
    /// face_value(i128 LE) || len(currency)(u32 LE) || currency || due_date(u64 LE) ||
    /// risk_score(u32 LE)`
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        let currency = self.currency.as_str().as_bytes();
        let mut payload = Vec::with_capacity(MINT_PAYLOAD_DOMAIN.len() + 96 + currency.len());
        payload.extend_from_slice(MINT_PAYLOAD_DOMAIN);
        payload.extend_from_slice(self.owner.as_bytes());
        payload.extend_from_slice(self.metadata_hash.as_bytes());
        payload.extend_from_slice(&self.face_value.raw().to_le_bytes());
        // Currency length is bounded by MAX_CURRENCY_LEN, so the cast is lossless.
        #[allow(clippy::cast_possible_truncation)]
        payload.extend_from_slice(&(currency.len() as u32).to_le_bytes());
        payload.extend_from_slice(currency);
        payload.extend_from_slice(&self.due_date.to_le_bytes());
        payload.extend_from_slice(&self.risk_score.to_le_bytes());
        payload
    }
}

/// A tokenized trade invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: InvoiceId,
    pub owner: Address,
    pub metadata_hash: ContentHash,
    pub face_value: Amount,
    pub currency: Currency,
    pub due_date: Timestamp,
    pub risk_score: u32,
    /// True while the invoice is pledged to a live loan.
    pub escrowed: bool,
}

impl Invoice {
    /// Build a fresh, un-escrowed invoice from a verified request.
    #[must_use]
    pub fn from_request(invoice_id: InvoiceId, request: MintRequest) -> Self {
        Self {
            invoice_id,
            owner: request.owner,
            metadata_hash: request.metadata_hash,
            face_value: request.face_value,
            currency: request.currency,
            due_date: request.due_date,
            risk_score: request.risk_score,
            escrowed: false,
        }
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl MintRequest {
    /// Dummy request for tests: 1000 USDC, random metadata.
    #[must_use]
    pub fn dummy(owner: Address, due_date: Timestamp) -> Self {
        Self {
            owner,
            metadata_hash: ContentHash(rand::random::<[u8; 32]>()),
            face_value: Amount::from_units(1000),
            currency: Currency(String::from("USDC")),
            due_date,
            risk_score: 720,
        }
    }
}
