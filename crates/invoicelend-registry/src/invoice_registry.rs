//! The invoice registry.
//!
//! Owns every [`Invoice`] record. Minting is gated by the trust backend's
//! signature and the invoice's due date; after that only the lending pool
//! may touch a record, and only its `escrowed` flag and `owner`.
//!
//! ## Mint checks (in order)
//!
//! 1. Protocol initialized (`NotInitialized`)
//! 2. `due_date > now` (`InvoiceExpired`)
//! 3. Backend signature over the canonical payload (`InvalidSignature`)
//! 4. `face_value > 0` (`InvalidAmount`)
//!
//! Nothing is written until all four pass.

use invoicelend_ledger::{Ctx, DataKey, StateRead};
use invoicelend_types::{
    Address, EventKind, Invoice, InvoiceId, InvoiceLendError, MintRequest, PublicKey, RecordRef,
    Result, Signature,
};

use crate::admin::AdminControl;
use crate::signature::{Ed25519Verifier, SignatureVerifier};

/// Signature-gated invoice registry.
pub struct InvoiceRegistry {
    verifier: Box<dyn SignatureVerifier>,
}

impl std::fmt::Debug for InvoiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceRegistry").finish_non_exhaustive()
    }
}

impl Default for InvoiceRegistry {
    fn default() -> Self {
        Self::new(Box::new(Ed25519Verifier))
    }
}

impl InvoiceRegistry {
    #[must_use]
    pub fn new(verifier: Box<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// Mint a new invoice record from a backend-signed request.
    ///
    /// # Errors
    /// See the module docs for the check order.
    pub fn mint(
        &self,
        ctx: &mut Ctx<'_>,
        request: MintRequest,
        signature: &Signature,
    ) -> Result<InvoiceId> {
        let config = AdminControl::load_config(&*ctx)?;
        let now = ctx.now();

        if request.due_date <= now {
            return Err(InvoiceLendError::InvoiceExpired {
                due_date: request.due_date,
                now,
            });
        }
        if !self.verifier.verify(
            &request.signing_payload(),
            signature,
            &config.backend_pubkey,
        ) {
            return Err(InvoiceLendError::InvalidSignature);
        }
        if !request.face_value.is_positive() {
            return Err(InvoiceLendError::InvalidAmount(request.face_value));
        }

        let invoice_id = config.next_invoice_id;
        let next = invoice_id
            .next()
            .ok_or(InvoiceLendError::ArithmeticOverflow {
                context: "invoice id counter",
            })?;
        let invoice = Invoice::from_request(invoice_id, request);

        ctx.set(DataKey::Invoice(invoice_id), &invoice)?;
        ctx.set(DataKey::NextInvoiceId, &next)?;
        ctx.emit(EventKind::InvoiceMinted {
            invoice_id,
            owner: invoice.owner,
            face_value: invoice.face_value,
        })?;

        tracing::info!(
            %invoice_id,
            owner = %invoice.owner,
            face_value = %invoice.face_value,
            currency = %invoice.currency,
            risk_score = invoice.risk_score,
            "Invoice minted"
        );
        Ok(invoice_id)
    }

    /// Rotate the trust backend key (admin only).
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` is not the admin.
    pub fn set_backend_pubkey(
        &self,
        ctx: &mut Ctx<'_>,
        caller: &Address,
        key: PublicKey,
    ) -> Result<()> {
        AdminControl::require_admin(&*ctx, caller)?;
        ctx.set(DataKey::BackendPubkey, &key)?;
        ctx.emit(EventKind::BackendKeyRotated { pubkey: key })?;
        tracing::info!(pubkey = %key, "Backend key rotated");
        Ok(())
    }

    /// Hand an invoice to `new_owner`. Pool only.
    ///
    /// # Errors
    /// Returns `Unauthorized` for any caller but the pool, `NotFound` for an
    /// unknown invoice.
    pub fn transfer_ownership(
        &self,
        ctx: &mut Ctx<'_>,
        caller: &Address,
        invoice_id: InvoiceId,
        new_owner: Address,
    ) -> Result<()> {
        require_pool(&*ctx, caller)?;
        let mut invoice = Self::invoice(&*ctx, invoice_id)?;
        let from = invoice.owner;
        invoice.owner = new_owner;
        ctx.set(DataKey::Invoice(invoice_id), &invoice)?;
        ctx.emit(EventKind::InvoiceOwnershipTransferred {
            invoice_id,
            from,
            to: new_owner,
        })?;
        tracing::info!(%invoice_id, %from, to = %new_owner, "Invoice ownership transferred");
        Ok(())
    }

    /// Set or clear the escrow lock. Pool only.
    ///
    /// An escrowed invoice is pinned; clearing the lock returns it to the
    /// regular liveness window.
    ///
    /// # Errors
    /// Returns `Unauthorized` for any caller but the pool, `NotFound` for an
    /// unknown invoice and `AlreadyEscrowed` when locking a locked invoice.
    pub fn set_escrowed(
        &self,
        ctx: &mut Ctx<'_>,
        caller: &Address,
        invoice_id: InvoiceId,
        escrowed: bool,
    ) -> Result<()> {
        require_pool(&*ctx, caller)?;
        let mut invoice = Self::invoice(&*ctx, invoice_id)?;
        if escrowed && invoice.escrowed {
            return Err(InvoiceLendError::AlreadyEscrowed(invoice_id));
        }
        invoice.escrowed = escrowed;
        let key = DataKey::Invoice(invoice_id);
        ctx.set(key, &invoice)?;
        // Collateral cannot lapse while it backs a loan.
        if escrowed {
            ctx.pin(key);
        } else {
            ctx.release(key);
        }
        ctx.emit(if escrowed {
            EventKind::InvoiceEscrowed { invoice_id }
        } else {
            EventKind::InvoiceReleased { invoice_id }
        })?;
        tracing::debug!(%invoice_id, escrowed, "Escrow flag set");
        Ok(())
    }

    /// Read an invoice.
    ///
    /// # Errors
    /// Returns `NotFound` if no live record exists.
    pub fn invoice(state: &impl StateRead, invoice_id: InvoiceId) -> Result<Invoice> {
        state
            .get(&DataKey::Invoice(invoice_id))?
            .ok_or(InvoiceLendError::NotFound(RecordRef::Invoice(invoice_id)))
    }
}

fn require_pool(state: &impl StateRead, caller: &Address) -> Result<()> {
    let pool: Address = state
        .get(&DataKey::Pool)?
        .ok_or(InvoiceLendError::NotInitialized)?;
    if *caller != pool {
        return Err(InvoiceLendError::unauthorized(
            "only the lending pool may mutate invoices",
        ));
    }
    Ok(())
}
