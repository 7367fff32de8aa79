//! The deployed entry-point surface.
//!
//! [`Protocol`] wires the invoice registry and lending ledger onto one ledger
//! environment. Every mutating entry point runs inside
//! [`Env::transact`], so it either commits in full (TTL refreshed, events
//! appended) or leaves no trace.

use invoicelend_ledger::{AssetLedger, Env, MemoryAssetLedger};
use invoicelend_registry::{AdminControl, InvoiceRegistry, SignatureVerifier};
use invoicelend_types::{
    Address, Amount, InitParams, Invoice, InvoiceId, Loan, LoanId, MintRequest, ProtocolConfig,
    ProtocolSettings, PublicKey, Repayment, Result, Signature, Timestamp,
};

use crate::interest::InterestModel;
use crate::lending_ledger::LendingLedger;

/// Invoice registry + lending ledger on a shared ledger environment.
#[derive(Debug)]
pub struct Protocol<A: AssetLedger = MemoryAssetLedger> {
    env: Env<A>,
    ledger: LendingLedger,
    settings: ProtocolSettings,
}

impl<A: AssetLedger> Protocol<A> {
    /// Build an uninitialized protocol over `assets`.
    ///
    /// # Errors
    /// Returns `Configuration` if `settings` fail validation.
    pub fn new(
        assets: A,
        verifier: Box<dyn SignatureVerifier>,
        settings: ProtocolSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let ledger = LendingLedger::new(
            InvoiceRegistry::new(verifier),
            InterestModel::from_settings(&settings),
        );
        Ok(Self {
            env: Env::new(assets, &settings),
            ledger,
            settings,
        })
    }

    /// Build and initialize in one step.
    ///
    /// # Errors
    /// Returns `Configuration` for invalid settings.
    pub fn deploy(
        assets: A,
        verifier: Box<dyn SignatureVerifier>,
        settings: ProtocolSettings,
        params: &InitParams,
        now: Timestamp,
    ) -> Result<Self> {
        let mut protocol = Self::new(assets, verifier, settings)?;
        protocol.env.set_timestamp(now);
        protocol.initialize(params)?;
        Ok(protocol)
    }

    // -----------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------

    /// # Errors
    /// Returns `AlreadyInitialized` on a second call.
    pub fn initialize(&mut self, params: &InitParams) -> Result<ProtocolConfig> {
        self.env
            .transact("initialize", |ctx| AdminControl::initialize(ctx, params))
    }

    /// # Errors
    /// See [`InvoiceRegistry::mint`].
    pub fn mint(&mut self, request: MintRequest, signature: &Signature) -> Result<InvoiceId> {
        let registry = self.ledger.registry();
        self.env
            .transact("mint", |ctx| registry.mint(ctx, request, signature))
    }

    /// # Errors
    /// Returns `Unauthorized` unless `caller` is the admin.
    pub fn set_backend_pubkey(&mut self, caller: &Address, key: PublicKey) -> Result<()> {
        let registry = self.ledger.registry();
        self.env.transact("set_backend_pubkey", |ctx| {
            registry.set_backend_pubkey(ctx, caller, key)
        })
    }

    /// # Errors
    /// Returns `Unauthorized` unless `caller` is the admin.
    pub fn set_paused(&mut self, caller: &Address, paused: bool) -> Result<()> {
        let ledger = &self.ledger;
        self.env
            .transact("set_paused", |ctx| ledger.set_paused(ctx, caller, paused))
    }

    /// # Errors
    /// Returns `Unauthorized` unless `caller` is the admin.
    pub fn set_admin(&mut self, caller: &Address, new_admin: Address) -> Result<()> {
        self.env
            .transact("set_admin", |ctx| AdminControl::set_admin(ctx, caller, new_admin))
    }

    /// # Errors
    /// See [`LendingLedger::borrow`].
    pub fn borrow(
        &mut self,
        caller: &Address,
        borrower: &Address,
        invoice_id: InvoiceId,
        principal: Amount,
        term_secs: u64,
    ) -> Result<LoanId> {
        let ledger = &self.ledger;
        self.env.transact("borrow", |ctx| {
            ledger.borrow(ctx, caller, borrower, invoice_id, principal, term_secs)
        })
    }

    /// # Errors
    /// See [`LendingLedger::repay_loan`].
    pub fn repay_loan(&mut self, caller: &Address, loan_id: LoanId) -> Result<Repayment> {
        let ledger = &self.ledger;
        self.env
            .transact("repay_loan", |ctx| ledger.repay_loan(ctx, caller, loan_id))
    }

    /// # Errors
    /// See [`LendingLedger::liquidate`].
    pub fn liquidate(&mut self, caller: &Address, loan_id: LoanId) -> Result<()> {
        let ledger = &self.ledger;
        self.env
            .transact("liquidate", |ctx| ledger.liquidate(ctx, caller, loan_id))
    }

    /// # Errors
    /// See [`LendingLedger::deposit`].
    pub fn deposit(&mut self, caller: &Address, from: &Address, amount: Amount) -> Result<()> {
        let ledger = &self.ledger;
        self.env
            .transact("deposit", |ctx| ledger.deposit(ctx, caller, from, amount))
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    /// # Errors
    /// Returns `NotFound` for an unknown invoice.
    pub fn invoice(&self, invoice_id: InvoiceId) -> Result<Invoice> {
        InvoiceRegistry::invoice(&self.env, invoice_id)
    }

    /// # Errors
    /// Returns `NotFound` for an unknown loan.
    pub fn loan(&self, loan_id: LoanId) -> Result<Loan> {
        LendingLedger::loan(&self.env, loan_id)
    }

    /// # Errors
    /// See [`LendingLedger::quote_repayment`].
    pub fn quote_repayment(&self, loan_id: LoanId) -> Result<Repayment> {
        self.ledger.quote_repayment(&self.env, loan_id)
    }

    /// # Errors
    /// Returns `NotInitialized` before initialization.
    pub fn pool_balance(&self) -> Result<Amount> {
        LendingLedger::pool_balance(&self.env)
    }

    /// # Errors
    /// Returns `NotInitialized` before initialization.
    pub fn is_paused(&self) -> Result<bool> {
        LendingLedger::is_paused(&self.env)
    }

    /// # Errors
    /// Returns `NotInitialized` before initialization.
    pub fn config(&self) -> Result<ProtocolConfig> {
        AdminControl::load_config(&self.env)
    }

    // -----------------------------------------------------------------
    // Host access
    // -----------------------------------------------------------------

    #[must_use]
    pub fn env(&self) -> &Env<A> {
        &self.env
    }

    /// Clock and asset-issuer access for hosts and tests.
    pub fn env_mut(&mut self) -> &mut Env<A> {
        &mut self.env
    }

    #[must_use]
    pub fn settings(&self) -> &ProtocolSettings {
        &self.settings
    }

    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.env.timestamp()
    }

    /// Advance the ledger clock.
    pub fn advance(&mut self, secs: u64) {
        self.env.advance(secs);
    }

    /// Reclaim entries whose liveness horizon has passed.
    pub fn sweep_expired(&mut self) -> usize {
        self.env.sweep_expired()
    }
}
