//! The lending ledger.
//!
//! Owns every [`Loan`] record and drives the per-loan state machine:
//!
//! ```text
//! ACTIVE ──repay_loan──▶ REPAID
//!    └────liquidate───▶ DEFAULTED
//! ```
//!
//! Both terminal states are final. The ledger acts as the pool: it is the
//! only caller the invoice registry accepts for escrow and ownership
//! changes, it disburses principal and it receives repayments.
//!
//! Every operation follows checks → effects → interactions: all
//! preconditions are validated first, then loan and escrow state is
//! written, and only then does stablecoin move through the asset ledger.
//!
//! An active loan and its collateral are pinned in storage, so a term of
//! any length outlives the liveness window. Settling the loan returns both
//! records to the regular window.

use invoicelend_ledger::{Ctx, DataKey, StateRead};
use invoicelend_registry::{AdminControl, InvoiceRegistry};
use invoicelend_types::{
    Address, Amount, EventKind, InvoiceId, InvoiceLendError, Loan, LoanId, ProtocolConfig,
    RecordRef, Repayment, Result,
};

use crate::interest::InterestModel;

/// Escrow-backed lending against registry invoices.
#[derive(Debug, Default)]
pub struct LendingLedger {
    registry: InvoiceRegistry,
    interest: InterestModel,
}

impl LendingLedger {
    #[must_use]
    pub fn new(registry: InvoiceRegistry, interest: InterestModel) -> Self {
        Self { registry, interest }
    }

    #[must_use]
    pub fn registry(&self) -> &InvoiceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn interest_model(&self) -> InterestModel {
        self.interest
    }

    /// Originate a loan of `principal` against `invoice_id` for
    /// `term_secs` seconds, disbursing the principal from the pool.
    ///
    /// # Errors
    /// - `ContractPaused` while paused
    /// - `Unauthorized` unless `caller` is `borrower` and owns the invoice
    /// - `NotFound` / `AlreadyEscrowed` for a missing or pledged invoice
    /// - `InvalidAmount` for a non-positive principal
    /// - `PrincipalExceedsFaceValue` if `principal > face_value`
    /// - `ArithmeticOverflow` if `now + term_secs` overflows
    /// - `InsufficientLiquidity` if the pool cannot fund the loan
    pub fn borrow(
        &self,
        ctx: &mut Ctx<'_>,
        caller: &Address,
        borrower: &Address,
        invoice_id: InvoiceId,
        principal: Amount,
        term_secs: u64,
    ) -> Result<LoanId> {
        // 1. Checks
        let config = active_config(&*ctx)?;
        if caller != borrower {
            return Err(InvoiceLendError::unauthorized(
                "borrow must be authorized by the borrower",
            ));
        }
        let invoice = InvoiceRegistry::invoice(&*ctx, invoice_id)?;
        if invoice.escrowed {
            return Err(InvoiceLendError::AlreadyEscrowed(invoice_id));
        }
        if invoice.owner != *borrower {
            return Err(InvoiceLendError::unauthorized(
                "borrower does not own the invoice",
            ));
        }
        if !principal.is_positive() {
            return Err(InvoiceLendError::InvalidAmount(principal));
        }
        if principal > invoice.face_value {
            return Err(InvoiceLendError::PrincipalExceedsFaceValue {
                principal,
                face_value: invoice.face_value,
            });
        }
        let now = ctx.now();
        let due_date = now
            .checked_add(term_secs)
            .ok_or(InvoiceLendError::ArithmeticOverflow {
                context: "loan due date",
            })?;
        let available = ctx.balance(&config.token_address, &config.pool);
        if available < principal {
            return Err(InvoiceLendError::InsufficientLiquidity {
                needed: principal,
                available,
            });
        }
        let loan_id = config.next_loan_id;
        let next = loan_id.next().ok_or(InvoiceLendError::ArithmeticOverflow {
            context: "loan id counter",
        })?;

        // 2. Effects
        self.registry
            .set_escrowed(ctx, &config.pool, invoice_id, true)?;
        let loan = Loan::originate(loan_id, *borrower, invoice_id, principal, now, due_date);
        ctx.set(DataKey::Loan(loan_id), &loan)?;
        ctx.pin(DataKey::Loan(loan_id));
        ctx.set(DataKey::NextLoanId, &next)?;
        ctx.emit(EventKind::LoanCreated {
            loan_id,
            borrower: *borrower,
            invoice_id,
            principal,
        })?;

        // 3. Interactions
        ctx.transfer(&config.token_address, &config.pool, borrower, principal)?;

        tracing::info!(
            %loan_id,
            %borrower,
            %invoice_id,
            %principal,
            due_date,
            "Loan created"
        );
        Ok(loan_id)
    }

    /// Repay a loan in full (principal plus interest accrued to now) and
    /// release its collateral to the borrower.
    ///
    /// # Errors
    /// - `ContractPaused` while paused
    /// - `NotFound` for an unknown loan
    /// - `AlreadyFinalized` if the loan was repaid or liquidated
    /// - `Unauthorized` unless `caller` is the borrower
    /// - `InsufficientBalance` if the borrower cannot cover the total due
    pub fn repay_loan(
        &self,
        ctx: &mut Ctx<'_>,
        caller: &Address,
        loan_id: LoanId,
    ) -> Result<Repayment> {
        // 1. Checks
        let config = active_config(&*ctx)?;
        let mut loan = Self::loan(&*ctx, loan_id)?;
        if loan.is_finalized() {
            return Err(InvoiceLendError::AlreadyFinalized(loan_id));
        }
        if *caller != loan.borrower {
            return Err(InvoiceLendError::unauthorized(
                "only the borrower may repay",
            ));
        }
        let repayment = self.quote(&loan, ctx.now())?;
        let available = ctx.balance(&config.token_address, &loan.borrower);
        if available < repayment.total {
            return Err(InvoiceLendError::InsufficientBalance {
                needed: repayment.total,
                available,
            });
        }

        // 2. Effects
        loan.mark_repaid(repayment.interest)?;
        ctx.set(DataKey::Loan(loan_id), &loan)?;
        ctx.release(DataKey::Loan(loan_id));
        self.registry
            .set_escrowed(ctx, &config.pool, loan.invoice_id, false)?;
        ctx.emit(EventKind::LoanRepaid {
            loan_id,
            borrower: loan.borrower,
            total: repayment.total,
        })?;

        // 3. Interactions
        ctx.transfer(
            &config.token_address,
            &loan.borrower,
            &config.pool,
            repayment.total,
        )?;

        tracing::info!(
            %loan_id,
            borrower = %loan.borrower,
            principal = %repayment.principal,
            interest = %repayment.interest,
            total = %repayment.total,
            "Loan repaid"
        );
        Ok(repayment)
    }

    /// Liquidate a loan past its due date: the collateral's ownership moves
    /// to the pool. Any caller may trigger it.
    ///
    /// # Errors
    /// - `ContractPaused` while paused
    /// - `NotFound` for an unknown loan
    /// - `AlreadyFinalized` if the loan was repaid or liquidated
    /// - `LoanNotDefaulted` while `now <= due_date`
    pub fn liquidate(&self, ctx: &mut Ctx<'_>, caller: &Address, loan_id: LoanId) -> Result<()> {
        let config = active_config(&*ctx)?;
        let mut loan = Self::loan(&*ctx, loan_id)?;
        if loan.is_finalized() {
            return Err(InvoiceLendError::AlreadyFinalized(loan_id));
        }
        let now = ctx.now();
        if !loan.is_overdue(now) {
            return Err(InvoiceLendError::LoanNotDefaulted {
                due_date: loan.due_date,
                now,
            });
        }

        loan.mark_defaulted()?;
        ctx.set(DataKey::Loan(loan_id), &loan)?;
        ctx.release(DataKey::Loan(loan_id));
        self.registry
            .transfer_ownership(ctx, &config.pool, loan.invoice_id, config.pool)?;
        self.registry
            .set_escrowed(ctx, &config.pool, loan.invoice_id, false)?;
        ctx.emit(EventKind::LoanLiquidated {
            loan_id,
            invoice_id: loan.invoice_id,
            liquidator: *caller,
        })?;

        tracing::info!(
            %loan_id,
            invoice_id = %loan.invoice_id,
            liquidator = %caller,
            overdue_secs = now - loan.due_date,
            "Loan liquidated"
        );
        Ok(())
    }

    /// Toggle the pause switch (admin only).
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` is not the admin.
    pub fn set_paused(&self, ctx: &mut Ctx<'_>, caller: &Address, paused: bool) -> Result<()> {
        AdminControl::require_admin(&*ctx, caller)?;
        ctx.set(DataKey::Paused, &paused)?;
        ctx.emit(EventKind::PauseSet { paused })?;
        tracing::info!(paused, "Pause switch set");
        Ok(())
    }

    /// Fund the pool with `amount` of stablecoin from `from`.
    ///
    /// # Errors
    /// - `ContractPaused` while paused
    /// - `Unauthorized` unless `caller` is `from`
    /// - `InvalidAmount` for a non-positive amount
    /// - `InsufficientBalance` if `from` cannot cover it
    pub fn deposit(
        &self,
        ctx: &mut Ctx<'_>,
        caller: &Address,
        from: &Address,
        amount: Amount,
    ) -> Result<()> {
        let config = active_config(&*ctx)?;
        if caller != from {
            return Err(InvoiceLendError::unauthorized(
                "deposit must be authorized by the depositor",
            ));
        }
        if !amount.is_positive() {
            return Err(InvoiceLendError::InvalidAmount(amount));
        }

        ctx.emit(EventKind::PoolDeposit {
            from: *from,
            amount,
        })?;
        ctx.transfer(&config.token_address, from, &config.pool, amount)?;

        tracing::info!(%from, %amount, "Pool deposit");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    /// Read a loan.
    ///
    /// # Errors
    /// Returns `NotFound` if no live record exists.
    pub fn loan(state: &impl StateRead, loan_id: LoanId) -> Result<Loan> {
        state
            .get(&DataKey::Loan(loan_id))?
            .ok_or(InvoiceLendError::NotFound(RecordRef::Loan(loan_id)))
    }

    /// What repaying `loan_id` right now would cost.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown loan and `AlreadyFinalized` for a
    /// repaid or liquidated one.
    pub fn quote_repayment(&self, state: &impl StateRead, loan_id: LoanId) -> Result<Repayment> {
        let loan = Self::loan(state, loan_id)?;
        if loan.is_finalized() {
            return Err(InvoiceLendError::AlreadyFinalized(loan_id));
        }
        self.quote(&loan, state.now())
    }

    /// Stablecoin held by the pool.
    ///
    /// # Errors
    /// Returns `NotInitialized` before initialization.
    pub fn pool_balance(state: &impl StateRead) -> Result<Amount> {
        let config = AdminControl::load_config(state)?;
        Ok(state.balance(&config.token_address, &config.pool))
    }

    /// Whether borrow, repay, liquidate and deposit are blocked.
    ///
    /// # Errors
    /// Returns `NotInitialized` before initialization.
    pub fn is_paused(state: &impl StateRead) -> Result<bool> {
        state
            .get(&DataKey::Paused)?
            .ok_or(InvoiceLendError::NotInitialized)
    }

    fn quote(&self, loan: &Loan, now: u64) -> Result<Repayment> {
        let interest = self.interest.accrued(loan.principal, loan.start_time, now)?;
        let total = loan
            .principal
            .checked_add(interest)
            .ok_or(InvoiceLendError::ArithmeticOverflow {
                context: "repayment total",
            })?;
        Ok(Repayment {
            loan_id: loan.loan_id,
            principal: loan.principal,
            interest,
            total,
        })
    }
}

/// Load the config and reject if paused.
fn active_config(state: &impl StateRead) -> Result<ProtocolConfig> {
    let config = AdminControl::load_config(state)?;
    if config.paused {
        return Err(InvoiceLendError::ContractPaused);
    }
    Ok(config)
}
