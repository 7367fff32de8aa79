//! Admin control: one-time initialization, config loading and the
//! authorization gate consulted before every privileged mutation.

use invoicelend_ledger::{Ctx, DataKey, StateRead};
use invoicelend_types::constants::FIRST_RECORD_ID;
use invoicelend_types::{
    Address, EventKind, InitParams, InvoiceId, InvoiceLendError, LoanId, ProtocolConfig, Result,
};

/// Authorization gate and owner of the [`ProtocolConfig`] singleton.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminControl;

impl AdminControl {
    /// Write the configuration exactly once.
    ///
    /// Liveness is ignored: an admin entry that exists in any state blocks a
    /// second initialization.
    ///
    /// # Errors
    /// Returns `AlreadyInitialized` if an admin is already stored.
    pub fn initialize(ctx: &mut Ctx<'_>, params: &InitParams) -> Result<ProtocolConfig> {
        if ctx.exists(&DataKey::Admin) {
            return Err(InvoiceLendError::AlreadyInitialized);
        }
        let config = ProtocolConfig {
            admin: params.admin,
            token_address: params.token_address,
            pool: params.pool,
            backend_pubkey: params.backend_pubkey,
            paused: false,
            next_loan_id: LoanId(FIRST_RECORD_ID),
            next_invoice_id: InvoiceId(FIRST_RECORD_ID),
        };
        ctx.set(DataKey::Admin, &config.admin)?;
        ctx.set(DataKey::TokenAddress, &config.token_address)?;
        ctx.set(DataKey::Pool, &config.pool)?;
        ctx.set(DataKey::BackendPubkey, &config.backend_pubkey)?;
        ctx.set(DataKey::Paused, &config.paused)?;
        ctx.set(DataKey::NextLoanId, &config.next_loan_id)?;
        ctx.set(DataKey::NextInvoiceId, &config.next_invoice_id)?;
        ctx.emit(EventKind::Initialized {
            admin: config.admin,
            pool: config.pool,
        })?;

        tracing::info!(admin = %config.admin, pool = %config.pool, "Protocol initialized");
        Ok(config)
    }

    /// Assemble the configuration from its persisted keys.
    ///
    /// # Errors
    /// Returns `NotInitialized` if any key is missing.
    pub fn load_config(state: &impl StateRead) -> Result<ProtocolConfig> {
        Ok(ProtocolConfig {
            admin: required(state, DataKey::Admin)?,
            token_address: required(state, DataKey::TokenAddress)?,
            pool: required(state, DataKey::Pool)?,
            backend_pubkey: required(state, DataKey::BackendPubkey)?,
            paused: required(state, DataKey::Paused)?,
            next_loan_id: required(state, DataKey::NextLoanId)?,
            next_invoice_id: required(state, DataKey::NextInvoiceId)?,
        })
    }

    /// Check that `caller` is the stored admin. Call before any mutation.
    ///
    /// # Errors
    /// Returns `Unauthorized` for anyone else, `NotInitialized` if there is
    /// no admin yet.
    pub fn require_admin(state: &impl StateRead, caller: &Address) -> Result<Address> {
        let admin: Address = required(state, DataKey::Admin)?;
        if *caller != admin {
            tracing::debug!(%caller, "Caller is not admin");
            return Err(InvoiceLendError::unauthorized("caller is not admin"));
        }
        Ok(admin)
    }

    /// Hand the admin role to `new_admin`.
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` is not the current admin.
    pub fn set_admin(ctx: &mut Ctx<'_>, caller: &Address, new_admin: Address) -> Result<()> {
        let previous = Self::require_admin(&*ctx, caller)?;
        ctx.set(DataKey::Admin, &new_admin)?;
        ctx.emit(EventKind::AdminChanged {
            previous,
            admin: new_admin,
        })?;
        tracing::info!(%previous, admin = %new_admin, "Admin changed");
        Ok(())
    }
}

fn required<T: serde::de::DeserializeOwned>(state: &impl StateRead, key: DataKey) -> Result<T> {
    state.get(&key)?.ok_or(InvoiceLendError::NotInitialized)
}
