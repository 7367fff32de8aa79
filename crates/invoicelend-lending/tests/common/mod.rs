//! Shared harness for the lending integration tests.

#![allow(dead_code)]

use invoicelend_ledger::{AssetLedger, MemoryAssetLedger, Storage};
use invoicelend_lending::Protocol;
use invoicelend_registry::{BackendSigner, Ed25519Verifier};
use invoicelend_types::{
    Address, Amount, Event, InitParams, InvoiceId, MintRequest, ProtocolSettings, Timestamp,
};
use tracing_subscriber::EnvFilter;

/// Ledger time the harness starts at.
pub const T0: Timestamp = 1_700_000_000;
/// Default loan term: 90 days.
pub const TERM: u64 = 90 * 24 * 3600;
/// Liquidity the pool starts with.
pub const POOL_LIQUIDITY: i64 = 100_000;

/// Install a test-writer subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// A deployed protocol with a funded pool and a backend signer.
pub struct Harness {
    pub protocol: Protocol,
    pub signer: BackendSigner,
    pub admin: Address,
    pub token: Address,
    pub pool: Address,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(ProtocolSettings::default())
    }

    pub fn with_settings(settings: ProtocolSettings) -> Self {
        init_tracing();
        let signer = BackendSigner::random();
        let params = InitParams {
            admin: Address::random(),
            token_address: Address::random(),
            pool: Address::random(),
            backend_pubkey: signer.public_key(),
        };
        let mut protocol = Protocol::deploy(
            MemoryAssetLedger::new(),
            Box::new(Ed25519Verifier),
            settings,
            &params,
            T0,
        )
        .expect("deploy should succeed");
        protocol
            .env_mut()
            .assets_mut()
            .mint(
                &params.token_address,
                &params.pool,
                Amount::from_units(POOL_LIQUIDITY),
            )
            .expect("pool funding should succeed");
        Self {
            protocol,
            signer,
            admin: params.admin,
            token: params.token_address,
            pool: params.pool,
        }
    }

    /// A backend-signed 1000-unit invoice for `owner`, due well after any
    /// loan term the tests use.
    pub fn signed_request(&self, owner: Address) -> (MintRequest, invoicelend_types::Signature) {
        let request = MintRequest::dummy(owner, self.protocol.now() + 4 * TERM);
        let signature = self.signer.sign_request(&request);
        (request, signature)
    }

    pub fn mint_for(&mut self, owner: Address) -> InvoiceId {
        let (request, signature) = self.signed_request(owner);
        self.protocol
            .mint(request, &signature)
            .expect("mint should succeed")
    }

    /// Issue stablecoin to `who` outside any transaction.
    pub fn fund(&mut self, who: &Address, amount: Amount) {
        let token = self.token;
        self.protocol
            .env_mut()
            .assets_mut()
            .mint(&token, who, amount)
            .expect("funding should succeed");
    }

    pub fn balance(&self, who: &Address) -> Amount {
        self.protocol.env().assets().balance(&self.token, who)
    }

    pub fn snapshot(&self, holders: &[Address]) -> Snapshot {
        Snapshot {
            storage: self.protocol.env().storage().clone(),
            events: self.protocol.env().events().as_slice().to_vec(),
            balances: holders.iter().map(|h| self.balance(h)).collect(),
        }
    }

    pub fn topics(&self) -> Vec<&'static str> {
        self.protocol
            .env()
            .events()
            .iter()
            .map(|e| e.kind.topic())
            .collect()
    }
}

/// Observable ledger state, for "nothing changed" assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub storage: Storage,
    pub events: Vec<Event>,
    pub balances: Vec<Amount>,
}
