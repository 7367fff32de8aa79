//! End-to-end lifecycle tests across the registry and the lending ledger.
//!
//! Each test drives the deployed [`Protocol`] surface the way an off-ledger
//! client would: the trust backend signs a mint request, the borrower pledges
//! the invoice, time passes, and the loan ends in repayment or liquidation.

mod common;

use common::{Harness, T0, TERM};
use invoicelend_ledger::{MemoryAssetLedger, StateRead};
use invoicelend_lending::{Protocol, calculate_interest};
use invoicelend_registry::{BackendSigner, Ed25519Verifier};
use invoicelend_types::constants::SECONDS_PER_YEAR;
use invoicelend_types::*;

// =============================================================================
// Test: mint → borrow → repay after one year
// =============================================================================
#[test]
fn e2e_borrow_and_repay_after_one_year() {
    let mut h = Harness::new();
    let alice = Address::random();

    let invoice_id = h.mint_for(alice);
    assert_eq!(invoice_id, InvoiceId(1));

    let loan_id = h
        .protocol
        .borrow(&alice, &alice, invoice_id, Amount::from_units(1000), TERM)
        .expect("borrow should succeed");
    assert_eq!(loan_id, LoanId(1));
    assert!(h.protocol.invoice(invoice_id).unwrap().escrowed);
    assert_eq!(h.balance(&alice), Amount::from_units(1000));

    // Alice earns the interest elsewhere.
    h.fund(&alice, Amount::from_units(50));
    h.protocol.advance(SECONDS_PER_YEAR);

    let repayment = h.protocol.repay_loan(&alice, loan_id).unwrap();
    assert_eq!(repayment.principal, Amount::from_units(1000));
    assert_eq!(repayment.interest, Amount::from_units(50));
    assert_eq!(repayment.total, Amount::from_units(1050));

    // Collateral released, owner unchanged.
    let invoice = h.protocol.invoice(invoice_id).unwrap();
    assert!(!invoice.escrowed);
    assert_eq!(invoice.owner, alice);

    let loan = h.protocol.loan(loan_id).unwrap();
    assert!(loan.is_repaid);
    assert!(!loan.is_defaulted);
    assert_eq!(loan.status(), LoanStatus::Repaid);
    assert_eq!(loan.interest, Amount::from_units(50));

    assert_eq!(h.balance(&alice), Amount::ZERO);
    assert_eq!(
        h.protocol.pool_balance().unwrap(),
        Amount::from_units(100_050)
    );
    h.protocol
        .env()
        .assets()
        .verify_supply(&h.token)
        .expect("supply must be conserved");

    assert_eq!(
        h.topics(),
        vec![
            "initialized",
            "mint",
            "invoice_escrowed",
            "loan_created",
            "invoice_released",
            "loan_repaid",
        ]
    );
    assert_eq!(h.protocol.env().events().verify_chain(), None);
}

// =============================================================================
// Test: immediate repayment carries no interest
// =============================================================================
#[test]
fn e2e_repay_at_zero_elapsed() {
    let mut h = Harness::new();
    let alice = Address::random();
    let invoice_id = h.mint_for(alice);
    let loan_id = h
        .protocol
        .borrow(&alice, &alice, invoice_id, Amount::from_units(700), TERM)
        .unwrap();

    let repayment = h.protocol.repay_loan(&alice, loan_id).unwrap();
    assert_eq!(repayment.interest, Amount::ZERO);
    assert_eq!(repayment.total, Amount::from_units(700));
    assert_eq!(
        h.protocol.pool_balance().unwrap(),
        Amount::from_units(common::POOL_LIQUIDITY)
    );
}

// =============================================================================
// Test: borrow → default → liquidate
// =============================================================================
#[test]
fn e2e_liquidation_lifecycle() {
    let mut h = Harness::new();
    let alice = Address::random();
    let keeper = Address::random();
    let invoice_id = h.mint_for(alice);
    let loan_id = h
        .protocol
        .borrow(&alice, &alice, invoice_id, Amount::from_units(900), TERM)
        .unwrap();

    // Still within term: healthy loan.
    h.protocol.advance(TERM - 1);
    let err = h.protocol.liquidate(&keeper, loan_id).unwrap_err();
    assert!(matches!(err, InvoiceLendError::LoanNotDefaulted { .. }));

    // Exactly at the due date is still healthy.
    h.protocol.advance(1);
    assert!(matches!(
        h.protocol.liquidate(&keeper, loan_id),
        Err(InvoiceLendError::LoanNotDefaulted { .. })
    ));

    h.protocol.advance(1);
    h.protocol
        .liquidate(&keeper, loan_id)
        .expect("overdue loan should liquidate");

    let invoice = h.protocol.invoice(invoice_id).unwrap();
    assert_eq!(invoice.owner, h.pool);
    assert!(!invoice.escrowed);
    let loan = h.protocol.loan(loan_id).unwrap();
    assert!(loan.is_defaulted);
    assert!(!loan.is_repaid);
    assert_eq!(loan.interest, Amount::ZERO);

    // Terminal: neither liquidate nor repay again.
    assert!(matches!(
        h.protocol.liquidate(&keeper, loan_id),
        Err(InvoiceLendError::AlreadyFinalized(_))
    ));
    h.fund(&alice, Amount::from_units(1_000));
    assert!(matches!(
        h.protocol.repay_loan(&alice, loan_id),
        Err(InvoiceLendError::AlreadyFinalized(_))
    ));
    assert!(matches!(
        h.protocol.quote_repayment(loan_id),
        Err(InvoiceLendError::AlreadyFinalized(_))
    ));

    let last = h.protocol.env().events().last().unwrap();
    assert_eq!(
        last.kind,
        EventKind::LoanLiquidated {
            loan_id,
            invoice_id,
            liquidator: keeper,
        }
    );
}

// =============================================================================
// Test: loans longer than the liveness window stay serviceable
// =============================================================================
#[test]
fn e2e_long_term_loans_outlive_window() {
    const DAY: u64 = 24 * 3600;
    let mut h = Harness::new();
    let window = h.protocol.settings().ttl_window_secs;
    assert!(TERM > window);
    let alice = Address::random();
    let bob = Address::random();
    let keeper = Address::random();

    let repaid_invoice = h.mint_for(alice);
    let repaid_loan = h
        .protocol
        .borrow(&alice, &alice, repaid_invoice, Amount::from_units(100), TERM)
        .unwrap();
    let seized_invoice = h.mint_for(bob);
    let seized_loan = h
        .protocol
        .borrow(&bob, &bob, seized_invoice, Amount::from_units(100), TERM)
        .unwrap();

    // Day 31: past the window with no transaction in between.
    h.protocol.advance(31 * DAY);
    h.fund(&alice, Amount::from_units(1));
    let repayment = h.protocol.repay_loan(&alice, repaid_loan).unwrap();
    assert_eq!(
        repayment.interest,
        calculate_interest(Amount::from_units(100), T0, T0 + 31 * DAY).unwrap()
    );
    let invoice = h.protocol.invoice(repaid_invoice).unwrap();
    assert!(!invoice.escrowed);
    assert_eq!(invoice.owner, alice);

    // Due date plus another 31 days.
    h.protocol.advance(TERM);
    h.protocol.liquidate(&keeper, seized_loan).unwrap();
    let invoice = h.protocol.invoice(seized_invoice).unwrap();
    assert_eq!(invoice.owner, h.pool);
    assert!(!invoice.escrowed);
    assert!(h.protocol.loan(seized_loan).unwrap().is_defaulted);
}

// =============================================================================
// Test: a repaid loan cannot be repaid twice
// =============================================================================
#[test]
fn e2e_double_repay_rejected() {
    let mut h = Harness::new();
    let alice = Address::random();
    let invoice_id = h.mint_for(alice);
    let term = 3_600;
    let loan_id = h
        .protocol
        .borrow(&alice, &alice, invoice_id, Amount::from_units(100), term)
        .unwrap();
    h.protocol.repay_loan(&alice, loan_id).unwrap();
    let err = h.protocol.repay_loan(&alice, loan_id).unwrap_err();
    assert!(matches!(err, InvoiceLendError::AlreadyFinalized(id) if id == loan_id));

    // Overdue but already settled.
    h.protocol.advance(term + 1);
    assert!(matches!(
        h.protocol.liquidate(&Address::random(), loan_id),
        Err(InvoiceLendError::AlreadyFinalized(_))
    ));

    // Once settled, the record ages out with the regular window.
    let window = h.protocol.settings().ttl_window_secs;
    h.protocol.advance(window);
    assert!(matches!(
        h.protocol.loan(loan_id),
        Err(InvoiceLendError::NotFound(RecordRef::Loan(_)))
    ));
}

// =============================================================================
// Test: an escrowed invoice cannot back a second loan
// =============================================================================
#[test]
fn e2e_escrowed_invoice_cannot_be_pledged_twice() {
    let mut h = Harness::new();
    let alice = Address::random();
    let invoice_id = h.mint_for(alice);
    h.protocol
        .borrow(&alice, &alice, invoice_id, Amount::from_units(300), TERM)
        .unwrap();

    let err = h
        .protocol
        .borrow(&alice, &alice, invoice_id, Amount::from_units(300), TERM)
        .unwrap_err();
    assert!(matches!(err, InvoiceLendError::AlreadyEscrowed(id) if id == invoice_id));
    assert!(matches!(
        h.protocol.loan(LoanId(2)),
        Err(InvoiceLendError::NotFound(RecordRef::Loan(LoanId(2))))
    ));
    assert_eq!(h.protocol.config().unwrap().next_loan_id, LoanId(2));
}

// =============================================================================
// Test: after repayment the invoice can back a fresh loan
// =============================================================================
#[test]
fn e2e_repledge_after_repayment() {
    let mut h = Harness::new();
    let alice = Address::random();
    let invoice_id = h.mint_for(alice);
    let first = h
        .protocol
        .borrow(&alice, &alice, invoice_id, Amount::from_units(500), TERM)
        .unwrap();
    h.protocol.repay_loan(&alice, first).unwrap();

    let second = h
        .protocol
        .borrow(&alice, &alice, invoice_id, Amount::from_units(500), TERM)
        .unwrap();
    assert_eq!(second, LoanId(2));
    assert!(h.protocol.invoice(invoice_id).unwrap().escrowed);
}

// =============================================================================
// Test: the pause switch blocks the lending entry points
// =============================================================================
#[test]
fn e2e_pause_blocks_lending() {
    let mut h = Harness::new();
    let alice = Address::random();
    let pledged = h.mint_for(alice);
    let spare = h.mint_for(alice);
    let loan_id = h
        .protocol
        .borrow(&alice, &alice, pledged, Amount::from_units(100), TERM)
        .unwrap();
    h.protocol.advance(TERM + 1);

    let admin = h.admin;
    h.protocol.set_paused(&admin, true).unwrap();
    assert!(h.protocol.is_paused().unwrap());

    assert!(matches!(
        h.protocol
            .borrow(&alice, &alice, spare, Amount::from_units(100), TERM),
        Err(InvoiceLendError::ContractPaused)
    ));
    assert!(matches!(
        h.protocol.repay_loan(&alice, loan_id),
        Err(InvoiceLendError::ContractPaused)
    ));
    assert!(matches!(
        h.protocol.liquidate(&Address::random(), loan_id),
        Err(InvoiceLendError::ContractPaused)
    ));
    assert!(matches!(
        h.protocol.deposit(&alice, &alice, Amount::from_units(1)),
        Err(InvoiceLendError::ContractPaused)
    ));

    // Minting is not pause-gated.
    h.mint_for(alice);

    h.protocol.set_paused(&admin, false).unwrap();
    h.protocol
        .liquidate(&Address::random(), loan_id)
        .expect("unpaused liquidation should succeed");
}

// =============================================================================
// Test: admin-only entry points reject everyone else
// =============================================================================
#[test]
fn e2e_admin_gate() {
    let mut h = Harness::new();
    let mallory = Address::random();
    let before = h.protocol.config().unwrap();

    assert!(matches!(
        h.protocol.set_paused(&mallory, true),
        Err(InvoiceLendError::Unauthorized { .. })
    ));
    assert!(matches!(
        h.protocol
            .set_backend_pubkey(&mallory, BackendSigner::random().public_key()),
        Err(InvoiceLendError::Unauthorized { .. })
    ));
    assert!(matches!(
        h.protocol.set_admin(&mallory, mallory),
        Err(InvoiceLendError::Unauthorized { .. })
    ));

    let after = h.protocol.config().unwrap();
    assert_eq!(before, after);
    assert!(!after.paused);
}

// =============================================================================
// Test: admin rotation hands over every privilege
// =============================================================================
#[test]
fn e2e_admin_rotation() {
    let mut h = Harness::new();
    let old_admin = h.admin;
    let new_admin = Address::random();
    h.protocol.set_admin(&old_admin, new_admin).unwrap();

    assert!(h.protocol.set_paused(&old_admin, true).is_err());
    h.protocol.set_paused(&new_admin, true).unwrap();
    assert!(h.protocol.is_paused().unwrap());
    assert_eq!(h.protocol.config().unwrap().admin, new_admin);
}

// =============================================================================
// Test: rotating the backend key invalidates old signatures
// =============================================================================
#[test]
fn e2e_backend_key_rotation() {
    let mut h = Harness::new();
    let admin = h.admin;
    let new_signer = BackendSigner::random();
    h.protocol
        .set_backend_pubkey(&admin, new_signer.public_key())
        .unwrap();

    let (request, old_sig) = h.signed_request(Address::random());
    assert!(matches!(
        h.protocol.mint(request.clone(), &old_sig),
        Err(InvoiceLendError::InvalidSignature)
    ));
    let new_sig = new_signer.sign_request(&request);
    assert_eq!(h.protocol.mint(request, &new_sig).unwrap(), InvoiceId(1));
}

// =============================================================================
// Test: mint rejections persist nothing
// =============================================================================
#[test]
fn e2e_mint_rejections() {
    let mut h = Harness::new();
    let alice = Address::random();
    let before = h.snapshot(&[]);

    // Due date at the current ledger time is already expired.
    let request = MintRequest::dummy(alice, h.protocol.now());
    let sig = h.signer.sign_request(&request);
    assert!(matches!(
        h.protocol.mint(request, &sig),
        Err(InvoiceLendError::InvoiceExpired { .. })
    ));

    // One flipped signature byte.
    let (request, sig) = h.signed_request(alice);
    let mut bytes = sig.to_bytes();
    bytes[17] ^= 0x80;
    assert!(matches!(
        h.protocol.mint(request.clone(), &Signature::from_bytes(bytes)),
        Err(InvoiceLendError::InvalidSignature)
    ));

    // A signed field altered after signing.
    let mut inflated = request;
    inflated.face_value = Amount::from_units(1_000_000);
    assert!(matches!(
        h.protocol.mint(inflated, &sig),
        Err(InvoiceLendError::InvalidSignature)
    ));

    assert_eq!(h.snapshot(&[]), before);
    assert!(h.protocol.invoice(InvoiceId(1)).is_err());
    assert_eq!(h.protocol.config().unwrap().next_invoice_id, InvoiceId(1));
}

// =============================================================================
// Test: liquidity providers fund new loans
// =============================================================================
#[test]
fn e2e_deposit_then_borrow_large() {
    let mut h = Harness::with_settings(ProtocolSettings::default());
    let lp = Address::random();
    let alice = Address::random();
    h.fund(&lp, Amount::from_units(250_000));
    h.protocol
        .deposit(&lp, &lp, Amount::from_units(250_000))
        .unwrap();
    assert_eq!(
        h.protocol.pool_balance().unwrap(),
        Amount::from_units(350_000)
    );

    let mut request = MintRequest::dummy(alice, T0 + 4 * TERM);
    request.face_value = Amount::from_units(300_000);
    let sig = h.signer.sign_request(&request);
    let invoice_id = h.protocol.mint(request, &sig).unwrap();
    h.protocol
        .borrow(&alice, &alice, invoice_id, Amount::from_units(300_000), TERM)
        .unwrap();
    assert_eq!(h.balance(&alice), Amount::from_units(300_000));
    assert_eq!(h.balance(&lp), Amount::ZERO);

    // Someone else cannot deposit on the LP's behalf.
    assert!(matches!(
        h.protocol.deposit(&alice, &lp, Amount::from_units(1)),
        Err(InvoiceLendError::Unauthorized { .. })
    ));
}

// =============================================================================
// Test: settings loaded from JSON drive the interest model
// =============================================================================
#[test]
fn e2e_settings_from_json() {
    let settings = ProtocolSettings::from_json_str(r#"{ "interest_rate_bps": 1200 }"#).unwrap();
    let mut h = Harness::with_settings(settings);
    let alice = Address::random();
    let invoice_id = h.mint_for(alice);
    let loan_id = h
        .protocol
        .borrow(&alice, &alice, invoice_id, Amount::from_units(1000), TERM)
        .unwrap();
    h.protocol.advance(SECONDS_PER_YEAR);
    let quote = h.protocol.quote_repayment(loan_id).unwrap();
    assert_eq!(quote.interest, Amount::from_units(120));
    assert_eq!(h.protocol.settings().interest_rate_bps, 1200);
}

// =============================================================================
// Test: an uninitialized protocol rejects everything
// =============================================================================
#[test]
fn e2e_uninitialized() {
    common::init_tracing();
    let mut protocol: Protocol = Protocol::new(
        MemoryAssetLedger::new(),
        Box::new(Ed25519Verifier),
        ProtocolSettings::default(),
    )
    .unwrap();
    protocol.env_mut().set_timestamp(T0);

    let signer = BackendSigner::random();
    let request = MintRequest::dummy(Address::random(), T0 + TERM);
    let sig = signer.sign_request(&request);
    assert!(matches!(
        protocol.mint(request, &sig),
        Err(InvoiceLendError::NotInitialized)
    ));
    assert!(matches!(
        protocol.is_paused(),
        Err(InvoiceLendError::NotInitialized)
    ));
    assert!(!protocol.env().has(&invoicelend_ledger::DataKey::Admin));

    let params = InitParams {
        admin: Address::random(),
        token_address: Address::random(),
        pool: Address::random(),
        backend_pubkey: signer.public_key(),
    };
    protocol.initialize(&params).unwrap();
    assert!(matches!(
        protocol.initialize(&params),
        Err(InvoiceLendError::AlreadyInitialized)
    ));
}

// =============================================================================
// Test: invalid settings refuse to deploy
// =============================================================================
#[test]
fn e2e_invalid_settings_rejected() {
    let settings = ProtocolSettings {
        seconds_per_year: 0,
        ..ProtocolSettings::default()
    };
    let result: Result<Protocol> =
        Protocol::new(MemoryAssetLedger::new(), Box::new(Ed25519Verifier), settings);
    assert!(matches!(result, Err(InvoiceLendError::Configuration(_))));
}
