use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use grni_accounting::{
    Account, AccountKind, Currency, InMemoryLedger, Journal, JournalKind, LedgerRepository,
    LineQuery, MoveOrigin, PeriodCalendar, PostedLine,
};
use grni_core::{CompanyId, DomainError, InvoiceLineId, JournalId, PartyId, ProductId};
use grni_purchasing::{
    InvoiceException, InvoiceLine, InvoiceMethod, InvoiceState, Product, ProductType, Purchase,
    PurchaseLine, ShipmentMovement, Unit,
};
use grni_stock_account::{InMemoryHost, PendingInvoiceService, SettingsConfiguration};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn today() -> NaiveDate {
    day(30)
}

struct World {
    company: CompanyId,
    pending: Account,
    expense: Account,
    ledger: Arc<InMemoryLedger>,
    service: PendingInvoiceService<Arc<InMemoryLedger>, InMemoryHost>,
}

impl World {
    fn new() -> Self {
        let mut pending = Account::new("PR", "Pending payable", AccountKind::Liability);
        pending.party_required = true;
        pending.reconcile = true;
        Self::with_pending(Some(pending))
    }

    fn with_pending(pending: Option<Account>) -> Self {
        let company = CompanyId::new();
        let mut host = InMemoryHost::new(
            SettingsConfiguration::new(pending.clone(), Currency::new("EUR", 2)),
            PeriodCalendar::monthly(company, 2024),
        );
        host.journals.push(Journal {
            id: JournalId::new(),
            code: "EXP".into(),
            name: "Expense".into(),
            kind: JournalKind::Expense,
        });
        host.rates.set_rate("EUR", day(1), dec!(1));
        host.rates.set_rate("USD", day(1), dec!(2));
        host.rates.set_rate("USD", day(5), dec!(4));
        let ledger = Arc::new(InMemoryLedger::new());
        Self {
            company,
            pending: pending
                .unwrap_or_else(|| Account::new("PR", "Pending payable", AccountKind::Liability)),
            expense: Account::new("600", "Expense", AccountKind::Expense),
            service: PendingInvoiceService::new(Arc::clone(&ledger), host),
            ledger,
        }
    }

    fn purchase(&self, lines: &[(Decimal, Decimal)]) -> Purchase {
        self.purchase_in(Currency::new("EUR", 2), lines)
    }

    fn purchase_in(&self, currency: Currency, lines: &[(Decimal, Decimal)]) -> Purchase {
        let mut purchase = Purchase::new(self.company, PartyId::new(), currency);
        purchase.reference = Some("P-0001".into());
        for (qty, price) in lines {
            let product = Product {
                id: ProductId::new(),
                name: "product".into(),
                kind: ProductType::Goods,
                expense_account: Some(self.expense.clone()),
            };
            purchase.lines.push(PurchaseLine::new(product, *qty, *price));
        }
        purchase
    }

    fn pending_lines(&self, purchase: &Purchase) -> Vec<PostedLine> {
        self.ledger.search_lines(
            &LineQuery::default()
                .origin(MoveOrigin::Purchase(purchase.id))
                .account(self.pending.id),
        )
    }

    /// Sum of credit - debit on the pending account for the purchase.
    fn pending_balance(&self, purchase: &Purchase) -> Decimal {
        self.pending_lines(purchase).iter().map(|p| p.line.pending()).sum()
    }

    fn pending_credits(&self, purchase: &Purchase) -> Decimal {
        self.pending_lines(purchase).iter().map(|p| p.line.credit).sum()
    }
}

fn ship(line: &mut PurchaseLine, qty: Decimal, on: NaiveDate) {
    line.moves.push(ShipmentMovement::done(qty, Unit::unit(), on));
}

fn invoice(line: &mut PurchaseLine, qty: Decimal, unit_price: Decimal, on: NaiveDate) -> InvoiceLineId {
    let il = InvoiceLine {
        id: InvoiceLineId::new(),
        quantity: qty,
        unit: Unit::unit(),
        unit_price,
        state: InvoiceState::Posted,
        invoice_date: Some(on),
        accounting_date: None,
        stock_move: None,
        exception: InvoiceException::None,
    };
    let id = il.id;
    line.invoice_lines.push(il);
    id
}

fn invoice_line_mut(purchase: &mut Purchase, id: InvoiceLineId) -> &mut InvoiceLine {
    purchase
        .lines
        .iter_mut()
        .flat_map(|l| l.invoice_lines.iter_mut())
        .find(|il| il.id == id)
        .unwrap()
}

#[test]
fn partial_shipment_of_two_lines_credits_pending_account() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(5), dec!(10)), (dec!(5), dec!(20))]);
    for line in purchase.lines.iter_mut() {
        ship(line, dec!(1), day(1));
    }

    let outcome = world.service.purchase_processed(&purchase, today()).unwrap();

    assert_eq!(outcome.moves.len(), 1);
    assert_eq!(world.pending_credits(&purchase), dec!(30.00));
    assert_eq!(world.pending_balance(&purchase), dec!(30.00));
    assert!(world.pending_lines(&purchase).iter().all(|p| {
        p.line.party == Some(purchase.party) && p.line.reconciliation.is_none()
    }));
}

#[test]
fn full_shipment_then_full_invoice_clears_and_reconciles() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(5), dec!(10)), (dec!(5), dec!(20))]);
    for line in purchase.lines.iter_mut() {
        ship(line, dec!(1), day(1));
    }
    world.service.purchase_processed(&purchase, today()).unwrap();

    for line in purchase.lines.iter_mut() {
        ship(line, dec!(4), day(2));
    }
    world.service.purchase_processed(&purchase, today()).unwrap();
    assert_eq!(world.pending_balance(&purchase), dec!(150.00));

    for line in purchase.lines.iter_mut() {
        let price = line.unit_price;
        invoice(line, dec!(5), price, day(5));
    }
    let outcome = world.service.purchase_processed(&purchase, today()).unwrap();

    assert_eq!(world.pending_balance(&purchase), dec!(0.00));
    let reconciliation = outcome.selection.and_then(|s| s.reconciliation);
    assert!(reconciliation.is_some());
    assert!(
        world
            .pending_lines(&purchase)
            .iter()
            .all(|p| p.line.reconciliation == reconciliation)
    );
}

#[test]
fn invoice_at_another_price_still_clears_at_purchase_price() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(10), dec!(10))]);
    ship(&mut purchase.lines[0], dec!(10), day(1));
    world.service.purchase_processed(&purchase, today()).unwrap();

    invoice(&mut purchase.lines[0], dec!(10), dec!(14), day(4));
    world.service.purchase_processed(&purchase, today()).unwrap();

    let lines = world.pending_lines(&purchase);
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|p| p.line.debit == dec!(100)));
    assert_eq!(world.pending_balance(&purchase), dec!(0));
    assert!(lines.iter().all(|p| p.line.is_reconciled()));
}

#[test]
fn sub_cent_price_shipped_over_several_days_reconciles_once_invoiced() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(3), dec!(3.3333))]);
    for d in 1..=3 {
        ship(&mut purchase.lines[0], dec!(1), day(d));
    }
    world.service.purchase_processed(&purchase, today()).unwrap();
    assert_eq!(world.pending_balance(&purchase), dec!(9.99));

    invoice(&mut purchase.lines[0], dec!(3), dec!(3.3333), day(5));
    let outcome = world.service.purchase_processed(&purchase, today()).unwrap();

    assert_eq!(world.pending_balance(&purchase), dec!(0));
    assert!(outcome.selection.is_some_and(|s| s.reconciliation.is_some()));
    assert!(world.pending_lines(&purchase).iter().all(|p| p.line.is_reconciled()));
}

#[test]
fn foreign_purchase_invoiced_after_a_rate_change_reconciles() {
    let world = World::new();
    let mut purchase = world.purchase_in(Currency::new("USD", 2), &[(dec!(3), dec!(10))]);
    for d in 1..=3 {
        ship(&mut purchase.lines[0], dec!(1), day(d));
    }
    world.service.purchase_processed(&purchase, today()).unwrap();
    assert_eq!(world.pending_balance(&purchase), dec!(15.00));

    invoice(&mut purchase.lines[0], dec!(3), dec!(10), day(5));
    let outcome = world.service.purchase_processed(&purchase, today()).unwrap();

    assert_eq!(world.pending_balance(&purchase), dec!(0));
    assert!(outcome.selection.is_some_and(|s| s.reconciliation.is_some()));
    assert!(world.pending_lines(&purchase).iter().all(|p| p.line.is_reconciled()));
}

#[test]
fn partial_invoice_leaves_the_rest_open() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(10), dec!(10))]);
    ship(&mut purchase.lines[0], dec!(10), day(1));
    invoice(&mut purchase.lines[0], dec!(3), dec!(10), day(4));

    let outcome = world.service.purchase_processed(&purchase, today()).unwrap();

    assert_eq!(world.pending_balance(&purchase), dec!(70));
    let selection = outcome.selection.unwrap();
    assert_eq!(selection.credit, dec!(100));
    assert_eq!(selection.debit, dec!(30));
    assert!(selection.reconciliation.is_none());
}

#[test]
fn return_debits_pending_account_until_credit_note() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(-4), dec!(10))]);
    ship(&mut purchase.lines[0], dec!(4), day(1));
    world.service.purchase_processed(&purchase, today()).unwrap();

    let lines = world.pending_lines(&purchase);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line.debit, dec!(40));
    assert_eq!(world.pending_balance(&purchase), dec!(-40));

    invoice(&mut purchase.lines[0], dec!(-4), dec!(10), day(3));
    world.service.purchase_processed(&purchase, today()).unwrap();

    assert_eq!(world.pending_balance(&purchase), dec!(0));
    assert!(world.pending_lines(&purchase).iter().all(|p| p.line.is_reconciled()));
}

#[test]
fn cancelled_then_ignored_invoice_adds_pairs_without_touching_history() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(5), dec!(10))]);
    ship(&mut purchase.lines[0], dec!(5), day(1));
    let invoice_id = invoice(&mut purchase.lines[0], dec!(5), dec!(10), day(3));
    world.service.purchase_processed(&purchase, today()).unwrap();

    let history = world.pending_lines(&purchase);
    assert_eq!(history.len(), 2);
    let first = history[0].line.reconciliation;
    assert!(first.is_some());

    invoice_line_mut(&mut purchase, invoice_id).state = InvoiceState::Cancelled;
    let cancelled = world.service.purchase_processed(&purchase, today()).unwrap();
    assert_eq!(cancelled.moves.len(), 1);
    assert_eq!(world.pending_balance(&purchase), dec!(50));
    assert!(cancelled.selection.is_some_and(|s| s.reconciliation.is_none()));

    invoice_line_mut(&mut purchase, invoice_id).exception = InvoiceException::Ignored;
    let ignored = world.service.purchase_processed(&purchase, today()).unwrap();
    assert_eq!(ignored.moves.len(), 1);
    assert_eq!(world.pending_balance(&purchase), dec!(0));
    let second = ignored.selection.and_then(|s| s.reconciliation);
    assert!(second.is_some());
    assert_ne!(first, second);

    let all = world.pending_lines(&purchase);
    assert_eq!(all.len(), 4);
    for old in &history {
        let now = all.iter().find(|p| p.line.id == old.line.id).unwrap();
        assert_eq!(now.line, old.line);
    }
    assert!(all.iter().skip(2).all(|p| p.line.date == day(3)));
}

#[test]
fn recreated_invoice_clears_once_its_replacement_is_posted() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(5), dec!(10))]);
    ship(&mut purchase.lines[0], dec!(5), day(1));
    let original = invoice(&mut purchase.lines[0], dec!(5), dec!(10), day(3));
    invoice_line_mut(&mut purchase, original).state = InvoiceState::Cancelled;
    invoice_line_mut(&mut purchase, original).exception = InvoiceException::Recreated;
    world.service.purchase_processed(&purchase, today()).unwrap();
    assert_eq!(world.pending_balance(&purchase), dec!(50));

    invoice(&mut purchase.lines[0], dec!(5), dec!(10), day(6));
    world.service.purchase_processed(&purchase, today()).unwrap();
    assert_eq!(world.pending_balance(&purchase), dec!(0));
    assert!(world.pending_lines(&purchase).iter().all(|p| p.line.is_reconciled()));
}

#[test]
fn missing_pending_account_aborts_without_writing() {
    let world = World::with_pending(None);
    let mut purchase = world.purchase(&[(dec!(5), dec!(10))]);
    ship(&mut purchase.lines[0], dec!(5), day(1));

    match world.service.purchase_processed(&purchase, today()) {
        Err(DomainError::Configuration(msg)) => assert!(msg.contains("Pending Invoice Account")),
        other => panic!("expected Configuration, got {other:?}"),
    }
    assert!(world.ledger.moves().is_empty());
}

#[test]
fn missing_expense_account_aborts_the_whole_purchase() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(5), dec!(10)), (dec!(5), dec!(10))]);
    for line in purchase.lines.iter_mut() {
        ship(line, dec!(1), day(1));
    }
    if let Some(product) = purchase.lines[1].product.as_mut() {
        product.expense_account = None;
    }

    let err = world.service.purchase_processed(&purchase, today()).unwrap_err();
    assert!(matches!(err, DomainError::Configuration(_)));
    assert!(world.ledger.moves().is_empty());
}

#[test]
fn shipment_cancellation_posts_but_does_not_reconcile() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(5), dec!(10))]);
    ship(&mut purchase.lines[0], dec!(5), day(1));
    world.service.purchase_processed(&purchase, today()).unwrap();

    purchase.lines[0].moves[0].state = grni_purchasing::MovementState::Cancelled;
    let outcome = world.service.shipment_cancelled(&purchase, today()).unwrap();

    assert_eq!(outcome.moves.len(), 1);
    assert!(outcome.selection.is_none());
    assert_eq!(world.pending_balance(&purchase), dec!(0));
    assert!(world.pending_lines(&purchase).iter().all(|p| !p.line.is_reconciled()));
}

#[test]
fn reprocessing_is_idempotent() {
    let world = World::new();
    let mut purchase = world.purchase(&[(dec!(5), dec!(10)), (dec!(3), dec!(7.5))]);
    ship(&mut purchase.lines[0], dec!(2), day(1));
    ship(&mut purchase.lines[1], dec!(3), day(2));
    invoice(&mut purchase.lines[0], dec!(1), dec!(10), day(4));

    world.service.purchase_processed(&purchase, today()).unwrap();
    let before = world.ledger.moves();
    let again = world.service.purchase_processed(&purchase, day(31)).unwrap();

    assert!(again.moves.is_empty());
    assert_eq!(world.ledger.moves().len(), before.len());
    assert_eq!(world.pending_balance(&purchase), dec!(32.50));
}

#[test]
fn batch_processing_skips_purchases_not_invoiced_on_shipment() {
    let world = World::new();
    let mut shipped = world.purchase(&[(dec!(5), dec!(10))]);
    ship(&mut shipped.lines[0], dec!(5), day(1));
    let mut manual = shipped.clone();
    manual.id = grni_core::PurchaseId::new();
    manual.invoice_method = InvoiceMethod::Manual;

    let outcomes = world
        .service
        .process_purchases(&[shipped.clone(), manual.clone()], today())
        .unwrap();

    assert!(!outcomes[0].skipped);
    assert!(outcomes[1].skipped);
    assert_eq!(world.pending_balance(&shipped), dec!(50));
    assert!(world.pending_lines(&manual).is_empty());
}
