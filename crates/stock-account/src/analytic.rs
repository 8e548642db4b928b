//! Analytic (cost-center) projection of expense entries.

use grni_accounting::{AnalyticLine, MoveLine};
use grni_core::JournalId;
use grni_purchasing::{Purchase, PurchaseLine};

/// One analytic line per analytic account configured on `line`.
///
/// Copies debit, credit and date from `entry`; names the line after the
/// purchase line and references the purchase.
pub fn project_analytic_lines(
    purchase: &Purchase,
    line: &PurchaseLine,
    entry: &MoveLine,
    journal: Option<JournalId>,
) -> Vec<AnalyticLine> {
    line.analytic_accounts
        .iter()
        .map(|account| AnalyticLine {
            account: *account,
            name: line.description.clone(),
            debit: entry.debit,
            credit: entry.credit,
            date: entry.date,
            reference: purchase.reference.clone(),
            party: Some(purchase.party),
            journal,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use grni_accounting::{Account, AccountKind, Currency};
    use grni_core::{AnalyticAccountId, CompanyId, PartyId, ProductId};
    use grni_purchasing::{Product, ProductType};
    use rust_decimal_macros::dec;

    fn fixture() -> (Purchase, PurchaseLine, MoveLine) {
        let mut purchase = Purchase::new(CompanyId::new(), PartyId::new(), Currency::new("EUR", 2));
        purchase.reference = Some("PO-7".into());
        let product = Product {
            id: ProductId::new(),
            name: "widget".into(),
            kind: ProductType::Goods,
            expense_account: Some(Account::new("600", "Purchases", AccountKind::Expense)),
        };
        let line = PurchaseLine::new(product, dec!(2), dec!(15));
        let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let entry = MoveLine::debit(grni_core::AccountId::new(), dec!(30), date);
        (purchase, line, entry)
    }

    #[test]
    fn no_analytic_accounts_means_no_lines() {
        let (purchase, line, entry) = fixture();
        assert!(project_analytic_lines(&purchase, &line, &entry, None).is_empty());
    }

    #[test]
    fn one_line_per_analytic_account() {
        let (purchase, mut line, entry) = fixture();
        let a = AnalyticAccountId::new();
        let b = AnalyticAccountId::new();
        line.analytic_accounts = vec![a, b];
        let journal = JournalId::new();

        let lines = project_analytic_lines(&purchase, &line, &entry, Some(journal));

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].account, a);
        assert_eq!(lines[1].account, b);
        for l in &lines {
            assert_eq!(l.debit, dec!(30));
            assert_eq!(l.credit, dec!(0));
            assert_eq!(l.date, entry.date);
            assert_eq!(l.name, "widget");
            assert_eq!(l.reference.as_deref(), Some("PO-7"));
            assert_eq!(l.party, Some(purchase.party));
            assert_eq!(l.journal, Some(journal));
        }
    }
}
