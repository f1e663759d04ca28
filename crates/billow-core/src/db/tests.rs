//! Database tests

use chrono::NaiveDate;

use super::*;
use crate::models::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_debit(external_id: &str, name: &str, amount: f64, d: NaiveDate) -> NewTransaction {
    NewTransaction {
        external_id: external_id.to_string(),
        name: name.to_string(),
        merchant_name: None,
        amount,
        transaction_type: TransactionType::Debit,
        date: d,
        category: None,
        pending: false,
    }
}

fn new_bill(user_id: i64, name: &str, amount: f64, next_due: NaiveDate) -> NewBill {
    NewBill {
        user_id,
        account_id: None,
        name: name.to_string(),
        amount,
        due_date: next_due,
        next_due_date: next_due,
        frequency: Frequency::Monthly,
        category: BillCategory::Other,
        payment_status: PaymentStatus::Upcoming,
        auto_detected: true,
        detection_confidence: 90,
        source_transaction_id: None,
        reminder_enabled: true,
        reminder_days_before: 3,
        priority: BillPriority::Medium,
    }
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert!(db.list_accounts(1).unwrap().is_empty());
    assert!(db.list_bills(1).unwrap().is_empty());
}

#[test]
fn test_account_crud() {
    let db = Database::in_memory().unwrap();

    let id = db.create_account(1, "Everyday Checking", Provider::Plaid).unwrap();
    assert!(id > 0);
    db.create_account(2, "Other User Account", Provider::Simplefin).unwrap();

    let accounts = db.list_accounts(1).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "Everyday Checking");
    assert_eq!(accounts[0].provider, Provider::Plaid);
}

#[test]
fn test_insert_transaction_dedupes_by_external_id() {
    let db = Database::in_memory().unwrap();
    let account_id = db.create_account(1, "Checking", Provider::Plaid).unwrap();

    let tx = new_debit("ext-1", "NETFLIX.COM", 15.99, date(2024, 3, 1));
    let first = db.insert_transaction(1, account_id, &tx).unwrap();
    assert!(first.is_some());

    // Same external id again: skipped
    let second = db.insert_transaction(1, account_id, &tx).unwrap();
    assert!(second.is_none());

    let txs = db.list_debits_since(1, date(2024, 1, 1)).unwrap();
    assert_eq!(txs.len(), 1);
}

#[test]
fn test_list_debits_filters_type_and_window() {
    let db = Database::in_memory().unwrap();
    let account_id = db.create_account(1, "Checking", Provider::Plaid).unwrap();

    db.insert_transaction(1, account_id, &new_debit("d-1", "Old Charge", 9.99, date(2023, 6, 1)))
        .unwrap();
    db.insert_transaction(1, account_id, &new_debit("d-2", "Rent", 1800.0, date(2024, 3, 1)))
        .unwrap();
    db.insert_transaction(
        1,
        account_id,
        &NewTransaction {
            transaction_type: TransactionType::Credit,
            ..new_debit("c-1", "Payroll", 2400.0, date(2024, 3, 2))
        },
    )
    .unwrap();

    let debits = db.list_debits_since(1, date(2024, 1, 1)).unwrap();
    assert_eq!(debits.len(), 1);
    assert_eq!(debits[0].name, "Rent");
}

#[test]
fn test_list_debits_ordering() {
    let db = Database::in_memory().unwrap();
    let account_id = db.create_account(1, "Checking", Provider::Plaid).unwrap();

    db.insert_transaction(1, account_id, &new_debit("a", "Mid", 1.0, date(2024, 2, 1)))
        .unwrap();
    db.insert_transaction(1, account_id, &new_debit("b", "New", 1.0, date(2024, 3, 1)))
        .unwrap();
    db.insert_transaction(1, account_id, &new_debit("c", "Older", 1.0, date(2024, 1, 1)))
        .unwrap();

    let asc: Vec<String> = db
        .list_debits_since(1, date(2024, 1, 1))
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(asc, ["Older", "Mid", "New"]);

    let desc: Vec<String> = db
        .list_unmatched_debits_since(1, date(2024, 1, 1))
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(desc, ["New", "Mid", "Older"]);
}

#[test]
fn test_link_transaction_writes_once() {
    let db = Database::in_memory().unwrap();
    let account_id = db.create_account(1, "Checking", Provider::Plaid).unwrap();
    let tx_id = db
        .insert_transaction(1, account_id, &new_debit("x", "Netflix", 15.99, date(2024, 3, 1)))
        .unwrap()
        .unwrap();
    let bill_a = db.create_bill(&new_bill(1, "Netflix", 15.99, date(2024, 3, 1))).unwrap();
    let bill_b = db.create_bill(&new_bill(1, "Other", 15.99, date(2024, 3, 1))).unwrap();

    assert!(db.link_transaction_to_bill(tx_id, bill_a).unwrap());
    // Second link attempt leaves the original in place
    assert!(!db.link_transaction_to_bill(tx_id, bill_b).unwrap());

    let tx = db.get_transaction(tx_id).unwrap().unwrap();
    assert_eq!(tx.bill_id, Some(bill_a));

    // Linked transactions disappear from the matcher's candidate pool
    assert!(db.list_unmatched_debits_since(1, date(2024, 1, 1)).unwrap().is_empty());
}

#[test]
fn test_bill_roundtrip() {
    let db = Database::in_memory().unwrap();
    let mut bill = new_bill(1, "City Electric", 120.50, date(2024, 4, 5));
    bill.frequency = Frequency::Quarterly;
    bill.category = BillCategory::Utilities;
    bill.priority = BillPriority::High;

    let id = db.create_bill(&bill).unwrap();
    let loaded = db.get_bill(id).unwrap().unwrap();
    assert_eq!(loaded.name, "City Electric");
    assert_eq!(loaded.amount, 120.50);
    assert_eq!(loaded.frequency, Frequency::Quarterly);
    assert_eq!(loaded.category, BillCategory::Utilities);
    assert_eq!(loaded.priority, BillPriority::High);
    assert_eq!(loaded.payment_status, PaymentStatus::Upcoming);
    assert_eq!(loaded.due_date, date(2024, 4, 5));
    assert_eq!(loaded.next_due_date, date(2024, 4, 5));
    assert!(loaded.auto_detected);
    assert_eq!(loaded.detection_confidence, 90);
    assert_eq!(loaded.last_payment_date, None);
    assert_eq!(loaded.last_payment_amount, None);
}

#[test]
fn test_find_auto_detected_bill_ignores_manual_bills() {
    let db = Database::in_memory().unwrap();

    let mut manual = new_bill(1, "Netflix", 15.99, date(2024, 4, 1));
    manual.auto_detected = false;
    db.create_bill(&manual).unwrap();

    assert_eq!(db.find_auto_detected_bill(1, "Netflix").unwrap(), None);

    let auto_id = db.create_bill(&new_bill(1, "Netflix", 15.99, date(2024, 4, 1))).unwrap();
    assert_eq!(db.find_auto_detected_bill(1, "Netflix").unwrap(), Some(auto_id));
    // Scoped per user
    assert_eq!(db.find_auto_detected_bill(2, "Netflix").unwrap(), None);
}

#[test]
fn test_list_open_bills_excludes_paid() {
    let db = Database::in_memory().unwrap();
    let a = db.create_bill(&new_bill(1, "A", 10.0, date(2024, 4, 1))).unwrap();
    let b = db.create_bill(&new_bill(1, "B", 10.0, date(2024, 4, 1))).unwrap();
    db.settle_bill(b, 10.0, date(2024, 4, 1), date(2024, 5, 1)).unwrap();

    let open: Vec<i64> = db.list_open_bills(1).unwrap().into_iter().map(|x| x.id).collect();
    assert_eq!(open, [a]);
}

#[test]
fn test_settle_bill() {
    let db = Database::in_memory().unwrap();
    let id = db.create_bill(&new_bill(1, "Netflix", 15.99, date(2024, 4, 1))).unwrap();

    db.settle_bill(id, 15.99, date(2024, 4, 2), date(2024, 5, 2)).unwrap();

    let bill = db.get_bill(id).unwrap().unwrap();
    assert_eq!(bill.payment_status, PaymentStatus::Paid);
    assert_eq!(bill.last_payment_date, Some(date(2024, 4, 2)));
    assert_eq!(bill.last_payment_amount, Some(15.99));
    assert_eq!(bill.next_due_date, date(2024, 5, 2));
}

#[test]
fn test_refresh_bill_statuses() {
    let db = Database::in_memory().unwrap();
    let today = date(2024, 4, 10);

    // Due in 2 days: inside the 3-day reminder window
    let due_soon = db.create_bill(&new_bill(1, "Due Soon", 10.0, date(2024, 4, 12))).unwrap();
    // Past due
    let late = db.create_bill(&new_bill(1, "Late", 10.0, date(2024, 4, 1))).unwrap();
    // Comfortably in the future
    let upcoming = db.create_bill(&new_bill(1, "Upcoming", 10.0, date(2024, 5, 20))).unwrap();
    // Paid this cycle: the next due date is still ahead, so it stays paid
    let paid_current = db.create_bill(&new_bill(1, "Paid Current", 10.0, date(2024, 4, 2))).unwrap();
    db.settle_bill(paid_current, 10.0, date(2024, 4, 2), date(2024, 5, 2)).unwrap();
    // Paid last cycle: the rolled-forward due date has passed, so it reopens
    let paid_lapsed = db.create_bill(&new_bill(1, "Paid Lapsed", 10.0, date(2024, 3, 1))).unwrap();
    db.settle_bill(paid_lapsed, 10.0, date(2024, 3, 1), date(2024, 4, 1)).unwrap();

    db.refresh_bill_statuses(1, today).unwrap();

    let status = |id| db.get_bill(id).unwrap().unwrap().payment_status;
    assert_eq!(status(due_soon), PaymentStatus::Due);
    assert_eq!(status(late), PaymentStatus::Overdue);
    assert_eq!(status(upcoming), PaymentStatus::Upcoming);
    assert_eq!(status(paid_current), PaymentStatus::Paid);
    assert_eq!(status(paid_lapsed), PaymentStatus::Overdue);
}

#[test]
fn test_reset_user_preserves_manual_bills() {
    let db = Database::in_memory().unwrap();
    let account_id = db.create_account(1, "Checking", Provider::Plaid).unwrap();
    db.insert_transaction(1, account_id, &new_debit("x", "Netflix", 15.99, date(2024, 3, 1)))
        .unwrap();
    db.create_bill(&new_bill(1, "Netflix", 15.99, date(2024, 4, 1))).unwrap();
    let mut manual = new_bill(1, "Rent", 1800.0, date(2024, 4, 1));
    manual.auto_detected = false;
    db.create_bill(&manual).unwrap();

    db.reset_user(1).unwrap();

    assert!(db.list_debits_since(1, date(2024, 1, 1)).unwrap().is_empty());
    let bills = db.list_bills(1).unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].name, "Rent");
}
