use cashlens_core::TransactionRecord;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

/// (description, amount in cents, days before today)
const DEMO_TRANSACTIONS: &[(&str, i64, u64)] = &[
    ("Salary Deposit", 450_000, 30),
    ("Whole Foods", -8_532, 28),
    ("Starbucks", -675, 25),
    ("Amazon", -12_745, 24),
    ("Uber", -2_350, 20),
    ("Netflix", -1_599, 15),
    ("Target", -6_789, 10),
    ("Gas Station", -4_500, 7),
    ("Restaurant", -4_560, 3),
];

/// A month of sample activity ending shortly before `today`.
pub fn demo_history(today: NaiveDate) -> Vec<TransactionRecord> {
    DEMO_TRANSACTIONS
        .iter()
        .map(|(description, cents, days_ago)| {
            let date = today.checked_sub_days(Days::new(*days_ago)).unwrap_or(today);
            TransactionRecord::new(date, Decimal::new(*cents, 2)).with_description(*description)
        })
        .collect()
}
