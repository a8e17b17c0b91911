//! Conversion between stored transactions and their editable form
//!
//! Deserializing never fails. An unparseable date falls back to the
//! fallback transaction's date (or today), and an amount that does not fit
//! in minor units falls back the same way.

use chrono::{Datelike, Local, NaiveDate};
use tracing::debug;

use crate::models::{DateFormat, EditableTransaction, Money, Transaction};

/// Convert a transaction into its editable form
pub fn serialize(transaction: &Transaction, format: DateFormat) -> EditableTransaction {
    EditableTransaction {
        id: transaction.id.clone(),
        account: transaction.account,
        payee: transaction.payee,
        category: transaction.category,
        amount: transaction.amount.to_decimal(),
        date: transaction.date.format(format.pattern()).to_string(),
        notes: transaction.notes.clone(),
        cleared: transaction.cleared,
        reconciled: transaction.reconciled,
        is_parent: transaction.is_parent,
        is_child: transaction.is_child,
        parent_id: transaction.parent_id.clone(),
        schedule: transaction.schedule,
        error: transaction.error,
    }
}

/// Convert an editable transaction back, resolving dates against today
pub fn deserialize(
    editable: &EditableTransaction,
    fallback: Option<&Transaction>,
    format: DateFormat,
) -> Transaction {
    deserialize_on(editable, fallback, format, Local::now().date_naive())
}

/// Convert an editable transaction back, resolving dates against `today`
pub fn deserialize_on(
    editable: &EditableTransaction,
    fallback: Option<&Transaction>,
    format: DateFormat,
    today: NaiveDate,
) -> Transaction {
    let date = parse_date(&editable.date, format, today).unwrap_or_else(|| {
        debug!(input = %editable.date, "Unparseable date, keeping previous value");
        fallback.map(|t| t.date).unwrap_or(today)
    });

    let amount = Money::from_decimal(editable.amount).unwrap_or_else(|e| {
        debug!(error = %e, "Amount out of range, keeping previous value");
        fallback.map(|t| t.amount).unwrap_or_default()
    });

    Transaction {
        id: editable.id.clone(),
        account: editable.account,
        payee: editable.payee,
        category: editable.category,
        amount,
        date,
        notes: editable.notes.clone(),
        cleared: editable.cleared,
        reconciled: editable.reconciled,
        is_parent: editable.is_parent,
        is_child: editable.is_child,
        parent_id: editable.parent_id.clone(),
        schedule: editable.schedule,
        error: editable.error,
    }
}

/// Parse a date typed by the user
///
/// Input that looks like the short day/month form (`"3/14"` for
/// `MM/dd/yyyy`) is read in the current year, and is rejected if the day or
/// month is out of range. Anything else must match the full format with a
/// year after 2000.
pub fn parse_date(input: &str, format: DateFormat, today: NaiveDate) -> Option<NaiveDate> {
    let input = input.trim();

    if let Some((first, second)) = day_month_parts(input, format.separator()) {
        let (day, month) = if format.day_first() {
            (first, second)
        } else {
            (second, first)
        };
        return NaiveDate::from_ymd_opt(today.year(), month, day);
    }

    NaiveDate::parse_from_str(input, format.pattern())
        .ok()
        .filter(|date| date.year() > 2000)
}

/// Split `"12/31"` style input into its two numbers
///
/// Returns `None` unless the input is exactly two groups of one or two
/// digits around `separator`.
fn day_month_parts(input: &str, separator: char) -> Option<(u32, u32)> {
    let (first, second) = input.split_once(separator)?;
    let is_short_number =
        |s: &str| (1..=2).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit());

    if !is_short_number(first) || !is_short_number(second) {
        return None;
    }
    Some((first.parse().ok()?, second.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountId;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Transaction {
        Transaction::new(Some(AccountId::new()), ymd(2024, 3, 1), Money::from_cents(-10000))
    }

    #[test]
    fn test_serialize_formats_amount_and_date() {
        let txn = sample();

        let editable = serialize(&txn, DateFormat::MonthDayYear);
        assert_eq!(editable.amount, Decimal::from_str("-100.00").unwrap());
        assert_eq!(editable.date, "03/01/2024");
        assert_eq!(editable.account, txn.account);

        assert_eq!(serialize(&txn, DateFormat::DayMonthYearDotted).date, "01.03.2024");
        assert_eq!(serialize(&txn, DateFormat::Iso).date, "2024-03-01");
    }

    #[test]
    fn test_deserialize_restores_the_transaction() {
        let txn = sample();
        for format in DateFormat::ALL {
            let editable = serialize(&txn, format);
            assert_eq!(deserialize_on(&editable, None, format, ymd(2025, 6, 1)), txn);
        }
    }

    #[test]
    fn test_invalid_date_falls_back_to_previous_date() {
        let txn = sample();
        let mut editable = serialize(&txn, DateFormat::MonthDayYear);
        editable.date = "13/45".into();

        let today = ymd(2025, 6, 1);
        let result = deserialize_on(&editable, Some(&txn), DateFormat::MonthDayYear, today);
        assert_eq!(result.date, ymd(2024, 3, 1));
    }

    #[test]
    fn test_invalid_date_without_fallback_is_today() {
        let mut editable = serialize(&sample(), DateFormat::MonthDayYear);
        editable.date = "not a date".into();

        let today = ymd(2025, 6, 1);
        let result = deserialize_on(&editable, None, DateFormat::MonthDayYear, today);
        assert_eq!(result.date, today);
    }

    #[test]
    fn test_day_month_uses_current_year() {
        let today = ymd(2025, 6, 1);
        assert_eq!(parse_date("3/14", DateFormat::MonthDayYear, today), Some(ymd(2025, 3, 14)));
        assert_eq!(parse_date("14/3", DateFormat::DayMonthYear, today), Some(ymd(2025, 3, 14)));
        assert_eq!(parse_date("03-14", DateFormat::Iso, today), Some(ymd(2025, 3, 14)));
        assert_eq!(parse_date("14.03", DateFormat::DayMonthYearDotted, today), Some(ymd(2025, 3, 14)));
    }

    #[test]
    fn test_day_month_out_of_range_does_not_try_full_format() {
        let today = ymd(2025, 6, 1);
        assert_eq!(parse_date("13/45", DateFormat::MonthDayYear, today), None);
        assert_eq!(parse_date("2/30", DateFormat::MonthDayYear, today), None);
    }

    #[test]
    fn test_full_date_requires_year_after_2000() {
        let today = ymd(2025, 6, 1);
        assert_eq!(
            parse_date("12/31/2024", DateFormat::MonthDayYear, today),
            Some(ymd(2024, 12, 31))
        );
        assert_eq!(parse_date("12/31/1999", DateFormat::MonthDayYear, today), None);
        assert_eq!(parse_date("12/31/201", DateFormat::MonthDayYear, today), None);
    }

    #[test]
    fn test_amount_rounds_to_cents() {
        let txn = sample();
        let mut editable = serialize(&txn, DateFormat::Iso);

        editable.amount = Decimal::from_str("-60.005").unwrap();
        let result = deserialize_on(&editable, Some(&txn), DateFormat::Iso, ymd(2025, 1, 1));
        assert_eq!(result.amount, Money::from_cents(-6001));

        editable.amount = Decimal::from_str("12.344").unwrap();
        let result = deserialize_on(&editable, Some(&txn), DateFormat::Iso, ymd(2025, 1, 1));
        assert_eq!(result.amount, Money::from_cents(1234));
    }
}
