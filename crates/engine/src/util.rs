//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation logic so create and update enforce the same invariants.

use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, MemberId, MoneyCents, ResultEngine, Share};

/// Trims and NFC-normalizes a required display text.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(normalized)
}

/// Lowercases and trims an email address.
pub(crate) fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = value.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(EngineError::InvalidInput(format!("invalid email: {value}")));
    }
    Ok(email)
}

/// Checks the amount and both share lists of an expense.
///
/// - 0 < amount <= [`MoneyCents::MAX_AMOUNT`]
/// - payer and split lists are non-empty, with non-negative amounts
/// - each list sums to the amount within [`MoneyCents::TOLERANCE`]
pub(crate) fn validate_expense_shares(
    amount: MoneyCents,
    payers: &[Share],
    splits: &[Share],
) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(
            "expense amount must be > 0".to_string(),
        ));
    }
    if amount > MoneyCents::MAX_AMOUNT {
        return Err(EngineError::InvalidAmount("amount too large".to_string()));
    }
    validate_share_list("payer", amount, payers)?;
    validate_share_list("split", amount, splits)?;
    Ok(())
}

fn validate_share_list(label: &str, amount: MoneyCents, shares: &[Share]) -> ResultEngine<()> {
    if shares.is_empty() {
        return Err(EngineError::InvalidShares(format!(
            "at least one {label} share is required"
        )));
    }
    if let Some(share) = shares.iter().find(|s| s.amount.is_negative()) {
        return Err(EngineError::InvalidShares(format!(
            "{label} share of member {} must be >= 0",
            share.member_id
        )));
    }
    let total = shares
        .iter()
        .try_fold(MoneyCents::ZERO, |acc, s| acc.checked_add(s.amount))
        .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
    if !total.approx_eq(amount) {
        return Err(EngineError::InvalidShares(format!(
            "{label} shares sum to {total}, expected {amount}"
        )));
    }
    Ok(())
}

/// Distinct member ids referenced by the given shares, ascending.
pub(crate) fn share_members(payers: &[Share], splits: &[Share]) -> BTreeSet<MemberId> {
    payers
        .iter()
        .chain(splits)
        .map(|s| s.member_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shares(values: &[(MemberId, i64)]) -> Vec<Share> {
        values.iter().map(|&(m, a)| Share::new(m, a)).collect()
    }

    #[test]
    fn accepts_balanced_expense() {
        let amount = MoneyCents::new(100_00);
        assert!(
            validate_expense_shares(amount, &shares(&[(1, 100_00)]), &shares(&[(1, 50_00), (2, 50_00)]))
                .is_ok()
        );
    }

    #[test]
    fn tolerates_one_cent_drift() {
        let amount = MoneyCents::new(100_00);
        assert!(
            validate_expense_shares(
                amount,
                &shares(&[(1, 100_00)]),
                &shares(&[(1, 33_33), (2, 33_33), (3, 33_33)])
            )
            .is_ok()
        );
    }

    #[test]
    fn rejects_split_mismatch() {
        let amount = MoneyCents::new(100_00);
        let err = validate_expense_shares(amount, &shares(&[(1, 100_00)]), &shares(&[(1, 80_00)]))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidShares("split shares sum to 80.00, expected 100.00".to_string())
        );
    }

    #[test]
    fn rejects_payer_mismatch() {
        let amount = MoneyCents::new(100_00);
        assert!(
            validate_expense_shares(amount, &shares(&[(1, 90_00)]), &shares(&[(1, 100_00)]))
                .is_err()
        );
    }

    #[test]
    fn rejects_empty_or_negative_inputs() {
        let ok = shares(&[(1, 10_00)]);
        assert!(validate_expense_shares(MoneyCents::ZERO, &ok, &ok).is_err());
        assert!(validate_expense_shares(MoneyCents::new(10_00), &[], &ok).is_err());
        assert!(validate_expense_shares(MoneyCents::new(10_00), &ok, &[]).is_err());
        assert!(
            validate_expense_shares(
                MoneyCents::new(10_00),
                &ok,
                &shares(&[(1, 15_00), (2, -5_00)])
            )
            .is_err()
        );
    }

    #[test]
    fn oversized_amounts_are_rejected_without_overflow() {
        let max = MoneyCents::new(i64::MAX);
        let err = validate_expense_shares(max, &shares(&[(1, i64::MAX)]), &shares(&[(1, i64::MAX)]))
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidAmount("amount too large".to_string()));

        let amount = MoneyCents::new(100_00);
        let err = validate_expense_shares(
            amount,
            &shares(&[(1, i64::MAX), (2, 1)]),
            &shares(&[(1, 100_00)]),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::InvalidAmount("amount too large".to_string()));

        assert!(
            validate_expense_shares(
                MoneyCents::MAX_AMOUNT,
                &shares(&[(1, MoneyCents::MAX_AMOUNT.cents())]),
                &shares(&[(1, MoneyCents::MAX_AMOUNT.cents())])
            )
            .is_ok()
        );
    }

    #[test]
    fn normalizes_text_and_email() {
        assert_eq!(normalize_required_text("  Trip ", "group name").unwrap(), "Trip");
        assert!(normalize_required_text("   ", "group name").is_err());
        assert_eq!(normalize_email(" Ann@Example.COM ").unwrap(), "ann@example.com");
        assert!(normalize_email("nope").is_err());
    }
}
