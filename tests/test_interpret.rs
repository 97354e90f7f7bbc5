
use straddle_watch::engine::{InterpretError, interpret};
use straddle_watch::model::{ChainSnapshot, ExpiryRank, IndexId, SeriesLabel};

use chain_common::*;

#[test]
fn test_atm_straddle_for_nearest_expiry() {
    let straddles = interpret(IndexId::Nifty, &nifty_snapshot(), 2).unwrap();
    assert_eq!(straddles.len(), 1, "only one expiry listed");

    let atm = &straddles[0];
    assert_eq!(atm.label, SeriesLabel::new(IndexId::Nifty, ExpiryRank::Current));
    assert_eq!(atm.expiry, date(2025, 3, 6));
    assert_eq!(atm.spot, 22500.0);
    assert_eq!(atm.strike, 22500.0);
    assert_eq!(atm.call_ltp, 120.0);
    assert_eq!(atm.put_ltp, 110.0);
    assert_eq!(atm.straddle, 230.0);
    assert_eq!(atm.call_volume, 1000);
    assert_eq!(atm.put_volume, 800);
    assert_eq!(atm.total_volume, 1800);
    assert_eq!(atm.straddle_iv, 29.0);
}

#[test]
fn test_two_expiries_ranked_by_date() {
    let straddles = interpret(IndexId::BankNifty, &bank_nifty_snapshot(), 2).unwrap();
    assert_eq!(straddles.len(), 2);

    assert_eq!(straddles[0].label.rank, ExpiryRank::Current);
    assert_eq!(straddles[0].expiry, date(2025, 3, 6));
    // 48180 is 20 away from 48200 and 80 away from 48100
    assert_eq!(straddles[0].strike, 48200.0);
    assert_eq!(straddles[0].straddle, 710.0);
    assert_eq!(straddles[0].straddle_iv, 31.9);

    assert_eq!(straddles[1].label.rank, ExpiryRank::Next);
    assert_eq!(straddles[1].expiry, date(2025, 3, 27));
    assert_eq!(straddles[1].total_volume, 90);
}

#[test]
fn test_expiry_count_limits_output() {
    let straddles = interpret(IndexId::BankNifty, &bank_nifty_snapshot(), 1).unwrap();
    assert_eq!(straddles.len(), 1);
    assert_eq!(straddles[0].label.rank, ExpiryRank::Current);
}

#[test]
fn test_missing_leg_counts_as_zero() {
    let mut snap = ChainSnapshot::new(Some(100.0));
    snap.insert(date(2025, 3, 6), strike(100.0, leg(5.0, 40, 12.3), None));

    let atm = &interpret(IndexId::Nifty, &snap, 1).unwrap()[0];
    assert_eq!(atm.put_ltp, 0.0);
    assert_eq!(atm.put_volume, 0);
    assert_eq!(atm.straddle, 5.0);
    assert_eq!(atm.total_volume, 40);
    assert_eq!(atm.straddle_iv, 12.3);
}

#[test]
fn test_missing_spot_is_an_error() {
    let mut snap = nifty_snapshot();
    snap.spot_price = None;
    assert_eq!(
        interpret(IndexId::Nifty, &snap, 2).unwrap_err(),
        InterpretError::MissingSpotPrice { index: IndexId::Nifty }
    );

    snap.spot_price = Some(0.0);
    assert!(interpret(IndexId::Nifty, &snap, 2).is_err());
}

#[test]
fn test_expiry_without_strikes_is_an_error() {
    let mut snap = ChainSnapshot::new(Some(22500.0));
    snap.expiries.push(date(2025, 3, 6));
    assert_eq!(
        interpret(IndexId::Nifty, &snap, 1).unwrap_err(),
        InterpretError::NoStrikesForExpiry {
            index: IndexId::Nifty,
            expiry: date(2025, 3, 6)
        }
    );
}

#[test]
fn test_no_expiries_yields_nothing() {
    let snap = ChainSnapshot::new(Some(22500.0));
    assert!(interpret(IndexId::Nifty, &snap, 2).unwrap().is_empty());
}
