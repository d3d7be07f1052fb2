use orderbook::{MatchingEngine, MemoryJournal, Price, Side};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashSet;

// (is_buy, price in thousandths, qty)
fn orders() -> impl Strategy<Value = Vec<(bool, i64, i64)>> {
    prop::collection::vec((any::<bool>(), 9_900i64..10_100, 1i64..50), 1..60)
}

fn submit_all(
    engine: &mut MatchingEngine<MemoryJournal>,
    orders: &[(bool, i64, i64)],
    pass_each: bool,
) -> u128 {
    let mut traded = 0;
    for &(is_buy, milli, qty) in orders {
        let side = if is_buy { Side::Buy } else { Side::Sell };
        engine.submit(side, Decimal::new(milli, 3), qty).unwrap();
        if pass_each {
            traded += engine
                .run_matching_pass()
                .unwrap()
                .iter()
                .map(|t| u128::from(t.qty))
                .sum::<u128>();
        }
    }
    traded
}

fn submitted(orders: &[(bool, i64, i64)], buy: bool) -> u128 {
    orders
        .iter()
        .filter(|(is_buy, _, _)| *is_buy == buy)
        .map(|(_, _, qty)| *qty as u128)
        .sum()
}

proptest! {
    #[test]
    fn quantity_is_conserved(orders in orders(), pass_each in any::<bool>()) {
        let mut engine = MatchingEngine::new(MemoryJournal::new());
        let mut traded = submit_all(&mut engine, &orders, pass_each);
        traded += engine.run_matching_pass().unwrap().iter().map(|t| u128::from(t.qty)).sum::<u128>();

        let book = engine.book();
        prop_assert_eq!(traded, engine.ledger().total_qty());
        prop_assert_eq!(submitted(&orders, true), book.bids.total_qty() + traded);
        prop_assert_eq!(submitted(&orders, false), book.asks.total_qty() + traded);
    }

    #[test]
    fn no_empty_orders_and_book_left_uncrossed(orders in orders()) {
        let mut engine = MatchingEngine::new(MemoryJournal::new());
        submit_all(&mut engine, &orders, false);
        engine.run_matching_pass().unwrap();

        prop_assert!(engine.open_orders().iter().all(|o| o.remaining_qty > 0));
        if let (Some(bid), Some(ask)) = (engine.book().best_bid(), engine.book().best_ask()) {
            prop_assert!(bid.rounded() < ask.rounded());
        }
    }

    #[test]
    fn second_pass_is_empty(orders in orders()) {
        let mut engine = MatchingEngine::new(MemoryJournal::new());
        submit_all(&mut engine, &orders, false);
        engine.run_matching_pass().unwrap();
        let open = engine.open_orders();

        prop_assert!(engine.run_matching_pass().unwrap().is_empty());
        prop_assert_eq!(engine.open_orders(), open);
    }

    #[test]
    fn trades_execute_at_a_sell_price(orders in orders()) {
        let mut engine = MatchingEngine::new(MemoryJournal::new());
        submit_all(&mut engine, &orders, false);
        let sell_prices: HashSet<Price> = engine
            .book()
            .list_open_sells()
            .iter()
            .map(|o| o.price)
            .collect();

        for trade in engine.run_matching_pass().unwrap() {
            prop_assert!(sell_prices.contains(&trade.price));
        }
    }

    #[test]
    fn matched_buys_outrank_resting_buys(orders in orders()) {
        let mut engine = MatchingEngine::new(MemoryJournal::new());
        submit_all(&mut engine, &orders, false);
        let before = engine.book().list_open_buys();
        engine.run_matching_pass().unwrap();

        // in priority order, every touched buy precedes every untouched one
        let mut seen_untouched = false;
        for order in &before {
            let untouched = engine
                .book()
                .get(order.id)
                .map(|o| o.remaining_qty == order.remaining_qty)
                .unwrap_or(false);
            if untouched {
                seen_untouched = true;
            } else {
                prop_assert!(!seen_untouched, "buy {} filled after a better buy was skipped", order.id);
            }
        }
    }
}
