//! Matchbook Performance Lab
//!
//! Runs the latency and throughput suite, then a short demo of the
//! submit-then-match cycle on an in-memory engine.

use orderbook::{BookError, MatchingEngine, MemoryJournal, Side};
use rust_decimal::Decimal;
use std::time::Duration;


fn main() -> Result<(), BookError> {
    println!("=== Matchbook Performance Lab ===");

    latency_test::run_latency_tests()?;
    latency_test::run_throughput_test(Duration::from_secs(10))?;

    println!("\n=== Basic Demo ===");
    run_basic_demo()
}

/// Two resting sells, then a buy that sweeps the cheaper one and part of the other.
fn run_basic_demo() -> Result<(), BookError> {
    let mut engine = MatchingEngine::new(MemoryJournal::new());

    println!("Submitting sell: 10 @ 100");
    engine.submit(Side::Sell, Decimal::new(100, 0), 10)?;
    println!("Submitting sell: 5 @ 99");
    engine.submit(Side::Sell, Decimal::new(99, 0), 5)?;

    println!("Best bid: {:?}", engine.book().best_bid());
    println!("Best ask: {:?}", engine.book().best_ask());

    println!("Submitting buy: 12 @ 100");
    engine.submit(Side::Buy, Decimal::new(100, 0), 12)?;

    let trades = engine.run_matching_pass()?;
    println!("Trades executed: {}", trades.len());
    for trade in &trades {
        // always the sell's price
        println!("  Trade: {} @ {}", trade.qty, trade.price);
    }

    println!("Resting orders:");
    for order in engine.open_orders() {
        println!("  #{} {} {} @ {}", order.id, order.side, order.remaining_qty, order.price);
    }

    println!("Completed by price:");
    for row in engine.completed_by_price() {
        println!("  {} @ {}", row.qty, row.price);
    }

    Ok(())
}
