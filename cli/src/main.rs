use clap::{Parser, Subcommand};
use orderbook::{Order, OrderId, PriceTotal, Side, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "matchbook-cli")]
#[command(about = "Matchbook CLI - Command line client for the matching service")]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    server: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a limit order (buy/buyer or sell/seller)
    Submit {
        #[arg(long, value_parser = parse_side)]
        side: Side,
        #[arg(short = 'p', long)]
        price: Decimal,
        #[arg(short = 'q', long, allow_negative_numbers = true)]
        qty: i64,
    },
    /// List resting orders
    Pending,
    /// Completed volume per execution price
    Completed,
    /// Ask the service to run a matching pass
    Match,
    Health,
}

#[derive(Serialize)]
struct SubmitOrderRequest {
    side: Side,
    price: Decimal,
    qty: i64,
}

#[derive(Deserialize)]
struct SubmitOrderResponse {
    order_id: OrderId,
    message: String,
    trades: Vec<Trade>,
}

#[derive(Deserialize)]
struct MatchResponse {
    trades: Vec<Trade>,
}

fn parse_side(s: &str) -> Result<Side, String> {
    s.parse().map_err(|e: orderbook::BookError| e.to_string())
}

fn print_trades(trades: &[Trade]) {
    if trades.is_empty() {
        println!("No trades executed");
        return;
    }
    println!("Trades executed: {}", trades.len());
    for trade in trades {
        println!("  {} @ {}", trade.qty, trade.price);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Submit { side, price, qty } => {
            let request = SubmitOrderRequest { side, price, qty };

            let response = client
                .post(format!("{}/api/order", cli.server))
                .json(&request)
                .send()
                .await?;

            if response.status().is_success() {
                let result: SubmitOrderResponse = response.json().await?;
                println!("Order ID: {}", result.order_id);
                println!("{}", result.message);
                print_trades(&result.trades);
            } else {
                println!("Error: {}", response.status());
                println!("{}", response.text().await?);
            }
        }

        Commands::Pending => {
            let response = client
                .get(format!("{}/api/orders/pending", cli.server))
                .send()
                .await?;

            if response.status().is_success() {
                let orders: Vec<Order> = response.json().await?;
                if orders.is_empty() {
                    println!("No resting orders");
                }
                println!("{:<8} {:<5} {:>12} {:>10}", "ID", "SIDE", "PRICE", "QTY");
                for order in orders {
                    println!(
                        "{:<8} {:<5} {:>12} {:>10}",
                        order.id.to_string(),
                        order.side.to_string(),
                        order.price.to_string(),
                        order.remaining_qty
                    );
                }
            } else {
                println!("Error: {}", response.status());
            }
        }

        Commands::Completed => {
            let response = client
                .get(format!("{}/api/orders/completed", cli.server))
                .send()
                .await?;

            if response.status().is_success() {
                let rows: Vec<PriceTotal> = response.json().await?;
                if rows.is_empty() {
                    println!("No completed trades");
                }
                for row in rows {
                    println!("{:>12} {:>10}", row.price.to_string(), row.qty);
                }
            } else {
                println!("Error: {}", response.status());
            }
        }

        Commands::Match => {
            let response = client
                .post(format!("{}/api/match", cli.server))
                .send()
                .await?;

            if response.status().is_success() {
                let result: MatchResponse = response.json().await?;
                print_trades(&result.trades);
            } else {
                println!("Error: {}", response.status());
                println!("{}", response.text().await?);
            }
        }

        Commands::Health => {
            let response = client.get(format!("{}/health", cli.server)).send().await?;

            if response.status().is_success() {
                let health: serde_json::Value = response.json().await?;
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                println!("Server is not healthy: {}", response.status());
            }
        }
    }

    Ok(())
}
