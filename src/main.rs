mod analytics;
mod catalog;
mod checkout;
mod config;
mod domain;
mod identity;
mod session;
mod storage;

use analytics::Analytics;
use catalog::MemoryCatalog;
use checkout::CheckoutTransactor;
use config::Config;
use domain::{Item, Money, NewUser, OrderStatus, Role, UserId};
use identity::{IdentityStore, MemoryIdentity};
use rust_decimal::Decimal;
use serde::Serialize;
use session::Session;
use std::env;
use std::sync::Arc;
use storage::{OrderStore, SqliteOrderStore, SqliteStoreConfig};
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

fn parse_config_path() -> String {
    for arg in env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    DEFAULT_CONFIG_PATH.to_string()
}

/// Returns the value of a `--flag=value` argument, if present.
fn parse_arg_value(prefix: &str) -> Option<String> {
    env::args()
        .skip(1)
        .find_map(|arg| arg.strip_prefix(prefix).map(|v| v.to_string()))
}

fn init_tracing(log_level: Option<&str>) {
    let level = match log_level {
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("warn") | Some("warning") => Level::WARN,
        Some("error") => Level::ERROR,
        Some("trace") => Level::TRACE,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config_path = parse_config_path();

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return;
        }
    };

    init_tracing(config.app.log_level.as_deref());
    info!(config = %config_path, app = %config.app.name, "Configuration loaded");

    let mut store_config = SqliteStoreConfig::default();
    if let Some(ref storage) = config.storage {
        if let Some(ref path) = storage.path {
            store_config.path = path.clone();
        }
        store_config.max_connections = storage.max_connections;
    }

    let store = match SqliteOrderStore::new(store_config).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "Failed to open order storage");
            return;
        }
    };

    let catalog = load_catalog(&config);

    if env::args().any(|arg| arg == "--demo") {
        run_demo(Arc::clone(&store), Arc::clone(&catalog)).await;
        let _ = store.close().await;
        return;
    }

    if let Some(buyer) = parse_id_arg("--report-buyer=") {
        report_buyer(&store, &catalog, buyer).await;
        let _ = store.close().await;
        return;
    }

    if let Some(merchant) = parse_id_arg("--report-merchant=") {
        report_merchant(&store, &catalog, merchant).await;
        let _ = store.close().await;
        return;
    }

    match store.count_orders().await {
        Ok(count) => info!(orders = count, listings = catalog.len(), "Marketplace core ready"),
        Err(e) => error!(error = %e, "Failed to count orders"),
    }

    let _ = store.close().await;
}

fn parse_id_arg(prefix: &str) -> Option<UserId> {
    let value = parse_arg_value(prefix)?;
    match value.parse::<UserId>() {
        Ok(id) => Some(id),
        Err(_) => {
            eprintln!("Invalid id in {}{}", prefix, value);
            None
        }
    }
}

fn load_catalog(config: &Config) -> Arc<MemoryCatalog> {
    let seed_path = config
        .catalog
        .as_ref()
        .and_then(|c| c.seed_path.as_deref());

    match seed_path {
        Some(path) => match MemoryCatalog::load_from_yaml(path) {
            Ok(catalog) => Arc::new(catalog),
            Err(e) => {
                warn!(error = %e, "Falling back to an empty catalog");
                Arc::new(MemoryCatalog::new())
            }
        },
        None => Arc::new(MemoryCatalog::new()),
    }
}

fn json_output() -> bool {
    env::args().any(|arg| arg == "--json")
}

#[derive(Debug, Serialize)]
struct BuyerReport {
    user_id: UserId,
    total_spent: Money,
    total_orders: i64,
}

/// Prints what a buyer has spent across all counted orders.
async fn report_buyer(store: &Arc<SqliteOrderStore>, catalog: &Arc<MemoryCatalog>, buyer: UserId) {
    let analytics = Analytics::new(Arc::clone(store), Arc::clone(catalog));

    let total_spent = match analytics.money_spent_by_buyer_total(buyer).await {
        Ok(total) => total,
        Err(e) => {
            error!(error = %e, "Failed to compute buyer spend");
            return;
        }
    };
    let total_orders = match analytics.total_orders_for_buyer(buyer).await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Failed to count buyer orders");
            return;
        }
    };

    let report = BuyerReport {
        user_id: buyer,
        total_spent,
        total_orders,
    };

    if json_output() {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => error!(error = %e, "Failed to serialize report"),
        }
    } else {
        println!("Buyer {}", report.user_id);
        println!("  total spent:  {}", report.total_spent);
        println!("  total orders: {}", report.total_orders);
    }
}

#[derive(Debug, Serialize)]
struct MerchantReport {
    merchant_id: UserId,
    top_items: Vec<analytics::ItemSales>,
    top_buyers: Vec<analytics::BuyerSpend>,
}

/// Prints a merchant's best-selling items and highest-spending buyers.
async fn report_merchant(
    store: &Arc<SqliteOrderStore>,
    catalog: &Arc<MemoryCatalog>,
    merchant: UserId,
) {
    let analytics = Analytics::new(Arc::clone(store), Arc::clone(catalog));

    let top_items = match analytics.top_selling_items_for_merchant(merchant, 5).await {
        Ok(items) => items,
        Err(e) => {
            error!(error = %e, "Failed to compute top items");
            return;
        }
    };
    let top_buyers = match analytics.top_spending_buyers_for_merchant(merchant, 5).await {
        Ok(buyers) => buyers,
        Err(e) => {
            error!(error = %e, "Failed to compute top buyers");
            return;
        }
    };

    let report = MerchantReport {
        merchant_id: merchant,
        top_items,
        top_buyers,
    };

    if json_output() {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => error!(error = %e, "Failed to serialize report"),
        }
    } else {
        println!("Merchant {}", report.merchant_id);
        println!("  top items:");
        for item in &report.top_items {
            println!(
                "    #{} {} — {} units, {}",
                item.item_id, item.name, item.units_sold, item.revenue
            );
        }
        println!("  top buyers:");
        for buyer in &report.top_buyers {
            println!("    user {} — {}", buyer.user_id, buyer.spent);
        }
    }
}

/// Walks one buyer through the whole flow: register, fill a cart, check
/// out, ship, report. Useful for poking at a fresh database.
async fn run_demo(store: Arc<SqliteOrderStore>, catalog: Arc<MemoryCatalog>) {
    if catalog.is_empty() {
        catalog.list(Item {
            id: 1,
            merchant_id: 100,
            name: "Brass Lamp".to_string(),
            image_url: "https://example.com/lamp.jpg".to_string(),
            price: Money::new(Decimal::new(2500, 2)),
            stock: 10,
        });
        catalog.list(Item {
            id: 2,
            merchant_id: 100,
            name: "Wool Rug".to_string(),
            image_url: "https://example.com/rug.jpg".to_string(),
            price: Money::new(Decimal::new(8000, 2)),
            stock: 3,
        });
        info!("Seeded demo catalog");
    }

    let identity = MemoryIdentity::new();
    let buyer = match identity.register(NewUser {
        name: "Demo Buyer".to_string(),
        email: "buyer@example.com".to_string(),
        street_address: "123 Main St".to_string(),
        city: "Denver".to_string(),
        state: "CO".to_string(),
        zip_code: "80202".to_string(),
        password: "hunter2".to_string(),
        role: Role::Buyer,
    }) {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "Demo registration failed");
            return;
        }
    };

    let mut session = Session::new();
    session.cart_mut().add(1, 2);
    session.cart_mut().add(2, 1);
    info!(
        items = session.cart().total_quantity(),
        total = %session.cart().grand_total(catalog.as_ref()),
        "Cart filled"
    );

    let transactor = CheckoutTransactor::new(Arc::clone(&store), Arc::clone(&catalog));

    // Anonymous checkout is refused; log in and retry.
    if let Err(e) = transactor.checkout_session(&mut session).await {
        info!(rejected = %e, "Checkout before login");
    }
    session.log_in(buyer.id);

    let order = match transactor.checkout_session(&mut session).await {
        Ok(order) => order,
        Err(e) => {
            error!(error = %e, "Demo checkout failed");
            return;
        }
    };

    if let Err(e) = store.update_status(order.id, OrderStatus::Shipped).await {
        error!(error = %e, "Failed to ship demo order");
        return;
    }

    let analytics = Analytics::new(Arc::clone(&store), Arc::clone(&catalog));
    match analytics.money_spent_by_buyer_total(buyer.id).await {
        Ok(total) => info!(order_id = order.id, spent = %total, "Demo complete"),
        Err(e) => error!(error = %e, "Demo report failed"),
    }
}
