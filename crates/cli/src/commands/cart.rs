//! Cart commands against the file-backed cart.
//!
//! Each command opens the store, hands it to an optimistic controller,
//! dispatches one action, and waits for the worker to drain before printing
//! the committed cart.

use std::error::Error;
use std::fmt::Write as _;
use std::sync::Arc;

use kago_cart::{CartPersistence, CartStore, FileStorage, OptimisticCart};
use kago_core::{CartAction, CartState, DerivedTotals};
use tracing::info;

use crate::config::CliConfig;

/// Open the store described by `config`.
///
/// # Errors
///
/// Returns an error if the storage key is invalid.
pub fn open_store(config: &CliConfig) -> Result<CartStore, Box<dyn Error>> {
    let storage = FileStorage::new(&config.storage_dir);
    let persistence = CartPersistence::new(Arc::new(storage), config.storage_key.as_str())?;
    Ok(CartStore::open(persistence, config.pricing))
}

/// Apply one action and return the store once it has committed.
///
/// # Errors
///
/// Returns an error if the action is refused, or if the commit worker fails.
pub async fn run_action(
    config: &CliConfig,
    action: CartAction,
) -> Result<CartStore, Box<dyn Error>> {
    let store = open_store(config)?;
    let (mut cart, worker) = OptimisticCart::spawn(store);

    let kind = action.kind();
    let handle = cart.dispatch(action)?;
    let receipt = handle.committed().await?;
    info!(kind, seq = receipt.seq, revision = receipt.revision, "Cart updated");

    drop(cart);
    Ok(worker.await?)
}

/// Apply one action and print the resulting cart.
///
/// # Errors
///
/// See [`run_action`].
pub async fn apply(config: &CliConfig, action: CartAction) -> Result<(), Box<dyn Error>> {
    let store = run_action(config, action).await?;
    print_cart(store.state(), &store.totals());
    Ok(())
}

/// Print the stored cart without changing it.
///
/// # Errors
///
/// See [`open_store`].
pub fn show(config: &CliConfig) -> Result<(), Box<dyn Error>> {
    let store = open_store(config)?;
    print_cart(store.state(), &store.totals());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(state: &CartState, totals: &DerivedTotals) {
    print!("{}", render_cart(state, totals));
}

/// Render the cart as plain text: one row per line, then the totals.
#[must_use]
pub fn render_cart(state: &CartState, totals: &DerivedTotals) -> String {
    let mut out = String::new();

    if state.items.is_empty() {
        out.push_str("Cart is empty\n");
    }
    for item in &state.items {
        let _ = writeln!(
            out,
            "{:<24} {:>4} x {:>10} = {:>10}",
            item.key().to_string(),
            item.quantity(),
            item.unit_price().to_string(),
            item.line_total().to_string(),
        );
    }

    let _ = writeln!(out, "Items:    {}", totals.total_items);
    let _ = writeln!(out, "Subtotal: {}", totals.subtotal);
    let _ = writeln!(out, "Tax:      {}", totals.tax);
    let _ = writeln!(out, "Shipping: {}", totals.shipping);
    let _ = writeln!(out, "Total:    {}", totals.total);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kago_core::{ColorId, LineKey, Price, PricingPolicy, Product, ProductId, SizeId};

    use super::*;

    fn config(dir: &std::path::Path) -> CliConfig {
        CliConfig {
            storage_dir: dir.to_path_buf(),
            storage_key: "cart-storage".to_string(),
            pricing: PricingPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    fn add(id: &str, yen: u64, quantity: i64) -> CartAction {
        CartAction::Add {
            product: Product::new(ProductId::new(id), Price::from_yen(yen)),
            size_id: SizeId::new("M"),
            color_id: ColorId::new("red"),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_actions_persist_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        run_action(&config, add("P1", 1000, 1)).await.unwrap();
        let store = run_action(&config, add("P1", 1000, 1)).await.unwrap();
        assert_eq!(store.total_items(), 2);

        let reopened = open_store(&config).unwrap();
        assert_eq!(reopened.subtotal(), Price::from_yen(2000));
    }

    #[tokio::test]
    async fn test_refused_action_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let key = LineKey::new(ProductId::new("P1"), SizeId::new("M"), ColorId::new("red"));

        let result = run_action(&config, CartAction::Update { key, quantity: 2 }).await;
        assert!(result.is_err());
        assert!(open_store(&config).unwrap().items().is_empty());
    }

    #[test]
    fn test_render_cart() {
        let mut state = CartState::default();
        state
            .items
            .add(
                &Product::new(ProductId::new("P1"), Price::from_yen(1000)),
                SizeId::new("M"),
                ColorId::new("red"),
                2,
            )
            .unwrap();
        let totals = PricingPolicy::default().totals(&state.items);

        let rendered = render_cart(&state, &totals);
        assert!(rendered.contains("P1-M-red"));
        assert!(rendered.contains("¥2,000"));
        assert!(rendered.contains("Tax:      ¥200"));
        assert!(rendered.contains("Total:    ¥2,700"));
    }

    #[test]
    fn test_render_empty_cart() {
        let state = CartState::default();
        let rendered = render_cart(&state, &DerivedTotals::default());
        assert!(rendered.starts_with("Cart is empty"));
        assert!(rendered.contains("Shipping: ¥0"));
    }
}
