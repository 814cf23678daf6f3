//! Cart and checkout commands.

use std::io::Write;

use cartwheel_client::{CartView, Store};
use cartwheel_core::ProductId;

use super::{CommandError, signed_in_user};

/// Load the cart from the backend and print it with prices.
pub async fn show(store: &Store, out: &mut impl Write) -> Result<(), CommandError> {
    let user_id = signed_in_user(store).await?;
    store.fetch_cart(&user_id).await?;
    print_cart(out, &store.cart_view().await)
}

pub async fn add(
    store: &Store,
    out: &mut impl Write,
    product: &ProductId,
    quantity: u32,
) -> Result<(), CommandError> {
    let user_id = signed_in_user(store).await?;
    store.add_item(&user_id, product, quantity).await?;
    print_cart(out, &store.cart_view().await)
}

pub async fn increase(
    store: &Store,
    out: &mut impl Write,
    product: &ProductId,
) -> Result<(), CommandError> {
    let user_id = signed_in_user(store).await?;
    store.increase_qty(&user_id, product).await?;
    print_cart(out, &store.cart_view().await)
}

pub async fn decrease(
    store: &Store,
    out: &mut impl Write,
    product: &ProductId,
) -> Result<(), CommandError> {
    let user_id = signed_in_user(store).await?;
    store.decrease_qty(&user_id, product).await?;
    print_cart(out, &store.cart_view().await)
}

pub async fn remove(
    store: &Store,
    out: &mut impl Write,
    product: &ProductId,
) -> Result<(), CommandError> {
    let user_id = signed_in_user(store).await?;
    store.remove_item(&user_id, product).await?;
    print_cart(out, &store.cart_view().await)
}

pub async fn empty(store: &Store, out: &mut impl Write) -> Result<(), CommandError> {
    let user_id = signed_in_user(store).await?;
    store.empty_cart(&user_id).await?;
    writeln!(out, "Your cart is empty")?;
    Ok(())
}

/// Place the order, then empty the cart.
pub async fn checkout(store: &Store, out: &mut impl Write) -> Result<(), CommandError> {
    let user_id = signed_in_user(store).await?;
    let cart = store.fetch_cart(&user_id).await?;
    if cart.is_empty() {
        writeln!(out, "Your cart is empty")?;
        return Ok(());
    }

    let view = store.cart_view().await;
    store.checkout(&user_id).await?;

    writeln!(out, "Order placed. Total Amount: {}", view.total.display())?;
    writeln!(out, "Thank you for your order!")?;
    Ok(())
}

fn print_cart(out: &mut impl Write, view: &CartView) -> Result<(), CommandError> {
    if view.lines.is_empty() {
        writeln!(out, "Your cart is empty")?;
        return Ok(());
    }

    for line in &view.lines {
        let name = if line.available {
            line.name.as_str()
        } else {
            "(product not available)"
        };
        writeln!(
            out,
            "{:<26} {:<32} {:>4} x {:>10} = {:>10}",
            line.product.as_str(),
            name,
            line.quantity,
            line.unit_price.display(),
            line.line_total.display(),
        )?;
    }
    writeln!(out, "Total Amount: {}", view.total.display())?;
    Ok(())
}
