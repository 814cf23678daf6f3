//! Shop management commands.
//!
//! # Usage
//!
//! ```bash
//! cw admin orders
//! cw admin order-status 65f1c0ffee delivered
//! cw admin payment-status 65f1c0ffee paid
//! cw admin create-product -n "Pineapple" -p 4.50 -c fruit -i https://img/1.png
//! cw admin upload-banners summer.jpg winter.jpg
//! ```
//!
//! These commands are refused locally unless the persisted session has the
//! admin role. The backend still enforces its own checks.

use std::io::Write;
use std::path::{Path, PathBuf};

use cartwheel_client::{Store, Upload};
use cartwheel_core::{NewProduct, Order, OrderId, OrderStatus, PaymentStatus, ProductId, ReviewId};

use super::CommandError;
use super::catalog::print_reviews;

/// Refuse to continue unless the session belongs to an admin.
pub async fn require_admin(store: &Store) -> Result<(), CommandError> {
    let session = store.session().await;
    if !session.is_authenticated {
        return Err(CommandError::NotSignedIn);
    }
    if !session.is_admin() {
        tracing::warn!(role = ?session.user_role, "Admin command refused");
        return Err(CommandError::NotAdmin);
    }
    Ok(())
}

// =============================================================================
// Orders
// =============================================================================

pub async fn orders(store: &Store, out: &mut impl Write) -> Result<(), CommandError> {
    let orders = store.all_orders().await;
    if orders.is_empty() {
        writeln!(out, "No orders")?;
        return Ok(());
    }

    for order in &orders {
        writeln!(out, "{}", format_order(order))?;
    }
    Ok(())
}

pub async fn order_status(
    store: &Store,
    out: &mut impl Write,
    order: &OrderId,
    status: OrderStatus,
) -> Result<(), CommandError> {
    let order = store.update_order_status(order, status).await?;
    writeln!(out, "{}", format_order(&order))?;
    Ok(())
}

pub async fn payment_status(
    store: &Store,
    out: &mut impl Write,
    order: &OrderId,
    payment: PaymentStatus,
) -> Result<(), CommandError> {
    let order = store.update_payment_status(order, payment).await?;
    writeln!(out, "{}", format_order(&order))?;
    Ok(())
}

fn format_order(order: &Order) -> String {
    let user = order.user.as_ref().map_or("-", |id| id.as_str());
    let total = order
        .total_amount
        .map_or_else(|| "-".to_owned(), |total| total.display());
    let items: u32 = order.items.iter().map(|item| item.quantity).sum();
    format!(
        "{:<26} user={user:<26} items={items:<3} total={total:<10} status={} payment={}",
        order.id.as_str(),
        order.status,
        order.payment,
    )
}

// =============================================================================
// Products & Reviews
// =============================================================================

pub async fn create_product(
    store: &Store,
    out: &mut impl Write,
    product: &NewProduct,
) -> Result<(), CommandError> {
    let created = store.create_product(product).await?;
    writeln!(out, "Created product {} ({})", created.id, created.name)?;
    Ok(())
}

pub async fn delete_product(
    store: &Store,
    out: &mut impl Write,
    id: &ProductId,
) -> Result<(), CommandError> {
    store.delete_product(id).await?;
    writeln!(out, "Deleted product {id}")?;
    Ok(())
}

pub async fn reviews(store: &Store, out: &mut impl Write) -> Result<(), CommandError> {
    print_reviews(out, &store.all_reviews().await, true)
}

pub async fn delete_review(
    store: &Store,
    out: &mut impl Write,
    id: &ReviewId,
) -> Result<(), CommandError> {
    store.delete_review(id).await?;
    writeln!(out, "Deleted review {id}")?;
    Ok(())
}

// =============================================================================
// Branding
// =============================================================================

pub async fn upload_logo(
    store: &Store,
    out: &mut impl Write,
    file: &Path,
) -> Result<(), CommandError> {
    store.upload_logo(read_upload(file).await?).await?;
    writeln!(out, "Logo uploaded successfully")?;
    Ok(())
}

/// Download the logo to `output`.
pub async fn logo(store: &Store, out: &mut impl Write, output: &Path) -> Result<(), CommandError> {
    let logo = store.logo().await?;
    tokio::fs::write(output, &logo.bytes)
        .await
        .map_err(|source| file_error(output, source))?;

    writeln!(
        out,
        "Wrote {} bytes ({}) to {}",
        logo.bytes.len(),
        logo.content_type.as_deref().unwrap_or("unknown type"),
        output.display()
    )?;
    Ok(())
}

pub async fn upload_banners(
    store: &Store,
    out: &mut impl Write,
    files: &[PathBuf],
) -> Result<(), CommandError> {
    let mut uploads = Vec::with_capacity(files.len());
    for file in files {
        uploads.push(read_upload(file).await?);
    }

    store.upload_banner_images(uploads).await?;
    writeln!(out, "Banner images uploaded successfully")?;
    Ok(())
}

pub async fn banners(store: &Store, out: &mut impl Write) -> Result<(), CommandError> {
    let banners = store.banner_images().await?;
    let pretty = serde_json::to_string_pretty(&banners)
        .map_err(|e| CommandError::Output(std::io::Error::other(e)))?;
    writeln!(out, "{pretty}")?;
    Ok(())
}

async fn read_upload(path: &Path) -> Result<Upload, CommandError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| file_error(path, source))?;
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    Ok(Upload::new(file_name, bytes))
}

fn file_error(path: &Path, source: std::io::Error) -> CommandError {
    CommandError::File {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartwheel_client::{ClientConfig, MemoryTokenStore, PersistedSession};
    use cartwheel_core::UserRole;
    use secrecy::SecretString;

    use super::*;

    fn store_with_role(role: Option<UserRole>) -> Store {
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        let tokens = MemoryTokenStore::with_session(&PersistedSession {
            token: SecretString::from("jwt".to_owned()),
            user_role: role,
            user_id: None,
        });
        Store::new(&config, tokens).unwrap()
    }

    #[tokio::test]
    async fn test_require_admin() {
        let admin = store_with_role(Some(UserRole::Admin));
        admin.initialize().await;
        assert!(require_admin(&admin).await.is_ok());

        let user = store_with_role(Some(UserRole::User));
        user.initialize().await;
        assert!(matches!(
            require_admin(&user).await,
            Err(CommandError::NotAdmin)
        ));
    }

    #[tokio::test]
    async fn test_require_admin_signed_out() {
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        let store = Store::new(&config, MemoryTokenStore::new()).unwrap();
        assert!(matches!(
            require_admin(&store).await,
            Err(CommandError::NotSignedIn)
        ));
    }

    #[test]
    fn test_format_order() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "_id": "o1",
            "user": "u1",
            "items": [{"product": "p1", "quantity": 2}, {"product": "p2", "quantity": 1}],
            "status": "shipped",
            "payment": "paid",
            "totalAmount": 30
        }))
        .unwrap();

        let line = format_order(&order);
        assert!(line.starts_with("o1"));
        assert!(line.contains("items=3"));
        assert!(line.contains("total=$30.00"));
        assert!(line.contains("status=shipped payment=paid"));
    }

    #[tokio::test]
    async fn test_read_upload_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let upload = read_upload(&path).await.unwrap();
        assert_eq!(upload.file_name, "logo.png");
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(upload.bytes.len(), 4);
    }

    #[tokio::test]
    async fn test_read_upload_missing_file() {
        let err = read_upload(Path::new("/nonexistent/banner.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::File { .. }));
    }
}
