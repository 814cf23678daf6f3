//! Catalog and review commands.

use std::io::Write;

use cartwheel_client::{Store, review_page};
use cartwheel_core::{Product, ProductId, Review};

use super::{CommandError, signed_in_user};

pub async fn list(store: &Store, out: &mut impl Write) -> Result<(), CommandError> {
    print_products(out, &store.all_products().await)
}

pub async fn search(store: &Store, out: &mut impl Write, keyword: &str) -> Result<(), CommandError> {
    print_products(out, &store.search_products(keyword).await)
}

/// Show one product and the first page of its reviews.
pub async fn show(
    store: &Store,
    out: &mut impl Write,
    id: &ProductId,
    all_reviews: bool,
) -> Result<(), CommandError> {
    let product = store.product(id).await?;

    writeln!(out, "{}", product.name)?;
    writeln!(out, "Price: {}", product.price.display())?;
    if !product.category.is_empty() {
        writeln!(out, "Category: {}", product.category)?;
    }
    if let Some(image) = product.main_image() {
        writeln!(out, "Image: {image}")?;
    }
    if !product.description.is_empty() {
        writeln!(out, "\n{}", product.description)?;
    }

    writeln!(out, "\nReviews")?;
    print_reviews(out, &store.product_reviews(id).await, all_reviews)
}

pub async fn reviews(
    store: &Store,
    out: &mut impl Write,
    product: &ProductId,
    all: bool,
) -> Result<(), CommandError> {
    print_reviews(out, &store.product_reviews(product).await, all)
}

pub async fn create_review(
    store: &Store,
    out: &mut impl Write,
    product: &ProductId,
    rating: u8,
    comment: &str,
) -> Result<(), CommandError> {
    let user_id = signed_in_user(store).await?;
    let review = store
        .create_review(&user_id, product, rating, comment)
        .await?;
    writeln!(out, "Review {} posted", review.id)?;
    Ok(())
}

fn print_products(out: &mut impl Write, products: &[Product]) -> Result<(), CommandError> {
    if products.is_empty() {
        writeln!(out, "No products found")?;
        return Ok(());
    }

    for product in products {
        writeln!(
            out,
            "{:<26} {:<32} {:>10}  {}",
            product.id.as_str(),
            product.name,
            product.price.display(),
            product.category,
        )?;
    }
    Ok(())
}

pub(crate) fn print_reviews(
    out: &mut impl Write,
    reviews: &[Review],
    show_all: bool,
) -> Result<(), CommandError> {
    if reviews.is_empty() {
        writeln!(out, "No reviews yet")?;
        return Ok(());
    }

    let page = review_page(reviews, show_all);
    for review in page.shown {
        writeln!(out, "{}", format_review(review))?;
    }
    if page.has_more {
        writeln!(
            out,
            "... {} more reviews",
            reviews.len() - page.shown.len()
        )?;
    }
    Ok(())
}

fn format_review(review: &Review) -> String {
    let stars = "*".repeat(usize::from(review.rating.min(Review::MAX_RATING)));
    let mut line = format!("[{}] {stars:<5} {}", review.id, review.user);
    if !review.comment.is_empty() {
        line.push_str(": ");
        line.push_str(&review.comment);
    }
    line
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn review(id: &str, rating: u8, comment: &str) -> Review {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "user": "Ada",
            "rating": rating,
            "comment": comment
        }))
        .unwrap()
    }

    #[test]
    fn test_format_review() {
        assert_eq!(format_review(&review("r1", 3, "Sweet")), "[r1] ***   Ada: Sweet");
        assert_eq!(format_review(&review("r2", 5, "")), "[r2] ***** Ada");
    }

    #[test]
    fn test_print_reviews_offers_more() {
        let reviews: Vec<Review> = (0..6).map(|i| review(&format!("r{i}"), 4, "")).collect();

        let mut out = Vec::new();
        print_reviews(&mut out, &reviews, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 6);
        assert!(text.ends_with("... 1 more reviews\n"));
    }
}
