//! Order creation workflow.
//!
//! [`CreateOrder`] is the unit of work behind `POST /orders/create`. Inside one
//! transaction it:
//!
//! 1. loads the user,
//! 2. for each line in request order, loads the product, checks stock,
//!    reserves the requested quantity and snapshots the unit price,
//! 3. checks the accumulated total against the user's balance and debits it,
//! 4. resolves the order id and inserts the order.
//!
//! Any failure returns `Err` before commit, so stock, balances and the order
//! collection are left exactly as they were.

use crate::backend::StoreBackend;
use crate::error::{Error, Result};
use crate::models::{LineItem, Money, Order, OrderRequest, Product, Sequence, User};
use crate::transaction::{Transaction, UnitOfWork};

/// Name of the sequence that hands out order ids.
pub const ORDER_SEQUENCE: &str = "orders";

/// Unit of work that turns an [`OrderRequest`] into a committed [`Order`].
#[derive(Debug, Clone)]
pub struct CreateOrder {
    request: OrderRequest,
}

impl CreateOrder {
    /// Wrap a request, rejecting malformed input before any store access.
    ///
    /// # Errors
    /// `Error::InvalidInput` for an empty item list or a zero quantity.
    pub fn new(request: OrderRequest) -> Result<Self> {
        request.validate()?;
        Ok(CreateOrder { request })
    }

    pub fn request(&self) -> &OrderRequest {
        &self.request
    }
}

impl<B: StoreBackend> UnitOfWork<B> for CreateOrder {
    type Output = Order;

    async fn execute(&mut self, tx: &mut Transaction<B>) -> Result<Order> {
        let request = &self.request;
        let mut user: User = tx.require(&request.user_id).await?;

        let mut total = Money::ZERO;
        let mut items = Vec::with_capacity(request.items.len());

        for line in &request.items {
            // A repeated product id sees the quantity reserved by earlier lines.
            let mut product: Product = tx.require(&line.product_id).await?;

            if product.quantity < line.quantity {
                return Err(Error::InsufficientStock {
                    product_id: product.id,
                    available: product.quantity,
                    requested: line.quantity,
                });
            }

            product.quantity -= line.quantity;
            tx.update(&product).await?;

            let item = LineItem {
                product_id: product.id,
                quantity: line.quantity,
                price: product.price,
            };
            total = total.checked_add(item.line_total()?)?;
            items.push(item);
        }

        if total > user.balance {
            return Err(Error::InsufficientBalance {
                user_id: user.id,
                balance: user.balance,
                total,
            });
        }

        user.balance = user.balance.checked_sub(total)?;
        tx.update(&user).await?;

        let id = match request.id {
            Some(id) => id,
            None => next_order_id(tx).await?,
        };

        let order = Order {
            id,
            user_id: user.id,
            items,
            total,
        };
        tx.insert(&order).await?;

        debug!(
            "» Order {} staged for user {}: {} line(s), total {} (attempt {})",
            order.id,
            order.user_id,
            order.items.len(),
            order.total,
            tx.attempt()
        );

        Ok(order)
    }

    fn name(&self) -> &'static str {
        "create_order"
    }
}

/// Take the next free order id from the `orders` sequence.
///
/// Ids already taken by client-assigned orders are skipped.
async fn next_order_id<B: StoreBackend>(tx: &mut Transaction<B>) -> Result<u64> {
    let name = ORDER_SEQUENCE.to_string();
    let existing = tx.get::<Sequence>(&name).await?;
    let is_new = existing.is_none();

    let mut sequence = existing.unwrap_or(Sequence { name, next: 1 });
    let mut id = sequence.next;

    while tx.exists::<Order>(&id).await? {
        id = id
            .checked_add(1)
            .ok_or_else(|| Error::InvalidInput("order id space exhausted".to_string()))?;
    }

    sequence.next = id
        .checked_add(1)
        .ok_or_else(|| Error::InvalidInput("order id space exhausted".to_string()))?;

    if is_new {
        tx.insert(&sequence).await?;
    } else {
        tx.update(&sequence).await?;
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::store::DocumentStore;

    async fn seeded_store() -> DocumentStore<InMemoryBackend> {
        let store = DocumentStore::new(InMemoryBackend::new());
        store
            .insert(User::new(1, "Alice", Money::from(100)))
            .await
            .unwrap();
        store
            .insert(Product::new(1, "Widget", 10, Money::from(5)))
            .await
            .unwrap();
        store
            .insert(Product::new(2, "Gadget", 2, Money::from(20)))
            .await
            .unwrap();
        store
    }

    fn create(request: OrderRequest) -> CreateOrder {
        CreateOrder::new(request).expect("valid request")
    }

    #[tokio::test]
    async fn test_create_order_success() {
        let store = seeded_store().await;

        let order = store
            .run_in_transaction(create(OrderRequest::new(1).with_id(1).item(1, 3)))
            .await
            .expect("order commits");

        assert_eq!(order.total, Money::from(15));
        assert_eq!(
            order.items,
            vec![LineItem {
                product_id: 1,
                quantity: 3,
                price: Money::from(5)
            }]
        );

        let widget: Product = store.get(&1).await.unwrap().unwrap();
        let alice: User = store.get(&1).await.unwrap().unwrap();
        assert_eq!(widget.quantity, 7);
        assert_eq!(alice.balance, Money::from(85));
        assert_eq!(store.get::<Order>(&1).await.unwrap(), Some(order));
    }

    #[tokio::test]
    async fn test_insufficient_stock_names_product() {
        let store = seeded_store().await;

        let result = store
            .run_in_transaction(create(OrderRequest::new(1).item(1, 11)))
            .await;

        assert_eq!(
            result.unwrap_err(),
            Error::InsufficientStock {
                product_id: 1,
                available: 10,
                requested: 11
            }
        );
    }

    #[tokio::test]
    async fn test_insufficient_balance_reports_total() {
        let store = seeded_store().await;

        store
            .insert(User::new(2, "Bob", Money::from(10)))
            .await
            .unwrap();

        let result = store
            .run_in_transaction(create(OrderRequest::new(2).item(1, 3)))
            .await;

        assert_eq!(
            result.unwrap_err(),
            Error::InsufficientBalance {
                user_id: 2,
                balance: Money::from(10),
                total: Money::from(15)
            }
        );
        let widget: Product = store.get(&1).await.unwrap().unwrap();
        assert_eq!(widget.quantity, 10);
    }

    #[tokio::test]
    async fn test_duplicate_product_lines_share_stock() {
        let store = seeded_store().await;

        let order = store
            .run_in_transaction(create(OrderRequest::new(1).item(1, 6).item(1, 4)))
            .await
            .expect("exactly all stock");
        assert_eq!(order.total, Money::from(50));

        let widget: Product = store.get(&1).await.unwrap().unwrap();
        assert_eq!(widget.quantity, 0);

        let result = store
            .run_in_transaction(create(OrderRequest::new(1).item(2, 1).item(2, 2)))
            .await;
        assert!(matches!(
            result,
            Err(Error::InsufficientStock {
                product_id: 2,
                available: 1,
                requested: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_server_assigned_ids_skip_taken() {
        let store = seeded_store().await;

        let first = store
            .run_in_transaction(create(OrderRequest::new(1).item(1, 1)))
            .await
            .unwrap();
        let explicit = store
            .run_in_transaction(create(OrderRequest::new(1).with_id(2).item(1, 1)))
            .await
            .unwrap();
        let third = store
            .run_in_transaction(create(OrderRequest::new(1).item(1, 1)))
            .await
            .unwrap();

        assert_eq!((first.id, explicit.id, third.id), (1, 2, 3));
    }

    #[tokio::test]
    async fn test_explicit_duplicate_id_rejected() {
        let store = seeded_store().await;
        store
            .run_in_transaction(create(OrderRequest::new(1).with_id(9).item(1, 1)))
            .await
            .unwrap();

        let result = store
            .run_in_transaction(create(OrderRequest::new(1).with_id(9).item(1, 1)))
            .await;
        assert!(matches!(
            result,
            Err(Error::AlreadyExists {
                collection: "orders",
                ..
            })
        ));

        // The rejected attempt reserved nothing
        let widget: Product = store.get(&1).await.unwrap().unwrap();
        assert_eq!(widget.quantity, 9);
    }

    #[test]
    fn test_malformed_request_rejected_up_front() {
        assert!(CreateOrder::new(OrderRequest::new(1)).is_err());
        assert!(CreateOrder::new(OrderRequest::new(1).item(1, 0)).is_err());
    }
}
