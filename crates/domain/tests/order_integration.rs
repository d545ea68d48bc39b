//! Integration tests for the order workflow.
//!
//! These tests drive `OrderService` against the in-memory store, covering the
//! line-item fan-out, partial failures, ownership binding and pagination.

use std::collections::HashSet;
use std::time::Duration;

use common::{Address, BookId, OrderId, Shipping, UserId};
use domain::{
    CreateOrderPayload, DomainError, LineItemFanOut, OrderService, Principal,
};
use store::{BookStore, InMemoryStore, NewBook, NewUser, OrderStore, UserStore};

/// Helper to create a test order service
fn create_service(store: &InMemoryStore) -> OrderService<InMemoryStore> {
    OrderService::new(store.clone())
}

async fn register(store: &InMemoryStore, email: &str, is_admin: bool) -> Principal {
    let user = store
        .create_user(NewUser {
            name: "Reader".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            is_admin,
        })
        .await
        .unwrap();
    Principal::from(user)
}

async fn stock(store: &InMemoryStore, count: usize) -> Vec<BookId> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let book = store
            .create_book(NewBook {
                title: format!("Book {i}"),
                description: String::new(),
                category: "fiction".to_string(),
                trending: i % 2 == 0,
                old_price: 15.0,
                new_price: 12.5,
                cover_image: String::new(),
            })
            .await
            .unwrap();
        ids.push(book.id);
    }
    ids
}

fn payload(book_ids: &[BookId]) -> CreateOrderPayload {
    CreateOrderPayload {
        name: "Reader".to_string(),
        email: "reader@example.com".to_string(),
        address: Address {
            city: "Bandung".to_string(),
            province: "Jawa Barat".to_string(),
            state: "ID".to_string(),
            zipcode: "40111".to_string(),
        },
        phone: "08123456789".to_string(),
        total_price: 12.5 * book_ids.len() as f64,
        user_id: None,
        book_ids: book_ids.iter().map(|id| id.as_i64()).collect(),
        shipping: Shipping {
            shipping_type: "jne".to_string(),
            shipping_service: "REG".to_string(),
            shipping_cost: 9000,
        },
    }
}

mod create_order {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fifty_books_create_fifty_lines() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;
        let books = stock(&store, 50).await;
        store.set_line_latency(Some(Duration::from_millis(2))).await;

        let order = service
            .create_order(Some(&principal), payload(&books))
            .await
            .unwrap();

        assert_eq!(order.books.len(), 50);
        assert_eq!(order.user_id, principal.user_id);
        assert_eq!(order.user.unwrap().email, "reader@example.com");
        assert!(store.max_concurrent_line_writes() > 1);

        let lines = store.get_order_lines(order.id).await.unwrap();
        assert_eq!(lines.len(), 50);
        assert!(lines.iter().all(|line| line.order_id == order.id));

        let line_ids: HashSet<_> = lines.iter().map(|line| line.id).collect();
        assert_eq!(line_ids.len(), 50);

        let mut stored: Vec<BookId> = lines.iter().map(|line| line.book_id).collect();
        let mut requested = books.clone();
        stored.sort();
        requested.sort();
        assert_eq!(stored, requested);
    }

    #[tokio::test]
    async fn empty_book_list_creates_order_without_lines() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;

        let order = service
            .create_order(Some(&principal), payload(&[]))
            .await
            .unwrap();

        assert!(order.books.is_empty());
        assert_eq!(store.order_count().await, 1);
        assert_eq!(store.line_attempts(), 0);
    }

    #[tokio::test]
    async fn invalid_book_yields_partial_failure() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;
        let mut books = stock(&store, 4).await;
        books.insert(2, BookId::new(9999));

        let err = service
            .create_order(Some(&principal), payload(&books))
            .await
            .unwrap_err();

        let DomainError::PartialFailure(failure) = err else {
            panic!("expected partial failure, got {err:?}");
        };
        assert_eq!(failure.attempted, 5);
        assert_eq!(failure.failures.len(), 1);
        assert_eq!(failure.failures[0].book_id, BookId::new(9999));

        // The parent order and the good lines stay behind.
        let order = service.get_order(failure.order_id).await.unwrap();
        assert_eq!(order.books.len(), 4);
        assert_eq!(store.line_attempts(), 5);
    }

    #[tokio::test]
    async fn injected_line_failures_are_all_reported() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;
        let books = stock(&store, 3).await;
        store.fail_lines_for_book(books[1]).await;

        let requested = vec![books[0], books[1], books[1], books[2]];
        let err = service
            .create_order(Some(&principal), payload(&requested))
            .await
            .unwrap_err();

        let DomainError::PartialFailure(failure) = err else {
            panic!("expected partial failure");
        };
        assert_eq!(failure.failures.len(), 2);
        assert!(failure.failures.iter().all(|f| f.book_id == books[1]));
        assert_eq!(store.line_count().await, 2);
    }

    #[tokio::test]
    async fn spoofed_user_id_is_ignored() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let victim = register(&store, "victim@example.com", false).await;
        let caller = register(&store, "caller@example.com", false).await;
        let books = stock(&store, 1).await;

        let mut spoofed = payload(&books);
        spoofed.user_id = Some(victim.user_id.as_i64());
        let order = service.create_order(Some(&caller), spoofed).await.unwrap();

        assert_eq!(order.user_id, caller.user_id);
        assert!(service.orders_for_user(victim.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn anonymous_caller_writes_nothing() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let books = stock(&store, 2).await;

        let err = service.create_order(None, payload(&books)).await.unwrap_err();

        assert!(matches!(err, DomainError::Unauthenticated(_)));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.line_attempts(), 0);
    }

    #[tokio::test]
    async fn invalid_payload_writes_nothing() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;

        let mut nameless = payload(&[]);
        nameless.name.clear();
        assert!(matches!(
            service.create_order(Some(&principal), nameless).await,
            Err(DomainError::Validation(_))
        ));

        let mut long_phone = payload(&[]);
        long_phone.phone = "+62 812 3456 7890 1234".to_string();
        assert!(matches!(
            service.create_order(Some(&principal), long_phone).await,
            Err(DomainError::Validation(_))
        ));

        let err = service
            .create_order_from_json(Some(&principal), b"{\"name\": ")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn parent_failure_spawns_no_lines() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;
        let books = stock(&store, 3).await;
        store.set_fail_on_create_order(true).await;

        let err = service
            .create_order(Some(&principal), payload(&books))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Storage(_)));
        assert_eq!(store.line_attempts(), 0);
    }

    #[tokio::test]
    async fn duplicate_books_become_duplicate_lines() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;
        let books = stock(&store, 1).await;

        let order = service
            .create_order(Some(&principal), payload(&[books[0], books[0], books[0]]))
            .await
            .unwrap();

        assert_eq!(order.books.len(), 3);
        assert!(order.books.iter().all(|b| b.id == books[0]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn line_writes_respect_concurrency_limit() {
        let store = InMemoryStore::new();
        let service = OrderService::with_fanout(store.clone(), LineItemFanOut::new(3));
        let principal = register(&store, "reader@example.com", false).await;
        let books = stock(&store, 12).await;
        store.set_line_latency(Some(Duration::from_millis(5))).await;

        let order = service
            .create_order(Some(&principal), payload(&books))
            .await
            .unwrap();

        assert_eq!(order.books.len(), 12);
        assert!(store.max_concurrent_line_writes() <= 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checkouts_share_one_limit() {
        let store = InMemoryStore::new();
        let service = OrderService::with_fanout(store.clone(), LineItemFanOut::new(3));
        let principal = register(&store, "reader@example.com", false).await;
        let books = stock(&store, 8).await;
        store.set_line_latency(Some(Duration::from_millis(10))).await;

        let mut checkouts = tokio::task::JoinSet::new();
        for _ in 0..4 {
            let service = service.clone();
            let principal = principal.clone();
            let payload = payload(&books);
            checkouts.spawn(async move { service.create_order(Some(&principal), payload).await });
        }
        while let Some(result) = checkouts.join_next().await {
            assert_eq!(result.unwrap().unwrap().books.len(), 8);
        }

        assert_eq!(store.line_count().await, 32);
        assert!(store.max_concurrent_line_writes() <= 3);
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn twenty_five_orders_make_three_pages() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;
        for _ in 0..25 {
            service
                .create_order(Some(&principal), payload(&[]))
                .await
                .unwrap();
        }

        let first = service.list_orders(1, 10).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.pagination.total_items, 25);
        assert_eq!(first.pagination.total_pages, 3);

        let last = service.list_orders(3, 10).await.unwrap();
        assert_eq!(last.items.len(), 5);
    }

    #[tokio::test]
    async fn page_past_the_end_is_clamped_and_echoed() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;
        for _ in 0..25 {
            service
                .create_order(Some(&principal), payload(&[]))
                .await
                .unwrap();
        }

        let page = service.list_orders(5, 10).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.requested_page, 5);
        assert_eq!(page.pagination.page, 3);
    }

    #[tokio::test]
    async fn out_of_range_page_size_is_rejected() {
        let service = create_service(&InMemoryStore::new());
        assert!(matches!(
            service.list_orders(1, 101).await,
            Err(DomainError::Validation(_))
        ));
        assert!(service.list_orders(0, 10).await.is_err());
    }

    #[tokio::test]
    async fn user_without_orders_gets_empty_list() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;

        assert!(service.orders_for_user(principal.user_id).await.unwrap().is_empty());
        assert!(service.orders_for_user(UserId::new(777)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_order_is_not_found() {
        let service = create_service(&InMemoryStore::new());
        let err = service.get_order(OrderId::new(12)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "order", .. }));
    }
}

mod repair {
    use super::*;

    #[tokio::test]
    async fn repair_adds_only_missing_lines_and_is_idempotent() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let principal = register(&store, "reader@example.com", false).await;
        let books = stock(&store, 3).await;
        store.fail_lines_for_book(books[2]).await;

        let requested = vec![books[0], books[1], books[2], books[2]];
        let DomainError::PartialFailure(failure) = service
            .create_order(Some(&principal), payload(&requested))
            .await
            .unwrap_err()
        else {
            panic!("expected partial failure");
        };
        store.clear_line_failures().await;

        let repaired = service
            .repair_missing_lines(&principal, failure.order_id, requested.clone())
            .await
            .unwrap();
        assert_eq!(repaired.books.len(), 4);

        let attempts = store.line_attempts();
        let again = service
            .repair_missing_lines(&principal, failure.order_id, requested)
            .await
            .unwrap();
        assert_eq!(again.books.len(), 4);
        assert_eq!(store.line_attempts(), attempts);
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_repair() {
        let store = InMemoryStore::new();
        let service = create_service(&store);
        let owner = register(&store, "owner@example.com", false).await;
        let stranger = register(&store, "stranger@example.com", false).await;
        let admin = register(&store, "admin@example.com", true).await;
        let books = stock(&store, 1).await;

        let order = service
            .create_order(Some(&owner), payload(&[]))
            .await
            .unwrap();

        assert!(matches!(
            service
                .repair_missing_lines(&stranger, order.id, books.clone())
                .await,
            Err(DomainError::Forbidden(_))
        ));

        let repaired = service
            .repair_missing_lines(&admin, order.id, books)
            .await
            .unwrap();
        assert_eq!(repaired.books.len(), 1);
    }
}
