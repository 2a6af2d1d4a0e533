//! Property-based test generators using proptest.
//!
//! Provides strategies for generating shop data that keeps the invariants
//! the producer relies on: unique keys, non-null key fields.

use crate::fixtures::{order, LineItem, Order, OrderStatus};
use entiodata_core::{Direction, Expr, OrderBy};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for order totals drawn from a small set, so ties are common.
pub fn total_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..8).prop_map(|n| Decimal::new(n * 250, 2))
}

/// Strategy for order states.
pub fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Open),
        Just(OrderStatus::Shipped),
        Just(OrderStatus::Cancelled),
    ]
}

/// Strategy for line items.
pub fn line_item_strategy() -> impl Strategy<Value = LineItem> {
    (
        prop::string::string_regex("[A-Z]-[0-9]{1,3}").expect("Invalid regex"),
        1i32..10,
        prop::collection::vec(prop::string::string_regex("[a-z]{1,6}").expect("Invalid regex"), 0..3),
    )
        .prop_map(|(sku, qty, tags)| LineItem { sku, qty, tags })
}

/// Strategy for up to `max` orders with ids `1..=n` in a shuffled order.
pub fn orders_strategy(max: usize) -> impl Strategy<Value = Vec<Order>> {
    prop::collection::vec(
        (
            total_strategy(),
            status_strategy(),
            prop::option::of(prop::string::string_regex("[a-z ]{0,12}").expect("Invalid regex")),
            prop::collection::vec(line_item_strategy(), 0..3),
        ),
        0..=max,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .zip(1..)
            .map(|((total, status, note, items), id)| Order {
                status,
                note,
                ..order(id, total, items)
            })
            .collect::<Vec<_>>()
    })
    .prop_shuffle()
}

/// Strategy for a sort direction.
pub fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Ascending), Just(Direction::Descending)]
}

/// Strategy for ordering by total then id, in arbitrary directions.
pub fn order_by_strategy() -> impl Strategy<Value = Vec<OrderBy>> {
    (direction_strategy(), direction_strategy()).prop_map(|(total, id)| {
        vec![
            OrderBy {
                expr: Expr::property("Total"),
                direction: total,
            },
            OrderBy {
                expr: Expr::property("Id"),
                direction: id,
            },
        ]
    })
}
