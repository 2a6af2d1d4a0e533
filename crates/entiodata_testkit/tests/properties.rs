//! Property tests for filtering, ordering and paging.

use entiodata_codec::Value;
use entiodata_core::{
    Direction, EntityKey, Expr, OrderBy, ProducerConfig, QueryInfo, ResultPage,
};
use entiodata_testkit::prelude::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::cmp::Ordering;

fn ids(page: &ResultPage) -> Vec<i32> {
    page.entities
        .iter()
        .map(|e| match e.key() {
            EntityKey::Single(Value::Int32(id)) => *id,
            other => panic!("unexpected key {other:?}"),
        })
        .collect()
}

fn shop(orders: &[Order]) -> Shop {
    Shop::with_config(ProducerConfig::default().max_results(1000), orders.to_vec())
}

fn directed(ord: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Ascending => ord,
        Direction::Descending => ord.reverse(),
    }
}

fn expected_order(orders: &[Order], keys: &[OrderBy]) -> Vec<i32> {
    let mut sorted = orders.to_vec();
    sorted.sort_by(|a, b| {
        directed(a.total.cmp(&b.total), keys[0].direction)
            .then(directed(a.id.cmp(&b.id), keys[1].direction))
    });
    sorted.iter().map(|o| o.id).collect()
}

proptest! {
    #[test]
    fn filter_keeps_exactly_matching_records(
        orders in orders_strategy(12),
        threshold in total_strategy(),
    ) {
        let shop = shop(&orders);
        let query = QueryInfo::new().filter(Expr::property("Total").gt(Expr::literal(threshold)));
        let page = shop.get_entities("Orders", &query).unwrap();

        let expected: Vec<i32> = orders.iter().filter(|o| o.total > threshold).map(|o| o.id).collect();
        prop_assert_eq!(ids(&page), expected);
    }

    #[test]
    fn null_comparisons_never_match(orders in orders_strategy(12)) {
        let shop = shop(&orders);
        let query = QueryInfo::new().filter(Expr::property("Note").gt(Expr::literal("")));
        let page = shop.get_entities("Orders", &query).unwrap();

        let expected: Vec<i32> = orders
            .iter()
            .filter(|o| o.note.as_deref().is_some_and(|n| !n.is_empty()))
            .map(|o| o.id)
            .collect();
        prop_assert_eq!(ids(&page), expected);
    }

    #[test]
    fn ties_keep_source_order(orders in orders_strategy(12)) {
        let shop = shop(&orders);
        let query = QueryInfo::new().order_by(OrderBy::asc(Expr::property("Total")));
        let page = shop.get_entities("Orders", &query).unwrap();

        let mut expected = orders.clone();
        expected.sort_by_key(|o| o.total);
        prop_assert_eq!(ids(&page), expected.iter().map(|o| o.id).collect::<Vec<_>>());
    }

    #[test]
    fn later_keys_break_ties(orders in orders_strategy(12), keys in order_by_strategy()) {
        let shop = shop(&orders);
        let mut query = QueryInfo::new();
        for key in keys.clone() {
            query = query.order_by(key);
        }
        let page = shop.get_entities("Orders", &query).unwrap();
        prop_assert_eq!(ids(&page), expected_order(&orders, &keys));
    }

    #[test]
    fn cursor_paging_is_complete_without_duplicates(
        orders in orders_strategy(15),
        keys in order_by_strategy(),
        page_size in 1usize..6,
    ) {
        let shop = Shop::with_config(ProducerConfig::default().max_results(page_size), orders.clone());
        let floor = Decimal::new(250, 2);
        let mut base = QueryInfo::new().filter(Expr::property("Total").ge(Expr::literal(floor)));
        for key in keys.clone() {
            base = base.order_by(key);
        }

        let mut seen = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let query = match token.take() {
                Some(t) => base.clone().skip_token(t),
                None => base.clone(),
            };
            let page = shop.get_entities("Orders", &query).unwrap();
            prop_assert!(page.entities.len() <= page_size);
            seen.extend(ids(&page));
            match page.skip_token {
                Some(t) => {
                    // The cursor is the key of the last entity returned.
                    prop_assert_eq!(Some(t.clone()), page.entities.last().map(|e| e.key_string().unwrap()));
                    token = Some(t);
                }
                None => break,
            }
        }

        let remaining: Vec<Order> = orders.into_iter().filter(|o| o.total >= floor).collect();
        prop_assert_eq!(seen, expected_order(&remaining, &keys));
    }

    #[test]
    fn counts_match_pages(
        orders in orders_strategy(12),
        skip in 0usize..5,
        top in 0usize..8,
    ) {
        let shop = shop(&orders);
        let query = QueryInfo::new().skip(skip).top(top);
        let count = shop.get_entities_count("Orders", &query).unwrap();
        let page = shop.get_entities("Orders", &query).unwrap();
        prop_assert_eq!(count, page.entities.len());
    }
}
