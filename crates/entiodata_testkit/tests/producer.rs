//! End-to-end queries against the shop fixtures.

use entiodata_codec::Value;
use entiodata_core::entity::LinkKind;
use entiodata_core::{
    CoreError, EntityKey, Expr, InlineCount, NavigationResponse, OrderBy, ProducerConfig,
    QueryInfo, ResultPage, WireProperty,
};
use entiodata_testkit::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

fn ids(page: &ResultPage) -> Vec<i32> {
    page.entities
        .iter()
        .map(|e| match e.key() {
            EntityKey::Single(Value::Int32(id)) => *id,
            other => panic!("unexpected key {other:?}"),
        })
        .collect()
}

fn reference_query() -> QueryInfo {
    QueryInfo::new()
        .filter(Expr::property("Total").gt(Expr::literal(Decimal::new(100, 1))))
        .order_by(OrderBy::desc(Expr::property("Total")))
        .order_by(OrderBy::asc(Expr::property("Id")))
}

fn alfki() -> Customer {
    customers().remove(0)
}

#[test]
fn reference_scenario_fits_one_page() {
    let shop = Shop::new(reference_orders());
    let page = shop.get_entities("Orders", &reference_query().top(2)).unwrap();

    assert_eq!(ids(&page), vec![2, 3]);
    assert_eq!(page.skip_token, None);
}

#[test]
fn reference_scenario_pages_with_a_cursor() {
    let shop = Shop::new(reference_orders());

    let first = shop.get_entities("Orders", &reference_query().top(1)).unwrap();
    assert_eq!(ids(&first), vec![2]);
    assert_eq!(first.skip_token.as_deref(), Some("2"));

    let second = shop
        .get_entities("Orders", &reference_query().top(1).skip_token("2"))
        .unwrap();
    assert_eq!(ids(&second), vec![3]);
    assert_eq!(second.skip_token, None);
}

#[test]
fn inline_count_counts_filtered_entities() {
    let shop = Shop::new(reference_orders());
    let query = reference_query().top(1).inline_count(InlineCount::AllPages);
    let page = shop.get_entities("Orders", &query).unwrap();

    assert_eq!(page.entities.len(), 1);
    assert_eq!(page.inline_count, Some(2));
}

#[test]
fn counts_reject_inline_count_and_cursors() {
    let shop = Shop::new(reference_orders());
    assert_eq!(shop.get_entities_count("Orders", &reference_query()).unwrap(), 2);
    assert_eq!(
        shop.get_entities_count("Orders", &QueryInfo::new().top(1)).unwrap(),
        1
    );

    let err = shop
        .get_entities_count("Orders", &QueryInfo::new().inline_count(InlineCount::AllPages))
        .unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedOperation { .. }));
    assert!(shop
        .get_entities_count("Orders", &QueryInfo::new().skip_token("1"))
        .unwrap_err()
        .is_unsupported());
}

#[test]
fn record_source_is_pulled_on_every_query() {
    let shop = Shop::new(reference_orders());
    let model = shop.metadata().unwrap();
    assert_eq!(shop.get_entities("Orders", &QueryInfo::new()).unwrap().entities.len(), 3);

    shop.set_orders(vec![order(9, Decimal::ONE, Vec::new())]);
    let page = shop.get_entities("Orders", &QueryInfo::new()).unwrap();
    assert_eq!(ids(&page), vec![9]);
    assert!(Arc::ptr_eq(&model, &shop.metadata().unwrap()));
}

#[test]
fn generated_metadata_follows_declaration_order() {
    let shop = Shop::new(Vec::new());
    let model = shop.metadata().unwrap();

    let sets: Vec<_> = model.entity_sets().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(sets, vec!["Orders", "Customers", "OrderLines", "Events"]);

    let order = model.entity_type("Order").unwrap();
    let names: Vec<_> = order.properties().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Id", "Total", "Status", "Note", "Items"]);
    assert_eq!(order.property("Items").unwrap().ty.full_name(), "List(InMemory.LineItem)");
    assert_eq!(order.navigation_property("Customer").unwrap().target_type, "Customer");

    let customer = model.entity_type("Customer").unwrap();
    assert!(customer.navigation_property("Orders").unwrap().multiplicity.is_many());
    assert_eq!(model.entity_type("Event").unwrap().keys(), ["EntityId".to_string()]);
}

#[test]
fn enumerations_are_strings_on_the_wire() {
    let shop = Shop::new(reference_orders());
    let entity = shop
        .get_entity("Orders", &EntityKey::from(Value::Int32(1)), &QueryInfo::new())
        .unwrap();
    assert_eq!(
        entity.property("Status").and_then(WireProperty::as_simple),
        Some(&Value::String("Open".to_string()))
    );

    let query = QueryInfo::new().filter(Expr::property("Status").equals(Expr::literal("Open")));
    assert_eq!(shop.get_entities_count("Orders", &query).unwrap(), 3);
}

#[test]
fn null_properties_follow_the_policy() {
    let shop = Shop::new(reference_orders());
    let key = EntityKey::from(Value::Int32(1));
    let entity = shop.get_entity("Orders", &key, &QueryInfo::new()).unwrap();
    assert!(entity.property("Note").is_some_and(WireProperty::is_null));

    let shop = Shop::with_config(
        ProducerConfig::default().include_null_properties(false),
        reference_orders(),
    );
    let entity = shop.get_entity("Orders", &key, &QueryInfo::new()).unwrap();
    assert!(entity.property("Note").is_none());
    assert!(entity.property("Total").is_some());
}

#[test]
fn composite_keys_need_every_field() {
    let shop = Shop::new(Vec::new());
    let full = EntityKey::Composite(vec![
        ("orderid".to_string(), Value::Int32(1)),
        ("ProductId".to_string(), Value::Int64(9)),
    ]);
    let entity = shop.get_entity("OrderLines", &full, &QueryInfo::new()).unwrap();
    assert_eq!(entity.key_string().unwrap(), "OrderId=1,ProductId=9L");

    let partial = EntityKey::Composite(vec![("OrderId".to_string(), Value::Int32(1))]);
    let err = shop.get_entity("OrderLines", &partial, &QueryInfo::new()).unwrap_err();
    assert!(err.is_not_found());

    let single = EntityKey::from(Value::Int32(1));
    assert!(shop
        .get_entity("OrderLines", &single, &QueryInfo::new())
        .unwrap_err()
        .is_not_found());
}

#[test]
fn composite_key_cursors_resume_paging() {
    let shop = Shop::new(Vec::new());
    let first = shop.get_entities("OrderLines", &QueryInfo::new().top(1)).unwrap();
    assert_eq!(first.skip_token.as_deref(), Some("OrderId=1,ProductId=7L"));

    let rest = shop
        .get_entities("OrderLines", &QueryInfo::new().skip_token("OrderId=1,ProductId=7L"))
        .unwrap();
    let keys: Vec<_> = rest.entities.iter().map(|e| e.key_string().unwrap()).collect();
    assert_eq!(keys, vec!["OrderId=1,ProductId=9L", "OrderId=2,ProductId=7L"]);
}

#[test]
fn computed_keys_identify_entities() {
    let shop = Shop::new(Vec::new());
    let entity = shop
        .get_entity("Events", &EntityKey::from(Value::Int64(200)), &QueryInfo::new())
        .unwrap();
    assert_eq!(entity.key_string().unwrap(), "200L");
    assert_eq!(
        entity.property("Code").and_then(WireProperty::as_simple),
        Some(&Value::String("paid".to_string()))
    );
}

#[test]
fn unexpanded_collection_navigation_is_deferred() {
    let shop = Shop::new(placed_by(reference_orders(), &alfki()));
    let key = EntityKey::from(Value::from("ALFKI"));

    let entity = shop.get_entity("Customers", &key, &QueryInfo::new()).unwrap();
    let link = entity.link("Orders").unwrap();
    assert!(matches!(link.kind, LinkKind::Deferred { collection: true }));
    assert!(link.related().is_empty());
}

#[test]
fn expanded_collection_navigation_is_inline() {
    let shop = Shop::new(placed_by(reference_orders(), &alfki()));
    let key = EntityKey::from(Value::from("ALFKI"));

    let entity = shop
        .get_entity("Customers", &key, &QueryInfo::new().expand("Orders"))
        .unwrap();
    let link = entity.link("Orders").unwrap();
    assert!(link.is_inline());
    let related = link.related();
    assert_eq!(related.len(), 3);
    assert!(related.iter().all(|o| o.entity_set() == "Orders"));
    // Expansion stops at the requested depth.
    assert!(matches!(
        related[0].link("Customer").map(|l| &l.kind),
        Some(LinkKind::Deferred { collection: false })
    ));

    let nested = shop
        .get_entity("Customers", &key, &QueryInfo::new().expand("Orders/Customer"))
        .unwrap();
    let orders = nested.link("Orders").unwrap().related();
    assert!(matches!(
        orders[0].link("Customer").map(|l| &l.kind),
        Some(LinkKind::InlineEntity { entity: None })
    ));
}

#[test]
fn select_limits_properties_and_links() {
    let shop = Shop::new(placed_by(reference_orders(), &alfki()));
    let key = EntityKey::from(Value::from("ALFKI"));

    let entity = shop
        .get_entity("Customers", &key, &QueryInfo::new().select("Name"))
        .unwrap();
    let names: Vec<_> = entity.properties().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Name"]);
    assert!(entity.links().is_empty());
    assert_eq!(entity.key_string().unwrap(), "'ALFKI'");
}

#[test]
fn navigation_requests() {
    let shop = Shop::new(placed_by(reference_orders(), &alfki()));
    let query = QueryInfo::new();

    match shop
        .get_nav_property("Orders", &EntityKey::from(Value::Int32(1)), "Customer", &query)
        .unwrap()
    {
        NavigationResponse::Entity(Some(customer)) => {
            assert_eq!(customer.key_string().unwrap(), "'ALFKI'");
        }
        other => panic!("unexpected {other:?}"),
    }

    match shop
        .get_nav_property("Customers", &EntityKey::from(Value::from("ALFKI")), "Orders", &query)
        .unwrap()
    {
        NavigationResponse::Entities(orders) => assert_eq!(orders.len(), 3),
        other => panic!("unexpected {other:?}"),
    }

    let err = shop
        .get_nav_property("Customers", &EntityKey::from(Value::from("ALFKI")), "Address", &query)
        .unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn unknown_names_are_not_found() {
    let shop = Shop::new(reference_orders());
    assert!(shop
        .get_entities("Invoices", &QueryInfo::new())
        .unwrap_err()
        .is_not_found());
    assert!(shop
        .get_entity("Orders", &EntityKey::from(Value::Int32(7)), &QueryInfo::new())
        .unwrap_err()
        .is_not_found());
}

#[test]
fn ill_typed_filters_are_evaluation_errors() {
    let shop = Shop::new(reference_orders());
    let query = QueryInfo::new().filter(Expr::property("Total").gt(Expr::literal("ten")));
    assert!(matches!(
        shop.get_entities("Orders", &query).unwrap_err(),
        CoreError::Evaluation { .. }
    ));

    let query = QueryInfo::new().filter(Expr::property("Missing").equals(Expr::literal(1)));
    assert!(matches!(
        shop.get_entities("Orders", &query).unwrap_err(),
        CoreError::Evaluation { .. }
    ));
}

#[test]
fn result_pages_serialize_to_json() {
    let shop = Shop::new(reference_orders());
    let page = shop.get_entities("Orders", &reference_query().top(1)).unwrap();
    let json = serde_json::to_value(&page).unwrap();

    assert_eq!(json["entity_set"], "Orders");
    assert_eq!(json["entities"][0]["key"], 2);
    assert_eq!(json["entities"][0]["entity_type"], "InMemory.Order");
    assert_eq!(json["skip_token"], "2");
    assert!(json.get("inline_count").is_none());
}
