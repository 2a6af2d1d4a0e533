//! Test fixtures: a small shop domain and a producer serving it.
//!
//! Provides record types covering every field kind the producer handles
//! (simple, nullable, enumeration, complex, collections of simple and
//! complex values, single and collection navigations, composite and
//! computed keys) plus helpers to build producers over them.

use entiodata_codec::SimpleType;
use entiodata_core::{
    ComplexTypeRegistration, CoreError, CoreResult, EntitySetRegistration, InMemoryProducer,
    MaterializeHooks, ProducerConfig, Record, RecordData, ShapeId, TypedAccessor, WireSource,
};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shape of [`Order`] records.
pub const ORDER: ShapeId = ShapeId::from_static("order");
/// Shape of [`LineItem`] records.
pub const LINE_ITEM: ShapeId = ShapeId::from_static("line-item");
/// Shape of [`Customer`] records.
pub const CUSTOMER: ShapeId = ShapeId::from_static("customer");
/// Shape of [`Address`] records.
pub const ADDRESS: ShapeId = ShapeId::from_static("address");
/// Shape of [`OrderLine`] records.
pub const ORDER_LINE: ShapeId = ShapeId::from_static("order-line");
/// Shape of [`Event`] records.
pub const EVENT: ShapeId = ShapeId::from_static("event");

/// One line of an order; a complex value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LineItem {
    /// Stock keeping unit.
    pub sku: String,
    /// Quantity ordered.
    pub qty: i32,
    /// Free-form labels.
    pub tags: Vec<String>,
}

/// Postal address; a complex value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Address {
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
}

/// Order lifecycle state; an enumeration field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// Placed, not shipped.
    #[default]
    Open,
    /// On its way.
    Shipped,
    /// Called off.
    Cancelled,
}

impl OrderStatus {
    /// Member name.
    pub fn name(self) -> &'static str {
        match self {
            OrderStatus::Open => "Open",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Parses a member name.
    pub fn parse(name: &str) -> CoreResult<Self> {
        match name {
            "Open" => Ok(OrderStatus::Open),
            "Shipped" => Ok(OrderStatus::Shipped),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(CoreError::invalid_record(format!("unknown order status {other}"))),
        }
    }
}

/// A customer; members of the `Customers` set.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Customer {
    /// Customer code, the key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Postal address, if known.
    pub address: Option<Address>,
    /// Orders placed; a one-to-many navigation.
    pub orders: Vec<Order>,
}

/// An order; members of the `Orders` set.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Order {
    /// Order number, the key.
    pub id: i32,
    /// Order total.
    pub total: Decimal,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Optional note.
    pub note: Option<String>,
    /// Order lines.
    pub items: Vec<LineItem>,
    /// Ordering customer; a single navigation.
    pub customer: Option<Customer>,
    /// Number of lines; derived, never exposed as a property.
    pub line_count: usize,
}

/// A line of the `OrderLines` set, keyed by order and product.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OrderLine {
    /// Order part of the key.
    pub order_id: i32,
    /// Product part of the key.
    pub product_id: i64,
    /// Quantity.
    pub quantity: i16,
}

/// An audit event with no natural key field.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Event {
    /// Event code.
    pub code: String,
    /// Position in the audit log; the computed key.
    pub sequence: i64,
}

/// Builds an order with the given lines.
pub fn order(id: i32, total: Decimal, items: Vec<LineItem>) -> Order {
    Order {
        id,
        total,
        line_count: items.len(),
        items,
        ..Order::default()
    }
}

/// Builds a line item.
pub fn line(sku: &str, qty: i32) -> LineItem {
    LineItem {
        sku: sku.to_string(),
        qty,
        tags: Vec::new(),
    }
}

/// The three orders of the reference paging scenario: totals 10.0, 25.5
/// and 25.5 with ids 1, 2 and 3.
pub fn reference_orders() -> Vec<Order> {
    vec![
        order(1, Decimal::new(100, 1), vec![line("A-1", 1)]),
        order(2, Decimal::new(255, 1), vec![line("B-1", 2), line("B-2", 1)]),
        order(3, Decimal::new(255, 1), vec![line("C-1", 5)]),
    ]
}

/// The two customers of the shop fixtures, without orders attached.
pub fn customers() -> Vec<Customer> {
    vec![
        Customer {
            id: "ALFKI".to_string(),
            name: "Alfreds Futterkiste".to_string(),
            address: Some(Address {
                street: "Obere Str. 57".to_string(),
                city: "Berlin".to_string(),
            }),
            orders: Vec::new(),
        },
        Customer {
            id: "ANATR".to_string(),
            name: "Ana Trujillo".to_string(),
            address: None,
            orders: Vec::new(),
        },
    ]
}

/// Accessor for [`LineItem`].
pub fn line_item_accessor() -> TypedAccessor<LineItem> {
    TypedAccessor::new()
        .simple("Sku", SimpleType::String, |l: &LineItem| l.sku.clone(), |l, v| l.sku = v)
        .not_null()
        .simple("Qty", SimpleType::Int32, |l: &LineItem| l.qty, |l, v| l.qty = v)
        .not_null()
        .simple_collection("Tags", SimpleType::String, |l: &LineItem| l.tags.clone(), |l, v| l.tags = v)
}

/// Accessor for [`Address`].
pub fn address_accessor() -> TypedAccessor<Address> {
    TypedAccessor::new()
        .simple("Street", SimpleType::String, |a: &Address| a.street.clone(), |a, v| a.street = v)
        .simple("City", SimpleType::String, |a: &Address| a.city.clone(), |a, v| a.city = v)
}

/// Accessor for [`Order`].
pub fn order_accessor() -> TypedAccessor<Order> {
    TypedAccessor::new()
        .simple("Id", SimpleType::Int32, |o: &Order| o.id, |o, v| o.id = v)
        .not_null()
        .simple("Total", SimpleType::Decimal, |o: &Order| o.total, |o, v| o.total = v)
        .not_null()
        .enumeration(
            "Status",
            "OrderStatus",
            |o: &Order| o.status.name().to_string(),
            |o, name| {
                o.status = OrderStatus::parse(name)?;
                Ok(())
            },
        )
        .simple("Note", SimpleType::String, |o: &Order| o.note.clone(), |o, v| o.note = v)
        .record_collection(
            "Items",
            LINE_ITEM,
            |o: &Order| o.items.clone(),
            |o, v| o.items = v,
        )
        .record("Customer", CUSTOMER, |o: &Order| o.customer.clone(), |o, v| o.customer = v)
}

/// Accessor for [`Customer`].
pub fn customer_accessor() -> TypedAccessor<Customer> {
    TypedAccessor::new()
        .simple("Id", SimpleType::String, |c: &Customer| c.id.clone(), |c, v| c.id = v)
        .not_null()
        .simple("Name", SimpleType::String, |c: &Customer| c.name.clone(), |c, v| c.name = v)
        .record("Address", ADDRESS, |c: &Customer| c.address.clone(), |c, v| c.address = v)
        .record_collection("Orders", ORDER, |c: &Customer| c.orders.clone(), |c, v| c.orders = v)
}

/// Accessor for [`OrderLine`].
pub fn order_line_accessor() -> TypedAccessor<OrderLine> {
    TypedAccessor::new()
        .simple("OrderId", SimpleType::Int32, |l: &OrderLine| l.order_id, |l, v| l.order_id = v)
        .not_null()
        .simple("ProductId", SimpleType::Int64, |l: &OrderLine| l.product_id, |l, v| l.product_id = v)
        .not_null()
        .simple("Quantity", SimpleType::Int16, |l: &OrderLine| l.quantity, |l, v| l.quantity = v)
}

/// Accessor for [`Event`]; keyed through a key function.
pub fn event_accessor() -> TypedAccessor<Event> {
    TypedAccessor::new()
        .simple("Code", SimpleType::String, |e: &Event| e.code.clone(), |e, v| e.code = v)
        .simple("Sequence", SimpleType::Int64, |e: &Event| e.sequence, |e, v| e.sequence = v)
}

/// Counts hook invocations on `Order` records and fills their derived
/// line count.
#[derive(Debug, Default, Clone)]
pub struct OrderHooks {
    /// Calls to `before_materialize`.
    pub before: Arc<AtomicUsize>,
    /// Calls to `after_materialize`.
    pub after: Arc<AtomicUsize>,
}

impl MaterializeHooks for OrderHooks {
    fn before_materialize(&self, _record: &mut RecordData, _source: WireSource<'_>) -> CoreResult<()> {
        self.before.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn after_materialize(&self, record: &mut RecordData, _source: WireSource<'_>) -> CoreResult<()> {
        self.after.fetch_add(1, Ordering::SeqCst);
        if let Some(order) = record.downcast_mut::<Order>() {
            order.line_count = order.items.len();
        }
        Ok(())
    }
}

/// A producer over mutable shop data.
///
/// Record sources read the shared vectors on every query, so changes made
/// through [`Shop::set_orders`] are visible to the next request.
pub struct Shop {
    /// The producer.
    pub producer: InMemoryProducer,
    /// Hooks installed on the `Orders` set.
    pub hooks: OrderHooks,
    orders: Arc<RwLock<Vec<Order>>>,
}

impl Shop {
    /// A shop with default configuration over `orders`.
    pub fn new(orders: Vec<Order>) -> Self {
        Self::with_config(ProducerConfig::default(), orders)
    }

    /// A shop with the given configuration over `orders`.
    ///
    /// Panics if registration fails; fixtures are expected to be valid.
    pub fn with_config(config: ProducerConfig, orders: Vec<Order>) -> Self {
        let orders = Arc::new(RwLock::new(orders));
        let hooks = OrderHooks::default();
        let producer = InMemoryProducer::new(config);

        producer.register_complex_type(ComplexTypeRegistration::new(
            "LineItem",
            LINE_ITEM,
            line_item_accessor(),
        ));
        producer.register_complex_type(ComplexTypeRegistration::new(
            "Address",
            ADDRESS,
            address_accessor(),
        ));

        let source = Arc::clone(&orders);
        producer
            .register_entity_set(
                EntitySetRegistration::new("Orders", ORDER, order_accessor(), move || {
                    source
                        .read()
                        .iter()
                        .cloned()
                        .map(|o| Record::new(ORDER, o))
                        .collect::<Vec<_>>()
                })
                .type_name("Order")
                .keys(["Id"])
                .hooks(hooks.clone()),
            )
            .expect("register Orders");

        let source = Arc::clone(&orders);
        producer
            .register_entity_set(
                EntitySetRegistration::new("Customers", CUSTOMER, customer_accessor(), move || {
                    let orders = source.read();
                    customers()
                        .into_iter()
                        .map(|mut customer| {
                            customer.orders = orders
                                .iter()
                                .filter(|o| o.customer.as_ref().is_some_and(|c| c.id == customer.id))
                                .map(|o| Order {
                                    customer: None,
                                    ..o.clone()
                                })
                                .collect();
                            Record::new(CUSTOMER, customer)
                        })
                        .collect::<Vec<_>>()
                })
                .type_name("Customer")
                .keys(["Id"]),
            )
            .expect("register Customers");

        producer
            .register_entity_set(
                EntitySetRegistration::new("OrderLines", ORDER_LINE, order_line_accessor(), || {
                    vec![
                        Record::new(ORDER_LINE, OrderLine { order_id: 1, product_id: 7, quantity: 2 }),
                        Record::new(ORDER_LINE, OrderLine { order_id: 1, product_id: 9, quantity: 1 }),
                        Record::new(ORDER_LINE, OrderLine { order_id: 2, product_id: 7, quantity: 4 }),
                    ]
                })
                .type_name("OrderLine")
                .keys(["OrderId", "ProductId"]),
            )
            .expect("register OrderLines");

        producer
            .register_entity_set(
                EntitySetRegistration::new("Events", EVENT, event_accessor(), || {
                    ["created", "paid", "shipped"]
                        .iter()
                        .zip(1..)
                        .map(|(code, sequence)| {
                            Record::new(
                                EVENT,
                                Event {
                                    code: (*code).to_string(),
                                    sequence,
                                },
                            )
                        })
                        .collect::<Vec<_>>()
                })
                .type_name("Event")
                .key_function(SimpleType::Int64, |e: &Event| e.sequence * 100),
            )
            .expect("register Events");

        Self {
            producer,
            hooks,
            orders,
        }
    }

    /// Replaces the orders served by the shop.
    pub fn set_orders(&self, orders: Vec<Order>) {
        *self.orders.write() = orders;
    }
}

impl std::ops::Deref for Shop {
    type Target = InMemoryProducer;

    fn deref(&self) -> &Self::Target {
        &self.producer
    }
}

/// Attaches `customer` to every order, without the customer's own orders.
pub fn placed_by(mut orders: Vec<Order>, customer: &Customer) -> Vec<Order> {
    for order in &mut orders {
        order.customer = Some(Customer {
            orders: Vec::new(),
            ..customer.clone()
        });
    }
    orders
}
