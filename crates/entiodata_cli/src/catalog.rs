//! Built-in sample catalog served by the CLI.

use entiodata_core::{
    ComplexTypeRegistration, CoreResult, EntitySetRegistration, InMemoryProducer, ProducerConfig,
    Record, TypedAccessor,
};
use entiodata_codec::SimpleType;
use rust_decimal::Decimal;

#[derive(Debug, Default, Clone)]
struct Address {
    street: String,
    city: String,
    country: String,
}

#[derive(Debug, Default, Clone, Copy)]
enum Rating {
    #[default]
    Unrated,
    Preferred,
    Approved,
}

impl Rating {
    fn name(self) -> &'static str {
        match self {
            Rating::Unrated => "Unrated",
            Rating::Preferred => "Preferred",
            Rating::Approved => "Approved",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "Unrated" => Some(Rating::Unrated),
            "Preferred" => Some(Rating::Preferred),
            "Approved" => Some(Rating::Approved),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Supplier {
    id: i32,
    name: String,
    address: Option<Address>,
    rating: Rating,
}

#[derive(Debug, Default, Clone)]
struct Category {
    id: i32,
    name: String,
    tags: Vec<String>,
}

#[derive(Debug, Default, Clone)]
struct Product {
    id: i32,
    name: String,
    price: Decimal,
    units_in_stock: Option<i16>,
    discontinued: bool,
    category: Option<Category>,
    supplier: Option<Supplier>,
}

fn categories() -> Vec<Category> {
    vec![
        Category {
            id: 1,
            name: "Beverages".to_string(),
            tags: vec!["drinks".to_string(), "cold".to_string()],
        },
        Category {
            id: 2,
            name: "Condiments".to_string(),
            tags: vec!["sauces".to_string()],
        },
        Category {
            id: 3,
            name: "Produce".to_string(),
            tags: Vec::new(),
        },
    ]
}

fn suppliers() -> Vec<Supplier> {
    vec![
        Supplier {
            id: 1,
            name: "Exotic Liquids".to_string(),
            address: Some(Address {
                street: "49 Gilbert St.".to_string(),
                city: "London".to_string(),
                country: "UK".to_string(),
            }),
            rating: Rating::Preferred,
        },
        Supplier {
            id: 2,
            name: "Tokyo Traders".to_string(),
            address: Some(Address {
                street: "9-8 Sekimai".to_string(),
                city: "Tokyo".to_string(),
                country: "Japan".to_string(),
            }),
            rating: Rating::Approved,
        },
        Supplier {
            id: 3,
            name: "Grandma Kelly's Homestead".to_string(),
            address: None,
            rating: Rating::Unrated,
        },
    ]
}

fn products() -> Vec<Product> {
    let categories = categories();
    let suppliers = suppliers();
    let rows: [(i32, &str, i64, Option<i16>, bool, usize, usize); 8] = [
        (1, "Chai", 1800, Some(39), false, 0, 0),
        (2, "Chang", 1900, Some(17), false, 0, 0),
        (3, "Aniseed Syrup", 1000, Some(13), false, 1, 0),
        (4, "Chef Anton's Cajun Seasoning", 2200, None, false, 1, 2),
        (5, "Chef Anton's Gumbo Mix", 2135, Some(0), true, 1, 2),
        (6, "Grandma's Boysenberry Spread", 2500, Some(120), false, 1, 2),
        (7, "Uncle Bob's Organic Dried Pears", 3000, Some(15), false, 2, 2),
        (8, "Ikura", 3100, Some(31), false, 2, 1),
    ];
    rows.iter()
        .map(|&(id, name, cents, stock, discontinued, category, supplier)| Product {
            id,
            name: name.to_string(),
            price: Decimal::new(cents, 2),
            units_in_stock: stock,
            discontinued,
            category: categories.get(category).cloned(),
            supplier: suppliers.get(supplier).cloned(),
        })
        .collect()
}

fn records<T: Clone + Send + Sync + 'static>(shape: &'static str, items: Vec<T>) -> Vec<Record> {
    items.into_iter().map(|item| Record::new(shape, item)).collect()
}

/// Builds a producer over the sample catalog.
pub fn producer(config: ProducerConfig) -> CoreResult<InMemoryProducer> {
    let producer = InMemoryProducer::new(config);

    producer.register_complex_type(ComplexTypeRegistration::new(
        "Address",
        "address",
        TypedAccessor::<Address>::new()
            .simple("Street", SimpleType::String, |a: &Address| a.street.clone(), |a, v| a.street = v)
            .simple("City", SimpleType::String, |a: &Address| a.city.clone(), |a, v| a.city = v)
            .simple("Country", SimpleType::String, |a: &Address| a.country.clone(), |a, v| a.country = v),
    ));

    let product_accessor = TypedAccessor::<Product>::new()
        .simple("ProductID", SimpleType::Int32, |p: &Product| p.id, |p, v| p.id = v)
        .not_null()
        .simple("ProductName", SimpleType::String, |p: &Product| p.name.clone(), |p, v| p.name = v)
        .simple("UnitPrice", SimpleType::Decimal, |p: &Product| p.price, |p, v| p.price = v)
        .simple("UnitsInStock", SimpleType::Int16, |p: &Product| p.units_in_stock, |p, v| p.units_in_stock = v)
        .simple("Discontinued", SimpleType::Boolean, |p: &Product| p.discontinued, |p, v| p.discontinued = v)
        .record("Category", "category", |p: &Product| p.category.clone(), |p, v| p.category = v)
        .record("Supplier", "supplier", |p: &Product| p.supplier.clone(), |p, v| p.supplier = v);
    producer.register_entity_set(
        EntitySetRegistration::new("Products", "product", product_accessor, || {
            records("product", products())
        })
        .type_name("Product")
        .keys(["ProductID"]),
    )?;

    let category_accessor = TypedAccessor::<Category>::new()
        .simple("CategoryID", SimpleType::Int32, |c: &Category| c.id, |c, v| c.id = v)
        .not_null()
        .simple("CategoryName", SimpleType::String, |c: &Category| c.name.clone(), |c, v| c.name = v)
        .simple_collection("Tags", SimpleType::String, |c: &Category| c.tags.clone(), |c, v| c.tags = v);
    producer.register_entity_set(
        EntitySetRegistration::new("Categories", "category", category_accessor, || {
            records("category", categories())
        })
        .type_name("Category")
        .keys(["CategoryID"]),
    )?;

    let supplier_accessor = TypedAccessor::<Supplier>::new()
        .simple("SupplierID", SimpleType::Int32, |s: &Supplier| s.id, |s, v| s.id = v)
        .not_null()
        .simple("CompanyName", SimpleType::String, |s: &Supplier| s.name.clone(), |s, v| s.name = v)
        .record("Address", "address", |s: &Supplier| s.address.clone(), |s, v| s.address = v)
        .enumeration(
            "Rating",
            "Rating",
            |s: &Supplier| s.rating.name().to_string(),
            |s, name| {
                s.rating = Rating::parse(name).ok_or_else(|| {
                    entiodata_core::CoreError::invalid_record(format!("unknown rating {name}"))
                })?;
                Ok(())
            },
        );
    producer.register_entity_set(
        EntitySetRegistration::new("Suppliers", "supplier", supplier_accessor, || {
            records("supplier", suppliers())
        })
        .type_name("Supplier")
        .keys(["SupplierID"]),
    )?;

    Ok(producer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use entiodata_core::QueryInfo;

    #[test]
    fn catalog_metadata() {
        let producer = producer(ProducerConfig::default()).unwrap();
        let model = producer.metadata().unwrap();

        assert_eq!(model.entity_sets().len(), 3);
        let product = model.entity_type("Product").unwrap();
        assert_eq!(product.keys(), ["ProductID".to_string()]);
        assert!(product.navigation_property("Category").is_some());
        assert!(product.navigation_property("Supplier").is_some());
        assert!(model.entity_type("Supplier").unwrap().property("Rating").is_some());
        assert!(model.complex_type("Address").is_some());
    }

    #[test]
    fn catalog_serves_every_product() {
        let producer = producer(ProducerConfig::default()).unwrap();
        let page = producer.get_entities("Products", &QueryInfo::new()).unwrap();
        assert_eq!(page.entities.len(), 8);
        assert_eq!(page.skip_token, None);
    }
}
