//! Metadata command implementation.

use entiodata_core::metadata::{EntityType, TypeDescriptor};
use entiodata_core::InMemoryProducer;

/// Runs the metadata command.
pub fn run(producer: &InMemoryProducer, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let model = producer.metadata()?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&*model)?);
        }
        _ => {
            println!("Namespace:  {}", model.namespace());
            println!("Container:  {}", model.container_name());
            println!();
            println!("Entity sets:");
            for set in model.entity_sets() {
                println!("  {} : {}", set.name, set.entity_type.full_name());
            }
            for entity_type in model.entity_types() {
                println!();
                print_entity_type(entity_type);
            }
            for complex in model.complex_types() {
                println!();
                println!("Complex type {}", complex.full_name());
                for property in &complex.properties {
                    println!("  {}", describe(&property.name, &property.ty, property.nullable));
                }
            }
        }
    }

    Ok(())
}

fn print_entity_type(entity_type: &EntityType) {
    println!(
        "Entity type {} (key: {})",
        entity_type.full_name(),
        entity_type.keys().join(", ")
    );
    for property in entity_type.properties() {
        println!("  {}", describe(&property.name, &property.ty, property.nullable));
    }
    for nav in entity_type.navigation_properties() {
        println!("  {} -> {} [{}]", nav.name, nav.target_type, nav.multiplicity);
    }
}

fn describe(name: &str, ty: &TypeDescriptor, nullable: bool) -> String {
    if nullable {
        format!("{name}: {ty}")
    } else {
        format!("{name}: {ty} not null")
    }
}
