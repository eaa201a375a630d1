mod crud_test;
mod naming_test;
mod paging_test;
mod retry_test;
mod update_test;

use docrepo::entity::{CollectionName, ConnectionName, EntityBase, EntityMetadata, Lineage};
use fake::faker::address::en::{CityName, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::FreeEmail;
use fake::faker::lorem::en::Words;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Person {
    #[serde(flatten)]
    pub base: EntityBase,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub email: Option<String>,
    pub address: Option<Address>,
}
docrepo::impl_entity!(Person);

/// Built directly on the base.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Employee {
    #[serde(flatten)]
    pub base: EntityBase,
    pub name: String,
    pub company: String,
}
docrepo::impl_entity!(Employee, lineage = Lineage::Derived(&[]));

/// Built on `Employee`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Manager {
    #[serde(flatten)]
    pub base: EntityBase,
    pub name: String,
    pub reports: Vec<String>,
}
docrepo::impl_entity!(Manager, lineage = Lineage::Derived(&["Employee"]));

/// Built on `Manager`, two levels above the base.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Director {
    #[serde(flatten)]
    pub base: EntityBase,
    pub name: String,
}
docrepo::impl_entity!(Director, lineage = Lineage::Derived(&["Manager", "Employee"]));

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Invoice {
    #[serde(flatten)]
    pub base: EntityBase,
    pub number: String,
    pub total: f64,
}
docrepo::impl_entity!(
    Invoice,
    declarations = EntityMetadata::new()
        .collection_name(CollectionName::new("Invoices")?)
        .connection_name(ConnectionName::new("Billing")?)
);

/// A derived type whose own declaration beats the ancestor walk.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Contractor {
    #[serde(flatten)]
    pub base: EntityBase,
    pub name: String,
}
docrepo::impl_entity!(
    Contractor,
    lineage = Lineage::Derived(&["Employee"]),
    declarations = EntityMetadata::new().connection_name(ConnectionName::new("Vendors")?)
);

/// Declares a blank collection name, which is rejected when resolved.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Broken {
    #[serde(flatten)]
    pub base: EntityBase,
}
docrepo::impl_entity!(
    Broken,
    declarations = EntityMetadata::new().collection_name(CollectionName::new("   ")?)
);

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    #[serde(flatten)]
    pub base: EntityBase,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub tags: Vec<String>,
}
docrepo::impl_entity!(Product);

pub fn generate_person() -> Person {
    Person {
        base: EntityBase::new(),
        first_name: FirstName().fake::<String>(),
        last_name: LastName().fake::<String>(),
        age: (18..80).fake::<i64>(),
        email: Some(FreeEmail().fake::<String>()),
        address: Some(Address {
            street: StreetName().fake::<String>(),
            city: CityName().fake::<String>(),
        }),
    }
}

pub fn generate_people(count: usize) -> Vec<Person> {
    (0..count).map(|_| generate_person()).collect()
}

pub fn person_aged(first_name: &str, age: i64) -> Person {
    let mut person = generate_person();
    person.first_name = first_name.to_string();
    person.age = age;
    person
}

pub fn generate_employee() -> Employee {
    Employee {
        base: EntityBase::new(),
        name: FirstName().fake::<String>(),
        company: CompanyName().fake::<String>(),
    }
}

pub fn generate_product(stock: i64) -> Product {
    Product {
        base: EntityBase::new(),
        name: CompanyName().fake::<String>(),
        price: (1.0..500.0).fake::<f64>(),
        stock,
        tags: Words(1..4).fake::<Vec<String>>(),
    }
}
