use crate::repository::{generate_product, person_aged, Address, Person, Product};
use chrono::{TimeZone, Utc};
use docrepo::errors::ErrorKind;
use docrepo::filter::{all, field};
use docrepo::repository::Repository;
use docrepo::update::{current_date, inc, set, set_value, unset, UpdateDefinition};
use docrepo_int_test::test_util::{cleanup, create_test_context, now, run_test};

#[test]
fn test_update_always_advances_modified_on() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let mut person = person_aged("Alice", 30);
            let long_ago = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
            person.base.set_modified_on(long_ago);
            repo.insert(&person)?;

            let before = now();
            assert!(repo.update_entity(&person, inc("age", 1))?);

            let stored = repo.get(person.base.id())?.expect("stored person");
            assert_eq!(stored.age, 31);
            assert!(stored.base.modified_on() > long_ago);
            assert!(stored.base.modified_on() > before);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_modified_on_is_later_than_any_prior_clock_read() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let person = person_aged("Cleo", 22);
            repo.insert(&person)?;

            for round in 0..200 {
                let before = now();
                repo.update_by_id(person.base.id(), set("first_name", format!("Cleo {}", round)))?;
                let stored = repo.get(person.base.id())?.expect("stored person");
                assert!(
                    stored.base.modified_on() > before,
                    "round {}: {} is not after {}",
                    round,
                    stored.base.modified_on(),
                    before
                );
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_modified_on_cannot_be_suppressed() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let person = person_aged("Bob", 40);
            repo.insert(&person)?;

            // a caller-supplied value for `_m` is overwritten by the appended stamp
            let before = now();
            repo.update_entity(&person, set("_m", 0))?;
            let stored = repo.get(person.base.id())?.expect("stored person");
            assert!(stored.base.modified_on() > before);

            repo.update_entity(&person, UpdateDefinition::new())?;
            let again = repo.get(person.base.id())?.expect("stored person");
            assert!(again.base.modified_on() >= stored.base.modified_on());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_many_by_filter() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Product> = ctx.repository()?;
            let products: Vec<Product> = (0..6).map(generate_product).collect();
            repo.insert_many(&products)?;

            assert!(repo.update(field("stock").lt(3), inc("stock", 10))?);
            let restocked = repo.count_matching(field("stock").gte(10))?;
            assert_eq!(restocked, 3);

            let stamped = repo.count_matching(field("_m").exists(true))?;
            assert_eq!(stamped, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_without_match_is_acknowledged() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Product> = ctx.repository()?;
            repo.insert(&generate_product(1))?;
            assert!(repo.update(field("name").eq("no such product"), set("stock", 0))?);
            assert_eq!(repo.count_matching(field("stock").eq(0))?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_combined_operations() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let person = person_aged("Carol", 25);
            repo.insert(&person)?;

            let update = UpdateDefinition::combine(vec![
                set("last_name", "Jones"),
                inc("age", 2),
                unset("email"),
                set("address.city", "Porto"),
            ]);
            repo.update_by_id(person.base.id(), update)?;

            let stored = repo.get(person.base.id())?.expect("stored person");
            assert_eq!(stored.last_name, "Jones");
            assert_eq!(stored.age, 27);
            assert_eq!(stored.email, None);
            assert_eq!(stored.address.expect("address").city, "Porto");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_single_field_updates() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let alice = person_aged("Alice", 30);
            let bob = person_aged("Bob", 30);
            repo.insert_many(&[alice.clone(), bob.clone()])?;

            let address = Address {
                street: "Rua Augusta".to_string(),
                city: "Lisbon".to_string(),
            };
            repo.update_entity_field(&alice, "address", &address)?;
            repo.update_field(field("first_name").eq("Bob"), "age", &45)?;

            let stored_alice = repo.get(alice.base.id())?.expect("alice");
            assert_eq!(stored_alice.address, Some(address));
            let stored_bob = repo.get(bob.base.id())?.expect("bob");
            assert_eq!(stored_bob.age, 45);
            assert!(stored_bob.base.modified_on() >= stored_bob.base.created_on());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_rejected_updates_leave_documents_untouched() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let person = person_aged("Dan", 33);
            repo.insert(&person)?;

            let err = repo
                .update_entity(&person, set("age", 1).then(inc("first_name", 1)))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidQuery);

            let err = repo
                .update_entity(&person, set("_id", "000000000000000000000000"))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ServerRejected);

            let stored = repo.get(person.base.id())?.expect("stored person");
            assert_eq!(stored.age, 33);
            assert_eq!(stored.base.modified_on(), person.base.id().timestamp());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_current_date_and_typed_set() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Product> = ctx.repository()?;
            let product = generate_product(5);
            repo.insert(&product)?;

            let tags = vec!["sale".to_string(), "new".to_string()];
            repo.update(all(), set_value("tags", &tags)?.then(current_date("_c")))?;

            let stored = repo.get(product.base.id())?.expect("stored product");
            assert_eq!(stored.tags, tags);
            assert!(stored.base.created_on() >= product.base.id().timestamp());
            Ok(())
        },
        cleanup,
    )
}
