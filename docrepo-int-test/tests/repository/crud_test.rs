use crate::repository::{generate_people, generate_person, person_aged, Person};
use chrono::{Duration, TimeZone, Utc};
use docrepo::entity::ObjectId;
use docrepo::errors::ErrorKind;
use docrepo::filter::{all, and, field, or};
use docrepo::repository::Repository;
use docrepo_int_test::test_util::{cleanup, create_test_context, now, run_test};
use std::sync::Arc;
use std::thread;

// =============================================================================
// CREATE
// =============================================================================

#[test]
fn test_insert_and_get() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            assert_eq!(repo.count()?, 0);

            let person = generate_person();
            repo.insert(&person)?;
            assert_eq!(repo.count()?, 1);

            let found = repo.get(person.base.id())?.expect("inserted person");
            assert_eq!(found.first_name, person.first_name);
            assert_eq!(found.address, person.address);
            assert_eq!(found.base.id(), person.base.id());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_get_missing_is_none() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            repo.insert_many(&generate_people(3))?;
            assert!(repo.get(ObjectId::new())?.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unset_timestamps_report_id_time() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let person = generate_person();
            repo.insert(&person)?;

            let found = repo.get(person.base.id())?.expect("inserted person");
            assert_eq!(found.base.created_on(), person.base.id().timestamp());
            assert_eq!(found.base.modified_on(), person.base.id().timestamp());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_caller_set_timestamps_are_kept() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let created = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
            let mut person = generate_person();
            person.base.set_created_on(created);
            person.base.set_modified_on(created + Duration::days(1));
            repo.insert(&person)?;

            let found = repo.get(person.base.id())?.expect("inserted person");
            assert_eq!(found.base.created_on(), created);
            assert_eq!(found.base.modified_on(), created + Duration::days(1));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_duplicate_insert_fails_once() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let person = generate_person();
            repo.insert(&person)?;

            let err = repo.insert(&person).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(repo.count()?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_keeps_entities_before_failure() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let people = generate_people(3);
            let batch = vec![
                people[0].clone(),
                people[1].clone(),
                people[0].clone(),
                people[2].clone(),
            ];

            let err = repo.insert_many(&batch).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::DuplicateKey);
            assert_eq!(repo.count()?, 2);
            assert!(repo.get(people[1].base.id())?.is_some());
            assert!(repo.get(people[2].base.id())?.is_none());
            Ok(())
        },
        cleanup,
    )
}

// =============================================================================
// RETRIEVE
// =============================================================================

#[test]
fn test_find_with_compound_and_nested_filters() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let mut alice = person_aged("Alice", 34);
            alice.address.as_mut().unwrap().city = "Lisbon".to_string();
            let bob = person_aged("Bob", 17);
            let carol = person_aged("Carol", 52);
            repo.insert_many(&[alice, bob, carol])?;

            let adults = repo.find(field("age").gte(18))?.to_vec()?;
            assert_eq!(adults.len(), 2);

            let in_lisbon = repo.find(field("address.city").eq("Lisbon"))?.to_vec()?;
            assert_eq!(in_lisbon.len(), 1);
            assert_eq!(in_lisbon[0].first_name, "Alice");

            let filter = and(vec![field("age").gt(20), field("first_name").ne("Carol")]);
            assert_eq!(repo.count_matching(filter)?, 1);

            let filter = or(vec![field("first_name").eq("Bob"), field("age").gt(50)]);
            assert_eq!(repo.find(filter)?.count(), 2);

            let filter = field("first_name").regex("^[AB]")?;
            assert_eq!(repo.count_matching(filter)?, 2);

            assert_eq!(
                repo.count_matching(field("first_name").in_array(vec!["Alice", "Zed"]))?,
                1
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_all_returns_every_entity() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let people = generate_people(10);
            repo.insert_many(&people)?;

            let all_people = repo.find_all()?.to_vec()?;
            assert_eq!(all_people.len(), 10);
            assert_eq!(repo.find(all())?.count(), 10);
            Ok(())
        },
        cleanup,
    )
}

// =============================================================================
// REPLACE
// =============================================================================

#[test]
fn test_replace_round_trip() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let person = generate_person();
            repo.insert(&person)?;

            let mut changed = repo.get(person.base.id())?.expect("inserted person");
            changed.age += 1;
            changed.email = None;
            let replace_time = now();
            changed.base.touch();
            assert!(repo.replace(&changed)?);

            let stored = repo.get(person.base.id())?.expect("replaced person");
            assert_eq!(stored.age, person.age + 1);
            assert_eq!(stored.email, None);
            assert_eq!(stored.first_name, person.first_name);
            assert_eq!(stored.address, person.address);
            assert_eq!(stored.base.created_on(), person.base.id().timestamp());
            assert!(stored.base.modified_on() > replace_time);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replace_without_touch_keeps_modified_on() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let person = generate_person();
            repo.insert(&person)?;

            let mut changed = person.clone();
            changed.last_name = "Changed".to_string();
            repo.replace(&changed)?;

            let stored = repo.get(person.base.id())?.expect("replaced person");
            assert_eq!(stored.last_name, "Changed");
            assert_eq!(stored.base.modified_on(), person.base.id().timestamp());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replace_of_missing_entity_changes_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            assert!(repo.replace(&generate_person())?);
            assert_eq!(repo.count()?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replace_many_runs_in_order() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let mut people = generate_people(4);
            repo.insert_many(&people)?;

            for (i, person) in people.iter_mut().enumerate() {
                person.age = 100 + i as i64;
            }
            assert_eq!(repo.replace_many(&people)?, vec![true; 4]);

            for person in &people {
                assert_eq!(repo.get(person.base.id())?.expect("stored").age, person.age);
            }
            Ok(())
        },
        cleanup,
    )
}

// =============================================================================
// DELETE
// =============================================================================

#[test]
fn test_delete_variants() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let people = vec![
                person_aged("a", 10),
                person_aged("b", 20),
                person_aged("c", 30),
                person_aged("d", 40),
                person_aged("e", 50),
            ];
            repo.insert_many(&people)?;

            assert!(repo.delete_by_id(people[0].base.id())?);
            assert!(repo.delete_entity(&people[1])?);
            assert_eq!(repo.count()?, 3);

            assert!(repo.delete(field("age").gt(35))?);
            assert_eq!(repo.count()?, 1);

            assert!(repo.delete(field("age").gt(1000))?);
            assert!(repo.delete_by_id(ObjectId::new())?);
            assert_eq!(repo.count()?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_all_twice_is_acknowledged() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            repo.insert_many(&generate_people(5))?;

            assert!(repo.delete_all()?);
            assert_eq!(repo.count()?, 0);
            assert!(repo.delete_all()?);
            assert_eq!(repo.count()?, 0);
            Ok(())
        },
        cleanup,
    )
}

// =============================================================================
// UTILITY
// =============================================================================

#[test]
fn test_any_agrees_with_find() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            let filters = || {
                vec![
                    all(),
                    field("age").gte(30),
                    field("first_name").eq("Nobody"),
                    field("email").exists(true),
                ]
            };

            for filter in filters() {
                assert_eq!(repo.any(filter.clone())?, repo.find(filter)?.next().is_some());
            }

            repo.insert_many(&[person_aged("Young", 20), person_aged("Old", 60)])?;
            for filter in filters() {
                assert_eq!(repo.any(filter.clone())?, repo.find(filter)?.next().is_some());
            }
            assert!(repo.any(field("age").gte(30))?);
            assert!(!repo.any(field("first_name").eq("Nobody"))?);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_count_matches_find() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            repo.insert_many(&generate_people(20))?;

            let filter = field("age").lt(40);
            assert_eq!(repo.count_matching(filter.clone())?, repo.find(filter)?.count() as u64);
            assert_eq!(repo.count()?, 20);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_repository_shared_across_threads() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Arc<Repository<Person>> = Arc::new(ctx.repository()?);

            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let repo = repo.clone();
                    thread::spawn(move || {
                        for person in generate_people(25) {
                            repo.insert(&person)?;
                            repo.get(person.base.id())?;
                        }
                        Ok::<(), docrepo::errors::RepoError>(())
                    })
                })
                .collect();

            for handle in handles {
                handle.join().expect("worker thread panicked")?;
            }
            assert_eq!(repo.count()?, 100);
            Ok(())
        },
        cleanup,
    )
}
