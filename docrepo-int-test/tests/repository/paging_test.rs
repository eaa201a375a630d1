use crate::repository::{person_aged, Person};
use docrepo::errors::RepoResult;
use docrepo::filter::{all, field, Filter};
use docrepo::repository::{EntityCursor, Repository};
use docrepo_int_test::test_util::{cleanup, create_test_context, run_test, TestContext};

/// Five people inserted in id order, ages descending so that age order and id order differ.
fn seed(ctx: &TestContext) -> RepoResult<(Repository<Person>, Vec<Person>)> {
    let repo: Repository<Person> = ctx.repository()?;
    let people = vec![
        person_aged("p0", 50),
        person_aged("p1", 40),
        person_aged("p2", 30),
        person_aged("p3", 20),
        person_aged("p4", 10),
    ];
    repo.insert_many(&people)?;
    Ok((repo, people))
}

fn names(cursor: EntityCursor<Person>) -> RepoResult<Vec<String>> {
    Ok(cursor.to_vec()?.into_iter().map(|p| p.first_name).collect())
}

#[test]
fn test_find_page_is_one_based() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, _) = seed(&ctx)?;
            assert_eq!(names(repo.find_page(all(), 1, 2)?)?, vec!["p0", "p1"]);
            assert_eq!(names(repo.find_page(all(), 2, 2)?)?, vec!["p2", "p3"]);
            assert_eq!(names(repo.find_page(all(), 3, 2)?)?, vec!["p4"]);
            assert!(names(repo.find_page(all(), 4, 2)?)?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_all_page_is_zero_based() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, _) = seed(&ctx)?;
            assert_eq!(names(repo.find_all_page(0, 2)?)?, vec!["p0", "p1"]);
            assert_eq!(names(repo.find_all_page(1, 2)?)?, vec!["p2", "p3"]);
            assert_eq!(names(repo.find_all_page(2, 2)?)?, vec!["p4"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_page_zero_of_find_page_is_first_page() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, _) = seed(&ctx)?;
            assert_eq!(names(repo.find_page(all(), 0, 2)?)?, vec!["p0", "p1"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_empty_page_size() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, _) = seed(&ctx)?;
            assert!(names(repo.find_page(all(), 1, 0)?)?.is_empty());
            assert!(names(repo.find_all_page(0, 0)?)?.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_paging_applies_filter_before_skip() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, _) = seed(&ctx)?;
            let filter = field("age").lte(40);
            assert_eq!(names(repo.find_page(filter.clone(), 1, 2)?)?, vec!["p1", "p2"]);
            assert_eq!(names(repo.find_page(filter, 2, 2)?)?, vec!["p3", "p4"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_paging_by_field() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, _) = seed(&ctx)?;
            assert_eq!(
                names(repo.find_page_by(all(), "age", 1, 2, false)?)?,
                vec!["p4", "p3"]
            );
            assert_eq!(
                names(repo.find_page_by(all(), "age", 2, 2, true)?)?,
                vec!["p2", "p3"]
            );
            assert_eq!(
                names(repo.find_all_page_by("age", 0, 3, false)?)?,
                vec!["p4", "p3", "p2"]
            );
            assert_eq!(
                names(repo.find_all_page_by("first_name", 1, 3, true)?)?,
                vec!["p1", "p0"]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_first_and_last_follow_id_order() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, people) = seed(&ctx)?;
            assert_eq!(repo.first()?.map(|p| p.base.id()), Some(people[0].base.id()));
            assert_eq!(repo.last()?.map(|p| p.base.id()), Some(people[4].base.id()));

            let filter = field("age").gte(30);
            assert_eq!(repo.first_matching(filter.clone())?.unwrap().first_name, "p0");
            assert_eq!(repo.last_matching(filter)?.unwrap().first_name, "p2");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_last_by_inverts_first_by() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, _) = seed(&ctx)?;
            let filters: Vec<Filter> = vec![all(), field("age").gt(15), field("age").lt(45)];
            for filter in filters {
                for order in ["_id", "age", "first_name"] {
                    for descending in [false, true] {
                        assert_eq!(
                            repo.last_by(filter.clone(), order, descending)?,
                            repo.first_by(filter.clone(), order, !descending)?
                        );
                    }
                }
            }

            // an explicit `false` means "largest first", not ascending
            assert_eq!(repo.last_by(all(), "age", false)?.unwrap().first_name, "p0");
            assert_eq!(repo.last_by(all(), "age", true)?.unwrap().first_name, "p4");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_first_and_last_on_empty_collection() {
    run_test(
        create_test_context,
        |ctx| {
            let repo: Repository<Person> = ctx.repository()?;
            assert!(repo.first()?.is_none());
            assert!(repo.last()?.is_none());
            assert!(repo.first_matching(all())?.is_none());
            assert!(repo.last_by(all(), "age", true)?.is_none());
            Ok(())
        },
        cleanup,
    )
}
