use crate::repository::{generate_people, generate_person, Person};
use docrepo::errors::{ErrorKind, RepoResult};
use docrepo::filter::{all, field};
use docrepo::repository::Repository;
use docrepo::retry::{is_transient, Backoff, RetryConfig};
use docrepo_int_test::test_util::{
    cleanup, create_test_context, run_test, Fault, FaultInjector, FlakyDriver, TestContext,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn flaky_repository(
    ctx: &TestContext,
    fault: Fault,
    retry_config: RetryConfig,
) -> RepoResult<(Repository<Person>, Arc<FaultInjector>)> {
    let faults = FaultInjector::new(fault);
    let driver = FlakyDriver::new(ctx.driver().clone(), faults.clone());
    let repo = Repository::<Person>::builder()
        .driver(&driver)
        .connection_string(ctx.connection_string())
        .retry_config(retry_config)
        .build()?;
    Ok((repo, faults))
}

#[test]
fn test_two_transient_failures_then_success() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, faults) = flaky_repository(&ctx, Fault::NetworkIo, RetryConfig::new())?;
            let person = generate_person();

            faults.fail_next(2);
            repo.insert(&person)?;
            assert_eq!(faults.attempts(), 3);

            faults.fail_next(2);
            assert!(repo.get(person.base.id())?.is_some());
            assert_eq!(faults.attempts(), 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_budget_exhausted_after_four_attempts() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, faults) = flaky_repository(&ctx, Fault::NetworkIo, RetryConfig::new())?;

            faults.fail_next(10);
            let err = repo.count().unwrap_err();
            assert_eq!(faults.attempts(), 4);
            assert_eq!(err.kind(), &ErrorKind::ConnectionFailure);
            assert_eq!(err.cause().map(|c| c.kind()), Some(&ErrorKind::NetworkIo));
            assert!(is_transient(&err));

            faults.fail_next(4);
            assert!(repo.find_all().is_err());
            assert_eq!(faults.attempts(), 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_socket_failures_are_transient() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, faults) = flaky_repository(&ctx, Fault::Socket, RetryConfig::new())?;
            repo.insert_many(&generate_people(3))?;

            faults.fail_next(3);
            assert_eq!(repo.find_all()?.count(), 3);
            assert_eq!(faults.attempts(), 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_permanent_failures_are_not_retried() {
    run_test(
        create_test_context,
        |ctx| {
            for fault in [Fault::Rejected, Fault::ConnectionLost] {
                let (repo, faults) = flaky_repository(&ctx, fault, RetryConfig::new())?;
                faults.fail_next(1);
                let err = repo.delete_all().unwrap_err();
                assert!(!is_transient(&err));
                assert_eq!(faults.attempts(), 1);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_any_is_retried_once_as_a_read() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, faults) = flaky_repository(&ctx, Fault::NetworkIo, RetryConfig::new())?;
            repo.insert(&generate_person())?;

            faults.fail_next(3);
            assert!(repo.any(all())?);
            assert_eq!(faults.attempts(), 4);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_writes_run_once_when_write_retries_disabled() {
    run_test(
        create_test_context,
        |ctx| {
            let config = RetryConfig::new().retry_writes(false);
            let (repo, faults) = flaky_repository(&ctx, Fault::NetworkIo, config)?;

            faults.fail_next(1);
            assert!(repo.insert(&generate_person()).is_err());
            assert_eq!(faults.attempts(), 1);

            faults.fail_next(1);
            assert_eq!(repo.count()?, 0);
            assert_eq!(faults.attempts(), 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_custom_retry_budget() {
    run_test(
        create_test_context,
        |ctx| {
            let config = RetryConfig::new().max_retries(6);
            let (repo, faults) = flaky_repository(&ctx, Fault::NetworkIo, config)?;

            faults.fail_next(6);
            assert_eq!(repo.count()?, 0);
            assert_eq!(faults.attempts(), 7);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replace_many_stops_at_first_failure() {
    run_test(
        create_test_context,
        |ctx| {
            let plain: Repository<Person> = ctx.repository()?;
            let mut people = generate_people(3);
            plain.insert_many(&people)?;

            let (repo, faults) = flaky_repository(&ctx, Fault::Rejected, RetryConfig::new())?;
            for person in people.iter_mut() {
                person.last_name = "Replaced".to_string();
            }

            faults.schedule(1, 1);
            let err = repo.replace_many(&people).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ServerRejected);
            assert_eq!(faults.attempts(), 2);

            // the first replace is kept, the rest never ran
            assert_eq!(plain.count_matching(field("last_name").eq("Replaced"))?, 1);
            let first = plain.get(people[0].base.id())?.expect("first person");
            assert_eq!(first.last_name, "Replaced");
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_replace_many_gives_each_element_its_own_budget() {
    run_test(
        create_test_context,
        |ctx| {
            let (repo, faults) = flaky_repository(&ctx, Fault::NetworkIo, RetryConfig::new())?;
            let mut people = generate_people(3);
            repo.insert_many(&people)?;
            for person in people.iter_mut() {
                person.age = 99;
            }

            // the second element uses three of its retries
            faults.schedule(1, 3);
            assert_eq!(repo.replace_many(&people)?, vec![true, true, true]);
            assert_eq!(faults.attempts(), 6);
            assert_eq!(repo.count_matching(field("age").eq(99))?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_fixed_backoff_between_attempts() {
    run_test(
        create_test_context,
        |ctx| {
            let config = RetryConfig::new().backoff(Backoff::Fixed(Duration::from_millis(25)));
            let (repo, faults) = flaky_repository(&ctx, Fault::NetworkIo, config)?;

            faults.fail_next(2);
            let start = Instant::now();
            repo.count()?;
            assert!(start.elapsed() >= Duration::from_millis(50));
            assert_eq!(faults.attempts(), 3);
            Ok(())
        },
        cleanup,
    )
}

#[tokio::test]
async fn test_async_retry_matches_blocking() {
    let ctx = create_test_context().unwrap();
    let (repo, faults) = flaky_repository(&ctx, Fault::NetworkIo, RetryConfig::new()).unwrap();
    let person = generate_person();

    faults.fail_next(2);
    repo.insert_async(&person).await.unwrap();
    assert_eq!(faults.attempts(), 3);

    faults.fail_next(10);
    assert!(repo.count_async().await.is_err());
    assert_eq!(faults.attempts(), 4);

    faults.fail_next(3);
    assert!(repo.any_async(all()).await.unwrap());
    assert_eq!(faults.attempts(), 4);

    cleanup(ctx).unwrap();
}

#[tokio::test]
async fn test_async_permanent_failure_is_not_retried() {
    let ctx = create_test_context().unwrap();
    let (repo, faults) = flaky_repository(&ctx, Fault::Rejected, RetryConfig::new()).unwrap();

    faults.fail_next(1);
    let err = repo.update_async(all(), docrepo::update::inc("age", 1)).await.unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ServerRejected);
    assert_eq!(faults.attempts(), 1);

    cleanup(ctx).unwrap();
}
