use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docrepo::common::Document;
use docrepo::config::ConnectionStrings;
use docrepo::entity::Entity;
use docrepo::errors::{ErrorKind, RepoError, RepoResult};
use docrepo::filter::Filter;
use docrepo::repository::Repository;
use docrepo::store::memory::InMemoryDriver;
use docrepo::store::{
    DeleteResult, DocumentCollection, DocumentCollectionProvider, DocumentCursor, FindOptions,
    InsertManyResult, InsertOneResult, StoreClient, StoreClientProvider, StoreDatabase,
    StoreDatabaseProvider, StoreDriver, StoreUrl, UpdateResult,
};
use docrepo::update::UpdateDefinition;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Runs a test once with error handling.
/// Tests run on the current thread; `after` runs whether the test body fails or not.
/// A failure is never rerun, so attempt counts asserted by a test stay exact.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> RepoResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> RepoResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> RepoResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => {
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| test(ctx.clone())));
                let after_run = after(ctx);
                match outcome {
                    Ok(Ok(_)) => after_run
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Ok(Err(e)) => Err((format!("Test failed: {:?}", e), backtrace.to_string())),
                    Err(panic_err) => std::panic::resume_unwind(panic_err),
                }
            }
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let elapsed = start_time.elapsed();

    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", err_msg), Backtrace::capture().to_string())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", elapsed);
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed. Error: {}", error);
}

/// A private in-memory database for one test.
#[derive(Clone)]
pub struct TestContext {
    driver: InMemoryDriver,
    connection_string: String,
}

impl TestContext {
    pub fn new(driver: InMemoryDriver, connection_string: String) -> Self {
        Self {
            driver,
            connection_string,
        }
    }

    pub fn driver(&self) -> &InMemoryDriver {
        &self.driver
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Configuration mapping every given connection name to this context's database.
    pub fn config(&self, connection_names: &[&str]) -> ConnectionStrings {
        connection_names
            .iter()
            .map(|name| (*name, self.connection_string.as_str()))
            .collect()
    }

    pub fn repository<T: Entity>(&self) -> RepoResult<Repository<T>> {
        Repository::from_connection_string(&self.driver, &self.connection_string)
    }
}

pub fn random_database() -> String {
    format!("test_{}", uuid::Uuid::new_v4().simple())
}

pub fn create_test_context() -> RepoResult<TestContext> {
    let connection_string = format!("memory://localhost/{}", random_database());
    Ok(TestContext::new(InMemoryDriver::new(), connection_string))
}

pub fn cleanup(ctx: TestContext) -> RepoResult<()> {
    let url = StoreUrl::parse(ctx.connection_string())?;
    ctx.driver().connect(&url)?.drop_database(url.database())
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// The failure a [`FaultInjector`] reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Connection failure caused by network I/O; transient.
    NetworkIo,
    /// Connection failure caused by a socket error; transient.
    Socket,
    /// Connection failure with no network cause; permanent.
    ConnectionLost,
    /// Store refusal; permanent.
    Rejected,
}

impl Fault {
    fn error(&self) -> RepoError {
        match self {
            Fault::NetworkIo => RepoError::network_io("injected network failure"),
            Fault::Socket => RepoError::socket_failure("injected socket failure"),
            Fault::ConnectionLost => {
                RepoError::new("injected connection loss", ErrorKind::ConnectionFailure)
            }
            Fault::Rejected => RepoError::new("injected rejection", ErrorKind::ServerRejected),
        }
    }
}

/// Counts collection calls and fails a scheduled run of them.
///
/// After [`schedule`](Self::schedule), the next `pass` calls succeed, the `fail` calls
/// after them return the fault, and every later call succeeds again.
pub struct FaultInjector {
    fault: Fault,
    pass_left: AtomicU32,
    fail_left: AtomicU32,
    attempts: AtomicU32,
}

impl FaultInjector {
    pub fn new(fault: Fault) -> Arc<Self> {
        Arc::new(FaultInjector {
            fault,
            pass_left: AtomicU32::new(0),
            fail_left: AtomicU32::new(0),
            attempts: AtomicU32::new(0),
        })
    }

    pub fn schedule(&self, pass: u32, fail: u32) {
        self.pass_left.store(pass, Ordering::SeqCst);
        self.fail_left.store(fail, Ordering::SeqCst);
        self.attempts.store(0, Ordering::SeqCst);
    }

    pub fn fail_next(&self, fail: u32) {
        self.schedule(0, fail);
    }

    /// Collection calls seen since the last schedule.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn check(&self) -> RepoResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.pass_left) {
            return Ok(());
        }
        if take_one(&self.fail_left) {
            return Err(self.fault.error());
        }
        Ok(())
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// A driver whose collections consult a [`FaultInjector`] before every call.
#[derive(Clone)]
pub struct FlakyDriver {
    inner: InMemoryDriver,
    faults: Arc<FaultInjector>,
}

impl FlakyDriver {
    pub fn new(inner: InMemoryDriver, faults: Arc<FaultInjector>) -> Self {
        FlakyDriver { inner, faults }
    }
}

impl StoreDriver for FlakyDriver {
    fn connect(&self, url: &StoreUrl) -> RepoResult<StoreClient> {
        Ok(StoreClient::new(FlakyClient {
            inner: self.inner.connect(url)?,
            faults: self.faults.clone(),
        }))
    }
}

struct FlakyClient {
    inner: StoreClient,
    faults: Arc<FaultInjector>,
}

impl StoreClientProvider for FlakyClient {
    fn database(&self, name: &str) -> RepoResult<StoreDatabase> {
        Ok(StoreDatabase::new(FlakyDatabase {
            inner: self.inner.database(name)?,
            faults: self.faults.clone(),
        }))
    }

    fn database_names(&self) -> RepoResult<Vec<String>> {
        self.inner.database_names()
    }

    fn drop_database(&self, name: &str) -> RepoResult<()> {
        self.inner.drop_database(name)
    }
}

struct FlakyDatabase {
    inner: StoreDatabase,
    faults: Arc<FaultInjector>,
}

impl StoreDatabaseProvider for FlakyDatabase {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn collection(&self, name: &str) -> RepoResult<DocumentCollection> {
        Ok(DocumentCollection::new(FlakyCollection {
            inner: self.inner.collection(name)?,
            faults: self.faults.clone(),
        }))
    }

    fn collection_names(&self) -> RepoResult<Vec<String>> {
        self.inner.collection_names()
    }

    fn drop_collection(&self, name: &str) -> RepoResult<()> {
        self.inner.drop_collection(name)
    }
}

struct FlakyCollection {
    inner: DocumentCollection,
    faults: Arc<FaultInjector>,
}

#[async_trait]
impl DocumentCollectionProvider for FlakyCollection {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn insert_one(&self, document: Document) -> RepoResult<InsertOneResult> {
        self.faults.check()?;
        self.inner.insert_one(document)
    }

    fn insert_many(&self, documents: Vec<Document>) -> RepoResult<InsertManyResult> {
        self.faults.check()?;
        self.inner.insert_many(documents)
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> RepoResult<DocumentCursor> {
        self.faults.check()?;
        self.inner.find(filter, options)
    }

    fn update_many(&self, filter: &Filter, update: &UpdateDefinition) -> RepoResult<UpdateResult> {
        self.faults.check()?;
        self.inner.update_many(filter, update)
    }

    fn replace_one(&self, filter: &Filter, replacement: Document) -> RepoResult<UpdateResult> {
        self.faults.check()?;
        self.inner.replace_one(filter, replacement)
    }

    fn delete_one(&self, filter: &Filter) -> RepoResult<DeleteResult> {
        self.faults.check()?;
        self.inner.delete_one(filter)
    }

    fn delete_many(&self, filter: &Filter) -> RepoResult<DeleteResult> {
        self.faults.check()?;
        self.inner.delete_many(filter)
    }

    fn count(&self, filter: &Filter) -> RepoResult<u64> {
        self.faults.check()?;
        self.inner.count(filter)
    }

    async fn insert_one_async(&self, document: Document) -> RepoResult<InsertOneResult> {
        self.faults.check()?;
        self.inner.insert_one_async(document).await
    }

    async fn insert_many_async(&self, documents: Vec<Document>) -> RepoResult<InsertManyResult> {
        self.faults.check()?;
        self.inner.insert_many_async(documents).await
    }

    async fn find_async(&self, filter: &Filter, options: &FindOptions) -> RepoResult<Vec<Document>> {
        self.faults.check()?;
        self.inner.find_async(filter, options).await
    }

    async fn update_many_async(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
    ) -> RepoResult<UpdateResult> {
        self.faults.check()?;
        self.inner.update_many_async(filter, update).await
    }

    async fn replace_one_async(&self, filter: &Filter, replacement: Document) -> RepoResult<UpdateResult> {
        self.faults.check()?;
        self.inner.replace_one_async(filter, replacement).await
    }

    async fn delete_one_async(&self, filter: &Filter) -> RepoResult<DeleteResult> {
        self.faults.check()?;
        self.inner.delete_one_async(filter).await
    }

    async fn delete_many_async(&self, filter: &Filter) -> RepoResult<DeleteResult> {
        self.faults.check()?;
        self.inner.delete_many_async(filter).await
    }

    async fn count_async(&self, filter: &Filter) -> RepoResult<u64> {
        self.faults.check()?;
        self.inner.count_async(filter).await
    }
}
