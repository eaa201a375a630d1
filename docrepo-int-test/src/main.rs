use docrepo::entity::EntityBase;
use docrepo::errors::RepoResult;
use docrepo::filter::field;
use docrepo::repository::Repository;
use docrepo::update::set;
use docrepo_int_test::test_util::{cleanup, create_test_context};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct StressRecord {
    #[serde(flatten)]
    pub base: EntityBase,
    pub first_name: String,
    pub last_name: String,
    pub processed: bool,
    pub failed: bool,
}
docrepo::impl_entity!(StressRecord);

fn main() -> RepoResult<()> {
    colog::init();
    println!("Starting stress test...");
    let ctx = create_test_context()?;
    let repo: Repository<StressRecord> = ctx.repository()?;

    let count = 100_000;
    let start = std::time::Instant::now();
    for _ in 0..count {
        repo.insert(&StressRecord {
            base: EntityBase::new(),
            first_name: uuid::Uuid::new_v4().to_string(),
            last_name: uuid::Uuid::new_v4().to_string(),
            processed: false,
            failed: false,
        })?;
    }
    println!("Inserted {} records in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let pending = repo.find(field("failed").eq(false))?.count();
    println!("Read {} records in {:?}", pending, start.elapsed());

    let start = std::time::Instant::now();
    repo.update(field("processed").eq(false), set("processed", true))?;
    println!("Updated all records in {:?}", start.elapsed());

    let start = std::time::Instant::now();
    let processed = repo.count_matching(field("processed").eq(true))?;
    println!("Counted {} processed records in {:?}", processed, start.elapsed());

    cleanup(ctx)
}
