//! A migrated database, a pool over it and a runtime to drive the adapters.
//!
//! Suites stay synchronous and `block_on` the shared runtime, so the cluster
//! bootstrap never runs inside a Tokio context.

use backend::outbound::persistence::{DbPool, PoolConfig};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::fixture;
use tokio::runtime::Runtime;

use crate::cluster_skip::handle_cluster_setup_failure;
use crate::embedded_postgres::provision_template_database;
use crate::pg_embed::shared_cluster;

pub struct PostgresWorld {
    pub runtime: Runtime,
    pub pool: DbPool,
    pub database_url: String,
    _database: TemporaryDatabase,
}

impl PostgresWorld {
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

fn setup() -> Result<PostgresWorld, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_template_database(cluster)?;
    let database_url = database.url().to_string();
    let config = PoolConfig::new(&database_url)
        .with_max_size(4)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    Ok(PostgresWorld {
        runtime,
        pool,
        database_url,
        _database: database,
    })
}

/// `None` when the cluster is unavailable and `SKIP_TEST_CLUSTER` is set.
#[fixture]
pub fn postgres_world() -> Option<PostgresWorld> {
    match setup() {
        Ok(world) => Some(world),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}
