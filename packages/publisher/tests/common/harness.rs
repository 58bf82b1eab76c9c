//! Test harness with testcontainers for Postgres-backed tests.
//!
//! One container is shared across all tests in a binary. It starts and runs
//! migrations on first use, then every harness gets a fresh pool against it.

use std::sync::Arc;

use anyhow::{Context, Result};
use publisher_core::kernel::test_dependencies::{MockGenerator, RecordingNotifier};
use publisher_core::kernel::{InMemoryRateLimitStore, ServerDeps};
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Route test logs through the test writer. Safe to call from every test.
///
/// Run tests with: RUST_LOG=debug cargo test -- --nocapture
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        init_tracing();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Postgres-backed dependencies with a scripted generator and notifier.
///
/// The database is shared, so tests must not assume an empty queue; assert
/// on the rows they created.
pub struct TestHarness {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
    pub generator: Arc<MockGenerator>,
    pub notifier: Arc<RecordingNotifier>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;

        let generator = Arc::new(MockGenerator::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let deps = Arc::new(ServerDeps::with_postgres(
            db_pool.clone(),
            generator.clone(),
            notifier.clone(),
            Arc::new(InMemoryRateLimitStore::new()),
            Vec::new(),
        ));

        Ok(Self {
            db_pool,
            deps,
            generator,
            notifier,
        })
    }
}
