use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

/// Schema statements, executed one at a time.
const MIGRATIONS: &[&str] = &[
    // 0001_jobs.sql
    r#"CREATE TABLE IF NOT EXISTS jobs (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        url VARCHAR NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        company TEXT NOT NULL DEFAULT '',
        location TEXT NOT NULL DEFAULT '',
        employment_type TEXT NOT NULL DEFAULT '',
        posting_date TIMESTAMPTZ,
        expiration_date TIMESTAMPTZ,
        is_active BOOLEAN NOT NULL DEFAULT FALSE,
        job_categories TEXT[] NOT NULL DEFAULT '{}',
        must_skills TEXT[] NOT NULL DEFAULT '{}',
        optional_skills TEXT[] NOT NULL DEFAULT '{}',
        salary TEXT NOT NULL DEFAULT '',
        years_of_experience INTEGER NOT NULL DEFAULT 0,
        education_level TEXT NOT NULL DEFAULT '',
        benefits TEXT[] NOT NULL DEFAULT '{}',
        company_size INTEGER NOT NULL DEFAULT 0,
        work_culture TEXT NOT NULL DEFAULT '',
        remote BOOLEAN NOT NULL DEFAULT FALSE,
        languages TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT uq_jobs_url UNIQUE (url)
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_jobs_created_at ON jobs(created_at DESC)"#,
];

/// Spins up a PostgreSQL container and returns a connected pool.
///
/// The `ContainerAsync` must be kept in scope for the test duration.
/// Dropping it will stop the container.
pub async fn setup_test_db() -> (PgPool, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "jobscraper_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let connection_string = format!("postgresql://postgres:postgres@{host}:{port}/jobscraper_test");

    // Retry connection until container is fully ready
    const MAX_RETRIES: u32 = 30;
    let mut retries = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    panic!("Failed to connect to database after {MAX_RETRIES} retries: {e}");
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    };

    // Run migrations one statement at a time
    for migration in MIGRATIONS {
        sqlx::query(migration)
            .execute(&pool)
            .await
            .expect("Failed to run migration");
    }

    (pool, container)
}
