use chrono::{TimeZone, Utc};
use jobscraper_core::error::AppError;
use jobscraper_core::models::Job;
use jobscraper_core::traits::JobStore;
use jobscraper_db::{Database, PgJobStore};

use crate::integration::common::setup_test_db;

fn enriched(url: &str) -> Job {
    Job {
        url: url.into(),
        title: "Backend Engineer".into(),
        description: "Build services".into(),
        company: "Acme AG".into(),
        location: "Zürich".into(),
        employment_type: "Full-time".into(),
        posting_date: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
        expiration_date: None,
        is_active: true,
        job_categories: vec!["IT".into()],
        must_skills: vec!["Rust".into(), "SQL".into()],
        optional_skills: vec![],
        salary: "120000".into(),
        years_of_experience: 3,
        education_level: "Bachelor".into(),
        benefits: vec!["Gym".into()],
        company_size: 250,
        work_culture: "Hybrid".into(),
        remote: true,
        languages: vec!["German".into(), "English".into()],
    }
}

#[tokio::test]
async fn save_and_list_job() {
    let (pool, _container) = setup_test_db().await;
    let store = PgJobStore::new(pool);

    let job = enriched("https://www.jobs.ch/job/1");
    store.save_job(&job).await.unwrap();

    let jobs = store.list_jobs(10).await.unwrap();
    assert_eq!(jobs, vec![job]);
    assert_eq!(store.count_jobs().await.unwrap(), 1);
}

#[tokio::test]
async fn existing_urls_reflect_saved_jobs() {
    let (pool, _container) = setup_test_db().await;
    let store = PgJobStore::new(pool);

    assert!(store.get_existing_urls().await.unwrap().is_empty());

    store.save_job(&Job::raw("https://a", "")).await.unwrap();
    store.save_job(&Job::raw("https://b", "")).await.unwrap();

    let urls = store.get_existing_urls().await.unwrap();
    assert_eq!(urls.len(), 2);
    assert!(urls.contains("https://a"));
    assert!(urls.contains("https://b"));
}

#[tokio::test]
async fn duplicate_url_is_rejected() {
    let (pool, _container) = setup_test_db().await;
    let store = PgJobStore::new(pool);

    store.save_job(&enriched("https://dup")).await.unwrap();
    let err = store.save_job(&enriched("https://dup")).await.unwrap_err();

    assert!(matches!(err, AppError::DatabaseError(ref m) if m.contains("already stored")));
    assert_eq!(store.count_jobs().await.unwrap(), 1);
}

#[tokio::test]
async fn list_is_newest_first_and_limited() {
    let (pool, _container) = setup_test_db().await;
    let store = PgJobStore::new(pool);

    for i in 0..3 {
        store
            .save_job(&Job::raw(format!("https://job/{i}"), ""))
            .await
            .unwrap();
        // Small delay to ensure different timestamps
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let jobs = store.list_jobs(2).await.unwrap();
    let urls: Vec<&str> = jobs.iter().map(|j| j.url.as_str()).collect();
    assert_eq!(urls, vec!["https://job/2", "https://job/1"]);
}

#[tokio::test]
async fn database_health_check() {
    let (pool, _container) = setup_test_db().await;
    let db = Database::from_pool(pool);

    db.health_check().await.unwrap();
    assert_eq!(db.job_store().count_jobs().await.unwrap(), 0);
}
