//! Shared test support: a wiremock double of the catalog API and a
//! collector wired against it.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfmark::catalog::{Resolver, TmdbProvider};
use shelfmark::config::{CatalogConfig, ScanConfig};
use shelfmark::library::collector::Collector;
use shelfmark::library::metrics::MemoryMetricsStore;
use shelfmark::scanner::Scanner;
use shelfmark::state::LibraryState;

/// A movie the catalog double knows about.
pub struct CatalogMovie {
    pub id: i64,
    pub title: &'static str,
    pub year: &'static str,
}

/// Mount the standard catalog endpoints for one movie: search (matched by
/// query), details, credits, and images.
pub async fn mount_movie(server: &MockServer, movie: &CatalogMovie) {
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("query", movie.title))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": movie.id,
                "title": movie.title,
                "release_date": format!("{}-06-01", movie.year),
                "overview": "overview",
                "poster_path": "/search-poster.jpg"
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/movie/{}", movie.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": movie.id,
            "title": movie.title,
            "overview": "full overview",
            "release_date": format!("{}-06-01", movie.year),
            "runtime": 120,
            "genres": [{"id": 18, "name": "Drama"}],
            "poster_path": "/poster.jpg",
            "backdrop_path": "/backdrop.jpg"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/movie/{}/credits", movie.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cast": [{"name": "Lead Actor", "character": "Hero", "profile_path": "/face.jpg"}],
            "crew": [{"name": "Director Person", "job": "Director", "profile_path": null}]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/movie/{}/images", movie.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posters": [{"file_path": "/poster.jpg"}],
            "backdrops": [{"file_path": "/backdrop.jpg"}],
            "logos": [{"file_path": "/logo.png"}]
        })))
        .mount(server)
        .await;
}

/// Mount `/search/movie` as an empty result set for any query not matched
/// by a more specific mock. Wiremock prefers mocks mounted earlier, so
/// mount this after the per-movie mocks.
pub async fn mount_search_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(server)
        .await;
}

/// Mount the image configuration endpoint. `expected` of `None` means no
/// call-count assertion.
pub async fn mount_configuration(server: &MockServer, expected: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path("/configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": {
                "secure_base_url": "https://image.tmdb.org/t/p/",
                "poster_sizes": ["w92", "w500", "original"],
                "backdrop_sizes": ["w300", "w1280", "original"],
                "logo_sizes": ["w300", "original"],
                "profile_sizes": ["w185", "original"],
                "still_sizes": ["w300", "original"]
            }
        })));

    match expected {
        Some(n) => mock.expect(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

/// Route test logs through the standard env-filtered subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Build a collector whose catalog provider points at the mock server.
pub fn collector_for(server: &MockServer) -> Collector {
    init_tracing();
    let config = CatalogConfig {
        api_key: "test-key".to_string(),
        language: "en-US".to_string(),
        base_url: server.uri(),
    };
    let resolver = Resolver::new(Arc::new(TmdbProvider::new(&config)));
    let scanner = Scanner::new(resolver, Arc::new(MemoryMetricsStore::new()));
    Collector::new(scanner, Arc::new(LibraryState::new()), ScanConfig::default())
}
