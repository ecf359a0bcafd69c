//! TMDB (The Movie Database) catalog provider.
//!
//! Implements [`CatalogProvider`] by querying the TMDB v3 REST API.
//!
//! Features:
//! - Token-bucket rate limiting at 4 requests / second via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - 30-second request timeout.
//! - Confidence scoring based on title similarity and year proximity.
//! - Injectable base URL so tests can point the client at a local double.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use shelfmark_common::{CatalogId, MediaKind};
use tracing::{debug, warn};

use super::image_config::ImageConfiguration;
use super::provider::{
    CatalogError, CatalogProvider, CatalogRecord, Credit, CreditList, EpisodeRecord, ImageSet,
    SearchHit, SeasonRecord,
};
use crate::config::CatalogConfig;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;

// ---------------------------------------------------------------------------
// TMDB API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieSearchResult {
    id: i64,
    title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvSearchResult {
    id: i64,
    name: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetail {
    id: i64,
    title: Option<String>,
    overview: Option<String>,
    release_date: Option<String>,
    runtime: Option<u32>,
    genres: Option<Vec<TmdbGenre>>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbTvDetail {
    id: i64,
    name: Option<String>,
    overview: Option<String>,
    first_air_date: Option<String>,
    episode_run_time: Option<Vec<u32>>,
    genres: Option<Vec<TmdbGenre>>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbCreditsResponse {
    cast: Option<Vec<TmdbCastMember>>,
    crew: Option<Vec<TmdbCrewMember>>,
}

#[derive(Debug, Deserialize)]
struct TmdbCastMember {
    name: String,
    character: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbCrewMember {
    name: String,
    job: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbImagesResponse {
    posters: Option<Vec<TmdbImage>>,
    backdrops: Option<Vec<TmdbImage>>,
    logos: Option<Vec<TmdbImage>>,
}

#[derive(Debug, Deserialize)]
struct TmdbImage {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonResponse {
    id: i64,
    season_number: u32,
    name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    episodes: Option<Vec<TmdbSeasonEpisode>>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonEpisode {
    id: i64,
    episode_number: u32,
    name: Option<String>,
    overview: Option<String>,
    still_path: Option<String>,
    runtime: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TmdbConfigurationResponse {
    images: TmdbImageConfiguration,
}

#[derive(Debug, Deserialize)]
struct TmdbImageConfiguration {
    secure_base_url: String,
    #[serde(default)]
    poster_sizes: Vec<String>,
    #[serde(default)]
    backdrop_sizes: Vec<String>,
    #[serde(default)]
    logo_sizes: Vec<String>,
    #[serde(default)]
    profile_sizes: Vec<String>,
    #[serde(default)]
    still_sizes: Vec<String>,
}

/// Pick a preferred size bucket, falling back to `original`.
fn pick_size(sizes: &[String], preferred: &str) -> String {
    if sizes.iter().any(|s| s == preferred) {
        preferred.to_string()
    } else {
        "original".to_string()
    }
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB catalog provider.
///
/// Wraps the TMDB v3 REST API with built-in rate limiting, retry logic, and
/// confidence-scored search results.
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbProvider {
    /// Create a new TMDB provider from catalog configuration.
    ///
    /// Rate limiting is configured at 4 requests per second.
    pub fn new(config: &CatalogConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        let quota = Quota::per_second(NonZeroU32::new(4).unwrap());
        let rate_limiter = RateLimiter::direct(quota);

        Self {
            client,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        }
    }

    /// Execute a GET request with rate limiting and 429-retry logic.
    async fn get(&self, url: &str) -> Result<reqwest::Response, CatalogError> {
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self.client.get(url).send().await?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    retry = retries,
                    wait_secs = wait,
                    "TMDB returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            if !resp.status().is_success() {
                return Err(CatalogError::Status {
                    status: resp.status(),
                    url: url.to_string(),
                });
            }

            return Ok(resp);
        }
    }

    /// GET a URL and decode its JSON body.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        self.get(url)
            .await?
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.to_string()))
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language={}",
            self.base_url, self.api_key, self.language
        );
        for (key, value) in extra_params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoded(value));
        }
        url
    }

    /// Compute confidence score for a search result based on title similarity
    /// and year proximity.
    fn confidence(
        query_title: &str,
        result_title: &str,
        query_year: Option<u16>,
        result_year: Option<u16>,
    ) -> f64 {
        // Title scoring
        let base = if query_title == result_title {
            0.5
        } else if query_title.eq_ignore_ascii_case(result_title) {
            0.4
        } else if result_title
            .to_ascii_lowercase()
            .contains(&query_title.to_ascii_lowercase())
        {
            0.2
        } else {
            0.1
        };

        // Year scoring
        let year_bonus = match (query_year, result_year) {
            (Some(q), Some(r)) if q == r => 0.3,
            (Some(q), Some(r)) if q.abs_diff(r) <= 1 => 0.15,
            _ => 0.0,
        };

        base + year_bonus
    }

    fn sort_by_confidence(results: &mut [SearchHit]) {
        results.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// Minimal percent-encoding for query parameter values.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Extract a four-digit year from a date string like `"2023-04-15"`.
fn parse_year(date: &Option<String>) -> Option<u16> {
    date.as_deref()
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse::<u16>().ok())
}

fn paths_of(images: Option<Vec<TmdbImage>>) -> Vec<String> {
    images
        .unwrap_or_default()
        .into_iter()
        .map(|i| i.file_path)
        .collect()
}

#[async_trait]
impl CatalogProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn search(
        &self,
        title: &str,
        year: Option<u16>,
        kind: MediaKind,
    ) -> Result<Vec<SearchHit>, CatalogError> {
        match kind {
            MediaKind::Movies | MediaKind::Music => {
                let mut params = vec![("query", title)];
                let year_str = year.map(|y| y.to_string());
                if let Some(ref y) = year_str {
                    params.push(("year", y.as_str()));
                }

                let url = self.url("/search/movie", &params);
                debug!(url = %url, "TMDB search movie");

                let body: TmdbSearchResponse<TmdbMovieSearchResult> = self.get_json(&url).await?;

                let mut results: Vec<SearchHit> = body
                    .results
                    .into_iter()
                    .map(|r| {
                        let result_title = r.title.unwrap_or_default();
                        let result_year = parse_year(&r.release_date);
                        let confidence =
                            Self::confidence(title, &result_title, year, result_year);
                        SearchHit {
                            id: CatalogId::from(r.id),
                            title: result_title,
                            year: result_year,
                            overview: r.overview,
                            confidence,
                            poster_path: r.poster_path,
                        }
                    })
                    .collect();

                Self::sort_by_confidence(&mut results);
                Ok(results)
            }
            MediaKind::TvShows => {
                let url = self.url("/search/tv", &[("query", title)]);
                debug!(url = %url, "TMDB search TV");

                let body: TmdbSearchResponse<TmdbTvSearchResult> = self.get_json(&url).await?;

                let mut results: Vec<SearchHit> = body
                    .results
                    .into_iter()
                    .map(|r| {
                        let result_title = r.name.unwrap_or_default();
                        let result_year = parse_year(&r.first_air_date);
                        let confidence =
                            Self::confidence(title, &result_title, year, result_year);
                        SearchHit {
                            id: CatalogId::from(r.id),
                            title: result_title,
                            year: result_year,
                            overview: r.overview,
                            confidence,
                            poster_path: r.poster_path,
                        }
                    })
                    .collect();

                Self::sort_by_confidence(&mut results);
                Ok(results)
            }
        }
    }

    async fn details(&self, id: CatalogId, kind: MediaKind) -> Result<CatalogRecord, CatalogError> {
        match kind {
            MediaKind::Movies | MediaKind::Music => {
                let url = self.url(&format!("/movie/{}", id.value()), &[]);
                debug!(url = %url, "TMDB get movie details");

                let detail: TmdbMovieDetail = self.get_json(&url).await?;

                Ok(CatalogRecord {
                    id: CatalogId::from(detail.id),
                    title: detail.title.unwrap_or_default(),
                    year: parse_year(&detail.release_date),
                    overview: detail.overview,
                    runtime_minutes: detail.runtime,
                    genres: detail
                        .genres
                        .unwrap_or_default()
                        .into_iter()
                        .map(|g| g.name)
                        .collect(),
                    poster_path: detail.poster_path,
                    backdrop_path: detail.backdrop_path,
                })
            }
            MediaKind::TvShows => {
                let url = self.url(&format!("/tv/{}", id.value()), &[]);
                debug!(url = %url, "TMDB get TV details");

                let detail: TmdbTvDetail = self.get_json(&url).await?;

                Ok(CatalogRecord {
                    id: CatalogId::from(detail.id),
                    title: detail.name.unwrap_or_default(),
                    year: parse_year(&detail.first_air_date),
                    overview: detail.overview,
                    runtime_minutes: detail
                        .episode_run_time
                        .as_ref()
                        .and_then(|v| v.first().copied()),
                    genres: detail
                        .genres
                        .unwrap_or_default()
                        .into_iter()
                        .map(|g| g.name)
                        .collect(),
                    poster_path: detail.poster_path,
                    backdrop_path: detail.backdrop_path,
                })
            }
        }
    }

    async fn credits(&self, id: CatalogId, kind: MediaKind) -> Result<CreditList, CatalogError> {
        let path = match kind {
            MediaKind::Movies | MediaKind::Music => format!("/movie/{}/credits", id.value()),
            MediaKind::TvShows => format!("/tv/{}/credits", id.value()),
        };
        let url = self.url(&path, &[]);
        debug!(url = %url, "TMDB get credits");

        let resp: TmdbCreditsResponse = self.get_json(&url).await?;

        Ok(CreditList {
            cast: resp
                .cast
                .unwrap_or_default()
                .into_iter()
                .map(|c| Credit {
                    name: c.name,
                    role: c.character,
                    profile_path: c.profile_path,
                })
                .collect(),
            crew: resp
                .crew
                .unwrap_or_default()
                .into_iter()
                .map(|c| Credit {
                    name: c.name,
                    role: c.job,
                    profile_path: c.profile_path,
                })
                .collect(),
        })
    }

    async fn images(&self, id: CatalogId, kind: MediaKind) -> Result<ImageSet, CatalogError> {
        let path = match kind {
            MediaKind::Movies | MediaKind::Music => format!("/movie/{}/images", id.value()),
            MediaKind::TvShows => format!("/tv/{}/images", id.value()),
        };
        let url = self.url(&path, &[]);
        debug!(url = %url, "TMDB get images");

        let resp: TmdbImagesResponse = self.get_json(&url).await?;

        Ok(ImageSet {
            posters: paths_of(resp.posters),
            logos: paths_of(resp.logos),
            backdrops: paths_of(resp.backdrops),
        })
    }

    async fn season(&self, show: CatalogId, number: u32) -> Result<SeasonRecord, CatalogError> {
        let url = self.url(&format!("/tv/{}/season/{}", show.value(), number), &[]);
        debug!(url = %url, "TMDB get season");

        let resp: TmdbSeasonResponse = self.get_json(&url).await?;

        Ok(SeasonRecord {
            id: CatalogId::from(resp.id),
            season_number: resp.season_number,
            title: resp.name.unwrap_or_else(|| format!("Season {number}")),
            overview: resp.overview,
            poster_path: resp.poster_path,
            episodes: resp
                .episodes
                .unwrap_or_default()
                .into_iter()
                .map(|e| EpisodeRecord {
                    id: CatalogId::from(e.id),
                    episode_number: e.episode_number,
                    title: e.name.unwrap_or_default(),
                    overview: e.overview,
                    still_path: e.still_path,
                    runtime_minutes: e.runtime,
                })
                .collect(),
        })
    }

    async fn image_configuration(&self) -> Result<ImageConfiguration, CatalogError> {
        let url = self.url("/configuration", &[]);
        debug!(url = %url, "TMDB get image configuration");

        let resp: TmdbConfigurationResponse = self.get_json(&url).await?;
        let images = resp.images;

        Ok(ImageConfiguration {
            poster_size: pick_size(&images.poster_sizes, "w500"),
            backdrop_size: pick_size(&images.backdrop_sizes, "w1280"),
            logo_size: pick_size(&images.logo_sizes, "w300"),
            profile_size: pick_size(&images.profile_sizes, "w185"),
            still_size: pick_size(&images.still_sizes, "w300"),
            secure_base_url: images.secure_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api_key: &str) -> TmdbProvider {
        TmdbProvider::new(&CatalogConfig {
            api_key: api_key.to_string(),
            language: "en-US".to_string(),
            base_url: "https://api.themoviedb.org/3".to_string(),
        })
    }

    #[test]
    fn confidence_exact_title_match() {
        let score = TmdbProvider::confidence("Inception", "Inception", Some(2010), Some(2010));
        assert!((score - 0.8).abs() < f64::EPSILON); // 0.5 + 0.3
    }

    #[test]
    fn confidence_case_insensitive_match() {
        let score = TmdbProvider::confidence("inception", "Inception", None, None);
        assert!((score - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_contains_match() {
        let score = TmdbProvider::confidence("Alien", "Aliens", None, None);
        assert!((score - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_close_year() {
        let score = TmdbProvider::confidence("Dune", "Dune", Some(2021), Some(2020));
        assert!((score - 0.65).abs() < f64::EPSILON); // 0.5 + 0.15
    }

    #[test]
    fn confidence_no_match() {
        let score = TmdbProvider::confidence("Foo", "Bar", None, None);
        assert!((score - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn year_parsing() {
        assert_eq!(parse_year(&Some("2023-04-15".to_string())), Some(2023));
        assert_eq!(parse_year(&Some("1999".to_string())), Some(1999));
        assert_eq!(parse_year(&None), None);
        assert_eq!(parse_year(&Some("".to_string())), None);
    }

    #[test]
    fn url_encoding() {
        assert_eq!(urlencoded("hello world"), "hello+world");
        assert_eq!(urlencoded("foo&bar"), "foo%26bar");
        assert_eq!(urlencoded("simple"), "simple");
    }

    #[test]
    fn url_builder_appends_params() {
        let p = provider("key");
        let url = p.url("/search/movie", &[("query", "dune part two")]);
        assert_eq!(
            url,
            "https://api.themoviedb.org/3/search/movie?api_key=key&language=en-US&query=dune+part+two"
        );
    }

    #[test]
    fn pick_size_prefers_bucket() {
        let sizes = vec!["w92".to_string(), "w500".to_string(), "original".to_string()];
        assert_eq!(pick_size(&sizes, "w500"), "w500");
        assert_eq!(pick_size(&sizes, "w1280"), "original");
    }

    #[test]
    fn provider_is_available() {
        assert!(provider("test-key").is_available());
        assert!(!provider("").is_available());
    }

    #[test]
    fn provider_name() {
        assert_eq!(provider("key").name(), "tmdb");
    }
}
