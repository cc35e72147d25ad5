use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;
use crate::config::{DigestSettings, MatchingSettings};
use crate::core::{DigestPlanner, DistanceTiers, ProximityMatcher};
use crate::models::{
    DigestEntry, DigestFacility, DigestRequest, DigestResponse, DistancesQuery, DistancesResponse,
    ErrorResponse, FacilityCategory, GeocodeRequest, GeocodeResponse, HealthResponse, RegionResponse,
    RegionSummary,
};
use crate::reference::{RegionIndex, RegionLevel, RegionRollup};
use crate::services::{FacilityStore, GeocodingClient, RecipientSource};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FacilityStore>,
    pub recipients: Arc<dyn RecipientSource>,
    pub geocoder: Arc<GeocodingClient>,
    pub matcher: ProximityMatcher,
    pub regions: Arc<RegionIndex>,
    pub matching: MatchingSettings,
    pub digest: DigestSettings,
    pub cache_ttl_secs: u64,
    pub shutdown: CancellationToken,
}

/// Configure all proximity routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/distances", web::get().to(calc_distances))
        .route("/regions", web::get().to(hero_regions))
        .route("/regions/{zip}", web::get().to(region_for_zip))
        .route("/digests", web::post().to(plan_digests))
        .route("/geocode", web::post().to(geocode));
}

fn error_response(status: StatusCode, error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

fn parse_categories<'a, I>(names: I) -> Result<Vec<FacilityCategory>, HttpResponse>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| name.parse::<FacilityCategory>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, "Invalid category", e))
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        coordinates: state.matcher.coordinates().len(),
        regions: state.regions.len(),
    })
}

/// Distance debugging endpoint
///
/// GET /api/v1/distances?zips=04103,10115&categories=ads&tiers=5,15
///
/// Returns, per origin zip, the facility ids in each tier. Origins without
/// any match are omitted.
async fn calc_distances(
    state: web::Data<AppState>,
    query: web::Query<DistancesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let categories = match &query.categories {
        Some(names) => match parse_categories(names.split(',')) {
            Ok(categories) => categories,
            Err(response) => return response,
        },
        None => state.matching.categories.clone(),
    };

    let tiers = match &query.tiers {
        Some(raw) => raw.parse::<DistanceTiers>(),
        None => DistanceTiers::new(&[state.matching.near_km, state.matching.far_km]),
    };
    let tiers = match tiers {
        Ok(tiers) => tiers,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "Invalid tiers", e),
    };

    let mut response = DistancesResponse::new();
    for zip in query.zips.split(',').map(str::trim).filter(|z| !z.is_empty()) {
        let result = match state
            .matcher
            .find_nearby(zip, &categories, &tiers, state.store.as_ref())
            .await
        {
            Ok(result) => result,
            Err(e) => return error_response(StatusCode::BAD_GATEWAY, "Failed to list facilities", e),
        };

        if !result.is_empty() {
            let by_label = result
                .by_tier()
                .into_iter()
                .map(|(tier, ids)| (tier.label(), ids))
                .collect();
            response.insert(zip.to_string(), by_label);
        }
    }

    tracing::info!("Calculated distances for {} origins", response.len());
    HttpResponse::Ok().json(response)
}

/// Region lookup for a single postal code
///
/// GET /api/v1/regions/{zip}
async fn region_for_zip(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let zip = path.into_inner();

    match state.regions.lookup(&zip) {
        Some(code) => HttpResponse::Ok().json(RegionResponse {
            state: code.prefix(RegionLevel::State).map(|r| r.to_string()),
            district: code.prefix(RegionLevel::District).map(|r| r.to_string()),
            code: code.to_string(),
            zip,
        }),
        None => {
            tracing::warn!("Unknown region for postal code {}", zip);
            error_response(
                StatusCode::NOT_FOUND,
                "Unknown postal code",
                format!("No region known for {}", zip),
            )
        }
    }
}

/// Opted-in heroes aggregated per state and district
///
/// GET /api/v1/regions
async fn hero_regions(state: web::Data<AppState>) -> impl Responder {
    let recipients = match state.recipients.list_recipients().await {
        Ok(recipients) => recipients,
        Err(e) => {
            tracing::error!("Failed to list heroes: {}", e);
            return error_response(StatusCode::BAD_GATEWAY, "Failed to list heroes", e);
        }
    };

    let mut by_zip: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for recipient in &recipients {
        by_zip.entry(&recipient.zip_code).or_default().push(&recipient.key);
    }

    let mut rollup = RegionRollup::new(&state.regions);
    for (zip, keys) in by_zip {
        rollup.register_ids(zip, keys);
    }

    let mut summaries = Vec::new();
    for level in RegionLevel::ALL {
        for (id, bucket) in rollup.regions(level) {
            summaries.push(RegionSummary {
                region: id.to_string(),
                level,
                heroes: bucket.ids.len(),
                strength: rollup.strength(id),
            });
        }
    }

    HttpResponse::Ok().json(summaries)
}

/// Plan the update digest for every opted-in hero
///
/// POST /api/v1/digests
///
/// Request body:
/// ```json
/// {
///   "categories": ["plasma"],
///   "nearKm": 5,
///   "farKm": 15
/// }
/// ```
async fn plan_digests(
    state: web::Data<AppState>,
    req: web::Json<DigestRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let categories = match &req.categories {
        Some(names) => match parse_categories(names.iter().map(String::as_str)) {
            Ok(categories) => categories,
            Err(response) => return response,
        },
        None => state.matching.categories.clone(),
    };
    let near_km = req.near_km.unwrap_or(state.matching.near_km);
    let far_km = req.far_km.unwrap_or(state.matching.far_km);

    let planner = match DigestPlanner::new(state.matcher.clone(), categories, near_km, far_km) {
        Ok(planner) => planner
            .with_concurrency(state.digest.concurrency)
            .with_cache_ttl(state.cache_ttl_secs),
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "Invalid tiers", e),
    };

    let recipients = match state.recipients.list_recipients().await {
        Ok(recipients) => recipients,
        Err(e) => {
            tracing::error!("Failed to list heroes: {}", e);
            return error_response(StatusCode::BAD_GATEWAY, "Failed to list heroes", e);
        }
    };

    let report = planner
        .plan(recipients, state.store.clone(), &state.shutdown.child_token())
        .await;

    let response = DigestResponse {
        run_id: report.run_id,
        generated_at: report.generated_at,
        candidates: report.candidates,
        skipped: report.skipped,
        cancelled: report.cancelled,
        digests: report
            .digests
            .into_iter()
            .map(|d| DigestEntry {
                recipient: d.recipient,
                distance_km: d.selected_tier.km,
                facilities: d
                    .facilities
                    .into_iter()
                    .map(|f| DigestFacility {
                        id: f.id,
                        title: f.title,
                        address: f.address,
                    })
                    .collect(),
            })
            .collect(),
    };

    HttpResponse::Ok().json(response)
}

/// Resolve a new stakeholder address to a coordinate
///
/// POST /api/v1/geocode
async fn geocode(
    state: web::Data<AppState>,
    req: web::Json<GeocodeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    match state.geocoder.resolve(&req.address, &req.zip_code, &req.city).await {
        Ok(coordinate) => HttpResponse::Ok().json(GeocodeResponse::from(coordinate)),
        Err(e) => {
            tracing::error!("Failed to resolve {}, {}: {}", req.zip_code, req.city, e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to resolve coordinates", e)
        }
    }
}
