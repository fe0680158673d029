//! HTTP handler functions for the exposure map API.

use actix_web::{HttpResponse, web};
use exposure_map_render::palette::color_at;
use exposure_map_render::{empty_figure, render};
use exposure_map_sample_models::Pollutant;
use exposure_map_server_models::{
    ApiDefaults, ApiHealth, ApiOptions, ApiPollutantOption, ApiRoundOption, ApiSample,
    FigureQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        samples: state.dataset.samples().len(),
        geocoded: state.dataset.geocoded_count(),
    })
}

/// `GET /api/options`
///
/// Returns the round checkboxes, placement radio values, pollutant
/// dropdown entries, and their initial values.
pub async fn options(state: web::Data<AppState>) -> HttpResponse {
    let dataset = &state.dataset;

    let rounds = dataset
        .rounds()
        .iter()
        .enumerate()
        .map(|(index, round)| ApiRoundOption {
            value: *round,
            label: round.label(),
            color: color_at(index).to_string(),
        })
        .collect();

    let pollutants = Pollutant::all()
        .iter()
        .map(|pollutant| ApiPollutantOption {
            key: *pollutant,
            label: pollutant.column_name().to_string(),
            available: dataset.has_pollutant(*pollutant),
        })
        .collect();

    HttpResponse::Ok().json(ApiOptions {
        rounds,
        placements: dataset.placements().to_vec(),
        pollutants,
        defaults: ApiDefaults::from(&state.defaults),
    })
}

/// `GET /api/figure`
///
/// Renders the map for the requested rounds, placement, and pollutant.
/// Unrecognized parameters produce an empty figure rather than an error.
pub async fn figure(
    state: web::Data<AppState>,
    params: web::Query<FigureQueryParams>,
) -> HttpResponse {
    let figure = match params.to_selection(&state.defaults) {
        Ok(selection) => {
            log::debug!(
                "Rendering {} for rounds {:?} ({})",
                selection.pollutant,
                selection.rounds,
                selection.placement
            );
            render(&state.dataset, &selection)
        }
        Err(e) => {
            log::warn!("Ignoring figure query: {e}");
            empty_figure(&state.dataset)
        }
    };

    HttpResponse::Ok().json(figure)
}

/// `GET /api/samples`
pub async fn samples(state: web::Data<AppState>) -> HttpResponse {
    let samples: Vec<ApiSample> = state.dataset.samples().iter().map(ApiSample::from).collect();
    HttpResponse::Ok().json(samples)
}
