//! Filter-to-figure pipeline.

use exposure_map_render_models::{
    FigureSpec, FilterSelection, Font, Layout, Legend, MapCenter, MapView, Marker, MarkerLayer,
    SCATTER_MAP_TRACE,
};
use exposure_map_sample_models::{Dataset, Placement, Pollutant, Sample};

use crate::marker_size::{MIN_SIZE, marker_sizes};
use crate::palette::round_color;

pub const FIGURE_WIDTH: u32 = 1200;
pub const FIGURE_HEIGHT: u32 = 900;
pub const MAP_ZOOM: f64 = 10.0;
pub const LEGEND_FONT_SIZE: u32 = 20;

/// Builds the map figure for `selection`.
///
/// Marker sizes are normalized once over every selected sample, across all
/// selected rounds, so sizes stay comparable between layers. Samples without
/// coordinates take part in that normalization but are not plotted.
///
/// Never fails: an unavailable pollutant yields a figure with no layers, and
/// a selection matching no samples yields empty layers.
#[must_use]
pub fn render(dataset: &Dataset, selection: &FilterSelection) -> FigureSpec {
    let pollutant = selection.pollutant;

    if !dataset.has_pollutant(pollutant) {
        log::debug!("Pollutant {pollutant} not present in the dataset");
        return empty_figure(dataset);
    }

    let selected: Vec<&Sample> = dataset
        .samples()
        .iter()
        .filter(|s| selection.includes(s.round) && s.placement == selection.placement)
        .collect();

    let values: Vec<f64> = selected
        .iter()
        .map(|s| s.measurements.clamped(pollutant))
        .collect();

    let sizes = marker_sizes(&values).unwrap_or_else(|e| {
        log::error!("Marker sizing rejected clamped {pollutant} values: {e}");
        vec![MIN_SIZE; values.len()]
    });

    let hovertemplate = hover_template(pollutant);

    let data = selection
        .rounds
        .iter()
        .filter_map(|&round| {
            let Some(color) = round_color(dataset, round) else {
                log::debug!("Round {round} is not in the dataset, no layer");
                return None;
            };

            let mut layer = MarkerLayer {
                trace_type: SCATTER_MAP_TRACE.to_string(),
                name: round.label(),
                meta: round,
                mode: "markers".to_string(),
                lat: Vec::new(),
                lon: Vec::new(),
                marker: Marker {
                    size: Vec::new(),
                    color: color.to_string(),
                },
                customdata: Vec::new(),
                hovertemplate: hovertemplate.clone(),
            };

            for (sample, size) in selected.iter().zip(&sizes) {
                if sample.round != round {
                    continue;
                }
                let Some(coordinates) = sample.coordinates else {
                    continue;
                };
                layer.lat.push(coordinates.latitude);
                layer.lon.push(coordinates.longitude);
                layer.marker.size.push(*size);
                layer
                    .customdata
                    .push((sample.home_id.clone(), sample.measurements.get(pollutant)));
            }

            Some(layer)
        })
        .collect();

    FigureSpec {
        data,
        layout: layout(dataset),
    }
}

/// A figure with the dataset's map view and no layers.
#[must_use]
pub fn empty_figure(dataset: &Dataset) -> FigureSpec {
    FigureSpec {
        data: Vec::new(),
        layout: layout(dataset),
    }
}

/// Initial dashboard state: every round, the first placement seen, and the
/// first pollutant the export carries (the first of the fixed list when it
/// carries none).
#[must_use]
pub fn default_selection(dataset: &Dataset) -> FilterSelection {
    FilterSelection::new(
        dataset.rounds().iter().copied(),
        dataset
            .placements()
            .first()
            .cloned()
            .unwrap_or(Placement::Indoor),
        dataset
            .available_pollutants()
            .first()
            .copied()
            .unwrap_or(Pollutant::all()[0]),
    )
}

fn hover_template(pollutant: Pollutant) -> String {
    format!(
        "<b> Home ID : %{{customdata[0]}} <br><b>{} : %{{customdata[1]}}",
        pollutant.column_name()
    )
}

/// Layout shared by every figure, centered on the whole dataset rather than
/// the current selection.
fn layout(dataset: &Dataset) -> Layout {
    Layout {
        hovermode: "closest".to_string(),
        autosize: true,
        width: FIGURE_WIDTH,
        height: FIGURE_HEIGHT,
        map: MapView {
            bearing: 0.0,
            center: dataset.center().map(MapCenter::from).unwrap_or_default(),
            pitch: 0.0,
            zoom: MAP_ZOOM,
        },
        showlegend: true,
        legend: Legend {
            orientation: "h".to_string(),
            xanchor: "auto".to_string(),
            yanchor: "top".to_string(),
            y: -0.02,
            itemsizing: "constant".to_string(),
            traceorder: "normal".to_string(),
            font: Font {
                family: "sans-serif".to_string(),
                size: LEGEND_FONT_SIZE,
                color: "black".to_string(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exposure_map_sample_models::{Coordinates, Round};

    fn sample(
        home: &str,
        round: u32,
        placement: Placement,
        value: f64,
        coords: Option<(f64, f64)>,
    ) -> Sample {
        Sample {
            home_id: home.to_string(),
            round: Round(round),
            placement,
            address: format!("{home} Main St"),
            set_up_date: None,
            pick_up_date: None,
            start_time: None,
            end_time: None,
            measurements: [(Pollutant::Pm25, value)].into_iter().collect(),
            coordinates: coords.map(|(lat, lon)| Coordinates::new(lat, lon)),
        }
    }

    fn dataset(samples: Vec<Sample>) -> Dataset {
        Dataset::new(samples, vec![Pollutant::Pm25])
    }

    fn selection(rounds: &[u32], placement: Placement) -> FilterSelection {
        FilterSelection::new(rounds.iter().map(|r| Round(*r)), placement, Pollutant::Pm25)
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn three_row_fixture_is_clipped_around_median() {
        let ds = dataset(vec![
            sample("H1", 0, Placement::Indoor, 10.0, Some((40.0, -80.0))),
            sample("H2", 0, Placement::Indoor, 20.0, Some((40.1, -80.1))),
            sample("H3", 0, Placement::Indoor, 30.0, Some((40.2, -80.2))),
        ]);
        let fig = render(&ds, &selection(&[0], Placement::Indoor));
        assert_eq!(fig.data.len(), 1);
        assert_close(&fig.data[0].marker.size, &[20.0, 25.0, 30.0]);
        assert_eq!(fig.data[0].name, "Round 0");
        assert_eq!(fig.data[0].marker.color, "#636EFA");
    }

    #[test]
    fn all_zero_pollutant_gives_minimum_sizes() {
        let ds = dataset(
            (0..5)
                .map(|i| sample(&format!("H{i}"), 0, Placement::Outdoor, 0.0, Some((40.0, -80.0))))
                .collect(),
        );
        let fig = render(&ds, &selection(&[0], Placement::Outdoor));
        assert_eq!(fig.data[0].marker.size, vec![MIN_SIZE; 5]);
    }

    #[test]
    fn empty_round_selection_has_no_layers() {
        let ds = dataset(vec![sample("H1", 0, Placement::Indoor, 1.0, Some((40.0, -80.0)))]);
        let fig = render(&ds, &selection(&[], Placement::Indoor));
        assert!(fig.data.is_empty());
        assert!(fig.layout.showlegend);
    }

    #[test]
    fn unavailable_pollutant_gives_empty_figure() {
        let ds = dataset(vec![sample("H1", 0, Placement::Indoor, 1.0, Some((40.0, -80.0)))]);
        let sel = FilterSelection::new([Round(0)], Placement::Indoor, Pollutant::Chloroform);
        let fig = render(&ds, &sel);
        assert!(fig.data.is_empty());
    }

    #[test]
    fn placement_with_no_rows_gives_empty_layers() {
        let ds = dataset(vec![sample("H1", 0, Placement::Indoor, 1.0, Some((40.0, -80.0)))]);
        let fig = render(&ds, &selection(&[0], Placement::Outdoor));
        assert_eq!(fig.data.len(), 1);
        assert!(fig.data[0].is_empty());
    }

    #[test]
    fn unexpected_placement_renders_under_its_own_category() {
        let blank = Placement::Other("Field blank".to_string());
        let ds = dataset(vec![
            sample("H1", 0, Placement::Indoor, 50.0, Some((40.0, -80.0))),
            sample("H2", 0, blank.clone(), 4.0, Some((40.1, -80.1))),
            sample("H3", 0, blank.clone(), 4.0, Some((40.2, -80.2))),
        ]);
        assert_eq!(ds.placements(), &[Placement::Indoor, blank.clone()]);

        let fig = render(&ds, &selection(&[0], blank));
        assert_eq!(fig.data.len(), 1);
        assert_eq!(fig.data[0].customdata[0].0, "H2");
        assert_eq!(fig.data[0].customdata[1].0, "H3");
        assert_close(&fig.data[0].marker.size, &[25.0, 25.0]);
    }

    #[test]
    fn normalization_is_global_across_rounds() {
        // Median over both rounds is 20; per-round normalization would put
        // every single-sample round at 25.
        let ds = dataset(vec![
            sample("H1", 0, Placement::Indoor, 10.0, Some((40.0, -80.0))),
            sample("H2", 1, Placement::Indoor, 20.0, Some((40.0, -80.0))),
            sample("H3", 2, Placement::Indoor, 30.0, Some((40.0, -80.0))),
        ]);
        let fig = render(&ds, &selection(&[0, 1, 2], Placement::Indoor));
        assert_eq!(fig.data.len(), 3);
        assert_close(&fig.data[0].marker.size, &[20.0]);
        assert_close(&fig.data[1].marker.size, &[25.0]);
        assert_close(&fig.data[2].marker.size, &[30.0]);
    }

    #[test]
    fn layers_follow_selection_order() {
        let ds = dataset(vec![
            sample("H1", 0, Placement::Indoor, 1.0, Some((40.0, -80.0))),
            sample("H2", 1, Placement::Indoor, 1.0, Some((40.0, -80.0))),
        ]);
        let fig = render(&ds, &selection(&[1, 0], Placement::Indoor));
        let names: Vec<&str> = fig.data.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Round 1", "Round 0"]);
        assert_eq!(fig.data[0].marker.color, "#EF553B");
    }

    #[test]
    fn ungeocoded_samples_shift_sizes_but_are_not_plotted() {
        let ds = dataset(vec![
            sample("H1", 0, Placement::Indoor, 10.0, Some((40.0, -80.0))),
            sample("H2", 0, Placement::Indoor, 20.0, None),
            sample("H3", 0, Placement::Indoor, 30.0, Some((40.2, -80.2))),
        ]);
        let fig = render(&ds, &selection(&[0], Placement::Indoor));
        let layer = &fig.data[0];
        assert_eq!(layer.len(), 2);
        assert_close(&layer.lat, &[40.0, 40.2]);
        // Still normalized against median 20 from the hidden sample.
        assert_close(&layer.marker.size, &[20.0, 30.0]);
    }

    #[test]
    fn negative_values_are_clamped_for_sizing_but_shown_raw() {
        let ds = dataset(vec![
            sample("H1", 0, Placement::Indoor, -5.0, Some((40.0, -80.0))),
            sample("H2", 0, Placement::Indoor, 4.0, Some((40.0, -80.0))),
            sample("H3", 0, Placement::Indoor, 4.0, Some((40.0, -80.0))),
        ]);
        let fig = render(&ds, &selection(&[0], Placement::Indoor));
        let layer = &fig.data[0];
        assert_close(&layer.marker.size, &[20.0, 25.0, 25.0]);
        assert_eq!(layer.customdata[0], ("H1".to_string(), -5.0));
    }

    #[test]
    fn unknown_selected_round_is_skipped() {
        let ds = dataset(vec![sample("H1", 0, Placement::Indoor, 1.0, Some((40.0, -80.0)))]);
        let fig = render(&ds, &selection(&[0, 9], Placement::Indoor));
        assert_eq!(fig.data.len(), 1);
        assert_eq!(fig.data[0].meta, Round(0));
    }

    #[test]
    fn map_is_centered_on_whole_dataset() {
        let ds = dataset(vec![
            sample("H1", 0, Placement::Indoor, 1.0, Some((40.0, -80.0))),
            sample("H2", 1, Placement::Outdoor, 1.0, Some((42.0, -82.0))),
        ]);
        let fig = render(&ds, &selection(&[0], Placement::Indoor));
        assert!((fig.layout.map.center.lat - 41.0).abs() < 1e-9);
        assert!((fig.layout.map.center.lon - -81.0).abs() < 1e-9);
        assert!((fig.layout.map.zoom - MAP_ZOOM).abs() < f64::EPSILON);
        assert_eq!(fig.layout.legend.orientation, "h");
    }

    #[test]
    fn hover_names_the_pollutant_column() {
        let ds = dataset(vec![sample("H1", 0, Placement::Indoor, 1.0, Some((40.0, -80.0)))]);
        let fig = render(&ds, &selection(&[0], Placement::Indoor));
        assert!(fig.data[0].hovertemplate.contains("PM2.5 (µg/m3)"));
        assert!(fig.data[0].hovertemplate.contains("%{customdata[0]}"));
    }

    #[test]
    fn repeated_renders_are_identical() {
        let ds = dataset(vec![
            sample("H1", 0, Placement::Indoor, 3.0, Some((40.0, -80.0))),
            sample("H2", 1, Placement::Indoor, 6.0, Some((40.0, -80.0))),
        ]);
        let sel = selection(&[0, 1], Placement::Indoor);
        assert_eq!(render(&ds, &sel), render(&ds, &sel));
    }

    #[test]
    fn default_selection_takes_all_rounds_and_first_values() {
        let ds = dataset(vec![
            sample("H1", 1, Placement::Outdoor, 1.0, None),
            sample("H2", 0, Placement::Indoor, 1.0, None),
        ]);
        let sel = default_selection(&ds);
        assert_eq!(sel.rounds, vec![Round(0), Round(1)]);
        assert_eq!(sel.placement, Placement::Outdoor);
        assert_eq!(sel.pollutant, Pollutant::Pm25);
    }

    #[test]
    fn default_selection_without_columns_uses_first_pollutant() {
        let ds = Dataset::new(vec![], vec![]);
        let sel = default_selection(&ds);
        assert!(sel.rounds.is_empty());
        assert_eq!(sel.placement, Placement::Indoor);
        assert_eq!(sel.pollutant, Pollutant::Pm25Mass);
    }

    #[test]
    fn serializes_for_plotly() {
        let ds = dataset(vec![sample("H1", 0, Placement::Indoor, 1.0, Some((40.0, -80.0)))]);
        let json = serde_json::to_value(render(&ds, &selection(&[0], Placement::Indoor))).unwrap();
        assert_eq!(json["data"][0]["type"], "scattermap");
        assert_eq!(json["layout"]["map"]["zoom"], 10.0);
        assert_eq!(json["layout"]["legend"]["itemsizing"], "constant");
    }
}
