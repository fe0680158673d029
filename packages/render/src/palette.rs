//! Round colors.
//!
//! Each round gets the palette entry at its position among the dataset's
//! distinct rounds (ascending). Past the end of the palette the colors
//! repeat, so every round always has a color.

use exposure_map_sample_models::{Dataset, Round};

/// Plotly's default qualitative palette.
pub const ROUND_PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// Color for the `index`-th distinct round.
#[must_use]
pub const fn color_at(index: usize) -> &'static str {
    ROUND_PALETTE[index % ROUND_PALETTE.len()]
}

/// Color for `round`, or `None` if the dataset never contains it.
#[must_use]
pub fn round_color(dataset: &Dataset, round: Round) -> Option<&'static str> {
    dataset.round_index(round).map(color_at)
}
