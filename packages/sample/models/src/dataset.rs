//! Immutable snapshot of the enriched sample table.

use std::collections::BTreeSet;

use crate::{Coordinates, Placement, Pollutant, Round, Sample};

/// All samples with resolved coordinates, plus the facts the dashboard needs
/// about them.
///
/// Built once at startup and never mutated afterwards; callers share it
/// behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    samples: Vec<Sample>,
    available: Vec<Pollutant>,
    rounds: Vec<Round>,
    placements: Vec<Placement>,
    center: Option<Coordinates>,
}

impl Dataset {
    /// Builds the snapshot. `available` lists the pollutant columns that
    /// were present in the source header.
    #[must_use]
    pub fn new(samples: Vec<Sample>, available: Vec<Pollutant>) -> Self {
        let rounds: Vec<Round> = samples
            .iter()
            .map(|s| s.round)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut placements = Vec::new();
        for sample in &samples {
            if !placements.contains(&sample.placement) {
                placements.push(sample.placement.clone());
            }
        }

        let center = mean_coordinates(&samples);

        let available = Pollutant::all()
            .iter()
            .copied()
            .filter(|p| available.contains(p))
            .collect();

        Self {
            samples,
            available,
            rounds,
            placements,
            center,
        }
    }

    /// Every loaded sample, in file order.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Distinct rounds, ascending.
    #[must_use]
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Distinct placements in first-appearance order.
    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Pollutant columns present in the source, in dashboard order.
    #[must_use]
    pub fn available_pollutants(&self) -> &[Pollutant] {
        &self.available
    }

    #[must_use]
    pub fn has_pollutant(&self, pollutant: Pollutant) -> bool {
        self.available.contains(&pollutant)
    }

    /// Position of `round` among the distinct rounds.
    #[must_use]
    pub fn round_index(&self, round: Round) -> Option<usize> {
        self.rounds.binary_search(&round).ok()
    }

    /// Mean of all resolved coordinates, or `None` when nothing geocoded.
    #[must_use]
    pub const fn center(&self) -> Option<Coordinates> {
        self.center
    }

    /// Number of samples that resolved to coordinates.
    #[must_use]
    pub fn geocoded_count(&self) -> usize {
        self.samples
            .iter()
            .filter(|s| s.coordinates.is_some())
            .count()
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_coordinates(samples: &[Sample]) -> Option<Coordinates> {
    let points: Vec<Coordinates> = samples.iter().filter_map(|s| s.coordinates).collect();
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let latitude = points.iter().map(|c| c.latitude).sum::<f64>() / n;
    let longitude = points.iter().map(|c| c.longitude).sum::<f64>() / n;
    Some(Coordinates::new(latitude, longitude))
}
