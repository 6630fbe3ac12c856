use crate::translation::{MonthlyTranslation, TranslationMap};
use std::collections::HashMap;
use svm_core::error::VolumeError;
use svm_core::reach::{mb_region, MbReachId};

/// Upper bound of a translation weight: an MB reach is at most fully covered.
pub const MAX_WEIGHT: f64 = 1.0;

/// Ascending list of positive pfaf regions plus the position of each region
/// in that list. Reference cubes are loaded in this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionIndex {
    regions: Vec<i64>,
    positions: HashMap<i64, usize>,
}

impl RegionIndex {
    pub fn from_regions<I: IntoIterator<Item = i64>>(regions: I) -> Self {
        let mut regions: Vec<i64> = regions.into_iter().filter(|r| *r > 0).collect();
        regions.sort_unstable();
        regions.dedup();
        let positions = regions.iter().enumerate().map(|(i, r)| (*r, i)).collect();
        RegionIndex { regions, positions }
    }

    pub fn position(&self, region: i64) -> Option<usize> {
        self.positions.get(&region).copied()
    }

    pub fn regions(&self) -> &[i64] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Reaches and clamped weights of one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBin {
    pub region: i64,
    /// Position of `region` in the [`RegionIndex`].
    pub position: usize,
    pub reach_ids: Vec<MbReachId>,
    pub weights: Vec<f64>,
}

/// A translation map clamped and split by region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTranslation {
    /// Bins in ascending region order, empty regions omitted.
    pub bins: Vec<RegionBin>,
    /// Number of weights that exceeded [`MAX_WEIGHT`].
    pub clamped: usize,
}

impl NormalizedTranslation {
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn reach_count(&self) -> usize {
        self.bins.iter().map(|b| b.reach_ids.len()).sum()
    }
}

/// Clamp weights above one and bin reaches by region.
pub fn normalize(map: &TranslationMap, index: &RegionIndex) -> Result<NormalizedTranslation, VolumeError> {
    let mut bins: Vec<Option<RegionBin>> = vec![None; index.len()];
    let mut clamped = 0;
    for (reach_id, weight) in map.iter() {
        let region = mb_region(reach_id);
        let position = index.position(region).ok_or(VolumeError::UnknownRegion(region))?;
        let weight = if weight > MAX_WEIGHT {
            clamped += 1;
            MAX_WEIGHT
        } else {
            weight
        };
        let bin = bins[position].get_or_insert_with(|| RegionBin {
            region,
            position,
            reach_ids: Vec::new(),
            weights: Vec::new(),
        });
        bin.reach_ids.push(reach_id);
        bin.weights.push(weight);
    }
    Ok(NormalizedTranslation {
        bins: bins.into_iter().flatten().collect(),
        clamped,
    })
}

/// Normalize each month's map; months nobody observed become `None`.
pub fn normalize_monthly(
    months: &[MonthlyTranslation],
    index: &RegionIndex,
) -> Result<Vec<Option<NormalizedTranslation>>, VolumeError> {
    months
        .iter()
        .map(|m| {
            if m.is_unobserved() {
                Ok(None)
            } else {
                normalize(&m.map, index).map(Some)
            }
        })
        .collect()
}
