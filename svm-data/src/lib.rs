//! Algorithms of the SWOT / MeanDRS volume comparison.
//!
//! Stages run leaves first: [`translation`] builds SWORD to MERIT-Basins
//! weights, [`normalize`] clamps and bins them by region, [`aggregate`] and
//! [`slice`] sum reference anomalies, [`swot`] sums observed anomalies, and
//! [`summary`], [`scale`] and [`agreement`] compare the two.

pub mod aggregate;
pub mod agreement;
pub mod anomaly;
pub mod counts;
pub mod normalize;
pub mod scale;
pub mod slice;
pub mod summary;
pub mod swot;
pub mod translation;
