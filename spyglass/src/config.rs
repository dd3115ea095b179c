use serde::{Deserialize, Serialize};

/// Tuning constants for the detection pipeline.
///
/// The defaults are the values the classifier was trained against; changing
/// them shifts the feature distributions the model sees, so they should be
/// treated as fixed unless the model is retrained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Median blur neighborhood radius in pixels (2 gives a 5x5 window)
    pub median_radius: usize,
    /// CLAHE contrast clip limit
    pub clahe_clip_limit: f64,
    /// CLAHE tile grid size (8 gives an 8x8 grid)
    pub clahe_tile_grid: usize,
    /// Diameter in pixels of the elliptical top-hat structuring element
    pub tophat_diameter: usize,
    /// Binary threshold applied to the processed map; values above are foreground
    pub detection_threshold: u8,
    /// Minimum enclosed boundary area in pixels; smaller regions are noise
    pub min_area: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            median_radius: 2,
            clahe_clip_limit: 2.0,
            clahe_tile_grid: 8,
            tophat_diameter: 35,
            detection_threshold: 15,
            min_area: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_trained_model_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.median_radius, 2);
        assert_eq!(config.clahe_clip_limit, 2.0);
        assert_eq!(config.clahe_tile_grid, 8);
        assert_eq!(config.tophat_diameter, 35);
        assert_eq!(config.detection_threshold, 15);
        assert_eq!(config.min_area, 5.0);
    }
}
