//! Deterministic model fixture: a hand-built decision forest over the full
//! feature schema, usable in-process or written out as artifact files.
//!
//! The fixture's decision rule is intentionally simple and legible:
//! small areas are noise, round shapes are stars, everything else is a
//! galaxy. Tests can place synthetic objects on either side of the
//! thresholds and know the label in advance.

use std::path::Path;

use spyglass::model::forest::{DecisionForest, DecisionTree, TreeNode};
use spyglass::model::imputer::MedianImputer;
use spyglass::model::ModelContext;
use spyglass::ObjectClass;

/// Area below which the fixture calls an object noise.
pub const NOISE_AREA_LIMIT: f64 = 40.0;

/// Circularity above which a large object is a star rather than a galaxy.
pub const STAR_CIRCULARITY_LIMIT: f64 = 0.6;

/// The full ordered feature schema the detection pipeline emits.
pub fn feature_schema() -> Vec<String> {
    [
        "area",
        "perimeter",
        "circularity",
        "aspect_ratio",
        "solidity",
        "eccentricity",
        "mean_intensity_gray",
        "std_dev_intensity_gray",
        "peak_intensity_gray",
        "mean_r",
        "mean_g",
        "mean_b",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Class ordering of the fixture model.
fn class_names() -> Vec<ObjectClass> {
    vec![ObjectClass::Star, ObjectClass::Galaxy, ObjectClass::Noise]
}

fn forest() -> DecisionForest {
    // Single tree: area <= 40 -> noise; circularity <= 0.6 -> galaxy;
    // otherwise star. Feature indices follow feature_schema().
    let tree = DecisionTree {
        nodes: vec![
            TreeNode::Split {
                feature: 0,
                threshold: NOISE_AREA_LIMIT,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf {
                distribution: vec![0.0, 0.0, 12.0],
            },
            TreeNode::Split {
                feature: 2,
                threshold: STAR_CIRCULARITY_LIMIT,
                left: 3,
                right: 4,
            },
            TreeNode::Leaf {
                distribution: vec![0.0, 12.0, 0.0],
            },
            TreeNode::Leaf {
                distribution: vec![12.0, 0.0, 0.0],
            },
        ],
    };

    DecisionForest {
        n_features: 12,
        n_classes: 3,
        trees: vec![tree],
    }
}

fn imputer() -> MedianImputer {
    // Column medians loosely matching real blob statistics; only used when
    // a feature value is non-finite
    MedianImputer::new(vec![
        100.0, 40.0, 0.8, 1.0, 0.95, 0.3, 120.0, 10.0, 200.0, 120.0, 120.0, 120.0,
    ])
}

/// Build the fixture model context in memory.
pub fn test_model() -> ModelContext {
    ModelContext::new(feature_schema(), class_names(), imputer(), Box::new(forest()))
        .expect("fixture artifacts are consistent by construction")
}

/// Write the fixture as a model artifact directory loadable through
/// [`ModelContext::load`].
pub fn write_model_artifacts(dir: &Path) -> std::io::Result<()> {
    let write = |name: &str, json: String| std::fs::write(dir.join(name), json);

    write("classifier.json", serde_json_string(&forest()))?;
    write("imputer.json", serde_json_string(&imputer()))?;
    write("feature_names.json", serde_json_string(&feature_schema()))?;
    write("class_names.json", serde_json_string(&class_names()))?;
    Ok(())
}

fn serde_json_string<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).expect("fixture types serialize infallibly")
}
