use serde::{Deserialize, Serialize};

use crate::Bounds;

/// Tunable parameters of the game core.
///
/// All fields have defaults, so a partial JSON document is accepted:
///
/// ```
/// use shaktris_engine::CoreConfig;
///
/// let config: CoreConfig = serde_json::from_str(r#"{ "start_height": 6 }"#).unwrap();
/// assert_eq!(config.start_height, 6);
/// assert_eq!(config.slide_limit, CoreConfig::default().slide_limit);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Bounds of a freshly created board.
    pub initial_bounds: Bounds,
    /// Altitude of a freshly spawned piece; also the upper clamp for height changes.
    pub start_height: u32,
    /// Height at or below which a piece must stay connected to existing cells.
    pub landing_height: u32,
    /// Maximum lateral offset of the spawn lane from the king.
    pub lateral_spread: i32,
    /// Distance in front of the king where the spawn search starts.
    pub spawn_min_distance: i32,
    /// Number of forward steps tried by the spawn search.
    pub spawn_max_steps: u32,
    /// Maximum number of forward steps a hard-dropped piece slides.
    pub slide_limit: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            initial_bounds: Bounds::new(0, 23, 0, 23),
            start_height: 10,
            landing_height: 1,
            lateral_spread: 6,
            spawn_min_distance: 2,
            spawn_max_steps: 20,
            slide_limit: 10,
        }
    }
}
