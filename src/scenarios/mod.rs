//! 內建的端到端情境

pub mod image_linking;
pub mod promo_team_leaderboard;
pub mod review_round_trip;

use crate::domain::ports::Scenario;
use crate::utils::error::{E2eError, Result};
use std::sync::Arc;

pub use image_linking::ImageLinking;
pub use promo_team_leaderboard::PromoTeamLeaderboard;
pub use review_round_trip::ReviewRoundTrip;

pub fn registry() -> Vec<Arc<dyn Scenario>> {
    vec![
        Arc::new(ReviewRoundTrip),
        Arc::new(ImageLinking),
        Arc::new(PromoTeamLeaderboard),
    ]
}

pub fn by_name(name: &str) -> Option<Arc<dyn Scenario>> {
    registry().into_iter().find(|scenario| scenario.name() == name)
}

/// 依名稱挑選情境並保留給定順序；空清單代表全部
pub fn select(names: &[String]) -> Result<Vec<Arc<dyn Scenario>>> {
    if names.is_empty() {
        return Ok(registry());
    }

    names
        .iter()
        .map(|name| {
            by_name(name).ok_or_else(|| E2eError::InvalidConfigValueError {
                field: "suite.scenarios".to_string(),
                value: name.clone(),
                reason: format!(
                    "Unknown scenario. Available: {}",
                    registry()
                        .iter()
                        .map(|s| s.name().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_keeps_requested_order() {
        let selected = select(&["image_linking".to_string(), "review_round_trip".to_string()]).unwrap();
        let names: Vec<_> = selected.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["image_linking", "review_round_trip"]);
    }

    #[test]
    fn test_select_all_and_unknown() {
        assert_eq!(select(&[]).unwrap().len(), 3);
        assert!(select(&["nope".to_string()]).is_err());
    }
}
