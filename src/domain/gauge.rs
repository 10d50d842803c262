/// 分数档位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    NeedsWork,
    GettingThere,
    GreatForm,
    Perfect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeColor {
    Red,
    Yellow,
    Green,
}

fn clamp(score: i64) -> i64 {
    score.clamp(0, 100)
}

impl ScoreTier {
    pub fn from_score(score: i64) -> Self {
        match clamp(score) {
            s if s < 40 => ScoreTier::NeedsWork,
            s if s < 70 => ScoreTier::GettingThere,
            s if s < 90 => ScoreTier::GreatForm,
            _ => ScoreTier::Perfect,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreTier::NeedsWork => "Needs Work",
            ScoreTier::GettingThere => "Getting There",
            ScoreTier::GreatForm => "Great Form",
            ScoreTier::Perfect => "Perfect!",
        }
    }
}

impl GaugeColor {
    pub fn from_score(score: i64) -> Self {
        match clamp(score) {
            s if s < 40 => GaugeColor::Red,
            s if s < 70 => GaugeColor::Yellow,
            _ => GaugeColor::Green,
        }
    }
}

/// 圆环填充比例，0.0 ~ 1.0
pub fn fill_ratio(score: i64) -> f64 {
    clamp(score) as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ScoreTier::from_score(39).label(), "Needs Work");
        assert_eq!(ScoreTier::from_score(40).label(), "Getting There");
        assert_eq!(ScoreTier::from_score(69).label(), "Getting There");
        assert_eq!(ScoreTier::from_score(70).label(), "Great Form");
        assert_eq!(ScoreTier::from_score(89).label(), "Great Form");
        assert_eq!(ScoreTier::from_score(90).label(), "Perfect!");
    }

    #[test]
    fn test_color_has_three_tiers() {
        assert_eq!(GaugeColor::from_score(10), GaugeColor::Red);
        assert_eq!(GaugeColor::from_score(55), GaugeColor::Yellow);
        assert_eq!(GaugeColor::from_score(70), GaugeColor::Green);
        assert_eq!(GaugeColor::from_score(95), GaugeColor::Green, "90 分以上仍为绿色");
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        assert_eq!(ScoreTier::from_score(-5), ScoreTier::NeedsWork);
        assert_eq!(ScoreTier::from_score(150), ScoreTier::Perfect);
        assert_eq!(fill_ratio(150), 1.0);
        assert_eq!(fill_ratio(-1), 0.0);
        assert_eq!(fill_ratio(62), 0.62);
    }
}
