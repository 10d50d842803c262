use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoseCategory {
    Calisthenics,
    Aerial,
    Pole,
}

impl PoseCategory {
    pub const ALL: [PoseCategory; 3] = [
        PoseCategory::Calisthenics,
        PoseCategory::Aerial,
        PoseCategory::Pole,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PoseCategory::Calisthenics => "Calisthenics",
            PoseCategory::Aerial => "Aerial Silks / Hoop / Trapeze",
            PoseCategory::Pole => "Pole Fitness",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pose {
    pub id: &'static str,
    pub name: &'static str,
    pub category: PoseCategory,
}

const fn pose(id: &'static str, name: &'static str, category: PoseCategory) -> Pose {
    Pose { id, name, category }
}

static POSES: [Pose; 23] = [
    // 徒手
    pose("handstand", "Handstand", PoseCategory::Calisthenics),
    pose("planche", "Planche", PoseCategory::Calisthenics),
    pose("front-lever", "Front Lever", PoseCategory::Calisthenics),
    pose("back-lever", "Back Lever", PoseCategory::Calisthenics),
    pose("l-sit", "L-Sit", PoseCategory::Calisthenics),
    pose("human-flag", "Human Flag", PoseCategory::Calisthenics),
    pose("muscle-up", "Muscle Up", PoseCategory::Calisthenics),
    pose("pistol-squat", "Pistol Squat", PoseCategory::Calisthenics),
    pose("one-arm-pullup", "One-Arm Pull-Up", PoseCategory::Calisthenics),
    // 空中
    pose("straddle-back", "Straddle Back Balance", PoseCategory::Aerial),
    pose("hip-key", "Hip Key", PoseCategory::Aerial),
    pose("star", "Star", PoseCategory::Aerial),
    pose("gazelle", "Gazelle", PoseCategory::Aerial),
    pose("meathook", "Meathook", PoseCategory::Aerial),
    pose("bird-nest", "Bird's Nest", PoseCategory::Aerial),
    pose("ankle-hang", "Ankle Hang", PoseCategory::Aerial),
    // 钢管
    pose("ayesha", "Ayesha", PoseCategory::Pole),
    pose("iron-x", "Iron X", PoseCategory::Pole),
    pose("jade-split", "Jade Split", PoseCategory::Pole),
    pose("superman", "Superman", PoseCategory::Pole),
    pose("allegra", "Allegra", PoseCategory::Pole),
    pose("butterfly", "Butterfly", PoseCategory::Pole),
    pose("brass-monkey", "Brass Monkey", PoseCategory::Pole),
];

pub fn poses() -> &'static [Pose] {
    &POSES
}

/// 按 id 查找动作
pub fn find(id: &str) -> Option<&'static Pose> {
    POSES.iter().find(|p| p.id == id)
}

pub fn by_category(category: PoseCategory) -> impl Iterator<Item = &'static Pose> {
    POSES.iter().filter(move |p| p.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_find_pose() {
        let pose = find("iron-x").unwrap();
        assert_eq!(pose.name, "Iron X");
        assert_eq!(pose.category, PoseCategory::Pole);

        assert!(find("unknown").is_none(), "未知 id 应返回 None");
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = poses().iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), poses().len(), "动作 id 不应重复");
    }

    #[test]
    fn test_category_counts() {
        assert_eq!(by_category(PoseCategory::Calisthenics).count(), 9);
        assert_eq!(by_category(PoseCategory::Aerial).count(), 7);
        assert_eq!(by_category(PoseCategory::Pole).count(), 7);
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(find("handstand").unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "handstand", "name": "Handstand", "category": "calisthenics"})
        );
    }
}
