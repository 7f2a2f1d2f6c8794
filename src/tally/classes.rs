use image::Rgb;
use serde::Serialize;

/// COCO class index as emitted by the detector.
pub type ClassId = u32;

/// Summary bucket a class is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayGroup {
    Vehicles,
    Bicycles,
    People,
}

/// A class the tally engine counts, with its overlay styling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedClass {
    pub id: ClassId,
    pub name: &'static str,
    pub color: Rgb<u8>,
    pub group: DisplayGroup,
}

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

pub const TRACKED_CLASSES: [TrackedClass; 6] = [
    TrackedClass {
        id: 0,
        name: "person",
        color: RED,
        group: DisplayGroup::People,
    },
    TrackedClass {
        id: 1,
        name: "bicycle",
        color: BLUE,
        group: DisplayGroup::Bicycles,
    },
    TrackedClass {
        id: 2,
        name: "car",
        color: GREEN,
        group: DisplayGroup::Vehicles,
    },
    TrackedClass {
        id: 3,
        name: "motorcycle",
        color: RED,
        group: DisplayGroup::Vehicles,
    },
    TrackedClass {
        id: 5,
        name: "bus",
        color: RED,
        group: DisplayGroup::Vehicles,
    },
    TrackedClass {
        id: 7,
        name: "truck",
        color: RED,
        group: DisplayGroup::Vehicles,
    },
];

/// Table entry for `class_id`, or `None` for classes that are not counted.
pub fn lookup(class_id: ClassId) -> Option<&'static TrackedClass> {
    TRACKED_CLASSES.iter().find(|c| c.id == class_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(2).map(|c| c.name), Some("car"));
        assert_eq!(lookup(7).map(|c| c.group), Some(DisplayGroup::Vehicles));
        assert!(lookup(4).is_none());
        assert!(lookup(6).is_none());
    }
}
