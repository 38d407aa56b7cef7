//! Color identity parsing and tag normalization.

use commander_tracker_server::game::types::{parse_colors, Color};
use commander_tracker_server::http::decks::{normalize_tags, MAX_TAGS, MAX_TAG_LEN};

#[test]
fn colors_come_back_in_wubrg_order() {
    assert_eq!(
        parse_colors(&["g", "W", "u", "G"]).unwrap(),
        vec![Color::W, Color::U, Color::G]
    );
    assert_eq!(parse_colors(&["C"]).unwrap(), vec![Color::C]);
    assert!(parse_colors::<&str>(&[]).unwrap().is_empty());
}

#[test]
fn bad_colors_are_rejected() {
    assert!(parse_colors(&["P"]).is_err());
    assert!(parse_colors(&["C", "R"]).is_err());
    assert_eq!(Color::from_code(" b "), Some(Color::B));
    assert_eq!(Color::from_code("blue"), None);
}

#[test]
fn tags_are_trimmed_and_deduplicated() {
    let tags: Vec<String> = ["  combo ", "Combo", "", "stax", "  "]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(normalize_tags(&tags).unwrap(), vec!["combo", "stax"]);
}

#[test]
fn tag_limits() {
    let long = vec!["x".repeat(MAX_TAG_LEN + 1)];
    assert_eq!(normalize_tags(&long).unwrap_err().field, "tags");

    let many: Vec<String> = (0..=MAX_TAGS).map(|i| format!("tag{i}")).collect();
    assert!(normalize_tags(&many).is_err());
    assert!(normalize_tags(&many[..MAX_TAGS]).is_ok());
}
