#![allow(clippy::float_cmp)]

use super::*;

fn atlas() -> Tiles {
    // 4 columns x 2 rows of 32px tiles.
    Tiles::new("/sprites.png", 32, 128, 64).unwrap()
}

// =============================================================
// Construction
// =============================================================

#[test]
fn new_rejects_zero_sprite_size() {
    assert_eq!(Tiles::new("/a.png", 0, 64, 64), Err(TileError::ZeroSpriteSize));
}

#[test]
fn new_rejects_image_smaller_than_tile() {
    let err = Tiles::new("/a.png", 32, 16, 64).unwrap_err();
    assert!(matches!(err, TileError::ImageSmallerThanTile { width: 16, .. }));
}

#[test]
fn len_counts_whole_tiles() {
    assert_eq!(atlas().len(), 8);
    assert!(!atlas().is_empty());
    assert_eq!(Tiles::new("/a.png", 32, 100, 40).unwrap().len(), 3);
}

#[test]
fn accessors() {
    let tiles = atlas();
    assert_eq!(tiles.url(), "/sprites.png");
    assert_eq!(tiles.sprite_size(), 32);
    assert_eq!(tiles.image_size(), (128, 64));
}

// =============================================================
// Source rects
// =============================================================

#[test]
fn source_rect_first_tile() {
    assert_eq!(atlas().source_rect(0).unwrap(), Rect::new(0.0, 0.0, 32.0, 32.0));
}

#[test]
fn source_rect_is_row_major() {
    let tiles = atlas();
    assert_eq!(tiles.source_rect(3).unwrap(), Rect::new(96.0, 0.0, 32.0, 32.0));
    assert_eq!(tiles.source_rect(4).unwrap(), Rect::new(0.0, 32.0, 32.0, 32.0));
    assert_eq!(tiles.source_rect(6).unwrap(), Rect::new(64.0, 32.0, 32.0, 32.0));
}

#[test]
fn source_rect_out_of_range() {
    assert_eq!(atlas().source_rect(8), Err(TileError::IndexOutOfRange { index: 8, len: 8 }));
}

#[test]
fn location_carries_url() {
    let loc = atlas().location(5).unwrap();
    assert_eq!(loc.tiles_url, "/sprites.png");
    assert_eq!(loc.index, 5);
    assert!(atlas().location(100).is_err());
}

// =============================================================
// SpriteLocation text form
// =============================================================

#[test]
fn sprite_location_display() {
    let loc = SpriteLocation { tiles_url: "/sprites.png".into(), index: 12 };
    assert_eq!(loc.to_string(), "/sprites.png@12");
}

#[test]
fn sprite_location_parse() {
    let loc: SpriteLocation = "/sprites.png@7".parse().unwrap();
    assert_eq!(loc, SpriteLocation { tiles_url: "/sprites.png".into(), index: 7 });
}

#[test]
fn sprite_location_parse_uses_last_separator() {
    let loc: SpriteLocation = "https://user@host/a.png@3".parse().unwrap();
    assert_eq!(loc.tiles_url, "https://user@host/a.png");
    assert_eq!(loc.index, 3);
}

#[test]
fn sprite_location_parse_rejects_garbage() {
    assert!("/sprites.png".parse::<SpriteLocation>().is_err());
    assert!("/sprites.png@x".parse::<SpriteLocation>().is_err());
    assert!("@4".parse::<SpriteLocation>().is_err());
}
