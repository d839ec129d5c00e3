//! Sprite atlas: a single image sliced into square tiles.
//!
//! Tiles are numbered row-major from the top-left. A sprite refers to its
//! tile through a [`SpriteLocation`], serialized as `"<atlas url>@<index>"`.

#[cfg(test)]
#[path = "tiles_test.rs"]
mod tiles_test;

use std::fmt;
use std::str::FromStr;

use crate::consts::SPRITE_REF_SEPARATOR;
use crate::rect::Rect;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TileError {
    #[error("sprite size must be positive")]
    ZeroSpriteSize,
    #[error("atlas image {width}x{height} is smaller than one {sprite_size}px tile")]
    ImageSmallerThanTile { width: u32, height: u32, sprite_size: u32 },
    #[error("tile index {index} out of range for atlas with {len} tiles")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("malformed sprite reference: {0}")]
    MalformedReference(String),
}

/// A loaded sprite atlas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tiles {
    url: String,
    sprite_size: u32,
    image_width: u32,
    image_height: u32,
}

impl Tiles {
    /// Describe an atlas image of the given pixel dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if `sprite_size` is zero or the image cannot hold a
    /// single tile.
    pub fn new(url: impl Into<String>, sprite_size: u32, image_width: u32, image_height: u32) -> Result<Self, TileError> {
        if sprite_size == 0 {
            return Err(TileError::ZeroSpriteSize);
        }
        if image_width < sprite_size || image_height < sprite_size {
            return Err(TileError::ImageSmallerThanTile { width: image_width, height: image_height, sprite_size });
        }
        Ok(Self { url: url.into(), sprite_size, image_width, image_height })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn sprite_size(&self) -> u32 {
        self.sprite_size
    }

    #[must_use]
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Number of whole tiles in the atlas.
    #[must_use]
    pub fn len(&self) -> usize {
        let cols = self.image_width / self.sprite_size;
        let rows = self.image_height / self.sprite_size;
        (cols as usize) * (rows as usize)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Source rect of tile `index` inside the atlas image.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::IndexOutOfRange`] for an index past the last tile.
    pub fn source_rect(&self, index: usize) -> Result<Rect, TileError> {
        let len = self.len();
        if index >= len {
            return Err(TileError::IndexOutOfRange { index, len });
        }
        let offset = index as u64 * u64::from(self.sprite_size);
        let width = u64::from(self.image_width);
        let size = f64::from(self.sprite_size);
        #[allow(clippy::cast_precision_loss)]
        let (sx, sy) = ((offset % width) as f64, ((offset / width) * u64::from(self.sprite_size)) as f64);
        Ok(Rect::new(sx, sy, size, size))
    }

    /// Reference to tile `index` in this atlas.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::IndexOutOfRange`] for an index past the last tile.
    pub fn location(&self, index: usize) -> Result<SpriteLocation, TileError> {
        let len = self.len();
        if index >= len {
            return Err(TileError::IndexOutOfRange { index, len });
        }
        Ok(SpriteLocation { tiles_url: self.url.clone(), index })
    }
}

/// Which tile of which atlas a sprite shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpriteLocation {
    pub tiles_url: String,
    pub index: usize,
}

impl fmt::Display for SpriteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.tiles_url, SPRITE_REF_SEPARATOR, self.index)
    }
}

impl FromStr for SpriteLocation {
    type Err = TileError;

    // Split on the last separator; atlas URLs may themselves contain '@'.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (url, index) = s.rsplit_once(SPRITE_REF_SEPARATOR).ok_or_else(|| TileError::MalformedReference(s.to_owned()))?;
        if url.is_empty() {
            return Err(TileError::MalformedReference(s.to_owned()));
        }
        let index = index.parse::<usize>().map_err(|_| TileError::MalformedReference(s.to_owned()))?;
        Ok(Self { tiles_url: url.to_owned(), index })
    }
}
