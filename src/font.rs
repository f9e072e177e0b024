//! Font values and face discovery.
//!
//! Glyph rasterization belongs to the graphics sink; the core only carries
//! a font dictionary, the face metadata the discovery collaborator reported,
//! and the matrix produced by `scalefont`/`makefont`.

use std::rc::Rc;

use crate::{dictionary::DictRef, matrix::Matrix};

/// Metadata for a discovered face
#[derive(Debug, Clone)]
pub struct FaceInfo {
    pub postscript_name: String,
    pub family: String,
    pub style: String,
    pub weight: u16,
    pub stretch: u16,
}

impl FaceInfo {
    pub fn synthetic(name: &str) -> Self {
        Self {
            postscript_name: name.to_owned(),
            family: name.split(['-', ' ']).next().unwrap_or(name).to_owned(),
            style: String::from("Regular"),
            weight: 400,
            stretch: 5,
        }
    }
}

/// An unsized face: the font dictionary plus discovery metadata. The
/// backend handle is whatever the sink's collaborator wants to carry.
#[derive(Debug)]
pub struct FontFace {
    pub dict: DictRef,
    pub info: FaceInfo,
    pub backend: Option<u64>,
}

/// A face sized by `scalefont` or transformed by `makefont`
#[derive(Debug)]
pub struct Font {
    pub face: Rc<FontFace>,
    pub matrix: Matrix,
}

impl Font {
    pub fn new(face: Rc<FontFace>, matrix: Matrix) -> Self {
        Self { face, matrix }
    }

    /// The nominal size: the vertical extent of the font matrix
    pub fn size(&self) -> f64 {
        let (dx, dy) = self.matrix.dtransform(0.0, 1.0);
        (dx * dx + dy * dy).sqrt()
    }
}

/// The font-discovery collaborator: given a face name, produce metadata and
/// an opaque handle
pub trait FaceSource {
    fn find_face(&self, name: &[u8]) -> Option<FaceInfo>;
}

/// Discovery that accepts every name and synthesizes metadata; the default
/// when the host supplies nothing richer
#[derive(Debug, Default)]
pub struct PermissiveFaceSource;

impl FaceSource for PermissiveFaceSource {
    fn find_face(&self, name: &[u8]) -> Option<FaceInfo> {
        Some(FaceInfo::synthetic(&String::from_utf8_lossy(name)))
    }
}
