#![allow(
    dead_code,
    // operand helpers exist for every type even where no operator pops one yet
    clippy::large_enum_variant,
    clippy::manual_range_contains,
)]

mod device;
mod dictionary;
mod eexec;
mod error;
mod file;
mod filter;
mod font;
mod graphics_state;
mod interpreter;
mod lexer;
mod matrix;
mod name;
mod object;
mod operators;
mod parser;
mod path;
mod resource;

pub use crate::{
    device::{Device, ImageRecord, NulDevice, RasterDevice},
    dictionary::{DictRef, DictStack, Dictionary},
    error::{PostScriptError, PsResult},
    file::{FileRef, MemorySource, PsFile},
    filter::{encode_ascii85, encode_run_length, Ascii85Decode, RunLengthDecode},
    font::{FaceInfo, FaceSource, Font, FontFace},
    graphics_state::{GraphicsState, LineCap, LineJoin, Paint},
    interpreter::Interpreter,
    matrix::Matrix,
    name::Name,
    object::{Access, ArrayRef, Object, Operator, PsArray, PsString, SaveRecord, StringRef, Value},
    path::{Path, Point, Segment, SegmentCommand},
};
