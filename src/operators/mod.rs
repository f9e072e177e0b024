//! The built-in operator library, grouped by family. Each module installs
//! its operators into the system dictionary.

pub(crate) mod array;
pub(crate) mod control;
pub(crate) mod convert;
pub(crate) mod debug;
pub(crate) mod dictionary;
pub(crate) mod file;
pub(crate) mod font;
pub(crate) mod graphics;
pub(crate) mod math;
pub(crate) mod matrix;
pub(crate) mod path;
pub(crate) mod polymorph;
pub(crate) mod relational;
pub(crate) mod resource;
pub(crate) mod stack;
pub(crate) mod string;
pub(crate) mod vm;

use crate::{
    dictionary::Dictionary,
    name::Name,
    object::{Object, Operator, OperatorFn},
};

pub(crate) fn op(dict: &mut Dictionary, name: &'static [u8], func: OperatorFn) {
    let name = Name::new(name);
    dict.insert(name, Object::operator(Operator { name, func }));
}

pub(crate) fn install_all(dict: &mut Dictionary) {
    stack::install(dict);
    math::install(dict);
    relational::install(dict);
    control::install(dict);
    convert::install(dict);
    dictionary::install(dict);
    array::install(dict);
    string::install(dict);
    polymorph::install(dict);
    file::install(dict);
    matrix::install(dict);
    path::install(dict);
    graphics::install(dict);
    font::install(dict);
    resource::install(dict);
    vm::install(dict);
    debug::install(dict);
}
