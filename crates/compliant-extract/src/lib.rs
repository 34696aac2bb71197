//! Text extraction layer: program-document requirement recognisers and
//! certificate field extraction.

pub mod coi_fields;
pub mod requirements;
mod source;

pub use coi_fields::{CoiFields, extract_coi_fields};
pub use requirements::{RequirementExtractor, RequirementPattern, extract_requirements};
pub use source::{PlainTextFile, TextSource};
