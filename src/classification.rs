//! tsserver classification values and the semantic token legend they map onto.

pub mod decoder;
pub mod legend;

pub use decoder::{
    Classification, DecodedClassification, LegacyClassification, MODIFIER_MASK, TYPE_OFFSET,
    decode, encode,
};
pub use legend::{Legend, TokenModifier, TokenType};
