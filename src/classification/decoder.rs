//! Decoding of tsserver classification values.
//!
//! tsserver reports each span with a single integer. With the `2020` format
//! the integer is packed: bits above [`TYPE_OFFSET`] hold `token_type + 1`
//! and the low bits hold the modifier mask. With the `original` format it is
//! one of tsserver's own `ClassificationType` ordinals, a handful of which
//! have a semantic token equivalent.
//!
//! The decision is made per value: any value above [`MODIFIER_MASK`] is
//! packed, everything else goes through the legacy table.

use super::legend::TokenType;

/// Bit offset of the `token_type + 1` field in a packed value.
pub const TYPE_OFFSET: u32 = 8;

/// Mask of the modifier field in a packed value.
pub const MODIFIER_MASK: u32 = (1 << TYPE_OFFSET) - 1;

/// tsserver's native classification ordinals (`ClassificationType`).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyClassification {
    Comment = 1,
    Identifier = 2,
    Keyword = 3,
    NumericLiteral = 4,
    Operator = 5,
    StringLiteral = 6,
    RegularExpressionLiteral = 7,
    WhiteSpace = 8,
    Text = 9,
    Punctuation = 10,
    ClassName = 11,
    EnumName = 12,
    InterfaceName = 13,
    ModuleName = 14,
    TypeParameterName = 15,
    TypeAliasName = 16,
    ParameterName = 17,
    DocCommentTagName = 18,
    JsxOpenTagName = 19,
    JsxCloseTagName = 20,
    JsxSelfClosingTagName = 21,
    JsxAttribute = 22,
    JsxText = 23,
    JsxAttributeStringLiteralValue = 24,
    BigintLiteral = 25,
}

impl LegacyClassification {
    const ALL: [LegacyClassification; 25] = [
        LegacyClassification::Comment,
        LegacyClassification::Identifier,
        LegacyClassification::Keyword,
        LegacyClassification::NumericLiteral,
        LegacyClassification::Operator,
        LegacyClassification::StringLiteral,
        LegacyClassification::RegularExpressionLiteral,
        LegacyClassification::WhiteSpace,
        LegacyClassification::Text,
        LegacyClassification::Punctuation,
        LegacyClassification::ClassName,
        LegacyClassification::EnumName,
        LegacyClassification::InterfaceName,
        LegacyClassification::ModuleName,
        LegacyClassification::TypeParameterName,
        LegacyClassification::TypeAliasName,
        LegacyClassification::ParameterName,
        LegacyClassification::DocCommentTagName,
        LegacyClassification::JsxOpenTagName,
        LegacyClassification::JsxCloseTagName,
        LegacyClassification::JsxSelfClosingTagName,
        LegacyClassification::JsxAttribute,
        LegacyClassification::JsxText,
        LegacyClassification::JsxAttributeStringLiteralValue,
        LegacyClassification::BigintLiteral,
    ];

    pub fn from_raw(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| *c as u32 == value)
    }

    /// The semantic token type this classification stands for, if any.
    ///
    /// Comments, keywords, literals, punctuation and the like are left to
    /// syntax highlighting.
    pub fn token_type(self) -> Option<TokenType> {
        match self {
            LegacyClassification::ClassName => Some(TokenType::Class),
            LegacyClassification::EnumName => Some(TokenType::Enum),
            LegacyClassification::InterfaceName => Some(TokenType::Interface),
            LegacyClassification::ModuleName => Some(TokenType::Namespace),
            LegacyClassification::TypeParameterName => Some(TokenType::TypeParameter),
            LegacyClassification::TypeAliasName => Some(TokenType::Type),
            LegacyClassification::ParameterName => Some(TokenType::Parameter),
            _ => None,
        }
    }
}

/// A token type and modifier mask recovered from a classification value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedClassification {
    pub token_type: TokenType,
    pub modifiers: u32,
}

/// The decode decision for one raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Packed `2020` value carrying a type and a modifier mask.
    Packed { token_type: TokenType, modifiers: u32 },
    /// Legacy ordinal with a semantic token equivalent.
    Legacy(LegacyClassification, TokenType),
    /// Nothing to emit for this value.
    Unrecognized(u32),
}

impl Classification {
    pub fn from_raw(value: u32) -> Self {
        if value > MODIFIER_MASK {
            let modifiers = value & MODIFIER_MASK;
            return match TokenType::from_ordinal((value >> TYPE_OFFSET) - 1) {
                Some(token_type) => Classification::Packed {
                    token_type,
                    modifiers,
                },
                // A type the legend does not know would shift every category.
                None => Classification::Unrecognized(value),
            };
        }

        match LegacyClassification::from_raw(value)
            .and_then(|legacy| legacy.token_type().map(|token_type| (legacy, token_type)))
        {
            Some((legacy, token_type)) => Classification::Legacy(legacy, token_type),
            None => Classification::Unrecognized(value),
        }
    }

    pub fn decoded(self) -> Option<DecodedClassification> {
        match self {
            Classification::Packed {
                token_type,
                modifiers,
            } => Some(DecodedClassification {
                token_type,
                modifiers,
            }),
            Classification::Legacy(_, token_type) => Some(DecodedClassification {
                token_type,
                modifiers: 0,
            }),
            Classification::Unrecognized(_) => None,
        }
    }
}

/// Decode a raw classification value into a token type and modifier mask.
///
/// Returns `None` when the value has no semantic token equivalent; the span
/// should then be skipped.
pub fn decode(value: u32) -> Option<DecodedClassification> {
    Classification::from_raw(value).decoded()
}

/// Pack a token type and modifier mask the way tsserver's `2020` format does.
pub fn encode(token_type: TokenType, modifiers: u32) -> u32 {
    ((token_type.ordinal() + 1) << TYPE_OFFSET) | (modifiers & MODIFIER_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::TokenModifier;
    use rstest::rstest;

    #[test]
    fn packed_value_decodes_type_and_modifiers() {
        // (parameter + 1) << 8 | readonly
        let decoded = decode(1800).expect("packed value should decode");
        assert_eq!(decoded.token_type, TokenType::Parameter);
        assert_eq!(decoded.modifiers, TokenModifier::Readonly.bit());
    }

    #[test]
    fn every_packed_value_matches_shift_formula() {
        let max = encode(TokenType::Method, MODIFIER_MASK);
        for value in (MODIFIER_MASK + 1)..=max {
            let decoded = decode(value).expect("in-range packed value should decode");
            assert_eq!(decoded.token_type.ordinal(), (value >> 8) - 1);
            assert_eq!(decoded.modifiers, value & 255);
        }
    }

    #[test]
    fn packed_value_with_unknown_type_is_unrecognized() {
        let value = (13 << TYPE_OFFSET) | 1;
        assert_eq!(Classification::from_raw(value), Classification::Unrecognized(value));
        assert_eq!(decode(value), None);
    }

    #[test]
    fn boundary_value_is_legacy() {
        // 255 is not packed even though it is all modifier bits
        assert_eq!(decode(MODIFIER_MASK), None);
        assert_eq!(
            Classification::from_raw(MODIFIER_MASK + 1),
            Classification::Packed {
                token_type: TokenType::Class,
                modifiers: 0,
            }
        );
    }

    #[rstest]
    #[case::class_name(11, TokenType::Class)]
    #[case::enum_name(12, TokenType::Enum)]
    #[case::interface_name(13, TokenType::Interface)]
    #[case::module_name(14, TokenType::Namespace)]
    #[case::type_parameter_name(15, TokenType::TypeParameter)]
    #[case::type_alias_name(16, TokenType::Type)]
    #[case::parameter_name(17, TokenType::Parameter)]
    fn legacy_table_maps_with_no_modifiers(#[case] value: u32, #[case] expected: TokenType) {
        assert_eq!(
            decode(value),
            Some(DecodedClassification {
                token_type: expected,
                modifiers: 0,
            })
        );
    }

    #[test]
    fn unmapped_legacy_values_are_skipped() {
        let mapped = 11..=17;
        for value in 0..=MODIFIER_MASK {
            if mapped.contains(&value) {
                continue;
            }
            assert_eq!(decode(value), None, "value {value} should not decode");
        }
    }

    #[test]
    fn identifier_has_no_semantic_equivalent() {
        assert_eq!(
            Classification::from_raw(LegacyClassification::Identifier as u32),
            Classification::Unrecognized(2)
        );
    }

    #[test]
    fn encode_is_inverse_of_decode_for_known_modifiers() {
        let mask = TokenModifier::Declaration.bit() | TokenModifier::Local.bit();
        let value = encode(TokenType::Variable, mask);
        assert_eq!(
            decode(value),
            Some(DecodedClassification {
                token_type: TokenType::Variable,
                modifiers: mask,
            })
        );
    }
}
