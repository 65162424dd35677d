//! Token types, token modifiers and the legend published to the client.
//!
//! The ordinal of each [`TokenType`] and the bit position of each
//! [`TokenModifier`] are wire values: the client resolves them through the
//! legend sent in `initialize`, so reordering either enum desyncs every token.

use serde::Serialize;
use tower_lsp_server::ls_types::{SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend};

/// Semantic token categories reported by tsserver.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Class = 0,
    Enum = 1,
    Interface = 2,
    Namespace = 3,
    TypeParameter = 4,
    Type = 5,
    Parameter = 6,
    Variable = 7,
    EnumMember = 8,
    Property = 9,
    Function = 10,
    Method = 11,
}

impl TokenType {
    /// Every token type in ordinal order.
    pub const ALL: [TokenType; 12] = [
        TokenType::Class,
        TokenType::Enum,
        TokenType::Interface,
        TokenType::Namespace,
        TokenType::TypeParameter,
        TokenType::Type,
        TokenType::Parameter,
        TokenType::Variable,
        TokenType::EnumMember,
        TokenType::Property,
        TokenType::Function,
        TokenType::Method,
    ];

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenType::Class => "class",
            TokenType::Enum => "enum",
            TokenType::Interface => "interface",
            TokenType::Namespace => "namespace",
            TokenType::TypeParameter => "typeParameter",
            TokenType::Type => "type",
            TokenType::Parameter => "parameter",
            TokenType::Variable => "variable",
            TokenType::EnumMember => "enumMember",
            TokenType::Property => "property",
            TokenType::Function => "function",
            TokenType::Method => "method",
        }
    }
}

/// Semantic token modifiers; each variant is a bit position in the mask.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenModifier {
    Declaration = 0,
    Static = 1,
    Async = 2,
    Readonly = 3,
    DefaultLibrary = 4,
    Local = 5,
}

impl TokenModifier {
    /// Every modifier in bit order.
    pub const ALL: [TokenModifier; 6] = [
        TokenModifier::Declaration,
        TokenModifier::Static,
        TokenModifier::Async,
        TokenModifier::Readonly,
        TokenModifier::DefaultLibrary,
        TokenModifier::Local,
    ];

    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn name(self) -> &'static str {
        match self {
            TokenModifier::Declaration => "declaration",
            TokenModifier::Static => "static",
            TokenModifier::Async => "async",
            TokenModifier::Readonly => "readonly",
            TokenModifier::DefaultLibrary => "defaultLibrary",
            TokenModifier::Local => "local",
        }
    }

    /// Expand a modifier mask into the modifiers it contains, lowest bit first.
    ///
    /// Bits above the known modifiers are ignored.
    pub fn from_mask(mask: u32) -> Vec<TokenModifier> {
        Self::ALL
            .into_iter()
            .filter(|modifier| mask & modifier.bit() != 0)
            .collect()
    }
}

/// Ordered type and modifier names, indexed by ordinal.
///
/// Built once per provider and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    token_types: Vec<&'static str>,
    token_modifiers: Vec<&'static str>,
}

impl Default for Legend {
    fn default() -> Self {
        Self::new()
    }
}

impl Legend {
    pub fn new() -> Self {
        let mut token_types = vec![""; TokenType::ALL.len()];
        for token_type in TokenType::ALL {
            token_types[token_type.ordinal() as usize] = token_type.name();
        }

        let mut token_modifiers = vec![""; TokenModifier::ALL.len()];
        for modifier in TokenModifier::ALL {
            token_modifiers[modifier as usize] = modifier.name();
        }

        debug_assert!(
            token_types.iter().chain(&token_modifiers).all(|name| !name.is_empty()),
            "legend has an unindexed hole"
        );

        Self {
            token_types,
            token_modifiers,
        }
    }

    pub fn token_types(&self) -> &[&'static str] {
        &self.token_types
    }

    pub fn token_modifiers(&self) -> &[&'static str] {
        &self.token_modifiers
    }

    /// Convert to the LSP legend advertised in the server capabilities.
    pub fn to_lsp(&self) -> SemanticTokensLegend {
        SemanticTokensLegend {
            token_types: self
                .token_types
                .iter()
                .map(|&name| SemanticTokenType::new(name))
                .collect(),
            token_modifiers: self
                .token_modifiers
                .iter()
                .map(|&name| SemanticTokenModifier::new(name))
                .collect(),
        }
    }
}
