use {super::mode::TokenKind, number::DEFAULT_DECIMALS};

/// Display name and precision of one token role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decimals: DEFAULT_DECIMALS,
        }
    }
}

/// The token roles of a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub reserve: Token,
    pub pegged: Token,
    pub collateral: Token,
    pub leveraged: Token,
    pub governance: Token,
}

impl Tokens {
    pub fn get(&self, kind: TokenKind) -> &Token {
        match kind {
            TokenKind::Pegged => &self.pegged,
            TokenKind::Collateral => &self.collateral,
            TokenKind::Leveraged => &self.leveraged,
        }
    }
}
