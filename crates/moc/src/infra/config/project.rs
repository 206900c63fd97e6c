//! The projects document, one entry per deployment.

use {
    crate::domain::{Mode, Token, Tokens},
    number::DEFAULT_DECIMALS,
    serde::Deserialize,
    std::collections::HashMap,
};

/// Project without the historic read round.
const WITHOUT_HISTORIC: &str = "bnb";

#[derive(Debug, Deserialize)]
pub struct Projects {
    pub projects: HashMap<String, ProjectConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub app_mode: Mode,
    /// Directory name of the project ABIs.
    pub app_project: String,
    pub tokens: TokenRoles,
    historic: Option<bool>,
}

impl ProjectConfig {
    pub fn historic(&self) -> bool {
        self.historic
            .unwrap_or_else(|| !self.app_project.eq_ignore_ascii_case(WITHOUT_HISTORIC))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct TokenRoles {
    pub reserve: TokenConfig,
    pub tp: TokenConfig,
    pub tc: TokenConfig,
    pub tg: TokenConfig,
    pub tx: TokenConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

impl From<TokenConfig> for Token {
    fn from(config: TokenConfig) -> Self {
        Self {
            name: config.name,
            decimals: config.decimals,
        }
    }
}

impl From<TokenRoles> for Tokens {
    fn from(roles: TokenRoles) -> Self {
        Self {
            reserve: roles.reserve.into(),
            pegged: roles.tp.into(),
            collateral: roles.tc.into(),
            leveraged: roles.tx.into(),
            governance: roles.tg.into(),
        }
    }
}
