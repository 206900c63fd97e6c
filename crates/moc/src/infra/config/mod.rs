//! Startup configuration. Everything is read and validated here, before the
//! first request goes to the node.

use {
    crate::{
        domain::{Mode, Tokens},
        infra::{
            cli,
            contracts::{Bootstrap, Legacy},
            submitter::{EventRegistry, events::LoadError},
        },
    },
    alloy::{
        primitives::Address,
        signers::local::{LocalSignerError, PrivateKeySigner},
    },
    bigdecimal::{BigDecimal, One},
    std::{
        path::{Path, PathBuf},
        time::Duration,
    },
    thiserror::Error,
    url::Url,
};

pub mod project;

pub use project::{ProjectConfig, Projects};

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed projects document {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("project {0:?} is not in the projects document")]
    UnknownProject(String),
    // The source never contains the key itself.
    #[error("invalid signing key")]
    Key(#[source] LocalSignerError),
    #[error("signing key belongs to {signer}, not to the configured {configured}")]
    AccountMismatch {
        signer: Address,
        configured: Address,
    },
    #[error("gas multiplier must be at least 1, got {0}")]
    GasMultiplier(BigDecimal),
    #[error(transparent)]
    Events(#[from] LoadError),
}

/// Everything the client needs, resolved once at startup.
pub struct Config {
    pub node: Url,
    pub signer: PrivateKeySigner,
    pub vendor: Address,
    pub slippage: BigDecimal,
    pub gas_multiplier: BigDecimal,
    pub confirmation_timeout: Option<Duration>,
    pub bootstrap: Bootstrap,
    pub mode: Mode,
    pub historic: bool,
    pub tokens: Tokens,
    pub events: EventRegistry,
}

impl Config {
    pub fn account(&self) -> Address {
        self.signer.address()
    }
}

pub async fn load(args: &cli::Args) -> Result<Config, Error> {
    let signer = args
        .user_pk
        .trim()
        .parse::<PrivateKeySigner>()
        .map_err(Error::Key)?;
    if let Some(configured) = args
        .user_address
        .filter(|configured| *configured != signer.address())
    {
        return Err(Error::AccountMismatch {
            signer: signer.address(),
            configured,
        });
    }
    if args.gas_multiplier < BigDecimal::one() {
        return Err(Error::GasMultiplier(args.gas_multiplier.clone()));
    }

    let project = read_project(&args.projects_path, &args.moc_project).await?;
    let legacy = match (args.contract_legacy_tp, args.contract_token_migrator) {
        (Some(pegged), Some(migrator)) => Some(Legacy { pegged, migrator }),
        _ => None,
    };
    let events = EventRegistry::load(
        &args.abis_path.join(&project.app_project),
        &abi_names(project.app_mode, legacy.is_some()),
    )
    .await?;
    tracing::info!(
        project = %args.moc_project,
        mode = %project.app_mode,
        historic = project.historic(),
        "loaded configuration"
    );

    Ok(Config {
        node: args.host_uri.clone(),
        signer,
        vendor: args.vendor_address,
        slippage: args.mint_slippage.clone(),
        gas_multiplier: args.gas_multiplier.clone(),
        confirmation_timeout: args.confirmation_timeout,
        bootstrap: Bootstrap {
            multicall: args.contract_multicall2,
            moc: args.contract_moc,
            legacy,
        },
        mode: project.app_mode,
        historic: project.historic(),
        tokens: project.tokens.into(),
        events,
    })
}

/// Looks up `name`, ignoring case, in the projects document at `path`.
pub async fn read_project(path: &Path, name: &str) -> Result<ProjectConfig, Error> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
    let projects: Projects = serde_json::from_str(&content).map_err(|source| Error::Parse {
        path: path.to_owned(),
        source,
    })?;
    projects
        .projects
        .into_iter()
        .find_map(|(key, project)| key.eq_ignore_ascii_case(name).then_some(project))
        .ok_or_else(|| Error::UnknownProject(name.to_owned()))
}

/// ABI documents whose events get decoded from receipts.
pub fn abi_names(mode: Mode, legacy: bool) -> Vec<&'static str> {
    let mut names = vec![
        "MoC",
        "MoCState",
        "MoCExchange",
        "MoCInrate",
        "MoCSettlement",
        "DocToken",
        "BProToken",
        "MoCToken",
        "MoCVendors",
    ];
    if mode == Mode::ReserveToken {
        names.push("ReserveToken");
    }
    if legacy {
        names.push("TokenMigrator");
    }
    names
}
