use {
    crate::domain::TokenKind,
    alloy::primitives::Address,
    bigdecimal::BigDecimal,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    url::Url,
};

#[derive(Debug, clap::Parser)]
#[clap(version, about = "Mints, redeems and inspects a MoC deployment")]
pub struct Args {
    /// The log filter.
    #[clap(long, env, default_value = "warn,moc=debug,ethrpc=debug")]
    pub log_filter: String,

    /// At which log level logs should be printed to stderr instead of stdout.
    #[clap(long, env)]
    pub log_stderr_threshold: Option<tracing::Level>,

    /// Whether to use JSON format for the logs.
    #[clap(long, env, default_value = "false")]
    pub use_json_logs: bool,

    /// The node RPC API endpoint.
    #[clap(long, env)]
    pub host_uri: Url,

    /// Hex encoded private key signing the transactions.
    #[clap(long, env, hide_env_values = true)]
    pub user_pk: String,

    /// Account the key belongs to. Checked against the key when set.
    #[clap(long, env)]
    pub user_address: Option<Address>,

    /// Vendor every mint and redeem is routed through.
    #[clap(long, env)]
    pub vendor_address: Address,

    /// Extra reserve sent on mints, in percent of the trade.
    #[clap(long, env, default_value = "0", value_parser = number::parse_amount)]
    pub mint_slippage: BigDecimal,

    /// Factor applied to the node's gas estimate.
    #[clap(long, env, default_value = "2", value_parser = number::parse_amount)]
    pub gas_multiplier: BigDecimal,

    #[clap(long, env)]
    pub contract_multicall2: Address,

    #[clap(long, env)]
    pub contract_moc: Address,

    /// Pegged token replaced by the current one. Requires the migrator too.
    #[clap(long, env, requires = "contract_token_migrator")]
    pub contract_legacy_tp: Option<Address>,

    #[clap(long, env)]
    pub contract_token_migrator: Option<Address>,

    /// Entry of the projects document describing the deployment.
    #[clap(long, env)]
    pub moc_project: String,

    #[clap(long, env, default_value = "./settings/projects.json")]
    pub projects_path: PathBuf,

    /// Directory holding one ABI directory per project.
    #[clap(long, env, default_value = "./abis")]
    pub abis_path: PathBuf,

    /// How long to wait for a receipt before reporting the transaction as
    /// pending. Waits indefinitely when unset.
    #[clap(long, env, value_parser = humantime::parse_duration)]
    pub confirmation_timeout: Option<Duration>,

    /// Print results as JSON instead of a summary.
    #[clap(long, env, default_value = "false")]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Command {
    /// Reads the protocol state.
    Status,
    /// Reads balances and allowances of an account, the signer by default.
    Balance { account: Option<Address> },
    Mint {
        #[clap(value_enum)]
        token: Token,
        #[clap(value_parser = number::parse_amount)]
        amount: BigDecimal,
    },
    Redeem {
        #[clap(value_enum)]
        token: Token,
        #[clap(value_parser = number::parse_amount)]
        amount: BigDecimal,
    },
    /// Lets the protocol charge commissions in the governance token.
    AllowCommission {
        #[clap(long)]
        revoke: bool,
    },
    /// Lets the protocol pull the reserve token on mints.
    AllowReserve {
        #[clap(long)]
        revoke: bool,
    },
    /// Reads a vendor registration, the configured vendor by default.
    VendorInfo { account: Option<Address> },
    /// Lets the vendors contract pull governance tokens for staking.
    VendorAllowance {
        #[clap(long)]
        revoke: bool,
    },
    VendorAddStake {
        #[clap(value_parser = number::parse_amount)]
        amount: BigDecimal,
    },
    VendorRemoveStake {
        #[clap(value_parser = number::parse_amount)]
        amount: BigDecimal,
    },
    /// Lets the migrator pull the legacy pegged tokens.
    AllowTokenMigrator {
        #[clap(long)]
        revoke: bool,
    },
    /// Swaps the legacy pegged tokens for the current ones.
    MigrateToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Token {
    Tp,
    Tc,
    Tx,
}

impl From<Token> for TokenKind {
    fn from(token: Token) -> Self {
        match token {
            Token::Tp => Self::Pegged,
            Token::Tc => Self::Collateral,
            Token::Tx => Self::Leveraged,
        }
    }
}

impl Display for Args {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            use_json_logs,
            host_uri,
            user_pk: _,
            user_address,
            vendor_address,
            mint_slippage,
            gas_multiplier,
            contract_multicall2,
            contract_moc,
            contract_legacy_tp,
            contract_token_migrator,
            moc_project,
            projects_path,
            abis_path,
            confirmation_timeout,
            json,
            command,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold:?}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        writeln!(f, "host_uri: {host_uri}")?;
        writeln!(f, "user_pk: SECRET")?;
        writeln!(f, "user_address: {user_address:?}")?;
        writeln!(f, "vendor_address: {vendor_address}")?;
        writeln!(f, "mint_slippage: {mint_slippage}")?;
        writeln!(f, "gas_multiplier: {gas_multiplier}")?;
        writeln!(f, "contract_multicall2: {contract_multicall2}")?;
        writeln!(f, "contract_moc: {contract_moc}")?;
        writeln!(f, "contract_legacy_tp: {contract_legacy_tp:?}")?;
        writeln!(f, "contract_token_migrator: {contract_token_migrator:?}")?;
        writeln!(f, "moc_project: {moc_project}")?;
        writeln!(f, "projects_path: {}", projects_path.display())?;
        writeln!(f, "abis_path: {}", abis_path.display())?;
        writeln!(f, "confirmation_timeout: {confirmation_timeout:?}")?;
        writeln!(f, "json: {json}")?;
        writeln!(f, "command: {command:?}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, clap::Parser};

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn parse(extra: &[&str]) -> Args {
        let mut args = vec![
            "moc",
            "--host-uri",
            "http://localhost:8545",
            "--user-pk",
            KEY,
            "--vendor-address",
            "0x000000000000000000000000000000000000dead",
            "--contract-multicall2",
            "0x0000000000000000000000000000000000000001",
            "--contract-moc",
            "0x0000000000000000000000000000000000000002",
            "--moc-project",
            "moc",
        ];
        args.extend_from_slice(extra);
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn display_hides_the_key() {
        let args = parse(&["status"]);

        let shown = args.to_string();
        assert!(shown.contains("user_pk: SECRET"));
        assert!(!shown.contains(&KEY[2..]));
    }

    #[test]
    fn parses_operations() {
        let args = parse(&["--mint-slippage", "0.5", "mint", "tx", "1.25"]);

        assert_eq!(args.mint_slippage.to_string(), "0.5");
        match args.command {
            Command::Mint { token, amount } => {
                assert_eq!(TokenKind::from(token), TokenKind::Leveraged);
                assert_eq!(amount.to_string(), "1.25");
            }
            other => panic!("unexpected command {other:?}"),
        }

        let args = parse(&["allow-commission", "--revoke"]);
        assert!(matches!(args.command, Command::AllowCommission { revoke: true }));
    }

    #[test]
    fn rejects_malformed_amounts() {
        let args = [
            "moc",
            "--host-uri",
            "http://localhost:8545",
            "--user-pk",
            KEY,
            "--vendor-address",
            "0x000000000000000000000000000000000000dead",
            "--contract-multicall2",
            "0x0000000000000000000000000000000000000001",
            "--contract-moc",
            "0x0000000000000000000000000000000000000002",
            "--moc-project",
            "moc",
            "redeem",
            "tp",
            "1e5",
        ];
        assert!(Args::try_parse_from(args).is_err());
    }

    #[test]
    fn legacy_token_requires_migrator() {
        let args = [
            "moc",
            "--host-uri",
            "http://localhost:8545",
            "--user-pk",
            KEY,
            "--vendor-address",
            "0x000000000000000000000000000000000000dead",
            "--contract-multicall2",
            "0x0000000000000000000000000000000000000001",
            "--contract-moc",
            "0x0000000000000000000000000000000000000002",
            "--moc-project",
            "moc",
            "--contract-legacy-tp",
            "0x0000000000000000000000000000000000000003",
            "migrate-token",
        ];
        assert!(Args::try_parse_from(args).is_err());
    }
}
