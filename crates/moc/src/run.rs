use {
    crate::{
        domain::{Operations, Settings},
        infra::{
            cli::{self, Command},
            config,
            contracts::ContractSet,
            protocol::Protocol,
            submitter::Submitter,
        },
        report::{self, Output},
    },
    alloy::network::EthereumWallet,
    clap::Parser,
    ethrpc::Aggregator,
    std::sync::Arc,
};

pub async fn start(args: impl Iterator<Item = String>) {
    let args = cli::Args::parse_from(args);
    let obs_config = observe::Config::new(
        &args.log_filter,
        args.log_stderr_threshold,
        args.use_json_logs,
    );
    observe::tracing::initialize(&obs_config);
    tracing::info!("running moc with validated arguments:\n{}", args);

    if let Err(err) = run(args).await {
        tracing::error!(?err, "operation failed");
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

pub async fn run(args: cli::Args) -> anyhow::Result<()> {
    let config = config::load(&args).await?;
    let account = config.account();

    let provider = ethrpc::provider(&config.node);
    let aggregator = Aggregator::new(config.bootstrap.multicall, provider.clone());
    let contracts = Arc::new(ContractSet::resolve(&aggregator, config.mode, config.bootstrap).await?);
    tracing::debug!(?contracts, "resolved contracts");

    let reader = Protocol::new(
        aggregator,
        contracts.clone(),
        config.vendor,
        config.historic,
    );
    let submitter = Submitter::new(
        Arc::new(provider),
        EthereumWallet::from(config.signer),
        account,
        config.gas_multiplier,
        config.confirmation_timeout,
        config.events,
    );
    let tokens = config.tokens;
    let operations = Operations::new(
        Arc::new(reader),
        submitter,
        contracts,
        Settings {
            vendor: config.vendor,
            slippage: config.slippage,
            tokens: tokens.clone(),
        },
    );

    let output = match args.command {
        Command::Status => Output::Status(Box::new(operations.status().await?)),
        Command::Balance { account: owner } => Output::Balance(Box::new(
            operations.balance(owner.unwrap_or(account)).await?,
        )),
        Command::Mint { token, amount } => Output::Submission(Box::new(
            operations.mint(token.into(), &amount).await?,
        )),
        Command::Redeem { token, amount } => Output::Submission(Box::new(
            operations.redeem(token.into(), &amount).await?,
        )),
        Command::AllowCommission { revoke } => Output::Submission(Box::new(
            operations.allow_governance_commission(!revoke).await?,
        )),
        Command::AllowReserve { revoke } => {
            Output::Submission(Box::new(operations.allow_reserve(!revoke).await?))
        }
        Command::VendorInfo { account } => Output::Vendor(operations.vendor_info(account).await?),
        Command::VendorAllowance { revoke } => {
            Output::Submission(Box::new(operations.vendor_allowance(!revoke).await?))
        }
        Command::VendorAddStake { amount } => {
            Output::Submission(Box::new(operations.add_stake(&amount).await?))
        }
        Command::VendorRemoveStake { amount } => {
            Output::Submission(Box::new(operations.remove_stake(&amount).await?))
        }
        Command::AllowTokenMigrator { revoke } => {
            Output::Submission(Box::new(operations.allow_token_migrator(!revoke).await?))
        }
        Command::MigrateToken => Output::Submission(Box::new(operations.migrate_token().await?)),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", report::render(&output, &tokens));
    }
    Ok(())
}
