//! Where every snapshot field is read from.
//!
//! Both collateral modes expose the same state under different getter names.
//! The table below maps a [`Field`] to its getter for each mode so that the
//! read rounds are built from one list instead of one per mode.

use {
    crate::domain::{
        mode::{Action, Mode, PaymentAsset, TokenKind},
        snapshot::{Field, Kind, RateKey},
    },
    alloy::{
        dyn_abi::{DynSolType, DynSolValue, JsonAbiExt},
        json_abi::Function,
        primitives::{B256, Bytes},
    },
    contracts::buckets,
    thiserror::Error,
};

/// Contract a getter lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Moc,
    State,
    Inrate,
    Settlement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    pub target: Target,
    pub signature: &'static str,
    /// Bucket passed as the only argument, if the getter takes one.
    pub bucket: Option<B256>,
}

#[derive(Debug, Error)]
#[error("cannot encode {signature}")]
pub struct SchemaError {
    pub signature: String,
    #[source]
    pub source: alloy::dyn_abi::Error,
}

impl Source {
    const fn state(signature: &'static str) -> Self {
        Self {
            target: Target::State,
            signature,
            bucket: None,
        }
    }

    const fn bucket(signature: &'static str, bucket: B256) -> Self {
        Self {
            target: Target::State,
            signature,
            bucket: Some(bucket),
        }
    }

    const fn on(target: Target, signature: &'static str) -> Self {
        Self {
            target,
            signature,
            bucket: None,
        }
    }

    pub fn encode(&self) -> Result<Bytes, SchemaError> {
        let args = self
            .bucket
            .map(|bucket| vec![DynSolValue::FixedBytes(bucket, 32)])
            .unwrap_or_default();
        encode(self.signature, &args)
    }
}

/// ABI encodes a call from its human readable signature.
pub fn encode(signature: &str, args: &[DynSolValue]) -> Result<Bytes, SchemaError> {
    let error = |source| SchemaError {
        signature: signature.to_owned(),
        source,
    };
    let function = Function::parse(signature)
        .map_err(|err| error(alloy::dyn_abi::Error::from(err)))?;
    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(error)
}

pub fn descriptor(kind: Kind) -> DynSolType {
    match kind {
        Kind::Uint => DynSolType::Uint(256),
        Kind::Address => DynSolType::Address,
        Kind::Bool => DynSolType::Bool,
    }
}

/// Getter of `field` in `mode`.
pub fn source(field: Field, mode: Mode) -> Source {
    use {Field::*, Mode::*};

    let pick = |coinbase, reserve_token| match mode {
        Coinbase => coinbase,
        ReserveToken => reserve_token,
    };
    match field {
        ReservePrice => Source::state(pick("getBitcoinPrice()", "getReserveTokenPrice()")),
        GovernancePrice => Source::state("getMoCPrice()"),
        TcAvailableToRedeem => Source::state(pick("absoluteMaxBPro()", "absoluteMaxRiskPro()")),
        TxAvailableToMint => Source::bucket(
            pick("maxBProx(bytes32)", "maxRiskProx(bytes32)"),
            buckets::X2,
        ),
        TpAvailableToMint => {
            Source::state(pick("absoluteMaxDoc()", "absoluteMaxStableToken()"))
        }
        TpAvailableToRedeem => Source::state(pick("freeDoc()", "freeStableToken()")),
        C0Leverage => Source::bucket("leverage(bytes32)", buckets::C0),
        C0TargetCoverage => Source::state("cobj()"),
        X2Leverage => Source::bucket("leverage(bytes32)", buckets::X2),
        TotalReserve => Source::state(pick("rbtcInSystem()", "reserves()")),
        ReserveEmaPrice => Source::state(pick(
            "getBitcoinMovingAverage()",
            "getExponentalMovingAverage()",
        )),
        C0InrateBag => Source::bucket("getInrateBag(bytes32)", buckets::C0),
        C0Reserve => Source::bucket(
            pick("getBucketNBTC(bytes32)", "getBucketNReserve(bytes32)"),
            buckets::C0,
        ),
        C0Pegged => Source::bucket(
            pick("getBucketNDoc(bytes32)", "getBucketNStableToken(bytes32)"),
            buckets::C0,
        ),
        C0Collateral => Source::bucket(
            pick("getBucketNBPro(bytes32)", "getBucketNRiskPro(bytes32)"),
            buckets::C0,
        ),
        X2Reserve => Source::bucket(
            pick("getBucketNBTC(bytes32)", "getBucketNReserve(bytes32)"),
            buckets::X2,
        ),
        X2Pegged => Source::bucket(
            pick("getBucketNDoc(bytes32)", "getBucketNStableToken(bytes32)"),
            buckets::X2,
        ),
        X2Collateral => Source::bucket(
            pick("getBucketNBPro(bytes32)", "getBucketNRiskPro(bytes32)"),
            buckets::X2,
        ),
        GlobalCoverage => Source::state("globalCoverage()"),
        ReservePrecision => Source::on(Target::Moc, "getReservePrecision()"),
        MocPrecision => Source::on(Target::Moc, "getMocPrecision()"),
        X2Coverage => Source::bucket("coverage(bytes32)", buckets::X2),
        TcPriceInReserve => Source::state(pick("bproTecPrice()", "riskProTecPrice()")),
        TcPriceInUsd => Source::state(pick("bproUsdPrice()", "riskProUsdPrice()")),
        TcDiscountRate => Source::state(pick(
            "bproSpotDiscountRate()",
            "riskProSpotDiscountRate()",
        )),
        MaxTcWithDiscount => Source::state(pick(
            "maxBProWithDiscount()",
            "maxRiskProWithDiscount()",
        )),
        TcDiscountPrice => Source::state(pick("bproDiscountPrice()", "riskProDiscountPrice()")),
        TxPriceInReserve => Source::bucket(
            pick("bucketBProTecPrice(bytes32)", "bucketRiskProTecPrice(bytes32)"),
            buckets::X2,
        ),
        TxPriceInTc => Source::bucket(
            pick("bproxBProPrice(bytes32)", "riskProxRiskProPrice(bytes32)"),
            buckets::X2,
        ),
        SpotInrate => Source::on(Target::Inrate, "spotInrate()"),
        DayBlockSpan => Source::state("dayBlockSpan()"),
        BlockSpan => Source::on(Target::Settlement, "getBlockSpan()"),
        BlocksToSettlement => Source::state("blocksToSettlement()"),
        State => Source::state("state()"),
        Paused => Source::on(Target::Moc, "paused()"),
        LiquidationEnabled => Source::state("getLiquidationEnabled()"),
        Protected => Source::state("getProtected()"),
        GovernanceToken => Source::state("getMoCToken()"),
        GovernancePriceProvider => Source::state("getMoCPriceProvider()"),
        ReservePriceProvider => Source::state("getBtcPriceProvider()"),
        Vendors => Source::state("getMoCVendors()"),
    }
}

/// Name of the inrate constant holding the rate type identifier of `key`,
/// for example `MINT_BPRO_FEES_RBTC()`.
pub fn rate_type_getter(key: RateKey, mode: Mode) -> String {
    let action = match key.action {
        Action::Mint => "MINT",
        Action::Redeem => "REDEEM",
    };
    let token = match (mode, key.token) {
        (Mode::Coinbase, TokenKind::Collateral) => "BPRO",
        (Mode::Coinbase, TokenKind::Pegged) => "DOC",
        (Mode::Coinbase, TokenKind::Leveraged) => "BTCX",
        (Mode::ReserveToken, TokenKind::Collateral) => "RISKPRO",
        (Mode::ReserveToken, TokenKind::Pegged) => "STABLETOKEN",
        (Mode::ReserveToken, TokenKind::Leveraged) => "RISKPROX",
    };
    let asset = match (mode, key.asset) {
        (Mode::Coinbase, PaymentAsset::Reserve) => "RBTC",
        (Mode::ReserveToken, PaymentAsset::Reserve) => "RESERVE",
        (_, PaymentAsset::Governance) => "MOC",
    };
    format!("{action}_{token}_FEES_{asset}()")
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::keccak256,
        hex_literal::hex,
    };

    #[test]
    fn every_signature_encodes_in_both_modes() {
        for mode in [Mode::Coinbase, Mode::ReserveToken] {
            for field in Field::ALL {
                let source = source(field, mode);
                let data = source.encode().unwrap();
                let selector = &keccak256(source.signature.as_bytes())[..4];
                assert_eq!(&data[..4], selector, "{field:?} in {mode}");
                let expected_len = if source.bucket.is_some() { 36 } else { 4 };
                assert_eq!(data.len(), expected_len, "{field:?} in {mode}");
            }
            for key in RateKey::all() {
                encode(&rate_type_getter(key, mode), &[]).unwrap();
            }
        }
    }

    #[test]
    fn bucket_argument_is_encoded() {
        let data = source(Field::TxAvailableToMint, Mode::ReserveToken)
            .encode()
            .unwrap();
        assert_eq!(
            data[4..],
            hex!("5832000000000000000000000000000000000000000000000000000000000000")
        );
    }

    #[test]
    fn rate_type_getter_names() {
        let key = RateKey {
            action: Action::Redeem,
            token: TokenKind::Leveraged,
            asset: PaymentAsset::Reserve,
        };
        assert_eq!(
            rate_type_getter(key, Mode::Coinbase),
            "REDEEM_BTCX_FEES_RBTC()"
        );
        assert_eq!(
            rate_type_getter(key, Mode::ReserveToken),
            "REDEEM_RISKPROX_FEES_RESERVE()"
        );
        let key = RateKey {
            asset: PaymentAsset::Governance,
            token: TokenKind::Pegged,
            action: Action::Mint,
        };
        assert_eq!(rate_type_getter(key, Mode::Coinbase), "MINT_DOC_FEES_MOC()");
    }

    #[test]
    fn modes_share_mode_independent_getters() {
        assert_eq!(
            source(Field::GovernancePrice, Mode::Coinbase),
            source(Field::GovernancePrice, Mode::ReserveToken)
        );
        assert_ne!(
            source(Field::ReservePrice, Mode::Coinbase).signature,
            source(Field::ReservePrice, Mode::ReserveToken).signature
        );
    }

    #[test]
    fn malformed_signature_is_an_error() {
        assert!(encode("not a signature", &[]).is_err());
    }
}
