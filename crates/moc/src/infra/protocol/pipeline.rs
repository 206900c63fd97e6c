//! The dependent read rounds behind a [`StateSnapshot`].
//!
//! Each stage consumes the typed output of the previous one:
//! `FetchState -> ResolveRates -> FetchHistoric`. Address resolution happens
//! once at startup, see [`crate::infra::contracts`].

use {
    super::{
        Error,
        schema::{self, Target},
    },
    crate::{
        domain::snapshot::{Field, Historic, Kind, RateKey, StateSnapshot, Value},
        infra::contracts::ContractSet,
    },
    alloy::{
        dyn_abi::{DynSolType, DynSolValue},
        primitives::{Address, U256},
        sol_types::SolCall,
    },
    contracts::MoCInrate,
    ethrpc::{Aggregator, Batch},
    std::collections::BTreeMap,
    tracing::instrument,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Slot {
    Field(Field),
    RateType(RateKey),
}

/// Output of the state round.
#[derive(Debug)]
struct State {
    block: u64,
    values: BTreeMap<Field, Option<Value>>,
    rate_types: BTreeMap<RateKey, Option<U256>>,
}

pub struct Pipeline<'a> {
    pub aggregator: &'a Aggregator,
    pub contracts: &'a ContractSet,
    pub historic: bool,
}

impl Pipeline<'_> {
    #[instrument(skip_all, fields(mode = %self.contracts.mode))]
    pub async fn run(&self) -> Result<StateSnapshot, Error> {
        let state = self.fetch_state().await?;
        let rates = self.resolve_rates(&state.rate_types).await?;
        let historic = if self.historic {
            self.fetch_historic(&state).await?
        } else {
            None
        };
        Ok(StateSnapshot {
            block: state.block,
            mode: self.contracts.mode,
            values: state.values,
            rate_types: state.rate_types,
            rates,
            historic,
        })
    }

    fn address(&self, target: Target) -> Address {
        match target {
            Target::Moc => self.contracts.moc,
            Target::State => self.contracts.state,
            Target::Inrate => self.contracts.inrate,
            Target::Settlement => self.contracts.settlement,
        }
    }

    fn push_field(&self, batch: &mut Batch<Slot>, field: Field) -> Result<(), Error> {
        let source = schema::source(field, self.contracts.mode);
        batch.push(
            Slot::Field(field),
            self.address(source.target),
            source.encode()?,
            schema::descriptor(field.kind()),
        );
        Ok(())
    }

    async fn fetch_state(&self) -> Result<State, Error> {
        let mode = self.contracts.mode;
        let mut batch = Batch::new();
        for field in Field::ALL {
            self.push_field(&mut batch, field)?;
            // The rate type constants go over the wire right after the spot
            // rate, next to the other inrate reads.
            if field == Field::SpotInrate {
                for key in RateKey::all() {
                    batch.push(
                        Slot::RateType(key),
                        self.contracts.inrate,
                        schema::encode(&schema::rate_type_getter(key, mode), &[])?,
                        DynSolType::Uint(256),
                    );
                }
            }
        }

        let decoded = batch.execute(self.aggregator, None).await?;
        let values = Field::ALL
            .into_iter()
            .map(|field| (field, convert(decoded.get(&Slot::Field(field)), field.kind())))
            .collect::<BTreeMap<_, _>>();
        let rate_types = RateKey::all()
            .map(|key| (key, decoded.uint(&Slot::RateType(key))))
            .collect();

        let missing = values.values().filter(|value| value.is_none()).count();
        if missing > 0 {
            tracing::warn!(missing, "some protocol reads failed");
        }
        tracing::debug!(block = decoded.block, "fetched protocol state");
        Ok(State {
            block: decoded.block,
            values,
            rate_types,
        })
    }

    async fn resolve_rates(
        &self,
        rate_types: &BTreeMap<RateKey, Option<U256>>,
    ) -> Result<BTreeMap<RateKey, Option<U256>>, Error> {
        let mut batch = Batch::new();
        for (key, rate_type) in rate_types {
            let Some(tx_type) = rate_type.and_then(|value| u8::try_from(value).ok()) else {
                tracing::warn!(%key, ?rate_type, "no usable rate type");
                continue;
            };
            batch.push(
                *key,
                self.contracts.inrate,
                MoCInrate::commissionRatesByTxTypeCall { txType: tx_type }.abi_encode(),
                DynSolType::Uint(256),
            );
        }
        if batch.is_empty() {
            return Ok(RateKey::all().map(|key| (key, None)).collect());
        }

        let decoded = batch.execute(self.aggregator, None).await?;
        Ok(RateKey::all()
            .map(|key| (key, decoded.uint(&key)))
            .collect())
    }

    /// Re-reads the prices as of a day ago. Skipped when the day span is
    /// unknown or reaches before genesis.
    async fn fetch_historic(&self, state: &State) -> Result<Option<Historic>, Error> {
        let span = state
            .values
            .get(&Field::DayBlockSpan)
            .copied()
            .flatten()
            .and_then(|value| match value {
                Value::Uint(span) => u64::try_from(span).ok(),
                _ => None,
            });
        let Some(block) = span.and_then(|span| state.block.checked_sub(span)) else {
            tracing::warn!(block = state.block, ?span, "cannot locate the historic block");
            return Ok(None);
        };

        let mut batch = Batch::new();
        for field in Field::HISTORIC {
            self.push_field(&mut batch, field)?;
        }
        let decoded = batch.execute(self.aggregator, Some(block)).await?;
        tracing::debug!(block, "fetched historic prices");
        Ok(Some(Historic {
            block,
            values: Field::HISTORIC
                .into_iter()
                .map(|field| (field, convert(decoded.get(&Slot::Field(field)), field.kind())))
                .collect(),
        }))
    }
}

fn convert(value: Option<&DynSolValue>, kind: Kind) -> Option<Value> {
    let value = value?;
    match kind {
        Kind::Uint => value.as_uint().map(|(value, _)| Value::Uint(value)),
        Kind::Address => value.as_address().map(Value::Address),
        Kind::Bool => value.as_bool().map(Value::Bool),
    }
}
