//! Defines the `BenneeClient`, a log source backed by a JSON-RPC provider
//! that serves the tracked contract's logs one block at a time

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use common::types::{
    BlockNumber,
    events::{EventValue, RawLogEvent},
};
use tracing::warn;
use util::err_str;

use crate::abi::{self, ParamKind};
use crate::errors::LogSourceError;
use crate::traits::LogSource;

/// The width of a single ABI-encoded word in a log's data
const WORD_LEN: usize = 32;
/// The number of leading zero bytes in a word holding an address
const ADDRESS_PAD_LEN: usize = 12;

/// A log source backed by a JSON-RPC provider, filtered to the Bennee
/// contract's address
#[derive(Clone)]
pub struct BenneeClient {
    /// The underlying RPC provider
    provider: DynProvider,
    /// The address of the tracked contract
    address: Address,
}

impl BenneeClient {
    /// Create a new client from an existing provider
    pub fn new(provider: DynProvider, address: Address) -> Self {
        Self { provider, address }
    }

    /// Create a new client connected to an HTTP RPC endpoint
    pub fn connect_http(rpc_url: &str, address: Address) -> Result<Self, LogSourceError> {
        let url = rpc_url
            .parse::<alloy::transports::http::reqwest::Url>()
            .map_err(err_str!(LogSourceError::SourceUnavailable))?;
        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self::new(DynProvider::new(provider), address))
    }

    /// The address of the tracked contract
    pub fn contract_address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl LogSource for BenneeClient {
    async fn latest_block(&self) -> Result<BlockNumber, LogSourceError> {
        let block_number = self.provider.get_block_number().await?;
        Ok(block_number)
    }

    async fn fetch_logs(
        &self,
        block_number: BlockNumber,
    ) -> Result<Vec<RawLogEvent>, LogSourceError> {
        // Fetch the block header first; its timestamp is copied onto every
        // log, and a missing block means the source has not seen it yet
        let block = self
            .provider
            .get_block_by_number(block_number.into())
            .await?
            .ok_or(LogSourceError::BlockNotFound(block_number))?;
        let block_timestamp = block.header.timestamp;

        let filter = Filter::new()
            .address(self.address)
            .from_block(block_number)
            .to_block(block_number);
        let logs = self.provider.get_logs(&filter).await?;

        let mut raw_logs: Vec<RawLogEvent> =
            logs.into_iter().filter_map(|log| convert_log(log, block_timestamp)).collect();
        raw_logs.sort_by_key(|log| log.log_index);

        Ok(raw_logs)
    }
}

// -----------
// | Helpers |
// -----------

/// Convert an RPC log into a raw log event, decoding its data words into
/// parameter values by the declared layout of its signature topic
///
/// Logs missing mined-block metadata are skipped with a warning; a confirmed
/// block's logs always carry it
fn convert_log(log: Log, block_timestamp: u64) -> Option<RawLogEvent> {
    let Some(block_number) = log.block_number else {
        warn!("log missing block number, skipping");
        return None;
    };
    let Some(transaction_hash) = log.transaction_hash else {
        warn!("log missing transaction hash, skipping");
        return None;
    };
    let Some(log_index) = log.log_index else {
        warn!("log missing log index, skipping");
        return None;
    };
    let Some(topic0) = log.topics().first().copied() else {
        warn!("log missing signature topic, skipping");
        return None;
    };

    let params = decode_words(topic0, log.data().data.as_ref());
    Some(RawLogEvent {
        block_number,
        block_timestamp,
        transaction_hash,
        log_index,
        address: log.address(),
        topic0,
        params,
    })
}

/// Mechanically decode a log's data into parameter values, word by word,
/// guided by the declared layout of its signature topic
///
/// Coercion is intentionally not enforced here: a word that does not fit its
/// declared kind is surfaced as a raw uint (or trailing bytes) so the event
/// decoder can reject it with full context
fn decode_words(topic0: B256, data: &[u8]) -> Vec<EventValue> {
    let layout = abi::event_layout(topic0);

    let mut params = Vec::with_capacity(data.len() / WORD_LEN);
    for (i, word) in data.chunks(WORD_LEN).enumerate() {
        if word.len() < WORD_LEN {
            params.push(EventValue::Bytes(word.to_vec()));
            continue;
        }

        let kind = layout.and_then(|kinds| kinds.get(i));
        let value = match kind {
            Some(ParamKind::Address) => word_to_address(word),
            _ => EventValue::Uint(U256::from_be_slice(word)),
        };
        params.push(value);
    }

    params
}

/// Interpret a word as an address
///
/// A word with a nonzero prefix is not a valid address; it is surfaced as a
/// raw uint for the decoder to reject
fn word_to_address(word: &[u8]) -> EventValue {
    if word[..ADDRESS_PAD_LEN].iter().all(|byte| *byte == 0) {
        EventValue::Address(Address::from_slice(&word[ADDRESS_PAD_LEN..]))
    } else {
        EventValue::Uint(U256::from_be_slice(word))
    }
}
