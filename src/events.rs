//! Inbound event types and raw-log decoding.
//!
//! The host delivery mechanism hands the engine `ethers` logs in block /
//! transaction / log-index order; this module turns them into the typed events
//! the handlers consume. Topic signatures are matched against the canonical
//! Uniswap V3 factory and pool event hashes.

use ethers::types::{Address, Log, H256, I256, U256};
use once_cell::sync::Lazy;
use std::str::FromStr;
use thiserror::Error;

/// PoolCreated(address,address,uint24,int24,address)
pub static POOL_CREATED_SIG: Lazy<H256> = Lazy::new(|| {
    H256::from_str("0x783cca1c0412dd0d695e784568c96da2e9c22ff989357a2e8b1d9b2b4e6b7118")
        .unwrap_or_else(|_| H256::zero())
});

/// Mint(address,address,int24,int24,uint128,uint256,uint256)
pub static MINT_SIG: Lazy<H256> = Lazy::new(|| {
    H256::from_str("0x7a53080ba414158be7ec69b987b5fb7d07dee101fe85488f0853ae16239d0bde")
        .unwrap_or_else(|_| H256::zero())
});

/// Burn(address,int24,int24,uint128,uint256,uint256)
pub static BURN_SIG: Lazy<H256> = Lazy::new(|| {
    H256::from_str("0x0c396cd989a39f4459b5fa1aed6a9a8dcdbc45908acfd67e028cd568da98982c")
        .unwrap_or_else(|_| H256::zero())
});

/// Swap(address,address,int256,int256,uint160,uint128,int24)
pub static SWAP_SIG: Lazy<H256> = Lazy::new(|| {
    H256::from_str("0xc42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67")
        .unwrap_or_else(|_| H256::zero())
});

/// Block/transaction context shared by creation events.
#[derive(Debug, Clone, Copy)]
pub struct BlockMeta {
    pub block_number: u64,
    pub block_timestamp: U256,
    pub transaction_hash: H256,
}

#[derive(Debug, Clone)]
pub struct PoolCreatedEvent {
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    pub pool: Address,
    pub block: BlockMeta,
}

#[derive(Debug, Clone)]
pub struct MintEvent {
    /// Emitting pool contract.
    pub pool: Address,
    pub sender: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount: U256,
    pub amount0: U256,
    pub amount1: U256,
    pub block_timestamp: U256,
    pub tx_hash: H256,
    pub log_index: U256,
}

#[derive(Debug, Clone)]
pub struct BurnEvent {
    pub pool: Address,
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount: U256,
    pub amount0: U256,
    pub amount1: U256,
    pub block_timestamp: U256,
    pub tx_hash: H256,
    pub log_index: U256,
}

#[derive(Debug, Clone)]
pub struct SwapEvent {
    pub pool: Address,
    pub sender: Address,
    pub recipient: Address,
    /// Signed per-token deltas as emitted by the pool.
    pub amount0: I256,
    pub amount1: I256,
    pub block_timestamp: U256,
    pub tx_hash: H256,
    pub log_index: U256,
}

/// ERC-20 transfer touching a tracked pool, reduced to the fields the
/// transfer counters need.
#[derive(Debug, Clone)]
pub struct TransferEvent {
    pub pool: Address,
    pub token: Address,
    pub tx_hash: H256,
    pub log_index: U256,
}

/// Every event kind the engine consumes, in delivery order.
#[derive(Debug, Clone)]
pub enum Event {
    PoolCreated(PoolCreatedEvent),
    Mint(MintEvent),
    Burn(BurnEvent),
    Swap(SwapEvent),
    Transfer(TransferEvent),
}

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("unknown event signature {0:?}")]
    UnknownSignature(H256),
    #[error("log has no topics")]
    MissingTopic0,
    #[error("expected {expected} topics, got {got}")]
    TopicCount { expected: usize, got: usize },
    #[error("event data too short: expected at least {expected} bytes, got {got}")]
    ShortData { expected: usize, got: usize },
    #[error("log is missing field {0}")]
    MissingField(&'static str),
}

/// Interprets the low 3 bytes of a 32-byte ABI word as a signed int24.
fn decode_int24(word: &[u8]) -> i32 {
    let tail = &word[29..32];
    let raw = ((tail[0] as u32) << 16) | ((tail[1] as u32) << 8) | (tail[2] as u32);
    if (raw & 0x800000) != 0 {
        (raw as i32) | !0xFFFFFF
    } else {
        raw as i32
    }
}

fn topic_address(topic: &H256) -> Address {
    Address::from_slice(&topic.as_bytes()[12..])
}

fn word(data: &[u8], index: usize) -> U256 {
    U256::from_big_endian(&data[index * 32..(index + 1) * 32])
}

fn require_topics(log: &Log, expected: usize) -> Result<(), EventDecodeError> {
    if log.topics.len() != expected {
        return Err(EventDecodeError::TopicCount {
            expected,
            got: log.topics.len(),
        });
    }
    Ok(())
}

fn require_data(log: &Log, expected: usize) -> Result<(), EventDecodeError> {
    if log.data.len() < expected {
        return Err(EventDecodeError::ShortData {
            expected,
            got: log.data.len(),
        });
    }
    Ok(())
}

fn tx_hash(log: &Log) -> Result<H256, EventDecodeError> {
    log.transaction_hash
        .ok_or(EventDecodeError::MissingField("transaction_hash"))
}

fn log_index(log: &Log) -> Result<U256, EventDecodeError> {
    log.log_index
        .ok_or(EventDecodeError::MissingField("log_index"))
}

/// Decodes a factory or pool log into a typed [`Event`].
///
/// `block_timestamp` comes from the enclosing block header; logs do not carry
/// it themselves.
pub fn decode_log(log: &Log, block_timestamp: U256) -> Result<Event, EventDecodeError> {
    let topic0 = log.topics.first().ok_or(EventDecodeError::MissingTopic0)?;

    if *topic0 == *POOL_CREATED_SIG {
        require_topics(log, 4)?;
        require_data(log, 64)?;
        let data = log.data.as_ref();
        Ok(Event::PoolCreated(PoolCreatedEvent {
            token0: topic_address(&log.topics[1]),
            token1: topic_address(&log.topics[2]),
            fee: U256::from_big_endian(&log.topics[3].as_bytes()[29..32]).as_u32(),
            tick_spacing: decode_int24(&data[0..32]),
            pool: Address::from_slice(&data[44..64]),
            block: BlockMeta {
                block_number: log
                    .block_number
                    .ok_or(EventDecodeError::MissingField("block_number"))?
                    .as_u64(),
                block_timestamp,
                transaction_hash: tx_hash(log)?,
            },
        }))
    } else if *topic0 == *MINT_SIG {
        require_topics(log, 4)?;
        require_data(log, 128)?;
        let data = log.data.as_ref();
        Ok(Event::Mint(MintEvent {
            pool: log.address,
            sender: Address::from_slice(&data[12..32]),
            tick_lower: decode_int24(log.topics[2].as_bytes()),
            tick_upper: decode_int24(log.topics[3].as_bytes()),
            amount: word(data, 1),
            amount0: word(data, 2),
            amount1: word(data, 3),
            block_timestamp,
            tx_hash: tx_hash(log)?,
            log_index: log_index(log)?,
        }))
    } else if *topic0 == *BURN_SIG {
        require_topics(log, 4)?;
        require_data(log, 96)?;
        let data = log.data.as_ref();
        Ok(Event::Burn(BurnEvent {
            pool: log.address,
            owner: topic_address(&log.topics[1]),
            tick_lower: decode_int24(log.topics[2].as_bytes()),
            tick_upper: decode_int24(log.topics[3].as_bytes()),
            amount: word(data, 0),
            amount0: word(data, 1),
            amount1: word(data, 2),
            block_timestamp,
            tx_hash: tx_hash(log)?,
            log_index: log_index(log)?,
        }))
    } else if *topic0 == *SWAP_SIG {
        require_topics(log, 3)?;
        require_data(log, 160)?;
        let data = log.data.as_ref();
        Ok(Event::Swap(SwapEvent {
            pool: log.address,
            sender: topic_address(&log.topics[1]),
            recipient: topic_address(&log.topics[2]),
            amount0: I256::from_raw(word(data, 0)),
            amount1: I256::from_raw(word(data, 1)),
            block_timestamp,
            tx_hash: tx_hash(log)?,
            log_index: log_index(log)?,
        }))
    } else {
        Err(EventDecodeError::UnknownSignature(*topic0))
    }
}
