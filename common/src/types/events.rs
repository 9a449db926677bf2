//! Defines the raw log event type emitted by a log source and the typed
//! domain events decoded from it

use alloy_primitives::{Address, B256, TxHash, U256};
use serde::{Deserialize, Serialize};

use super::BlockNumber;

/// A single decoded parameter value carried by a raw log event
///
/// Log sources decode ABI-encoded words mechanically; coercing a value into
/// the field type an event kind expects is the decoder's job
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventValue {
    /// A 20-byte contract or account address
    Address(Address),
    /// An unsigned 256-bit integer
    Uint(U256),
    /// A boolean flag
    Bool(bool),
    /// An opaque byte string
    Bytes(Vec<u8>),
}

impl EventValue {
    /// The solidity-facing name of the value's type, used in error messages
    pub fn type_str(&self) -> &'static str {
        match self {
            EventValue::Address(_) => "address",
            EventValue::Uint(_) => "uint256",
            EventValue::Bool(_) => "bool",
            EventValue::Bytes(_) => "bytes",
        }
    }
}

/// A raw log event as supplied by a log source for a single block
///
/// Immutable once constructed; the decoder derives a [`BenneeEvent`] from it
/// without mutating or re-fetching anything
#[derive(Clone, Debug, PartialEq)]
pub struct RawLogEvent {
    /// The number of the block the log was emitted in
    pub block_number: BlockNumber,
    /// The timestamp of the block the log was emitted in
    pub block_timestamp: u64,
    /// The hash of the transaction that emitted the log
    pub transaction_hash: TxHash,
    /// The index of the log within its transaction
    pub log_index: u64,
    /// The address of the emitting contract
    pub address: Address,
    /// The event signature topic (topic0) identifying the event kind
    pub topic0: B256,
    /// The decoded parameter values, in contract declaration order
    pub params: Vec<EventValue>,
}

/// A typed event emitted by the Bennee lending contract
///
/// One variant per tracked event kind; each carries only the fields the
/// contract declares for that kind, in declaration order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenneeEvent {
    /// A borrower drew down a funded loan
    Borrowed {
        /// The borrower that drew down the loan
        by: Address,
        /// The index of the borrow position
        borrow_index: U256,
    },
    /// A borrower cancelled an open loan request
    CancelledRequest {
        /// The borrower that cancelled the request
        by: Address,
        /// The index of the borrow position
        borrow_index: U256,
    },
    /// A lender withdrew a supply commitment from an unfunded request
    CancelledSupply {
        /// The lender cancelling their supply
        lender: Address,
        /// The borrower whose request was being supplied
        borrower: Address,
        /// The index of the borrow position
        borrow_index: U256,
        /// The amount of supply withdrawn
        cancel_amount: U256,
    },
    /// A lender withdrew from a defaulted loan
    DefaultWithdraw {
        /// The lender performing the withdrawal
        by: Address,
        /// The index of the borrow position
        borrow_index: U256,
        /// The borrower that defaulted
        borrower: Address,
        /// The amount withdrawn
        amount: U256,
    },
    /// The fx scheduler posted a new exchange rate
    FxRateUpdated {
        /// The scheduler that posted the rate
        scheduler: Address,
        /// The new exchange rate
        fx_rate: U256,
    },
    /// The fx scheduler role was reassigned
    FxSchedulerUpdated {
        /// The previous scheduler
        old_fx_scheduler: Address,
        /// The new scheduler
        new_fx_scheduler: Address,
    },
    /// A two-step ownership transfer was initiated
    OwnershipTransferStarted {
        /// The current owner
        previous_owner: Address,
        /// The pending new owner
        new_owner: Address,
    },
    /// An ownership transfer completed
    OwnershipTransferred {
        /// The owner before the transfer
        previous_owner: Address,
        /// The owner after the transfer
        new_owner: Address,
    },
    /// A borrower repaid a loan
    Repaid {
        /// The borrower repaying
        borrower: Address,
        /// The index of the borrow position
        borrower_index: U256,
        /// The amount repaid
        repay_amount: U256,
    },
    /// A borrower opened a loan request
    Requested {
        /// The requesting borrower
        user: Address,
        /// The index of the new borrow position
        index: U256,
        /// The principal requested
        amount: U256,
        /// The loan tenure
        tenure: U256,
        /// The offered interest rate
        interest_rate: U256,
        /// The repayment window after tenure
        repayment_window: U256,
    },
    /// The attestation signer role was reassigned
    SignerUpdated {
        /// The previous signer
        old_signer: Address,
        /// The new signer
        new_signer: Address,
    },
    /// A lender supplied funds to a loan request
    Supplied {
        /// The supplying lender
        lender: Address,
        /// The amount supplied
        lend_amount: U256,
        /// The borrower being funded
        borrower: Address,
        /// The index of the borrow position
        borrow_index: U256,
    },
    /// A lender withdrew principal and interest from a repaid loan
    Withdraw {
        /// The lender performing the withdrawal
        by: Address,
        /// The index of the borrow position
        borrow_index: U256,
        /// The borrower of the position
        borrower: Address,
        /// The amount withdrawn
        amount: U256,
    },
}

impl BenneeEvent {
    /// The name of the event kind, as the contract declares it
    pub fn name(&self) -> &'static str {
        match self {
            BenneeEvent::Borrowed { .. } => "Borrowed",
            BenneeEvent::CancelledRequest { .. } => "CancelledRequest",
            BenneeEvent::CancelledSupply { .. } => "CancelledSupply",
            BenneeEvent::DefaultWithdraw { .. } => "DefaultWithdraw",
            BenneeEvent::FxRateUpdated { .. } => "FxRateUpdated",
            BenneeEvent::FxSchedulerUpdated { .. } => "FxSchedulerUpdated",
            BenneeEvent::OwnershipTransferStarted { .. } => "OwnershipTransferStarted",
            BenneeEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            BenneeEvent::Repaid { .. } => "Repaid",
            BenneeEvent::Requested { .. } => "Requested",
            BenneeEvent::SignerUpdated { .. } => "SignerUpdated",
            BenneeEvent::Supplied { .. } => "Supplied",
            BenneeEvent::Withdraw { .. } => "Withdraw",
        }
    }
}
