//! Solidity ABI definitions of the Bennee contract's events and the
//! declared parameter layouts used to decode raw log data
#![allow(missing_docs)]
#![allow(unused_doc_comments)]

use alloy_primitives::B256;
use alloy_sol_types::{SolEvent, sol};

pub use Bennee::*;

sol! {
    contract Bennee {
        event Borrowed(address by, uint256 borrowIndex);
        event CancelledRequest(address by, uint256 borrowIndex);
        event CancelledSupply(address lender, address borrower, uint256 borrowIndex, uint256 cancelAmount);
        event DefaultWithdraw(address by, uint256 borrowIndex, address borrower, uint256 amount);
        event FxRateUpdated(address scheduler, uint256 fxRate);
        event FxSchedulerUpdated(address oldFxScheduler, address newFxScheduler);
        event OwnershipTransferStarted(address previousOwner, address newOwner);
        event OwnershipTransferred(address previousOwner, address newOwner);
        event Repaid(address borrower, uint256 borrowerIndex, uint256 repayAmount);
        event Requested(address user, uint256 index, uint256 amount, uint256 tenure, uint256 interestRate, uint256 repaymentWindow);
        event SignerUpdated(address oldSigner, address newSigner);
        event Supplied(address lender, uint256 lendAmount, address borrower, uint256 borrowIndex);
        event Withdraw(address by, uint256 borrowIndex, address borrower, uint256 amount);
    }
}

/// A list of the signature topics of all tracked events
pub const KNOWN_EVENT_SIGNATURES: [B256; 13] = [
    Borrowed::SIGNATURE_HASH,
    CancelledRequest::SIGNATURE_HASH,
    CancelledSupply::SIGNATURE_HASH,
    DefaultWithdraw::SIGNATURE_HASH,
    FxRateUpdated::SIGNATURE_HASH,
    FxSchedulerUpdated::SIGNATURE_HASH,
    OwnershipTransferStarted::SIGNATURE_HASH,
    OwnershipTransferred::SIGNATURE_HASH,
    Repaid::SIGNATURE_HASH,
    Requested::SIGNATURE_HASH,
    SignerUpdated::SIGNATURE_HASH,
    Supplied::SIGNATURE_HASH,
    Withdraw::SIGNATURE_HASH,
];

/// The static ABI type of a single event parameter
///
/// Every Bennee event parameter is a single static word; dynamic types do
/// not appear in the contract's events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// A 20-byte address, left-padded to a word
    Address,
    /// An unsigned 256-bit integer
    Uint,
}

/// Look up the declared parameter layout for a known event signature topic
///
/// Returns `None` for signatures the indexer does not track. Matches cannot
/// depend on associated constants, so we if-else
pub fn event_layout(topic0: B256) -> Option<&'static [ParamKind]> {
    use ParamKind::{Address as Addr, Uint};

    if topic0 == Borrowed::SIGNATURE_HASH {
        Some(&[Addr, Uint])
    } else if topic0 == CancelledRequest::SIGNATURE_HASH {
        Some(&[Addr, Uint])
    } else if topic0 == CancelledSupply::SIGNATURE_HASH {
        Some(&[Addr, Addr, Uint, Uint])
    } else if topic0 == DefaultWithdraw::SIGNATURE_HASH {
        Some(&[Addr, Uint, Addr, Uint])
    } else if topic0 == FxRateUpdated::SIGNATURE_HASH {
        Some(&[Addr, Uint])
    } else if topic0 == FxSchedulerUpdated::SIGNATURE_HASH {
        Some(&[Addr, Addr])
    } else if topic0 == OwnershipTransferStarted::SIGNATURE_HASH {
        Some(&[Addr, Addr])
    } else if topic0 == OwnershipTransferred::SIGNATURE_HASH {
        Some(&[Addr, Addr])
    } else if topic0 == Repaid::SIGNATURE_HASH {
        Some(&[Addr, Uint, Uint])
    } else if topic0 == Requested::SIGNATURE_HASH {
        Some(&[Addr, Uint, Uint, Uint, Uint, Uint])
    } else if topic0 == SignerUpdated::SIGNATURE_HASH {
        Some(&[Addr, Addr])
    } else if topic0 == Supplied::SIGNATURE_HASH {
        Some(&[Addr, Uint, Addr, Uint])
    } else if topic0 == Withdraw::SIGNATURE_HASH {
        Some(&[Addr, Uint, Addr, Uint])
    } else {
        None
    }
}

/// Look up the declared name for a known event signature topic
pub fn event_name(topic0: B256) -> Option<&'static str> {
    if topic0 == Borrowed::SIGNATURE_HASH {
        Some("Borrowed")
    } else if topic0 == CancelledRequest::SIGNATURE_HASH {
        Some("CancelledRequest")
    } else if topic0 == CancelledSupply::SIGNATURE_HASH {
        Some("CancelledSupply")
    } else if topic0 == DefaultWithdraw::SIGNATURE_HASH {
        Some("DefaultWithdraw")
    } else if topic0 == FxRateUpdated::SIGNATURE_HASH {
        Some("FxRateUpdated")
    } else if topic0 == FxSchedulerUpdated::SIGNATURE_HASH {
        Some("FxSchedulerUpdated")
    } else if topic0 == OwnershipTransferStarted::SIGNATURE_HASH {
        Some("OwnershipTransferStarted")
    } else if topic0 == OwnershipTransferred::SIGNATURE_HASH {
        Some("OwnershipTransferred")
    } else if topic0 == Repaid::SIGNATURE_HASH {
        Some("Repaid")
    } else if topic0 == Requested::SIGNATURE_HASH {
        Some("Requested")
    } else if topic0 == SignerUpdated::SIGNATURE_HASH {
        Some("SignerUpdated")
    } else if topic0 == Supplied::SIGNATURE_HASH {
        Some("Supplied")
    } else if topic0 == Withdraw::SIGNATURE_HASH {
        Some("Withdraw")
    } else {
        None
    }
}
