//! Decoding of raw log events into typed Bennee events
//!
//! Decoding is a pure function of the raw log: the signature topic selects
//! the event kind and the parameter values are mapped positionally into the
//! kind's fields, in the order the contract declares them

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use common::types::events::{BenneeEvent, EventValue, RawLogEvent};

use crate::abi::{
    Borrowed, CancelledRequest, CancelledSupply, DefaultWithdraw, FxRateUpdated,
    FxSchedulerUpdated, OwnershipTransferStarted, OwnershipTransferred, Repaid, Requested,
    SignerUpdated, Supplied, Withdraw,
};
use crate::errors::EventDecodingError;

/// Decode a raw log event into the typed event its signature topic selects
///
/// Fails with `UnknownSignature` when the topic matches no tracked kind,
/// `ArityMismatch` when the parameter count differs from the kind's
/// declaration, and `TypeMismatch` when a parameter cannot be coerced to its
/// declared type. No side effects
pub fn decode_event(raw: &RawLogEvent) -> Result<BenneeEvent, EventDecodingError> {
    let topic0 = raw.topic0;
    let params = &raw.params;

    // Matches cannot depend on associated constants, so we if-else
    if topic0 == Borrowed::SIGNATURE_HASH {
        check_arity("Borrowed", 2, params)?;
        Ok(BenneeEvent::Borrowed {
            by: as_address("Borrowed", "by", &params[0])?,
            borrow_index: as_uint("Borrowed", "borrowIndex", &params[1])?,
        })
    } else if topic0 == CancelledRequest::SIGNATURE_HASH {
        check_arity("CancelledRequest", 2, params)?;
        Ok(BenneeEvent::CancelledRequest {
            by: as_address("CancelledRequest", "by", &params[0])?,
            borrow_index: as_uint("CancelledRequest", "borrowIndex", &params[1])?,
        })
    } else if topic0 == CancelledSupply::SIGNATURE_HASH {
        check_arity("CancelledSupply", 4, params)?;
        Ok(BenneeEvent::CancelledSupply {
            lender: as_address("CancelledSupply", "lender", &params[0])?,
            borrower: as_address("CancelledSupply", "borrower", &params[1])?,
            borrow_index: as_uint("CancelledSupply", "borrowIndex", &params[2])?,
            cancel_amount: as_uint("CancelledSupply", "cancelAmount", &params[3])?,
        })
    } else if topic0 == DefaultWithdraw::SIGNATURE_HASH {
        check_arity("DefaultWithdraw", 4, params)?;
        Ok(BenneeEvent::DefaultWithdraw {
            by: as_address("DefaultWithdraw", "by", &params[0])?,
            borrow_index: as_uint("DefaultWithdraw", "borrowIndex", &params[1])?,
            borrower: as_address("DefaultWithdraw", "borrower", &params[2])?,
            amount: as_uint("DefaultWithdraw", "amount", &params[3])?,
        })
    } else if topic0 == FxRateUpdated::SIGNATURE_HASH {
        check_arity("FxRateUpdated", 2, params)?;
        Ok(BenneeEvent::FxRateUpdated {
            scheduler: as_address("FxRateUpdated", "scheduler", &params[0])?,
            fx_rate: as_uint("FxRateUpdated", "fxRate", &params[1])?,
        })
    } else if topic0 == FxSchedulerUpdated::SIGNATURE_HASH {
        check_arity("FxSchedulerUpdated", 2, params)?;
        Ok(BenneeEvent::FxSchedulerUpdated {
            old_fx_scheduler: as_address("FxSchedulerUpdated", "oldFxScheduler", &params[0])?,
            new_fx_scheduler: as_address("FxSchedulerUpdated", "newFxScheduler", &params[1])?,
        })
    } else if topic0 == OwnershipTransferStarted::SIGNATURE_HASH {
        check_arity("OwnershipTransferStarted", 2, params)?;
        Ok(BenneeEvent::OwnershipTransferStarted {
            previous_owner: as_address("OwnershipTransferStarted", "previousOwner", &params[0])?,
            new_owner: as_address("OwnershipTransferStarted", "newOwner", &params[1])?,
        })
    } else if topic0 == OwnershipTransferred::SIGNATURE_HASH {
        check_arity("OwnershipTransferred", 2, params)?;
        Ok(BenneeEvent::OwnershipTransferred {
            previous_owner: as_address("OwnershipTransferred", "previousOwner", &params[0])?,
            new_owner: as_address("OwnershipTransferred", "newOwner", &params[1])?,
        })
    } else if topic0 == Repaid::SIGNATURE_HASH {
        check_arity("Repaid", 3, params)?;
        Ok(BenneeEvent::Repaid {
            borrower: as_address("Repaid", "borrower", &params[0])?,
            borrower_index: as_uint("Repaid", "borrowerIndex", &params[1])?,
            repay_amount: as_uint("Repaid", "repayAmount", &params[2])?,
        })
    } else if topic0 == Requested::SIGNATURE_HASH {
        check_arity("Requested", 6, params)?;
        Ok(BenneeEvent::Requested {
            user: as_address("Requested", "user", &params[0])?,
            index: as_uint("Requested", "index", &params[1])?,
            amount: as_uint("Requested", "amount", &params[2])?,
            tenure: as_uint("Requested", "tenure", &params[3])?,
            interest_rate: as_uint("Requested", "interestRate", &params[4])?,
            repayment_window: as_uint("Requested", "repaymentWindow", &params[5])?,
        })
    } else if topic0 == SignerUpdated::SIGNATURE_HASH {
        check_arity("SignerUpdated", 2, params)?;
        Ok(BenneeEvent::SignerUpdated {
            old_signer: as_address("SignerUpdated", "oldSigner", &params[0])?,
            new_signer: as_address("SignerUpdated", "newSigner", &params[1])?,
        })
    } else if topic0 == Supplied::SIGNATURE_HASH {
        check_arity("Supplied", 4, params)?;
        Ok(BenneeEvent::Supplied {
            lender: as_address("Supplied", "lender", &params[0])?,
            lend_amount: as_uint("Supplied", "lendAmount", &params[1])?,
            borrower: as_address("Supplied", "borrower", &params[2])?,
            borrow_index: as_uint("Supplied", "borrowIndex", &params[3])?,
        })
    } else if topic0 == Withdraw::SIGNATURE_HASH {
        check_arity("Withdraw", 4, params)?;
        Ok(BenneeEvent::Withdraw {
            by: as_address("Withdraw", "by", &params[0])?,
            borrow_index: as_uint("Withdraw", "borrowIndex", &params[1])?,
            borrower: as_address("Withdraw", "borrower", &params[2])?,
            amount: as_uint("Withdraw", "amount", &params[3])?,
        })
    } else {
        Err(EventDecodingError::UnknownSignature(topic0))
    }
}

// -----------
// | Helpers |
// -----------

/// Check that a log carries exactly the parameter count its kind declares
fn check_arity(
    event: &'static str,
    expected: usize,
    params: &[EventValue],
) -> Result<(), EventDecodingError> {
    if params.len() != expected {
        return Err(EventDecodingError::ArityMismatch {
            event,
            expected,
            actual: params.len(),
        });
    }
    Ok(())
}

/// Coerce a parameter value into an address
fn as_address(
    event: &'static str,
    param: &'static str,
    value: &EventValue,
) -> Result<Address, EventDecodingError> {
    match value {
        EventValue::Address(addr) => Ok(*addr),
        _ => Err(EventDecodingError::TypeMismatch {
            event,
            param,
            expected: "address",
            actual: value.type_str(),
        }),
    }
}

/// Coerce a parameter value into an unsigned 256-bit integer
fn as_uint(
    event: &'static str,
    param: &'static str,
    value: &EventValue,
) -> Result<U256, EventDecodingError> {
    match value {
        EventValue::Uint(val) => Ok(*val),
        _ => Err(EventDecodingError::TypeMismatch {
            event,
            param,
            expected: "uint256",
            actual: value.type_str(),
        }),
    }
}

#[cfg(test)]
mod test {
    use alloy_primitives::{Address, B256, TxHash, U256};
    use alloy_sol_types::SolEvent;
    use common::types::events::{BenneeEvent, EventValue, RawLogEvent};

    use crate::abi::{self, KNOWN_EVENT_SIGNATURES, ParamKind};
    use crate::errors::EventDecodingError;

    use super::decode_event;

    /// Build a raw log with the given topic and params and dummy metadata
    fn raw_log(topic0: B256, params: Vec<EventValue>) -> RawLogEvent {
        RawLogEvent {
            block_number: 1,
            block_timestamp: 1_700_000_000,
            transaction_hash: TxHash::from([0xaa; 32]),
            log_index: 0,
            address: Address::from([0x0b; 20]),
            topic0,
            params,
        }
    }

    /// Tests positional field mapping for a borrow event
    #[test]
    fn test_decode_borrowed() {
        let by = Address::from([0x01; 20]);
        let raw = raw_log(
            abi::Borrowed::SIGNATURE_HASH,
            vec![EventValue::Address(by), EventValue::Uint(U256::from(234))],
        );

        let event = decode_event(&raw).unwrap();
        assert_eq!(event, BenneeEvent::Borrowed { by, borrow_index: U256::from(234) });
    }

    /// Tests positional field mapping for a supply event with interleaved
    /// address and integer parameters
    #[test]
    fn test_decode_supplied() {
        let lender = Address::from([0x01; 20]);
        let borrower = Address::from([0x02; 20]);
        let raw = raw_log(
            abi::Supplied::SIGNATURE_HASH,
            vec![
                EventValue::Address(lender),
                EventValue::Uint(U256::from(1_000)),
                EventValue::Address(borrower),
                EventValue::Uint(U256::from(7)),
            ],
        );

        let event = decode_event(&raw).unwrap();
        assert_eq!(
            event,
            BenneeEvent::Supplied {
                lender,
                lend_amount: U256::from(1_000),
                borrower,
                borrow_index: U256::from(7),
            }
        );
    }

    /// Tests that every tracked signature decodes when its params match the
    /// declared layout
    #[test]
    fn test_decode_all_kinds() {
        for sig in KNOWN_EVENT_SIGNATURES {
            let layout = abi::event_layout(sig).unwrap();
            let params = layout
                .iter()
                .enumerate()
                .map(|(i, kind)| match kind {
                    ParamKind::Address => EventValue::Address(Address::repeat_byte(i as u8 + 1)),
                    ParamKind::Uint => EventValue::Uint(U256::from(i + 1)),
                })
                .collect();

            let event = decode_event(&raw_log(sig, params)).unwrap();
            assert_eq!(Some(event.name()), abi::event_name(sig));
        }
    }

    /// Tests that an untracked signature fails with an unknown signature
    /// error carrying the topic
    #[test]
    fn test_decode_unknown_signature() {
        let topic = B256::from([0x42; 32]);
        let err = decode_event(&raw_log(topic, vec![])).unwrap_err();

        assert!(matches!(err, EventDecodingError::UnknownSignature(t) if t == topic));
        assert!(!err.is_malformed());
    }

    /// Tests that a tracked signature with too few parameters fails with an
    /// arity mismatch
    #[test]
    fn test_decode_arity_mismatch() {
        let raw = raw_log(
            abi::Withdraw::SIGNATURE_HASH,
            vec![
                EventValue::Address(Address::from([0x01; 20])),
                EventValue::Uint(U256::from(1)),
                EventValue::Address(Address::from([0x02; 20])),
            ],
        );

        let err = decode_event(&raw).unwrap_err();
        assert!(matches!(
            err,
            EventDecodingError::ArityMismatch { event: "Withdraw", expected: 4, actual: 3 }
        ));
        assert!(err.is_malformed());
    }

    /// Tests that a non-address value in an address position fails with a
    /// type mismatch naming the parameter
    #[test]
    fn test_decode_type_mismatch() {
        let raw = raw_log(
            abi::Borrowed::SIGNATURE_HASH,
            vec![EventValue::Uint(U256::from(5)), EventValue::Uint(U256::from(234))],
        );

        let err = decode_event(&raw).unwrap_err();
        assert!(matches!(
            err,
            EventDecodingError::TypeMismatch { event: "Borrowed", param: "by", .. }
        ));
        assert!(err.is_malformed());
    }
}
