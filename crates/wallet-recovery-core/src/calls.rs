//! Call parsing and construction.
//!
//! Decoding uses `alloy_json_abi::Function::parse()` plus
//! `abi_decode_input`, the same pattern Foundry uses for calldata decoding.
//! Parsing is best-effort: any decode failure falls through to
//! `CallKind::Unknown` rather than erroring.

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::Function;
use alloy::primitives::{Address, Bytes, U256};
use eyre::{eyre, Result, WrapErr};

use crate::domain::{Call, CallKind, ContractType, ParsedCall, TokenRecord};
use crate::ports::PortError;

pub const TRANSFER_SIG: &str = "transfer(address,uint256)";
pub const TRANSFER_FROM_SIG: &str = "transferFrom(address,address,uint256)";
pub const SAFE_TRANSFER_FROM_721_SIG: &str = "safeTransferFrom(address,address,uint256)";
pub const SAFE_TRANSFER_FROM_1155_SIG: &str =
    "safeTransferFrom(address,address,uint256,uint256,bytes)";

/// `transfer(address,uint256)`
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
/// `transferFrom(address,address,uint256)`
pub const TRANSFER_FROM_SELECTOR: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];
/// `safeTransferFrom(address,address,uint256)`
pub const SAFE_TRANSFER_FROM_721_SELECTOR: [u8; 4] = [0x42, 0x84, 0x2e, 0x0e];
/// `safeTransferFrom(address,address,uint256,uint256,bytes)`
pub const SAFE_TRANSFER_FROM_1155_SELECTOR: [u8; 4] = [0xf2, 0x42, 0x43, 0x2a];

/// Decode the intent of a single call from its `to`/`value`/`data`.
pub fn parse_call(to: Address, value: U256, data: &Bytes) -> ParsedCall {
    if data.is_empty() {
        return ParsedCall {
            kind: CallKind::Native,
            recipient: Some(to),
            amount: Some(value),
            token_id: None,
            contract_address: None,
            decimals: None,
            symbol: None,
            description: format!("Send {value} wei to {to}"),
        };
    }
    if data.len() < 4 {
        return ParsedCall::unknown("Calldata shorter than a selector");
    }

    let selector: [u8; 4] = [data[0], data[1], data[2], data[3]];
    let result = match selector {
        TRANSFER_SELECTOR => parse_erc20_transfer(to, data),
        TRANSFER_FROM_SELECTOR => parse_erc721_transfer(to, data, TRANSFER_FROM_SIG),
        SAFE_TRANSFER_FROM_721_SELECTOR => {
            parse_erc721_transfer(to, data, SAFE_TRANSFER_FROM_721_SIG)
        }
        SAFE_TRANSFER_FROM_1155_SELECTOR => parse_erc1155_transfer(to, data),
        _ => Err(eyre!("unrecognized selector")),
    };

    result.unwrap_or_else(|_| {
        ParsedCall::unknown(format!(
            "Unknown call to {to} (selector 0x{})",
            alloy::hex::encode(selector)
        ))
    })
}

fn parse_erc20_transfer(contract: Address, data: &Bytes) -> Result<ParsedCall> {
    let args = decode_args(TRANSFER_SIG, data)?;
    let recipient = as_address(&args[0])?;
    let amount = as_uint(&args[1])?;
    Ok(ParsedCall {
        kind: CallKind::Erc20,
        recipient: Some(recipient),
        amount: Some(amount),
        token_id: None,
        contract_address: Some(contract),
        decimals: None,
        symbol: None,
        description: format!("Transfer {amount} base units of {contract} to {recipient}"),
    })
}

fn parse_erc721_transfer(contract: Address, data: &Bytes, signature: &str) -> Result<ParsedCall> {
    let args = decode_args(signature, data)?;
    let recipient = as_address(&args[1])?;
    let token_id = as_uint(&args[2])?;
    Ok(ParsedCall {
        kind: CallKind::Erc721,
        recipient: Some(recipient),
        amount: None,
        token_id: Some(token_id),
        contract_address: Some(contract),
        decimals: None,
        symbol: None,
        description: format!("Transfer collectible #{token_id} of {contract} to {recipient}"),
    })
}

fn parse_erc1155_transfer(contract: Address, data: &Bytes) -> Result<ParsedCall> {
    let args = decode_args(SAFE_TRANSFER_FROM_1155_SIG, data)?;
    let recipient = as_address(&args[1])?;
    let token_id = as_uint(&args[2])?;
    let amount = as_uint(&args[3])?;
    Ok(ParsedCall {
        kind: CallKind::Erc1155,
        recipient: Some(recipient),
        amount: Some(amount),
        token_id: Some(token_id),
        contract_address: Some(contract),
        decimals: None,
        symbol: None,
        description: format!(
            "Transfer {amount} of collectible #{token_id} of {contract} to {recipient}"
        ),
    })
}

fn decode_args(signature: &str, data: &Bytes) -> Result<Vec<DynSolValue>> {
    let func = Function::parse(signature)
        .wrap_err_with(|| format!("invalid signature '{signature}'"))?;
    let decoded = func
        .abi_decode_input(&data[4..], true)
        .wrap_err_with(|| format!("ABI decode failed for '{signature}'"))?;
    eyre::ensure!(
        decoded.len() == func.inputs.len(),
        "argument count mismatch for '{signature}'"
    );
    Ok(decoded)
}

fn as_address(value: &DynSolValue) -> Result<Address> {
    match value {
        DynSolValue::Address(a) => Ok(*a),
        other => Err(eyre!("expected address, got {other:?}")),
    }
}

fn as_uint(value: &DynSolValue) -> Result<U256> {
    match value {
        DynSolValue::Uint(u, _) => Ok(*u),
        other => Err(eyre!("expected uint, got {other:?}")),
    }
}

fn encode_calldata(signature: &str, selector: [u8; 4], args: &[DynSolValue]) -> Result<Bytes, PortError> {
    let func = Function::parse(signature)
        .map_err(|e| PortError::Validation(format!("invalid signature '{signature}': {e}")))?;
    let encoded = func
        .abi_encode_input_raw(args)
        .map_err(|e| PortError::Validation(format!("ABI encode failed for '{signature}': {e}")))?;
    let mut data = Vec::with_capacity(4 + encoded.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&encoded);
    Ok(Bytes::from(data))
}

/// Build the transfer call for one token record. `amount_override` replaces
/// the record's full balance; collectible transfers move out of `owner`
/// (the smart-contract wallet under recovery).
pub fn build_transfer_call(
    record: &TokenRecord,
    owner: Address,
    recipient: Address,
    amount_override: Option<U256>,
) -> Result<Call, PortError> {
    match record {
        TokenRecord::Coin {
            contract_address,
            contract_type,
            balance,
            ..
        } => {
            let amount = amount_override.unwrap_or(*balance);
            match contract_type {
                ContractType::Native => {
                    Ok(Call::with_defaults(recipient, amount, Bytes::new()))
                }
                ContractType::Erc20 => {
                    let data = encode_calldata(
                        TRANSFER_SIG,
                        TRANSFER_SELECTOR,
                        &[
                            DynSolValue::Address(recipient),
                            DynSolValue::Uint(amount, 256),
                        ],
                    )?;
                    Ok(Call::with_defaults(*contract_address, U256::ZERO, data))
                }
                other => Err(PortError::Validation(format!(
                    "coin record with collectible contract type {other:?}"
                ))),
            }
        }
        TokenRecord::Collectible {
            contract_address,
            contract_type,
            token_id,
            balance,
        } => match contract_type {
            ContractType::Erc721 => {
                let data = encode_calldata(
                    TRANSFER_FROM_SIG,
                    TRANSFER_FROM_SELECTOR,
                    &[
                        DynSolValue::Address(owner),
                        DynSolValue::Address(recipient),
                        DynSolValue::Uint(*token_id, 256),
                    ],
                )?;
                Ok(Call::with_defaults(*contract_address, U256::ZERO, data))
            }
            ContractType::Erc1155 => {
                let amount = amount_override.unwrap_or(*balance);
                let data = encode_calldata(
                    SAFE_TRANSFER_FROM_1155_SIG,
                    SAFE_TRANSFER_FROM_1155_SELECTOR,
                    &[
                        DynSolValue::Address(owner),
                        DynSolValue::Address(recipient),
                        DynSolValue::Uint(*token_id, 256),
                        DynSolValue::Uint(amount, 256),
                        DynSolValue::Bytes(Vec::new()),
                    ],
                )?;
                Ok(Call::with_defaults(*contract_address, U256::ZERO, data))
            }
            other => Err(PortError::Validation(format!(
                "collectible record with coin contract type {other:?}"
            ))),
        },
    }
}
