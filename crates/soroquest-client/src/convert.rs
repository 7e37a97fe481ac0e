//! Conversions between native values and the network's `ScVal`
//! representation.

use stellar_strkey::Strkey;
use stellar_xdr::curr::{
    AccountId, ContractId, Hash, Limits, PublicKey, ReadXdr, ScAddress, ScString, ScSymbol, ScVal,
    StringM, UInt128Parts, Uint256,
};

use crate::error::ClientError;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Decode a `G...` or `C...` strkey into an `ScAddress`.
pub fn decode_address(addr: &str) -> Result<ScAddress, ClientError> {
    let strkey = Strkey::from_string(addr)
        .map_err(|e| ClientError::Config(format!("invalid address '{}': {}", addr, e)))?;

    match strkey {
        Strkey::PublicKeyEd25519(pk) => {
            let account_id = AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(pk.0)));
            Ok(ScAddress::Account(account_id))
        }
        Strkey::Contract(c) => Ok(ScAddress::Contract(ContractId(Hash(c.0)))),
        _ => Err(ClientError::Config(format!(
            "invalid address '{}': expected G... (account) or C... (contract)",
            addr
        ))),
    }
}

/// Decode a `G...` strkey into an `AccountId`.
pub fn decode_account_id(addr: &str) -> Result<AccountId, ClientError> {
    let strkey = Strkey::from_string(addr)
        .map_err(|e| ClientError::Config(format!("invalid address '{}': {}", addr, e)))?;

    match strkey {
        Strkey::PublicKeyEd25519(pk) => {
            Ok(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(pk.0))))
        }
        _ => Err(ClientError::Config(format!(
            "'{}' is not a G... account address",
            addr
        ))),
    }
}

pub fn address_val(addr: &str) -> Result<ScVal, ClientError> {
    Ok(ScVal::Address(decode_address(addr)?))
}

pub fn u128_val(v: u128) -> ScVal {
    ScVal::U128(UInt128Parts {
        hi: (v >> 64) as u64,
        lo: v as u64,
    })
}

pub fn string_val(s: &str) -> Result<ScVal, ClientError> {
    let sm: StringM = s
        .to_string()
        .try_into()
        .map_err(|_| ClientError::Xdr("string too long".to_string()))?;
    Ok(ScVal::String(ScString(sm)))
}

pub fn symbol_val(s: &str) -> Result<ScVal, ClientError> {
    let sym: ScSymbol = s
        .to_string()
        .try_into()
        .map_err(|_| ClientError::Xdr(format!("invalid symbol '{}'", s)))?;
    Ok(ScVal::Symbol(sym))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Deserialize a base64-encoded ScVal as returned by simulateTransaction.
pub fn scval_from_base64(b64: &str) -> Result<ScVal, ClientError> {
    ScVal::from_xdr_base64(b64, Limits::none())
        .map_err(|e| ClientError::Xdr(format!("return value: {}", e)))
}

pub fn expect_u64(val: &ScVal) -> Result<u64, ClientError> {
    match val {
        ScVal::U64(v) => Ok(*v),
        other => Err(mismatch("u64", other)),
    }
}

pub fn expect_u32(val: &ScVal) -> Result<u32, ClientError> {
    match val {
        ScVal::U32(v) => Ok(*v),
        other => Err(mismatch("u32", other)),
    }
}

pub fn expect_u128(val: &ScVal) -> Result<u128, ClientError> {
    match val {
        ScVal::U128(parts) => Ok(((parts.hi as u128) << 64) | parts.lo as u128),
        other => Err(mismatch("u128", other)),
    }
}

pub fn expect_bool(val: &ScVal) -> Result<bool, ClientError> {
    match val {
        ScVal::Bool(v) => Ok(*v),
        other => Err(mismatch("bool", other)),
    }
}

pub fn expect_string(val: &ScVal) -> Result<String, ClientError> {
    match val {
        ScVal::String(s) => Ok(s.to_string()),
        other => Err(mismatch("string", other)),
    }
}

pub fn expect_symbol(val: &ScVal) -> Result<String, ClientError> {
    match val {
        ScVal::Symbol(s) => Ok(s.to_string()),
        other => Err(mismatch("symbol", other)),
    }
}

/// Decode an `ScVal::Address` back into its strkey text form.
pub fn expect_address(val: &ScVal) -> Result<String, ClientError> {
    let addr = match val {
        ScVal::Address(a) => a,
        other => return Err(mismatch("address", other)),
    };
    match addr {
        ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(key))) => {
            Ok(Strkey::PublicKeyEd25519(stellar_strkey::ed25519::PublicKey(key.0)).to_string())
        }
        ScAddress::Contract(contract_id) => {
            Ok(Strkey::Contract(stellar_strkey::Contract(contract_id.0 .0)).to_string())
        }
        other => Err(ClientError::Decode(format!(
            "unsupported address variant: {:?}",
            other
        ))),
    }
}

/// Borrow the elements of an `ScVal::Vec`.
pub fn expect_vec(val: &ScVal) -> Result<&[ScVal], ClientError> {
    match val {
        ScVal::Vec(Some(items)) => Ok(items.as_slice()),
        ScVal::Vec(None) => Ok(&[]),
        other => Err(mismatch("vec", other)),
    }
}

fn mismatch(expected: &str, got: &ScVal) -> ClientError {
    ClientError::Decode(format!("expected {}, got {:?}", expected, got))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
