//! Synchronous procedure bodies.
//!
//! Each function runs with exclusive access to the key-value store (the
//! caller holds the store lock), which is what makes a procedure atomic.

use std::net::IpAddr;

use crate::domain::config::StoreConfig;
use crate::domain::entities::{
    is_valid_asset_name, AccountRecord, AssetAccess, AssetListing, Timestamp, Token, TokenRecord,
};
use crate::domain::errors::{KVStoreError, StoreError};
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use uuid::Uuid;

pub(crate) const USER_PREFIX: &str = "user:";
pub(crate) const TOKEN_PREFIX: &str = "token:";
pub(crate) const ASSET_PREFIX: &str = "asset:";

pub(crate) fn user_key(login: &str) -> Vec<u8> {
    format!("{USER_PREFIX}{login}").into_bytes()
}

pub(crate) fn token_key(token: &Token) -> Vec<u8> {
    format!("{TOKEN_PREFIX}{}", token.as_str()).into_bytes()
}

pub(crate) fn namespace_prefix(account_id: &Uuid) -> Vec<u8> {
    format!("{ASSET_PREFIX}{account_id}:").into_bytes()
}

pub(crate) fn asset_key(account_id: &Uuid, name: &str) -> Vec<u8> {
    let mut key = namespace_prefix(account_id);
    key.extend_from_slice(name.as_bytes());
    key
}

fn decode<T: serde::de::DeserializeOwned>(key: &[u8], raw: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(raw).map_err(|e| {
        StoreError::Backend(KVStoreError::Corruption {
            key: String::from_utf8_lossy(key).into_owned(),
            message: e.to_string(),
        })
    })
}

pub(crate) fn load_account<S: KeyValueStore>(
    kv: &S,
    login: &str,
) -> Result<Option<AccountRecord>, StoreError> {
    let key = user_key(login);
    kv.get(&key)?.map(|raw| decode(&key, &raw)).transpose()
}

pub(crate) fn save_account<S: KeyValueStore>(
    kv: &mut S,
    account: &AccountRecord,
) -> Result<(), StoreError> {
    let raw = serde_json::to_vec(account)?;
    kv.put(&user_key(&account.login), &raw)?;
    Ok(())
}

/// Resolve a `(token, ip)` pair to the owning account.
///
/// `None` covers every authorization failure: empty or unknown token,
/// IP mismatch, expiry, and an account that was disabled or re-created
/// after the token was issued.
pub(crate) fn resolve_owner<S: KeyValueStore>(
    kv: &S,
    token: &Token,
    ip: IpAddr,
    now: Timestamp,
) -> Result<Option<Uuid>, StoreError> {
    if token.is_empty() {
        return Ok(None);
    }

    let key = token_key(token);
    let record: TokenRecord = match kv.get(&key)? {
        Some(raw) => decode(&key, &raw)?,
        None => return Ok(None),
    };
    if !record.is_valid_for(ip, now) {
        return Ok(None);
    }

    match load_account(kv, &record.login)? {
        Some(account) if !account.disabled && account.account_id == record.account_id => {
            Ok(Some(account.account_id))
        }
        _ => Ok(None),
    }
}

/// Second half of authenticate: the password already verified against
/// `verified_hash`. Issues a token only if the account still carries that
/// hash and is enabled.
pub(crate) fn issue_token<S: KeyValueStore>(
    kv: &mut S,
    config: &StoreConfig,
    login: &str,
    verified_hash: &str,
    ip: IpAddr,
    now: Timestamp,
) -> Result<Option<Token>, StoreError> {
    let account = match load_account(kv, login)? {
        Some(account) if account.password_hash == verified_hash && !account.disabled => account,
        _ => return Ok(None),
    };

    let token = Token::generate();
    let record = TokenRecord {
        account_id: account.account_id,
        login: account.login,
        ip,
        issued_at: now,
        expires_at: now.saturating_add(config.token_ttl.as_secs()),
    };
    kv.put(&token_key(&token), &serde_json::to_vec(&record)?)?;
    Ok(Some(token))
}

pub(crate) fn upload<S: KeyValueStore>(
    kv: &mut S,
    config: &StoreConfig,
    token: &Token,
    ip: IpAddr,
    name: &str,
    content: &[u8],
    now: Timestamp,
) -> Result<bool, StoreError> {
    let Some(owner) = resolve_owner(kv, token, ip, now)? else {
        return Ok(false);
    };
    if !is_valid_asset_name(name) || content.len() > config.max_asset_size {
        return Ok(false);
    }

    let key = asset_key(&owner, name);
    if kv.exists(&key)? {
        return Ok(false);
    }
    kv.put(&key, content)?;
    Ok(true)
}

pub(crate) fn download<S: KeyValueStore>(
    kv: &S,
    token: &Token,
    ip: IpAddr,
    name: &str,
    now: Timestamp,
) -> Result<AssetAccess<Vec<u8>>, StoreError> {
    let Some(owner) = resolve_owner(kv, token, ip, now)? else {
        return Ok(AssetAccess::Unauthorized);
    };
    if !is_valid_asset_name(name) {
        return Ok(AssetAccess::Missing);
    }

    Ok(match kv.get(&asset_key(&owner, name))? {
        Some(content) => AssetAccess::Present(content),
        None => AssetAccess::Missing,
    })
}

pub(crate) fn delete<S: KeyValueStore>(
    kv: &mut S,
    token: &Token,
    ip: IpAddr,
    name: &str,
    now: Timestamp,
) -> Result<AssetAccess<()>, StoreError> {
    let Some(owner) = resolve_owner(kv, token, ip, now)? else {
        return Ok(AssetAccess::Unauthorized);
    };
    if !is_valid_asset_name(name) {
        return Ok(AssetAccess::Missing);
    }

    let key = asset_key(&owner, name);
    if !kv.exists(&key)? {
        return Ok(AssetAccess::Missing);
    }
    kv.delete(&key)?;
    Ok(AssetAccess::Present(()))
}

pub(crate) fn list<S: KeyValueStore>(
    kv: &S,
    token: &Token,
    ip: IpAddr,
    now: Timestamp,
) -> Result<AssetListing, StoreError> {
    let Some(owner) = resolve_owner(kv, token, ip, now)? else {
        return Ok(AssetListing::Unauthorized);
    };

    let prefix = namespace_prefix(&owner);
    let names = kv
        .prefix_keys(&prefix)?
        .into_iter()
        .map(|key| String::from_utf8_lossy(&key[prefix.len()..]).into_owned())
        .collect();
    Ok(AssetListing::Names(names))
}

/// Delete every expired token record in one batch. Returns how many.
pub(crate) fn purge_expired<S: KeyValueStore>(
    kv: &mut S,
    now: Timestamp,
) -> Result<usize, StoreError> {
    let mut expired = Vec::new();
    for (key, raw) in kv.prefix_scan(TOKEN_PREFIX.as_bytes())? {
        let record: TokenRecord = decode(&key, &raw)?;
        if record.is_expired(now) {
            expired.push(BatchOperation::delete(key));
        }
    }

    let count = expired.len();
    if count > 0 {
        kv.atomic_batch_write(expired)?;
    }
    Ok(count)
}
