use crate::error::{
    Result,
    StorefrontError,
};
use alloy::signers::local::PrivateKeySigner;
use eth_keystore::{
    KeystoreError,
    decrypt_key,
};
use rpassword::prompt_password;
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletDescriptor {
    pub name: String,
    pub path: PathBuf,
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

pub fn default_wallet_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").map_err(|_| {
        StorefrontError::Connection("HOME environment variable not set".into())
    })?;
    Ok(PathBuf::from(home).join(".foundry").join("keystores"))
}

pub fn resolve_wallet_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_wallet_dir(),
    }
}

/// Every regular, non-hidden file in `dir` is treated as a keystore named
/// after its file stem.
pub fn list_wallets(dir: &Path) -> Result<Vec<WalletDescriptor>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let read_err =
        |e: std::io::Error| StorefrontError::Connection(format!("reading {}: {e}", dir.display()));
    let mut wallets = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        wallets.push(WalletDescriptor::new(name.to_owned(), path.clone()));
    }
    wallets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wallets)
}

pub fn find_wallet(dir: &Path, name: &str) -> Result<WalletDescriptor> {
    let wallets = list_wallets(dir)?;
    wallets.into_iter().find(|w| w.name == name).ok_or_else(|| {
        StorefrontError::Connection(format!(
            "Wallet '{name}' not found in {}",
            dir.to_string_lossy()
        ))
    })
}

/// Prompts for the keystore password and decrypts it. A wrong password is
/// the user declining authorization.
pub fn unlock_wallet(descriptor: &WalletDescriptor) -> Result<PrivateKeySigner> {
    let prompt = format!("Enter password for wallet '{}': ", descriptor.name);
    let password = prompt_password(prompt).map_err(|e| {
        StorefrontError::Connection(format!("failed to read wallet password: {e}"))
    })?;
    unlock_wallet_with_password(descriptor, &password)
}

pub fn unlock_wallet_with_password(
    descriptor: &WalletDescriptor,
    password: &str,
) -> Result<PrivateKeySigner> {
    let secret = decrypt_key(&descriptor.path, password.as_bytes()).map_err(|e| match e {
        KeystoreError::MacMismatch => StorefrontError::Connection(format!(
            "Invalid password for wallet '{}'",
            descriptor.name
        )),
        other => StorefrontError::Connection(format!(
            "failed to open wallet '{}' at {}: {other}",
            descriptor.name,
            descriptor.path.display()
        )),
    })?;
    PrivateKeySigner::from_slice(&secret).map_err(|_| {
        StorefrontError::Connection(format!(
            "Wallet '{}' contained unsupported key material",
            descriptor.name
        ))
    })
}
