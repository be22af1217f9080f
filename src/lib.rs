mod bridge;
mod error;
mod extension;
mod handle;
mod module;
mod vtab;

pub use crate::bridge::{forward_init, forward_version, quack_init, quack_version, ExtensionModule};
pub use crate::error::Error;
pub use crate::extension::{Extension, QuackExtension};
pub use crate::handle::InstanceHandle;
pub use crate::module::{register, QuackModule};
pub use crate::vtab::QuackVTab;

/// Name the host uses to resolve `{name}_init` and `{name}_version`.
pub const EXTENSION_NAME: &str = "quack";

pub const EXTENSION_VERSION: &str = env!("CARGO_PKG_VERSION");

const fn is_symbol_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() || !bytes[0].is_ascii_lowercase() {
        return false;
    }

    let mut idx = 1;
    while idx < bytes.len() {
        let byte = bytes[idx];
        if !(byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_') {
            return false;
        }
        idx += 1;
    }

    true
}

const _: () = assert!(
    is_symbol_prefix(EXTENSION_NAME),
    "extension name must be a lowercase identifier"
);
