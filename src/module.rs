use std::ffi::{c_char, c_void, CStr};

use duckdb::ffi;
use duckdb::Connection;
use duckdb_loadable_macros::duckdb_entrypoint;
use log::{debug, error};

use crate::bridge::ExtensionModule;
use crate::error::Error;
use crate::handle::InstanceHandle;
use crate::vtab::QuackVTab;
use crate::EXTENSION_NAME;

/// The extension implementation behind the C entry points.
#[derive(Copy, Clone, Debug, Default)]
pub struct QuackModule;

impl QuackModule {
    pub fn version_str(&self) -> &'static str {
        self.version().to_str().unwrap_or_default()
    }

    unsafe fn try_init(&self, db: InstanceHandle) -> Result<(), Error> {
        if db.is_null() {
            return Err(Error::NullHandle);
        }

        debug!("initializing {} extension at {:?}", EXTENSION_NAME, db);
        quack_init_rust(db.as_ptr());

        Ok(())
    }
}

impl ExtensionModule for QuackModule {
    unsafe fn init(&self, db: InstanceHandle) {
        if let Err(err) = self.try_init(db) {
            error!("{} extension failed to initialize: {}", EXTENSION_NAME, err);
        }
    }

    fn version(&self) -> &'static CStr {
        unsafe { CStr::from_ptr(quack_version_rust()) }
    }
}

/// Registers every function the extension provides on `conn`.
pub fn register(conn: &Connection) -> Result<(), Error> {
    conn.register_table_function::<QuackVTab>(QuackVTab::NAME)
        .map_err(|source| Error::Registration {
            name: QuackVTab::NAME,
            source,
        })?;
    debug!("registered table function `{}`", QuackVTab::NAME);

    Ok(())
}

// Exports `quack_init_rust(db)` and `quack_version_rust()`.
#[duckdb_entrypoint]
pub fn quack_init_rust(conn: Connection) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = register(&conn) {
        error!("{:#}", anyhow::Error::new(err));
    }

    Ok(())
}
