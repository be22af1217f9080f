use anyhow::{ensure, Result};
use duckdb::{ffi, Config, Connection};
use quack::{
    register, Extension, ExtensionModule, InstanceHandle, QuackExtension, QuackModule,
    EXTENSION_NAME, EXTENSION_VERSION,
};
use std::ffi::{c_void, CStr};
use std::path::Path;
use std::process::Command;

fn connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    register(&conn)?;

    Ok(conn)
}

#[test]
fn test_quack_returns_greeting() -> Result<()> {
    let conn = connection()?;

    let greeting: String = conn.query_row("SELECT * FROM quack('Jane');", [], |row| row.get(0))?;
    assert_eq!(greeting, "Quack Jane 🐥");

    Ok(())
}

#[test]
fn test_quack_returns_single_row() -> Result<()> {
    let conn = connection()?;

    let count: i64 = conn.query_row("SELECT count(*) FROM quack('Jane');", [], |row| row.get(0))?;
    assert_eq!(count, 1);

    Ok(())
}

#[test]
fn test_quack_column_name() -> Result<()> {
    let conn = connection()?;

    let greeting: String = conn.query_row("SELECT quack FROM quack('Bob');", [], |row| row.get(0))?;
    assert_eq!(greeting, "Quack Bob 🐥");

    Ok(())
}

#[test]
fn test_quack_requires_argument() -> Result<()> {
    let conn = connection()?;

    assert!(conn.prepare("SELECT * FROM quack();").is_err());

    Ok(())
}

#[test]
fn test_quack_null_argument() -> Result<()> {
    let conn = connection()?;

    let err = conn
        .query_row("SELECT * FROM quack(NULL);", [], |row| row.get::<_, String>(0))
        .unwrap_err();
    assert!(
        err.to_string().contains("argument `name` must not be NULL"),
        "unexpected error: {}",
        err
    );

    // the connection is still usable afterwards
    let greeting: String = conn.query_row("SELECT * FROM quack('Jane');", [], |row| row.get(0))?;
    assert_eq!(greeting, "Quack Jane 🐥");

    Ok(())
}

/// A database opened through the C API, closed on drop.
struct RawDatabase(ffi::duckdb_database);

impl RawDatabase {
    fn open_in_memory() -> Result<Self> {
        let mut db: ffi::duckdb_database = std::ptr::null_mut();
        let state = unsafe { ffi::duckdb_open(c":memory:".as_ptr(), &mut db) };
        ensure!(state == ffi::DuckDBSuccess, "failed to open in-memory database");

        Ok(Self(db))
    }

    fn as_ptr(&self) -> *mut c_void {
        self.0.cast()
    }

    fn connect(&self) -> Result<Connection> {
        Ok(unsafe { Connection::open_from_raw(self.0) }?)
    }
}

impl Drop for RawDatabase {
    fn drop(&mut self) {
        unsafe { ffi::duckdb_close(&mut self.0) };
    }
}

#[test]
fn test_init_entry_point_registers_quack() -> Result<()> {
    let db = RawDatabase::open_in_memory()?;

    unsafe { quack::quack_init(db.as_ptr()) };

    let conn = db.connect()?;
    let greeting: String = conn.query_row("SELECT * FROM quack('Jane');", [], |row| row.get(0))?;
    assert_eq!(greeting, "Quack Jane 🐥");

    Ok(())
}

#[test]
fn test_descriptor_load_registers_quack() -> Result<()> {
    let db = RawDatabase::open_in_memory()?;

    let extension = QuackExtension::new();
    unsafe { extension.load(InstanceHandle::from_ptr(db.as_ptr())) };

    let conn = db.connect()?;
    let greeting: String = conn.query_row("SELECT * FROM quack('Bob');", [], |row| row.get(0))?;
    assert_eq!(greeting, "Quack Bob 🐥");

    Ok(())
}

#[test]
fn test_descriptor() {
    let extension = QuackExtension::new();

    assert_eq!(extension.name(), EXTENSION_NAME);
    assert_eq!(quack::quack_version(), extension.module().version().as_ptr());
}

#[test]
fn test_version_matches_host_library() {
    let version = unsafe { CStr::from_ptr(duckdb::ffi::duckdb_library_version()) };

    assert_eq!(QuackModule.version_str(), version.to_str().unwrap());
}

fn attach_metadata(target_dir: &str) -> Result<()> {
    let library_output = if cfg!(target_os = "macos") {
        "libquack.dylib"
    } else if cfg!(target_os = "linux") {
        "libquack.so"
    } else {
        unimplemented!("Unsupported platform");
    };

    let status = Command::new("cargo")
        .args([
            "run",
            "--package",
            "duckdb_metadata_bin",
            "--bin",
            "duckdb_metadata",
            "--",
            "--input",
            &format!("{}/{}", target_dir, library_output),
            "--output",
            &format!("{}/quack.duckdb_extension", target_dir),
            "--extension-version",
            &format!("v{}", EXTENSION_VERSION),
            "--duckdb-version",
            QuackModule.version_str(),
            "--platform",
            if cfg!(target_os = "macos") {
                "osx_arm64"
            } else if cfg!(target_os = "linux") {
                "linux_amd64"
            } else {
                unimplemented!("Unsupported platform")
            },
        ])
        .status()?;
    ensure!(status.success(), "attaching metadata failed: {}", status);

    Ok(())
}

#[test]
#[ignore = "builds the release library and loads it through the host's extension loader"]
fn test_load_extension() -> Result<()> {
    let target_dir = "./target/release";

    let status = Command::new("cargo")
        .args(["build", "--release", "--package", "quack"])
        .status()?;
    ensure!(status.success(), "building the extension failed: {}", status);
    attach_metadata(target_dir)?;

    let extension_path = format!("{}/quack.duckdb_extension", target_dir);
    assert!(Path::new(&extension_path).exists());

    let config = Config::default().allow_unsigned_extensions()?;
    let conn = Connection::open_in_memory_with_flags(config)?;
    conn.execute(&format!("LOAD '{}'", extension_path), [])?;

    let greeting: String = conn.query_row("SELECT * FROM quack('Jane');", [], |row| row.get(0))?;
    assert_eq!(greeting, "Quack Jane 🐥");

    Ok(())
}
