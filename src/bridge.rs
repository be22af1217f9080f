use std::ffi::{c_char, c_void, CStr};

use crate::handle::InstanceHandle;
use crate::module::QuackModule;

/// Implementation the C entry points forward to.
pub trait ExtensionModule {
    /// Performs the extension's initialization against the host database.
    ///
    /// # Safety
    ///
    /// `db` must point to a live host database object for the duration of the call.
    unsafe fn init(&self, db: InstanceHandle);

    fn version(&self) -> &'static CStr;
}

/// # Safety
///
/// See [`ExtensionModule::init`].
pub unsafe fn forward_init<M: ExtensionModule>(module: &M, db: *mut c_void) {
    module.init(InstanceHandle::from_ptr(db))
}

pub fn forward_version<M: ExtensionModule>(module: &M) -> *const c_char {
    module.version().as_ptr()
}

/// Called by duckdb using the convention `{extension_name}_init(db)`.
///
/// # Safety
///
/// Will be called by duckdb with a pointer to its database instance.
#[no_mangle]
pub unsafe extern "C" fn quack_init(db: *mut c_void) {
    forward_init(&QuackModule, db)
}

/// Called by duckdb using the convention `{extension_name}_version()`.
#[no_mangle]
pub extern "C" fn quack_version() -> *const c_char {
    forward_version(&QuackModule)
}
