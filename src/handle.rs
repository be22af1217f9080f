use std::ffi::c_void;
use std::fmt;

/// Pointer-sized reference to a host-owned database object.
///
/// The handle is never dereferenced, allocated or freed on this side of the
/// boundary. It is only valid for the duration of the call it was passed into.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct InstanceHandle(*mut c_void);

impl InstanceHandle {
    pub fn from_ptr(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn address(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceHandle({:#x})", self.address())
    }
}
