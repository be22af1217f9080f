use std::error::Error;
use std::ffi::{CStr, CString};
use std::mem::size_of;
use std::ops::{Deref, DerefMut};

use anyhow::format_err;
use duckdb::ffi;
use duckdb::vtab::{
    BindInfo, DataChunk, Free, FunctionInfo, InitInfo, Inserter, LogicalType, LogicalTypeId, VTab,
    Value,
};
use log::trace;

pub struct Parameters {
    pub name: String,
}

impl Parameters {
    pub fn from_bind_info(bind: &BindInfo) -> Result<Self, anyhow::Error> {
        if bind.get_parameter_count() == 0 {
            return Err(format_err!("missing argument `name`"));
        }

        let name = varchar(&bind.get_parameter(0))
            .ok_or_else(|| format_err!("argument `name` must not be NULL"))?;

        Ok(Self { name })
    }

    pub fn values() -> Vec<LogicalType> {
        vec![LogicalType::new(LogicalTypeId::Varchar)]
    }
}

// `Value` is a lone `duckdb_value` with no accessor for it.
const _: () = assert!(size_of::<Value>() == size_of::<ffi::duckdb_value>());

/// Reads a value as VARCHAR, `None` for SQL NULL.
///
/// `Value`'s `Display` cannot be used here, it hands a NULL varchar straight to
/// `CString::from_raw`.
fn varchar(value: &Value) -> Option<String> {
    unsafe {
        let raw = *(value as *const Value as *const ffi::duckdb_value);
        let ptr = ffi::duckdb_get_varchar(raw);
        if ptr.is_null() {
            return None;
        }

        let text = CStr::from_ptr(ptr).to_string_lossy().into_owned();
        ffi::duckdb_free(ptr.cast());

        Some(text)
    }
}

pub fn greeting(name: &str) -> String {
    format!("Quack {} 🐥", name)
}

#[repr(C)]
pub struct QuackInitData {
    done: bool,
}

impl Free for QuackInitData {}

/// `quack(name)`: a single row greeting `name`.
pub struct QuackVTab;

impl QuackVTab {
    pub const NAME: &'static str = "quack";
    pub const COLUMN: &'static str = "quack";
}

impl VTab for QuackVTab {
    type InitData = QuackInitData;
    type BindData = Handle<Parameters>;

    unsafe fn bind(
        bind: &BindInfo,
        data: *mut Self::BindData,
    ) -> duckdb::Result<(), Box<dyn Error>> {
        Ok(Self::bind(bind, data).map_err(format_error_with_causes)?)
    }

    unsafe fn init(
        init_info: &InitInfo,
        data: *mut Self::InitData,
    ) -> duckdb::Result<(), Box<dyn Error>> {
        Ok(Self::init(init_info, data).map_err(format_error_with_causes)?)
    }

    unsafe fn func(
        func: &FunctionInfo,
        output: &mut DataChunk,
    ) -> duckdb::Result<(), Box<dyn Error>> {
        Ok(Self::func(func, output).map_err(format_error_with_causes)?)
    }

    fn parameters() -> Option<Vec<LogicalType>> {
        Some(Parameters::values())
    }
}

impl QuackVTab {
    fn bind(bind: &BindInfo, data: *mut <Self as VTab>::BindData) -> Result<(), anyhow::Error> {
        let data = unsafe { &mut *data };

        let params = Parameters::from_bind_info(bind)?;
        trace!("binding {}('{}')", Self::NAME, params.name);

        bind.add_result_column(Self::COLUMN, LogicalType::new(LogicalTypeId::Varchar));

        data.assign(params);

        Ok(())
    }

    fn init(_init_info: &InitInfo, data: *mut <Self as VTab>::InitData) -> Result<(), anyhow::Error> {
        unsafe {
            (*data).done = false;
        }

        Ok(())
    }

    fn func(func: &FunctionInfo, output: &mut DataChunk) -> Result<(), anyhow::Error> {
        let init_data = unsafe { &mut *func.get_init_data::<<Self as VTab>::InitData>() };
        let bind_data = unsafe { &*func.get_bind_data::<<Self as VTab>::BindData>() };

        if init_data.done {
            output.set_len(0);
            return Ok(());
        }

        init_data.done = true;

        let vector = output.flat_vector(0);
        let value = CString::new(greeting(&bind_data.name))?;
        vector.insert(0, value);
        output.set_len(1);

        Ok(())
    }
}

#[repr(C)]
pub struct Handle<T> {
    inner: *mut T,
}

impl<T> Handle<T> {
    pub fn assign(&mut self, inner: T) {
        self.inner = Box::into_raw(Box::new(inner));
    }
}

impl<T> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        if self.inner.is_null() {
            panic!("unable to deref null handle")
        }

        unsafe { &*self.inner }
    }
}

impl<T> DerefMut for Handle<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        if self.inner.is_null() {
            panic!("unable to deref null handle")
        }

        unsafe { &mut *self.inner }
    }
}

impl<T> Free for Handle<T> {
    fn free(&mut self) {
        unsafe {
            if self.inner.is_null() {
                return;
            }

            drop(Box::from_raw(self.inner));
        }
        self.inner = std::ptr::null_mut();
    }
}

fn format_error_with_causes(error: anyhow::Error) -> anyhow::Error {
    format_err!(
        "{}",
        error
            .chain()
            .map(|cause| cause.to_string())
            .collect::<Vec<_>>()
            .join(": ")
    )
}
