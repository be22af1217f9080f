use crate::bridge::ExtensionModule;
use crate::handle::InstanceHandle;
use crate::module::QuackModule;
use crate::EXTENSION_NAME;

/// Descriptor the host's extension manager dispatches to.
pub trait Extension {
    /// Invoked once when the host activates the extension.
    ///
    /// # Safety
    ///
    /// `db` must point to a live host database object for the duration of the call.
    unsafe fn load(&self, db: InstanceHandle);

    fn name(&self) -> &'static str;
}

pub struct QuackExtension<M: ExtensionModule = QuackModule> {
    module: M,
}

impl QuackExtension {
    pub fn new() -> Self {
        Self::with_module(QuackModule)
    }
}

impl Default for QuackExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ExtensionModule> QuackExtension<M> {
    pub fn with_module(module: M) -> Self {
        Self { module }
    }

    pub fn module(&self) -> &M {
        &self.module
    }
}

impl<M: ExtensionModule> Extension for QuackExtension<M> {
    unsafe fn load(&self, db: InstanceHandle) {
        self.module.init(db)
    }

    fn name(&self) -> &'static str {
        EXTENSION_NAME
    }
}
