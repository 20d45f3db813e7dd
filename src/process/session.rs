//! Boot session context.
//!
//! A [`Session`] owns everything one emulator instance needs to open and
//! boot games: configuration, the factory registry, the optional network
//! transport, the host collaborators and the core state. Nothing here is a
//! process global, so tests can run many sessions side by side.

use std::sync::Arc;

use crate::access::{AccessLayer, BoxedAccess, RangeTransport};
use crate::chain::ChainBuilder;
use crate::config::Config;
use crate::host::{CoreState, DiscMapper, GameLoader, VirtualFileSystem};
use crate::locator::Locator;
use crate::registry::{FactoryRegistry, LoaderFactory};

/// One emulator instance's boot context.
///
/// Created via [`Session::builder`]. Booting lives in
/// [`load_file`](Session::load_file), disc swapping in
/// [`replace_disc`](Session::replace_disc).
pub struct Session {
    pub(super) config: Config,
    pub(super) registry: FactoryRegistry,
    pub(super) transport: Option<Arc<dyn RangeTransport>>,
    pub(super) vfs: Box<dyn VirtualFileSystem>,
    pub(super) loader: Box<dyn GameLoader>,
    pub(super) mapper: Box<dyn DiscMapper>,
    pub(super) state: CoreState,
    pub(super) active_disc: Option<BoxedAccess>,
}

impl Session {
    /// Start building a session around the host collaborators.
    pub fn builder(
        vfs: impl VirtualFileSystem + 'static,
        loader: impl GameLoader + 'static,
        mapper: impl DiscMapper + 'static,
    ) -> SessionBuilder {
        SessionBuilder {
            config: None,
            registry: FactoryRegistry::new(),
            transport: None,
            vfs: Box::new(vfs),
            loader: Box::new(loader),
            mapper: Box::new(mapper),
        }
    }

    /// Chain builder over this session's registry, config and transport.
    pub fn chain(&self) -> ChainBuilder<'_> {
        ChainBuilder::new(&self.registry, &self.config, self.transport.as_ref())
    }

    /// Open a fresh access chain for `locator`.
    pub fn open(&self, locator: &Locator) -> BoxedAccess {
        self.chain().construct(locator)
    }

    /// Register a factory for a path prefix. Replaces any earlier one.
    pub fn register_factory(&mut self, prefix: impl Into<String>, factory: impl LoaderFactory + 'static) {
        self.registry.register(prefix, factory);
    }

    /// The session configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current boot state.
    pub fn core_state(&self) -> CoreState {
        self.state
    }

    /// Disc installed by the last [`replace_disc`](Session::replace_disc), if any.
    pub fn active_disc(&self) -> Option<&dyn AccessLayer> {
        self.active_disc.as_deref()
    }

    /// Identify many locators in parallel with this session's chains.
    #[cfg(feature = "batch")]
    pub fn identify_all(
        &self,
        locators: &[Locator],
    ) -> Vec<Result<crate::identify::GameImageKind, crate::diagnostic::IdentifyError>> {
        crate::identify::identify_all(&self.chain(), locators)
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: Option<Config>,
    registry: FactoryRegistry,
    transport: Option<Arc<dyn RangeTransport>>,
    vfs: Box<dyn VirtualFileSystem>,
    loader: Box<dyn GameLoader>,
    mapper: Box<dyn DiscMapper>,
}

impl SessionBuilder {
    /// Use `config` instead of [`Config::default`].
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Transport for `http://` and `https://` locators.
    ///
    /// Without one, network locators open as missing layers.
    pub fn with_transport(mut self, transport: Arc<dyn RangeTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Register a factory for a path prefix.
    pub fn with_factory(mut self, prefix: impl Into<String>, factory: impl LoaderFactory + 'static) -> Self {
        self.registry.register(prefix, factory);
        self
    }

    /// Finish the session.
    pub fn build(self) -> Session {
        Session {
            config: self.config.unwrap_or_default(),
            registry: self.registry,
            transport: self.transport,
            vfs: self.vfs,
            loader: self.loader,
            mapper: self.mapper,
            state: CoreState::Uninitialized,
            active_disc: None,
        }
    }
}
