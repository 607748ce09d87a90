//! Command service: the palette, its registries and the keyboard wired together

use futures::stream::{FuturesUnordered, StreamExt};
use palette_hotkeys::{
    ActiveElement, HotkeyOptions, HotkeyRegistry, HotkeyToken, KeyEvent, ScopeId,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::aggregator::{ResolveRequest, ResolvedBatch};
use crate::bus::{PaletteBus, PaletteEvent};
use crate::category::CategoryRegistry;
use crate::config::PaletteSettings;
use crate::error::Result;
use crate::namespace::NamespaceRegistry;
use crate::provider::{CommandProvider, HotkeyItemProvider, ProviderRegistry};
use crate::registry::CommandRegistry;
use crate::session::{CloseCallback, KeyHandling, PaletteSession, PaletteView};
use crate::types::{
    ActionOutcome, CommandDefinition, CommandId, CommandOptions, PaletteConfig, PaletteRequest,
};

/// Id of the built-in provider listing registered commands
pub const COMMAND_PROVIDER: &str = "command";
/// Id of the built-in provider listing labelled overlay hotkeys
pub const HOTKEY_PROVIDER: &str = "data-hotkeys";

/// Owns the command palette and everything feeding it.
///
/// All methods are synchronous except [`CommandService::settle`], which
/// runs queued provider resolutions and applies whichever are still
/// current when they finish.
pub struct CommandService {
    settings: PaletteSettings,
    active: ActiveElement,
    hotkeys: HotkeyRegistry,
    commands: CommandRegistry,
    providers: ProviderRegistry,
    palette: PaletteSession,
    palette_scope: ScopeId,
    palette_hotkey: HotkeyToken,
    requests: mpsc::UnboundedReceiver<PaletteRequest>,
    pending: Vec<ResolveRequest>,
}

impl CommandService {
    pub fn new(settings: PaletteSettings) -> Result<Self> {
        Self::with_active_element(settings, ActiveElement::new())
    }

    /// Build over an existing active-element pointer, e.g. one shared with dialogs
    pub fn with_active_element(settings: PaletteSettings, active: ActiveElement) -> Result<Self> {
        settings.validate()?;
        let hotkeys = HotkeyRegistry::with_display(active.clone(), settings.display()?);
        let (sender, requests) = mpsc::unbounded_channel();
        let commands = CommandRegistry::new(hotkeys.clone(), sender.clone());

        let mut providers = ProviderRegistry::new();
        providers.add(COMMAND_PROVIDER, Arc::new(CommandProvider::new(commands.clone())))?;
        providers.add(HOTKEY_PROVIDER, Arc::new(HotkeyItemProvider::new(hotkeys.clone())))?;

        let palette_hotkey = hotkeys.register(
            settings.palette_combo()?,
            Arc::new(move || {
                let _ = sender.send(PaletteRequest::OpenMain);
            }),
            HotkeyOptions::global(),
        );

        let palette = PaletteSession::new(PaletteBus::new())
            .with_categories(settings.category_registry())
            .with_namespaces(settings.namespace_registry())
            .with_placeholder(settings.placeholder.clone())
            .with_empty_message(settings.empty_message.clone());
        let palette_scope = active.new_scope();

        info!(
            hotkey = %settings.palette_hotkey,
            platform = ?settings.platform,
            providers = providers.len(),
            "Command service started"
        );
        Ok(Self {
            settings,
            active,
            hotkeys,
            commands,
            providers,
            palette,
            palette_scope,
            palette_hotkey,
            requests,
            pending: Vec::new(),
        })
    }

    pub fn settings(&self) -> &PaletteSettings {
        &self.settings
    }

    pub fn active_element(&self) -> &ActiveElement {
        &self.active
    }

    pub fn hotkeys(&self) -> &HotkeyRegistry {
        &self.hotkeys
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn providers_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.providers
    }

    pub fn categories_mut(&mut self) -> &mut CategoryRegistry {
        self.palette.categories_mut()
    }

    pub fn namespaces_mut(&mut self) -> &mut NamespaceRegistry {
        self.palette.namespaces_mut()
    }

    pub fn palette(&self) -> &PaletteSession {
        &self.palette
    }

    /// Scope that is active while the palette is open
    pub fn palette_scope(&self) -> ScopeId {
        self.palette_scope
    }

    pub fn palette_hotkey(&self) -> HotkeyToken {
        self.palette_hotkey
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PaletteEvent> {
        self.palette.bus().subscribe()
    }

    pub fn add<R, F>(&self, name: &str, f: F, options: CommandOptions) -> Result<CommandId>
    where
        R: Into<ActionOutcome>,
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.commands.add(name, f, options)
    }

    pub fn register(&self, definition: CommandDefinition) -> Result<CommandId> {
        self.commands.register(definition)
    }

    pub fn remove(&self, id: CommandId) -> bool {
        self.commands.remove(id)
    }

    /// Open over the registered providers, or the config's own.
    ///
    /// Returns the sequence number of the queued resolution; results show
    /// up after [`CommandService::settle`].
    pub fn open_palette(&mut self, config: PaletteConfig) -> u64 {
        self.start(config, None)
    }

    /// Like [`CommandService::open_palette`], calling `on_close` once the
    /// palette closes by any path
    pub fn open_main_palette(
        &mut self,
        config: PaletteConfig,
        on_close: impl FnOnce() + Send + 'static,
    ) -> u64 {
        self.start(config, Some(Box::new(on_close)))
    }

    fn start(&mut self, config: PaletteConfig, on_close: Option<CloseCallback>) -> u64 {
        // The owner is whatever was active before the palette took over
        let (owner, guard) = if self.palette.is_open() {
            (self.palette.owner_scope(), None)
        } else {
            (self.active.current(), Some(self.active.activate(self.palette_scope)))
        };
        let request = self
            .palette
            .open(config, self.providers.providers(), owner, guard, on_close);
        let seq = request.seq();
        self.pending.push(request);
        seq
    }

    fn queue(&mut self, request: Option<ResolveRequest>) -> bool {
        match request {
            Some(request) => {
                self.pending.push(request);
                true
            }
            None => false,
        }
    }

    fn queue_key(&mut self, handling: KeyHandling) -> bool {
        match handling {
            KeyHandling::Ignored => false,
            KeyHandling::Handled => true,
            KeyHandling::Resolve(request) => self.queue(Some(request)),
        }
    }

    fn drain_requests(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            debug!(?request, "Palette requested");
            match request {
                PaletteRequest::OpenMain => {
                    self.start(PaletteConfig::default(), None);
                }
                PaletteRequest::Open(config) => {
                    self.start(config, None);
                }
            }
        }
    }

    /// Offer a key to the open palette first, then to the hotkey registry
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if self.palette.is_open() {
            let handling = self.palette.handle_key(event);
            if handling.is_handled() {
                self.queue_key(handling);
                self.drain_requests();
                return true;
            }
        }
        let outcome = self.hotkeys.dispatch(event);
        self.drain_requests();
        outcome.handled()
    }

    pub fn set_search(&mut self, text: &str) -> bool {
        let request = self.palette.set_search(text);
        self.queue(request)
    }

    pub fn switch_namespace(&mut self, marker: &str) -> bool {
        let request = self.palette.switch_namespace(marker);
        self.queue(request)
    }

    /// Backspace on an empty search
    pub fn back(&mut self) -> bool {
        let handling = self.palette.back();
        self.queue_key(handling)
    }

    pub fn select(&mut self, index: usize) -> bool {
        let handling: KeyHandling = self.palette.select(index).into();
        let handled = self.queue_key(handling);
        self.drain_requests();
        handled
    }

    pub fn select_focused(&mut self) -> bool {
        let index = self.palette.focus();
        self.select(index)
    }

    /// Select the entry named `name` in the current list
    pub fn select_named(&mut self, name: &str) -> bool {
        match self.palette.results().iter().position(|e| e.name == name) {
            Some(index) => self.select(index),
            None => false,
        }
    }

    pub fn dismiss(&mut self) {
        self.palette.dismiss();
        self.pending.clear();
    }

    pub fn close(&mut self) {
        self.palette.close();
        self.pending.clear();
    }

    pub fn is_open(&self) -> bool {
        self.palette.is_open()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Run queued resolutions concurrently until the newest one is applied.
    ///
    /// Batches that finish earlier are applied or dropped as stale. Once
    /// nothing in flight can still be current, the leftovers are detached:
    /// they keep running on the runtime but their results are ignored.
    /// Returns how many batches were applied.
    pub async fn settle(&mut self) -> usize {
        let mut applied = 0;
        loop {
            self.drain_requests();
            let newest = match self.pending.iter().map(ResolveRequest::seq).max() {
                Some(seq) => seq,
                None => return applied,
            };
            let mut in_flight: FuturesUnordered<_> =
                self.pending.drain(..).map(ResolveRequest::run).collect();
            while self.palette.is_current(newest) {
                let Some(batch) = in_flight.next().await else {
                    break;
                };
                let seq = batch.seq;
                if self.palette.apply(batch) {
                    applied += 1;
                }
                if seq == newest {
                    break;
                }
            }
            detach(in_flight);
        }
    }

    pub fn view(&self) -> PaletteView {
        self.palette.view(&self.hotkeys.display())
    }

    /// Close the palette and drop every registered command
    pub fn reset(&mut self) {
        self.close();
        self.commands.clear();
    }
}

/// Let superseded resolutions run to completion without waiting on them
fn detach<F>(mut stale: FuturesUnordered<F>)
where
    F: Future<Output = ResolvedBatch> + Send + 'static,
{
    if stale.is_empty() {
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            debug!(count = stale.len(), "Superseded resolutions detached");
            handle.spawn(async move {
                while let Some(batch) = stale.next().await {
                    debug!(seq = batch.seq, "Superseded resolution finished, ignored");
                }
            });
        }
        Err(_) => {
            debug!(count = stale.len(), "No runtime for superseded resolutions, dropped");
        }
    }
}

impl std::fmt::Debug for CommandService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandService")
            .field("palette", &self.palette)
            .field("commands", &self.commands.len())
            .field("providers", &self.providers)
            .field("pending", &self.pending.len())
            .finish()
    }
}
