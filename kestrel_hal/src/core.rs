//! HAL context.
//!
//! [`Hal`] is the one context value of the loader. It owns every subsystem
//! (CPU seam, timer, console, boot-info accessor, transport registry,
//! interrupt table, command registry) and the launch state, and is threaded
//! into every command. Its lifetime runs from start-up to the hand-off.

use crate::arch::Cpu;
use crate::board::BoardProfile;
use crate::command_registry::CommandRegistry;
use crate::commands;
use crate::console::{Attr, Console};
use crate::interrupts::{InterruptTable, Isr};
use crate::timer::Timer;
use crate::transport_registry::TransportRegistry;
use kestrel_common::config::{LaunchConfig, LoaderConfig};
use kestrel_common::consts::{LOADER_STACK_SIZE, TICKS_PER_SECOND};
use kestrel_common::hal::bootinfo::BootInfo;
use kestrel_common::hal::error::{HalError, to_errno};
use kestrel_common::hal::transport::{DeviceId, DeviceTransport};
use kestrel_common::hal::types::{CacheKind, IrqSource, KernelEntry};
use tracing::{debug, info, warn};

/// Platform pieces the HAL is assembled from.
pub struct HalParts {
    /// CPU-family back end.
    pub cpu: Box<dyn Cpu>,
    /// Tick source.
    pub timer: Box<dyn Timer>,
    /// Boot-info accessor.
    pub bootinfo: Box<dyn BootInfo>,
    /// Loader console.
    pub console: Console,
    /// Transports, keyed by the identifier they serve. Each identifier must
    /// appear in the board's device table.
    pub transports: Vec<(DeviceId, Box<dyn DeviceTransport>)>,
}

/// State consumed by the hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchState {
    /// Verified kernel entry point, if one has been loaded.
    pub kernel_entry: Option<KernelEntry>,
    /// Autoboot countdown in ticks.
    pub timeout_ticks: u64,
}

impl LaunchState {
    fn from_config(config: &LaunchConfig) -> Self {
        Self {
            kernel_entry: None,
            timeout_ticks: config.timeout_s.saturating_mul(TICKS_PER_SECOND),
        }
    }
}

/// Loader HAL context.
pub struct Hal {
    pub(crate) config: LoaderConfig,
    pub(crate) board: &'static BoardProfile,
    pub(crate) bootinfo_address: usize,
    pub(crate) cpu: Box<dyn Cpu>,
    pub(crate) timer: Box<dyn Timer>,
    pub(crate) bootinfo: Box<dyn BootInfo>,
    pub(crate) console: Console,
    pub(crate) transports: TransportRegistry,
    pub(crate) interrupts: InterruptTable,
    pub(crate) commands: CommandRegistry,
    pub(crate) launch: LaunchState,
    started: bool,
}

impl Hal {
    /// Assemble a HAL for the configured board.
    ///
    /// Registers the transports under their board names and builds the
    /// command table: the base commands first, then the board's commands
    /// (all of them or none).
    ///
    /// # Errors
    /// - `HalError::Config` if the configuration is invalid
    /// - `HalError::InvalidArgument` if a transport id is not in the board's
    ///   device table, or is given twice
    /// - `HalError::OutOfRange` if the board's interrupt table is too large
    pub fn new(config: LoaderConfig, parts: HalParts) -> Result<Self, HalError> {
        config.validate()?;

        let board = BoardProfile::for_kind(config.board.kind);
        let bootinfo_address = config
            .board
            .bootinfo_address
            .unwrap_or(board.bootinfo_address);

        let mut transports = TransportRegistry::new();
        for (id, transport) in parts.transports {
            let name = board.device_name(id).ok_or_else(|| {
                HalError::InvalidArgument(format!("{id} is not a {} device", board.name))
            })?;
            transports.register(id, name, transport)?;
        }

        let interrupts =
            InterruptTable::new(board.size_interrupts, board.exception_count, board.irq_priority)?;

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);
        if !registry.append(board.commands) {
            warn!("No room for {} board commands", board.name);
        }

        info!(
            "HAL assembled for {} with {} commands, {} interrupt sources",
            board.name,
            registry.len(),
            interrupts.size()
        );

        let launch = LaunchState::from_config(&config.launch);
        Ok(Self {
            config,
            board,
            bootinfo_address,
            cpu: parts.cpu,
            timer: parts.timer,
            bootinfo: parts.bootinfo,
            console: parts.console,
            transports,
            interrupts,
            commands: registry,
            launch,
            started: false,
        })
    }

    /// Bring the platform up.
    ///
    /// Order: interrupt table, timer, console, boot-info address and loader
    /// footprint, transports. Transport failures are logged and tolerated.
    /// Runs once; launch state set before `init` is kept.
    ///
    /// # Errors
    /// - `HalError::InvalidArgument` if the HAL is already up
    /// - the console or boot-info error if either cannot start
    pub fn init(&mut self) -> Result<(), HalError> {
        if self.started {
            return Err(HalError::InvalidArgument(format!(
                "{} is already initialized",
                self.board.name
            )));
        }

        self.interrupts.clear(self.cpu.as_ref());
        self.cpu.interrupts_enable();

        self.timer.init();
        self.console.init()?;

        self.bootinfo.set_address(self.bootinfo_address);
        if let Some((base, size)) = self.board.loader_region {
            self.bootinfo.add_entries(base, size + LOADER_STACK_SIZE)?;
        }

        let ready = self.transports.init();
        self.started = true;

        info!(
            "{} up: {} of {} transports ready, boot info at {:#x}",
            self.board.name,
            ready,
            self.transports.entries().count(),
            self.bootinfo_address
        );
        Ok(())
    }

    /// Quiesce the platform before hand-off.
    ///
    /// Releases the transports and the console, stops the timer and cleans
    /// the data cache. No transport may be used afterwards.
    pub fn done(&mut self) {
        self.transports.deinit();
        self.console.deinit();
        self.timer.done();
        self.cpu.cache_clean_all();
        debug!("Platform quiesced");
    }

    // ─── Interrupts ─────────────────────────────────────────────────

    /// Bind `isr` to `source`; `None` disables the source instead.
    pub fn irq_install(
        &mut self,
        source: IrqSource,
        isr: Option<Isr>,
        context: usize,
    ) -> Result<(), HalError> {
        self.interrupts
            .install(self.cpu.as_ref(), source, isr, context)
    }

    /// Clear the binding of `source`.
    pub fn irq_uninstall(&mut self, source: IrqSource) -> Result<(), HalError> {
        self.interrupts.uninstall(self.cpu.as_ref(), source)
    }

    /// Run the handler bound to `source`. Exception-entry path only.
    pub fn irq_dispatch(&self, source: IrqSource) -> Result<i32, HalError> {
        self.interrupts.dispatch(source)
    }

    /// Unmask interrupts globally.
    pub fn global_enable(&self) {
        self.cpu.interrupts_enable();
    }

    /// Mask interrupts globally.
    pub fn global_disable(&self) {
        self.cpu.interrupts_disable();
    }

    // ─── Caches ─────────────────────────────────────────────────────

    /// Invalidate `[addr, addr + size)` after a transport wrote an image
    /// there behind the cache.
    pub fn cache_invalidate(&self, kind: CacheKind, addr: usize, size: usize) {
        self.cpu.cache_invalidate(kind, addr, size);
    }

    /// Invalidate a whole cache.
    pub fn cache_invalidate_all(&self, kind: CacheKind) {
        self.cpu.cache_invalidate_all(kind);
    }

    // ─── Launch state ───────────────────────────────────────────────

    /// Record the verified kernel entry, translated to the address it runs
    /// from on this board. Zero clears the entry.
    pub fn set_kernel_entry(&mut self, addr: usize) -> Option<KernelEntry> {
        let entry = KernelEntry::new(self.board.kernel_physical(addr));
        self.launch.kernel_entry = entry;
        match entry {
            Some(e) => debug!("Kernel entry set to {}", e),
            None => debug!("Kernel entry cleared"),
        }
        entry
    }

    /// Verified kernel entry, if any.
    pub fn kernel_entry(&self) -> Option<KernelEntry> {
        self.launch.kernel_entry
    }

    /// Set the autoboot countdown in ticks.
    pub fn set_launch_timeout(&mut self, ticks: u64) {
        self.launch.timeout_ticks = ticks;
    }

    /// Autoboot countdown in ticks.
    pub fn launch_timeout(&self) -> u64 {
        self.launch.timeout_ticks
    }

    /// Current launch state.
    pub fn launch_state(&self) -> LaunchState {
        self.launch
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Active board profile.
    pub fn board(&self) -> &'static BoardProfile {
        self.board
    }

    /// Loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Boot-info address handed to the kernel.
    pub fn bootinfo_address(&self) -> usize {
        self.bootinfo_address
    }

    /// CPU-family back end.
    pub fn cpu(&self) -> &dyn Cpu {
        self.cpu.as_ref()
    }

    /// Loader console.
    pub fn console(&mut self) -> &mut Console {
        &mut self.console
    }

    /// Transport registry.
    pub fn transports(&mut self) -> &mut TransportRegistry {
        &mut self.transports
    }

    /// Interrupt binding table.
    pub fn interrupts(&self) -> &InterruptTable {
        &self.interrupts
    }

    /// Command registry.
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Command registry, for collaborators that add commands after start-up.
    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    // ─── Command execution ──────────────────────────────────────────

    /// Execute one command line.
    ///
    /// The first word names the command, the rest is its argument string.
    /// Blank lines and `#` comments do nothing. A failure is reported on
    /// the console with its negative errno and returned.
    pub fn exec(&mut self, line: &str) -> Result<(), HalError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (line, ""),
        };

        let result = self
            .commands
            .lookup(name)
            .and_then(|command| (command.run)(self, args));

        if let Err(e) = &result {
            let status = to_errno(&result);
            warn!("Command '{}' failed with {}: {}", name, status, e);
            self.console.set_attr(Attr::Error);
            self.console.print(format_args!("{name}: {e} ({status})\n"));
            self.console.set_attr(Attr::User);
        }
        result
    }

    /// Execute the configured script `name` line by line, stopping at the
    /// first failing line.
    ///
    /// # Errors
    /// - `HalError::NotFound` if no such script is configured
    /// - the first command failure otherwise
    pub fn run_script(&mut self, name: &str) -> Result<(), HalError> {
        let script = self
            .config
            .script(name)
            .ok_or_else(|| HalError::NotFound(format!("script '{name}'")))?
            .to_owned();

        info!("Running script '{}'", name);
        for line in script.lines() {
            self.exec(line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimEvent, SimHarness};
    use kestrel_common::config::BoardKind;

    fn harness(kind: BoardKind) -> SimHarness {
        let mut config = LoaderConfig::default();
        config.board.kind = kind;
        SimHarness::new(config).unwrap()
    }

    #[test]
    fn init_order() {
        let mut h = harness(BoardKind::Sim);
        h.hal.init().unwrap();

        let events = h.journal.events();
        let pos = |e: &SimEvent| events.iter().position(|x| x == e).unwrap();
        assert!(pos(&SimEvent::InterruptsEnabled) < pos(&SimEvent::TimerInit));
        assert!(pos(&SimEvent::TimerInit) < pos(&SimEvent::TransportInit("com1".into())));
        assert!(
            pos(&SimEvent::BootInfoEntry {
                base: 0x1_0000,
                size: 0x1_0000 + LOADER_STACK_SIZE,
            }) < pos(&SimEvent::TransportInit("com1".into()))
        );
        assert_eq!(h.bootinfo.address(), 0x1000);
    }

    #[test]
    fn done_order() {
        let mut h = harness(BoardKind::Sim);
        h.hal.init().unwrap();
        h.journal.clear();
        h.hal.done();

        let events = h.journal.events();
        assert_eq!(events.first(), Some(&SimEvent::TransportDeinit("com1".into())));
        assert_eq!(events.last(), Some(&SimEvent::CacheClean));
        assert!(events.contains(&SimEvent::TimerDone));
    }

    fn status_isr(_source: IrqSource, context: usize) -> i32 {
        context as i32
    }

    #[test]
    fn second_init_is_refused_and_keeps_state() {
        let mut h = harness(BoardKind::Imxrt117x);
        h.hal.init().unwrap();
        h.hal
            .irq_install(IrqSource(20), Some(status_isr), 5)
            .unwrap();
        h.hal.set_kernel_entry(0x4000);
        h.journal.clear();

        assert!(matches!(h.hal.init(), Err(HalError::InvalidArgument(_))));
        assert!(h.journal.events().is_empty());
        assert_eq!(h.hal.irq_dispatch(IrqSource(20)), Ok(5));
        assert_eq!(h.hal.kernel_entry().map(KernelEntry::addr), Some(0x4000));
    }

    #[test]
    fn entry_set_before_init_survives_init() {
        let mut h = harness(BoardKind::Imxrt117x);
        h.hal.set_kernel_entry(0x3000_0401);
        h.hal.init().unwrap();
        assert_eq!(h.hal.kernel_entry().map(KernelEntry::addr), Some(0x3000_0401));
    }

    #[test]
    fn zynq_entry_is_translated() {
        let mut h = harness(BoardKind::Zynq7000);
        let entry = h.hal.set_kernel_entry(0xC000_0100).unwrap();
        assert_eq!(entry.addr(), 0x0010_0100);
        assert!(h.hal.set_kernel_entry(0).is_none());
        assert!(h.hal.kernel_entry().is_none());
    }

    #[test]
    fn bootinfo_address_override() {
        let mut config = LoaderConfig::default();
        config.board.bootinfo_address = Some(0x8000);
        let mut h = SimHarness::new(config).unwrap();
        h.hal.init().unwrap();
        assert_eq!(h.bootinfo.address(), 0x8000);
    }

    #[test]
    fn launch_timeout_defaults_to_three_seconds() {
        let h = harness(BoardKind::Sim);
        assert_eq!(h.hal.launch_timeout(), 3 * TICKS_PER_SECOND);
    }

    #[test]
    fn board_commands_follow_base_set() {
        let h = harness(BoardKind::Sim);
        let names: Vec<_> = h.hal.commands().iter().map(|c| c.name).collect();
        assert_eq!(names, ["help", "go!", "script", "timeout", "lsdev", "cpuinfo", "irqstat"]);
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let mut h = harness(BoardKind::Sim);
        assert!(h.hal.exec("").is_ok());
        assert!(h.hal.exec("   # comment").is_ok());
    }

    #[test]
    fn unknown_command_reported_on_console() {
        let mut h = harness(BoardKind::Sim);
        h.hal.init().unwrap();
        h.console.take_tx();

        let result = h.hal.exec("bitstream 0x100");
        assert!(matches!(result, Err(HalError::NotFound(_))));
        let out = String::from_utf8(h.console.take_tx()).unwrap();
        assert!(out.contains("bitstream: Not found"));
        assert!(out.contains(&format!("({})", -kestrel_common::hal::error::errno::ENOENT)));
    }

    #[test]
    fn cache_maintenance_reaches_cpu() {
        let h = harness(BoardKind::Sim);
        h.hal.cache_invalidate(CacheKind::Data, 0x8000_0000, 0x1000);
        h.hal.cache_invalidate_all(CacheKind::Instruction);
        assert_eq!(
            h.journal.events(),
            vec![SimEvent::CacheInvalidate, SimEvent::CacheInvalidate]
        );
    }

    #[test]
    fn global_masking_reaches_cpu() {
        let h = harness(BoardKind::Imxrt117x);
        h.hal.global_disable();
        h.hal.global_enable();
        assert_eq!(
            h.journal.events(),
            vec![SimEvent::InterruptsDisabled, SimEvent::InterruptsEnabled]
        );
    }

    #[test]
    fn launch_state_tracks_setters() {
        let mut h = harness(BoardKind::Imxrt117x);
        h.hal.set_kernel_entry(0x3000_0401);
        h.hal.set_launch_timeout(0);
        let state = h.hal.launch_state();
        assert_eq!(state.kernel_entry.map(KernelEntry::addr), Some(0x3000_0401));
        assert_eq!(state.timeout_ticks, 0);
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = LoaderConfig::default();
        config.launch.settle_ticks = 0;
        assert!(matches!(SimHarness::new(config), Err(HalError::Config(_))));
    }
}
