//! Interrupt binding table and dispatch.
//!
//! Fixed-size table mapping an [`IrqSource`] to one handler and its opaque
//! context. Every table write happens inside a critical section, together
//! with the controller programming for the line, so a handler never sees a
//! half-written binding.
//!
//! Per source the only states are Unbound and Bound:
//!
//! ```text
//!            install(isr)              install(None) / uninstall
//! Unbound ─────────────────► Bound ─────────────────────────────► Unbound
//!                             │ ▲
//!                             └─┘ install(isr)  (last install wins)
//! ```
//!
//! Handlers must not call back into `install`/`uninstall`.

use crate::arch::{Cpu, critical_section};
use heapless::Vec;
use kestrel_common::consts::MAX_INTERRUPTS;
use kestrel_common::hal::error::HalError;
use kestrel_common::hal::types::IrqSource;
use tracing::debug;

/// Interrupt service routine: `(source, context) -> status`.
pub type Isr = fn(IrqSource, usize) -> i32;

/// Handler bound to a source.
#[derive(Debug, Clone, Copy)]
pub struct HandlerBinding {
    /// Routine invoked on dispatch.
    pub isr: Isr,
    /// Opaque value handed back to `isr`.
    pub context: usize,
}

/// Interrupt binding table for one board.
#[derive(Debug)]
pub struct InterruptTable {
    bindings: Vec<Option<HandlerBinding>, MAX_INTERRUPTS>,
    exception_count: u16,
    priority: u8,
}

impl InterruptTable {
    /// Create an empty table with `size` sources.
    ///
    /// Sources below `exception_count` are core exceptions and are never
    /// programmed at the controller. Installed lines get `priority`.
    ///
    /// # Errors
    /// Returns `HalError::OutOfRange` if `size` exceeds `MAX_INTERRUPTS`.
    pub fn new(size: usize, exception_count: u16, priority: u8) -> Result<Self, HalError> {
        let mut bindings = Vec::new();
        bindings.resize(size, None).map_err(|_| {
            HalError::OutOfRange(format!(
                "interrupt table size {size} exceeds {MAX_INTERRUPTS}"
            ))
        })?;

        Ok(Self {
            bindings,
            exception_count,
            priority,
        })
    }

    /// Number of sources in the table.
    pub fn size(&self) -> usize {
        self.bindings.len()
    }

    /// Drop every binding and disable its controller line.
    pub fn clear<C: Cpu + ?Sized>(&mut self, cpu: &C) {
        let exception_count = self.exception_count;
        critical_section(cpu, || {
            for (idx, slot) in self.bindings.iter_mut().enumerate() {
                if slot.take().is_some() {
                    if let Some(line) = (idx as u16).checked_sub(exception_count) {
                        cpu.irq_disable(line);
                    }
                }
            }
        });
    }

    fn check(&self, source: IrqSource) -> Result<usize, HalError> {
        let idx = source.index();
        if idx >= self.bindings.len() {
            return Err(HalError::OutOfRange(format!(
                "{source} exceeds table size {}",
                self.bindings.len()
            )));
        }
        Ok(idx)
    }

    fn line(&self, source: IrqSource) -> Option<u16> {
        source.0.checked_sub(self.exception_count)
    }

    /// Bind `isr` to `source`, replacing any previous binding.
    ///
    /// With `isr == None` the source is unbound and disabled at the
    /// controller instead.
    ///
    /// # Errors
    /// Returns `HalError::OutOfRange` if `source` is outside the table.
    pub fn install<C: Cpu + ?Sized>(
        &mut self,
        cpu: &C,
        source: IrqSource,
        isr: Option<Isr>,
        context: usize,
    ) -> Result<(), HalError> {
        let idx = self.check(source)?;
        let line = self.line(source);
        let priority = self.priority;
        let binding = isr.map(|isr| HandlerBinding { isr, context });

        critical_section(cpu, || {
            self.bindings[idx] = binding;
            if let Some(line) = line {
                if binding.is_some() {
                    cpu.irq_enable(line, priority);
                } else {
                    cpu.irq_disable(line);
                }
            }
        });

        debug!(
            "{} {}",
            if binding.is_some() { "Installed handler on" } else { "Disabled" },
            source
        );
        Ok(())
    }

    /// Clear the binding of `source`. Clearing an unbound source is a no-op.
    ///
    /// # Errors
    /// Returns `HalError::OutOfRange` if `source` is outside the table.
    pub fn uninstall<C: Cpu + ?Sized>(&mut self, cpu: &C, source: IrqSource) -> Result<(), HalError> {
        let idx = self.check(source)?;
        let line = self.line(source);

        critical_section(cpu, || {
            self.bindings[idx] = None;
            if let Some(line) = line {
                cpu.irq_disable(line);
            }
        });

        debug!("Uninstalled handler from {}", source);
        Ok(())
    }

    /// Invoke the handler bound to `source` and return its status.
    ///
    /// Called from interrupt context only; interrupt masking is the
    /// exception-entry frame's business.
    ///
    /// # Errors
    /// - `HalError::OutOfRange` if `source` is outside the table
    /// - `HalError::Unhandled` if nothing is bound to `source`
    pub fn dispatch(&self, source: IrqSource) -> Result<i32, HalError> {
        let idx = self.check(source)?;
        match self.bindings[idx] {
            Some(binding) => Ok((binding.isr)(source, binding.context)),
            None => Err(HalError::Unhandled(source)),
        }
    }

    /// Current binding of `source`, if any.
    pub fn binding(&self, source: IrqSource) -> Option<HandlerBinding> {
        self.bindings.get(source.index()).copied().flatten()
    }

    /// Sources that currently have a handler, in ascending order.
    pub fn bound_sources(&self) -> impl Iterator<Item = IrqSource> + '_ {
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(idx, _)| IrqSource(idx as u16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Journal, SimCpu, SimEvent};
    use proptest::prelude::*;
    use std::cell::Cell;

    thread_local! {
        static HITS: Cell<u32> = const { Cell::new(0) };
    }

    fn counting_isr(_source: IrqSource, context: usize) -> i32 {
        HITS.with(|h| h.set(h.get() + 1));
        context as i32
    }

    fn other_isr(_source: IrqSource, _context: usize) -> i32 {
        -1
    }

    fn table() -> (InterruptTable, SimCpu, Journal) {
        let journal = Journal::new();
        let cpu = SimCpu::new("test").with_journal(journal.clone());
        (InterruptTable::new(64, 16, 1).unwrap(), cpu, journal)
    }

    #[test]
    fn install_runs_inside_critical_section() {
        let (mut table, cpu, journal) = table();
        table.install(&cpu, IrqSource(20), Some(counting_isr), 7).unwrap();

        assert_eq!(
            journal.events(),
            vec![
                SimEvent::InterruptsDisabled,
                SimEvent::IrqEnabled { line: 4, priority: 1 },
                SimEvent::InterruptsEnabled,
            ]
        );
    }

    #[test]
    fn install_none_disables_line() {
        let (mut table, cpu, journal) = table();
        table.install(&cpu, IrqSource(20), Some(counting_isr), 0).unwrap();
        journal.clear();

        table.install(&cpu, IrqSource(20), None, 0).unwrap();
        assert!(table.binding(IrqSource(20)).is_none());
        assert!(journal.events().contains(&SimEvent::IrqDisabled { line: 4 }));
    }

    #[test]
    fn exceptions_skip_controller() {
        let (mut table, cpu, journal) = table();
        table.install(&cpu, IrqSource(3), Some(counting_isr), 0).unwrap();
        assert_eq!(
            journal.events(),
            vec![SimEvent::InterruptsDisabled, SimEvent::InterruptsEnabled]
        );
    }

    #[test]
    fn install_out_of_range_fails_without_masking() {
        let (mut table, cpu, journal) = table();
        let result = table.install(&cpu, IrqSource(64), Some(counting_isr), 0);
        assert!(matches!(result, Err(HalError::OutOfRange(_))));
        assert!(journal.events().is_empty());
    }

    #[test]
    fn dispatch_invokes_handler_with_context() {
        let (mut table, cpu, _) = table();
        table.install(&cpu, IrqSource(40), Some(counting_isr), 42).unwrap();

        HITS.with(|h| h.set(0));
        assert_eq!(table.dispatch(IrqSource(40)), Ok(42));
        assert_eq!(HITS.with(|h| h.get()), 1);
    }

    #[test]
    fn dispatch_unbound_is_unhandled() {
        let (table, _, _) = table();
        HITS.with(|h| h.set(0));
        assert_eq!(
            table.dispatch(IrqSource(40)),
            Err(HalError::Unhandled(IrqSource(40)))
        );
        assert_eq!(HITS.with(|h| h.get()), 0);
    }

    #[test]
    fn dispatch_does_not_touch_masking() {
        let (mut table, cpu, journal) = table();
        table.install(&cpu, IrqSource(40), Some(counting_isr), 1).unwrap();
        journal.clear();
        table.dispatch(IrqSource(40)).unwrap();
        assert!(journal.events().is_empty());
    }

    #[test]
    fn uninstall_empty_slot_is_noop() {
        let (mut table, cpu, _) = table();
        assert!(table.uninstall(&cpu, IrqSource(30)).is_ok());
        assert!(table.binding(IrqSource(30)).is_none());
    }

    #[test]
    fn last_operation_per_source_wins() {
        // Random-ish op sequence over a handful of sources; the final table
        // must equal a replay of only the last op per source.
        #[derive(Clone, Copy)]
        enum Op {
            Install(u16, Isr, usize),
            Uninstall(u16),
        }

        let ops = [
            Op::Install(17, counting_isr, 1),
            Op::Install(18, other_isr, 2),
            Op::Uninstall(17),
            Op::Install(19, counting_isr, 3),
            Op::Install(18, counting_isr, 4),
            Op::Uninstall(20),
            Op::Install(17, other_isr, 5),
            Op::Uninstall(19),
            Op::Install(20, counting_isr, 6),
        ];

        let apply = |table: &mut InterruptTable, cpu: &SimCpu, op: Op| match op {
            Op::Install(s, isr, ctx) => table.install(cpu, IrqSource(s), Some(isr), ctx).unwrap(),
            Op::Uninstall(s) => table.uninstall(cpu, IrqSource(s)).unwrap(),
        };

        let (mut full, cpu, _) = table();
        for op in ops {
            apply(&mut full, &cpu, op);
        }

        let (mut replay, cpu2, _) = table();
        for source in 17..=20u16 {
            let last = ops
                .iter()
                .rev()
                .find(|op| matches!(op, Op::Install(s, ..) | Op::Uninstall(s) if *s == source));
            if let Some(op) = last {
                apply(&mut replay, &cpu2, *op);
            }
        }

        for source in 0..64u16 {
            let a = full.binding(IrqSource(source)).map(|b| b.context);
            let b = replay.binding(IrqSource(source)).map(|b| b.context);
            assert_eq!(a, b, "source {source}");
        }
        assert_eq!(
            full.bound_sources().collect::<std::vec::Vec<_>>(),
            vec![IrqSource(17), IrqSource(18), IrqSource(20)]
        );
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Install(u16, usize),
        Disable(u16),
        Uninstall(u16),
    }

    fn op() -> impl Strategy<Value = Op> {
        let source = 14u16..22;
        prop_oneof![
            (source.clone(), 0usize..8).prop_map(|(s, ctx)| Op::Install(s, ctx)),
            source.clone().prop_map(Op::Disable),
            source.prop_map(Op::Uninstall),
        ]
    }

    fn op_source(op: Op) -> u16 {
        match op {
            Op::Install(s, _) | Op::Disable(s) | Op::Uninstall(s) => s,
        }
    }

    fn apply(table: &mut InterruptTable, cpu: &SimCpu, op: Op) {
        let result = match op {
            Op::Install(s, ctx) => table.install(cpu, IrqSource(s), Some(counting_isr), ctx),
            Op::Disable(s) => table.install(cpu, IrqSource(s), None, 0),
            Op::Uninstall(s) => table.uninstall(cpu, IrqSource(s)),
        };
        assert!(result.is_ok());
    }

    proptest! {
        #[test]
        fn any_op_sequence_matches_last_op_replay(
            ops in prop::collection::vec(op(), 0..40)
        ) {
            let (mut full, cpu, _) = table();
            for &op in &ops {
                apply(&mut full, &cpu, op);
            }

            let (mut replay, cpu2, _) = table();
            for source in 14u16..22 {
                if let Some(&last) = ops.iter().rev().find(|op| op_source(**op) == source) {
                    apply(&mut replay, &cpu2, last);
                }
            }

            for source in 0..64u16 {
                let a = full.binding(IrqSource(source)).map(|b| b.context);
                let b = replay.binding(IrqSource(source)).map(|b| b.context);
                prop_assert_eq!(a, b, "source {}", source);
            }
        }
    }

    #[test]
    fn clear_disables_bound_lines_while_masked() {
        let (mut table, cpu, journal) = table();
        table.install(&cpu, IrqSource(3), Some(counting_isr), 0).unwrap();
        table.install(&cpu, IrqSource(20), Some(counting_isr), 0).unwrap();
        journal.clear();

        table.clear(&cpu);
        assert_eq!(
            journal.events(),
            vec![
                SimEvent::InterruptsDisabled,
                SimEvent::IrqDisabled { line: 4 },
                SimEvent::InterruptsEnabled,
            ]
        );
        assert_eq!(table.bound_sources().count(), 0);
    }

    #[test]
    fn oversized_table_rejected() {
        assert!(matches!(
            InterruptTable::new(MAX_INTERRUPTS + 1, 0, 0),
            Err(HalError::OutOfRange(_))
        ));
    }
}
