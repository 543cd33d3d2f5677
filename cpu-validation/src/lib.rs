use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use orchard_core::core::{Bus, BusMaster, CoreError, SignalLines};
use orchard_core::cpu::M65C02;
use serde::{Deserialize, Serialize};

pub mod cycle_script;
pub mod reference;

pub use cycle_script::{ScriptedCycle, align_trace, scripted_cycles};

// --- TracingBus: flat 64KB memory with access-by-access recording ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write,
    Internal,
}

impl BusOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BusOp::Read => "read",
            BusOp::Write => "write",
            BusOp::Internal => "internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct BusCycle {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

pub struct TracingBus {
    pub memory: Box<[u8]>,
    pub cycles: Vec<BusCycle>,
    pub signals: SignalLines,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: vec![0; 0x10000].into_boxed_slice(),
            cycles: Vec::new(),
            signals: SignalLines::default(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn clear_cycles(&mut self) {
        self.cycles.clear();
    }

    /// Writes recorded since the last clear, in bus order.
    pub fn writes(&self) -> Vec<(u16, u8)> {
        self.cycles
            .iter()
            .filter(|c| c.op == BusOp::Write)
            .map(|c| (c.addr, c.data))
            .collect()
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        let data = self.memory[addr as usize];
        self.cycles.push(BusCycle {
            addr,
            data,
            op: BusOp::Read,
        });
        data
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.cycles.push(BusCycle {
            addr,
            data,
            op: BusOp::Write,
        });
    }

    fn signals(&mut self) -> &mut SignalLines {
        &mut self.signals
    }
}

/// Decode the opcode at `cpu.regs.pc` and execute exactly one step, leaving
/// only that step's accesses in `bus.cycles`.
///
/// The engine decodes ahead, so the final read of a completed step is the
/// next opcode fetch. It is dropped here; the leading entry is this step's
/// own opcode fetch.
pub fn execute_one(cpu: &mut M65C02, bus: &mut TracingBus) -> Result<u32, CoreError> {
    bus.clear_cycles();
    cpu.prime(bus);
    let cycles = cpu.cycle(bus)?;
    if bus.cycles.last().is_some_and(|c| c.op == BusOp::Read) {
        bus.cycles.pop();
    }
    Ok(cycles)
}

// --- M65C02 JSON test vector types (SingleStepTests/65x02 format) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct M65C02TestCase {
    pub name: String,
    pub initial: M65C02CpuState,
    #[serde(rename = "final")]
    pub final_state: M65C02CpuState,
    pub cycles: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct M65C02CpuState {
    pub pc: u16,
    pub s: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub ram: Vec<(u16, u8)>,
}

/// Load a vector file, transparently inflating `.gz`.
pub fn load_vectors(path: &Path) -> io::Result<Vec<M65C02TestCase>> {
    let mut file = BufReader::new(File::open(path)?);
    let mut json = String::new();
    if path.extension().is_some_and(|ext| ext == "gz") {
        GzDecoder::new(file).read_to_string(&mut json)?;
    } else {
        file.read_to_string(&mut json)?;
    }
    serde_json::from_str(&json).map_err(io::Error::from)
}
