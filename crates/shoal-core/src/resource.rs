//! Capacity vectors offered by cluster nodes.
//!
//! A [`Resource`] describes what a node (or an aggregate of offers on one
//! node) can still hand out: fractional CPUs, memory, GPUs, disk and a set
//! of port ranges. Packing carves pieces out of it with [`Resource::cut`],
//! which always hands back exactly what was consumed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::job::ResourceDemand;

/// Inclusive range of ports, `begin..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub begin: u32,
    pub end: u32,
}

impl PortRange {
    /// Build a range; the bounds are swapped if given in reverse.
    pub fn new(begin: u32, end: u32) -> Self {
        Self {
            begin: begin.min(end),
            end: begin.max(end),
        }
    }

    pub fn single(port: u32) -> Self {
        Self::new(port, port)
    }

    /// Number of ports in the range (never zero).
    pub fn len(&self) -> u64 {
        u64::from(self.end.abs_diff(self.begin)) + 1
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.begin == self.end {
            write!(f, "{}", self.begin)
        } else {
            write!(f, "{}-{}", self.begin, self.end)
        }
    }
}

/// Capacity held by a node, an offer, or a single launched task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawResource")]
pub struct Resource {
    cpu: f64,
    mem_mb: u64,
    gpu: u32,
    disk_mb: u64,
    ports: Vec<PortRange>,
}

/// Wire shape of a resource; normalised through [`Resource::new`].
#[derive(Deserialize)]
struct RawResource {
    cpu: f64,
    mem_mb: u64,
    #[serde(default)]
    gpu: u32,
    #[serde(default)]
    disk_mb: u64,
    #[serde(default)]
    ports: Vec<PortRange>,
}

impl From<RawResource> for Resource {
    fn from(raw: RawResource) -> Self {
        Resource::new(raw.cpu, raw.mem_mb, raw.gpu, raw.disk_mb, raw.ports)
    }
}

impl Resource {
    /// Negative or NaN CPU values are clamped to zero; port ranges are
    /// sorted and coalesced.
    pub fn new(cpu: f64, mem_mb: u64, gpu: u32, disk_mb: u64, ports: Vec<PortRange>) -> Self {
        Self {
            cpu: if cpu > 0.0 { cpu } else { 0.0 },
            mem_mb,
            gpu,
            disk_mb,
            ports: normalize(ports),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn cpu(&self) -> f64 {
        self.cpu
    }

    pub fn mem_mb(&self) -> u64 {
        self.mem_mb
    }

    pub fn gpu(&self) -> u32 {
        self.gpu
    }

    pub fn disk_mb(&self) -> u64 {
        self.disk_mb
    }

    pub fn ports(&self) -> &[PortRange] {
        &self.ports
    }

    /// Total number of individual ports held.
    pub fn port_amount(&self) -> u64 {
        self.ports.iter().map(PortRange::len).sum()
    }

    /// Highest port held, or 0 when the resource carries no ports.
    pub fn last_port(&self) -> u32 {
        self.ports.last().map_or(0, |r| r.end)
    }

    /// Add `other` into `self`, dimension by dimension.
    pub fn merge(&mut self, other: &Resource) {
        self.cpu += other.cpu;
        self.mem_mb += other.mem_mb;
        self.gpu += other.gpu;
        self.disk_mb += other.disk_mb;
        if !other.ports.is_empty() {
            let mut ports = std::mem::take(&mut self.ports);
            ports.extend_from_slice(&other.ports);
            self.ports = normalize(ports);
        }
    }

    /// True when every dimension of `demand` fits at once.
    pub fn covers(&self, demand: &ResourceDemand) -> bool {
        cpu_fits(demand.cpu, self.cpu)
            && demand.mem_mb <= self.mem_mb
            && demand.gpu <= self.gpu
            && demand.disk_mb <= self.disk_mb
            && u64::from(demand.ports) <= self.port_amount()
    }

    /// Deduct `demand` and return the consumed sub-resource.
    ///
    /// Ports are taken lowest-first from those strictly above `last_port`,
    /// so a caller that feeds back [`Resource::last_port`] of each cut gets
    /// strictly increasing port assignments. If not enough ports sit above
    /// the watermark the rest come from the lowest remaining ports.
    ///
    /// Only call this after [`Resource::covers`] returned true; an
    /// uncovered demand is saturated at what is available.
    pub fn cut(&mut self, demand: &ResourceDemand, last_port: u32) -> Resource {
        let cpu = demand.cpu.clamp(0.0, self.cpu);
        let mem_mb = demand.mem_mb.min(self.mem_mb);
        let gpu = demand.gpu.min(self.gpu);
        let disk_mb = demand.disk_mb.min(self.disk_mb);

        self.cpu = (self.cpu - cpu).max(0.0);
        self.mem_mb -= mem_mb;
        self.gpu -= gpu;
        self.disk_mb -= disk_mb;

        let mut taken = Vec::new();
        let mut wanted = demand.ports;
        if let Some(floor) = last_port.checked_add(1) {
            wanted = self.take_ports(floor, wanted, &mut taken);
        }
        if wanted > 0 {
            self.take_ports(0, wanted, &mut taken);
        }

        Resource::new(cpu, mem_mb, gpu, disk_mb, taken)
    }

    /// Move up to `wanted` ports `>= floor` into `taken`; returns the shortfall.
    fn take_ports(&mut self, floor: u32, mut wanted: u32, taken: &mut Vec<PortRange>) -> u32 {
        let mut kept = Vec::with_capacity(self.ports.len() + 1);
        for range in std::mem::take(&mut self.ports) {
            if wanted == 0 || range.end < floor {
                kept.push(range);
                continue;
            }
            let start = range.begin.max(floor);
            if start > range.begin {
                kept.push(PortRange::new(range.begin, start - 1));
            }
            let available = u64::from(range.end - start) + 1;
            let n = u32::try_from(available.min(u64::from(wanted))).unwrap_or(wanted);
            taken.push(PortRange::new(start, start + n - 1));
            wanted -= n;
            if start + n - 1 < range.end {
                kept.push(PortRange::new(start + n, range.end));
            }
        }
        self.ports = kept;
        wanted
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cpu={:.1} mem={}MB gpu={} disk={}MB ports=[",
            self.cpu, self.mem_mb, self.gpu, self.disk_mb
        )?;
        for (i, range) in self.ports.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{range}")?;
        }
        f.write_str("]")
    }
}

/// Fractional CPU sums pick up rounding error; allow for it.
const CPU_EPSILON: f64 = 1e-9;

/// True when `demand` CPUs fit into `available`, tolerating float noise.
pub fn cpu_fits(demand: f64, available: f64) -> bool {
    demand <= available + CPU_EPSILON
}

/// Fix reversed bounds, then sort and coalesce overlapping or adjacent
/// ranges.
fn normalize(ports: Vec<PortRange>) -> Vec<PortRange> {
    let mut ports: Vec<PortRange> = ports
        .into_iter()
        .map(|r| PortRange::new(r.begin, r.end))
        .collect();
    ports.sort_by_key(|r| r.begin);
    let mut out: Vec<PortRange> = Vec::with_capacity(ports.len());
    for range in ports {
        match out.last_mut() {
            Some(prev) if range.begin <= prev.end.saturating_add(1) => {
                prev.end = prev.end.max(range.end);
            }
            _ => out.push(range),
        }
    }
    out
}
