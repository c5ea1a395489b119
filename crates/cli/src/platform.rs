//! Platform protocol session backed by the local host via `sysinfo`.
//!
//! Resources are enumerated fresh for every request:
//! `/os=<name>`, `/os=<name>/memory=memory`, `/os=<name>/processor=<index>`
//! and `/os=<name>/file_store=<disk>`. Power sources are not exposed.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use sysinfo::{Disks, ProcessesToUpdate, System};
use tracing::debug;
use vigil_core::{
    Kind, Location, LocationResolver, PlatformPath, PlatformResolver, PlatformResourceType,
    Protocol,
};
use vigil_scheduler::{
    BatchRequest, BatchResponse, ReadStep, Session, SessionError, SessionFactory, StepOutcome,
    TargetOutcome,
};

pub const SYSTEM_CPU_LOAD: &str = "System CPU Load";
pub const SYSTEM_LOAD_AVERAGE: &str = "System Load Average";
pub const PROCESS_COUNT: &str = "Process Count";
pub const AVAILABLE_MEMORY: &str = "Available Memory";
pub const TOTAL_MEMORY: &str = "Total Memory";
pub const CPU_USAGE: &str = "CPU Usage";
pub const USABLE_SPACE: &str = "Usable Space";
pub const TOTAL_SPACE: &str = "Total Space";

/// Opens sessions on the local host. All sessions share one `System` so CPU
/// usage is measured between consecutive requests.
pub struct PlatformSessionFactory {
    system: Arc<Mutex<System>>,
}

impl PlatformSessionFactory {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        Self {
            system: Arc::new(Mutex::new(system)),
        }
    }
}

impl Default for PlatformSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFactory for PlatformSessionFactory {
    fn protocol(&self) -> Protocol {
        Protocol::Platform
    }

    fn open(&self, kind: &Kind) -> Result<Box<dyn Session>, SessionError> {
        debug!(endpoint = %kind.endpoint, "Opening platform session");
        Ok(Box::new(PlatformSession {
            system: Arc::clone(&self.system),
        }))
    }
}

struct PlatformSession {
    system: Arc<Mutex<System>>,
}

/// Concrete resource found on the host.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Resource {
    OperatingSystem,
    Memory,
    Processor(usize),
    FileStore(usize),
}

/// Refreshed host state for one request.
struct HostSnapshot<'a> {
    system: &'a System,
    disks: Disks,
    resources: Vec<(Location, Resource)>,
}

impl<'a> HostSnapshot<'a> {
    fn capture(system: &'a System, disks: Disks) -> Self {
        let os_name = System::name().unwrap_or_else(|| "os".to_string());
        let os = PlatformPath::empty().segment(PlatformResourceType::OperatingSystem, &os_name);

        let mut resources = vec![
            (Location::from(os.clone()), Resource::OperatingSystem),
            (
                Location::from(os.clone().segment(PlatformResourceType::Memory, "memory")),
                Resource::Memory,
            ),
        ];
        for index in 0..system.cpus().len() {
            let path = os
                .clone()
                .segment(PlatformResourceType::Processor, &index.to_string());
            resources.push((Location::from(path), Resource::Processor(index)));
        }
        for (index, disk) in disks.iter().enumerate() {
            let name = disk.name().to_string_lossy();
            let path = os.clone().segment(PlatformResourceType::FileStore, &name);
            resources.push((Location::from(path), Resource::FileStore(index)));
        }

        Self {
            system,
            disks,
            resources,
        }
    }

    /// Resources addressed by `query`, in enumeration order.
    fn lookup(&self, query: &PlatformPath) -> Vec<(&Location, Resource)> {
        self.resources
            .iter()
            .filter(|(location, _)| match location {
                Location::Platform(concrete) => PlatformResolver.matches(query, concrete),
                _ => false,
            })
            .map(|(location, resource)| (location, *resource))
            .collect()
    }

    fn read(&self, resource: Resource, attribute: &str) -> Result<Value, String> {
        let value = match (resource, attribute) {
            (Resource::OperatingSystem, SYSTEM_CPU_LOAD) => {
                json!(f64::from(self.system.global_cpu_usage()) / 100.0)
            }
            (Resource::OperatingSystem, SYSTEM_LOAD_AVERAGE) => json!(System::load_average().one),
            (Resource::OperatingSystem, PROCESS_COUNT) => json!(self.system.processes().len()),
            (Resource::Memory, AVAILABLE_MEMORY) => json!(self.system.available_memory()),
            (Resource::Memory, TOTAL_MEMORY) => json!(self.system.total_memory()),
            (Resource::Processor(index), CPU_USAGE) => {
                let cpu = self
                    .system
                    .cpus()
                    .get(index)
                    .ok_or_else(|| format!("processor {index} disappeared"))?;
                json!(f64::from(cpu.cpu_usage()) / 100.0)
            }
            (Resource::FileStore(index), USABLE_SPACE | TOTAL_SPACE) => {
                let disk = self
                    .disks
                    .list()
                    .get(index)
                    .ok_or_else(|| format!("file store {index} disappeared"))?;
                if attribute == USABLE_SPACE {
                    json!(disk.available_space())
                } else {
                    json!(disk.total_space())
                }
            }
            (resource, attribute) => {
                return Err(format!("unknown metric '{attribute}' for {resource:?}"));
            }
        };
        Ok(value)
    }

    fn answer(&self, step: &ReadStep) -> StepOutcome {
        let Location::Platform(query) = step.location() else {
            return StepOutcome::Failed(format!("not a platform location: {}", step.location()));
        };
        let attribute = match step {
            ReadStep::Attribute { attribute, .. } => Some(attribute.as_str()),
            ReadStep::Resource { .. } => None,
        };
        let read = |resource| match attribute {
            Some(attribute) => self.read(resource, attribute),
            None => Ok(Value::Null),
        };

        let found = self.lookup(query);
        if PlatformResolver.is_multi_target(query) {
            return StepOutcome::Targets(
                found
                    .into_iter()
                    .map(|(location, resource)| TargetOutcome {
                        location: location.clone(),
                        result: read(resource),
                    })
                    .collect(),
            );
        }
        match found.first() {
            Some((_, resource)) => match read(*resource) {
                Ok(value) => StepOutcome::Value(value),
                Err(e) => StepOutcome::Failed(e),
            },
            None => StepOutcome::Failed(format!("no platform resource at {query}")),
        }
    }
}

impl Session for PlatformSession {
    fn execute(&mut self, request: &BatchRequest) -> Result<BatchResponse, SessionError> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| SessionError::Transport("platform state lock poisoned".to_string()))?;
        system.refresh_cpu_all();
        system.refresh_memory();
        system.refresh_processes(ProcessesToUpdate::All, true);

        let snapshot = HostSnapshot::capture(&system, Disks::new_with_refreshed_list());
        let outcomes = request.steps.iter().map(|step| snapshot.answer(step)).collect();
        Ok(BatchResponse { outcomes })
    }
}
