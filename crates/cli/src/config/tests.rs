use std::io::Write;
use std::sync::Mutex;

use vigil_core::{Interval, Protocol, TaskError, TaskType};

use super::{AgentConfig, ConfigError, TaskConfig};

// Env-based tests must run serially to avoid interfering with each other.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_vigil_env() {
    let keys = [
        "VIGIL_AGENT_ENDPOINT",
        "VIGIL_SCHEDULER_WORKER_THREADS",
        "VIGIL_SCHEDULER_TICK_MILLIS",
        "VIGIL_SCHEDULER_SHUTDOWN_TIMEOUT_SECONDS",
        "VIGIL_SCHEDULER_DIAGNOSTICS_INTERVAL_SECONDS",
        "VIGIL_STORAGE_BUFFER_SIZE",
        "VIGIL_STORAGE_MAX_BATCH_SIZE",
        "VIGIL_STORAGE_MAX_WAIT_MILLIS",
    ];
    for k in keys {
        std::env::remove_var(k);
    }
}

#[test]
fn parse_minimal_toml() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_vigil_env();

    let cfg = AgentConfig::from_toml("").unwrap();
    assert_eq!(cfg.agent.endpoint, "localhost");
    assert_eq!(cfg.scheduler.worker_threads, 2);
    assert_eq!(cfg.storage.max_batch_size, 100);
    assert!(cfg.tasks.is_empty());
}

#[test]
fn parse_full_toml() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_vigil_env();

    let toml = r#"
[agent]
endpoint = "app-01"

[scheduler]
worker_threads = 4
tick_millis = 50
diagnostics_interval_seconds = 0

[storage]
buffer_size = 500
max_batch_size = 25

[[tasks]]
id = "%_ManagedServerName%-heap"
type = "metric"
protocol = "object"
location = "java.lang:type=Memory"
attribute = "HeapMemoryUsage"
subref = "used"
interval = { duration = 30, unit = "seconds" }

[[tasks]]
id = "deployment-%deployment%"
type = "avail"
protocol = "tree"
endpoint = "standalone"
base = "/deployment=shop.war"
location = "/subsystem=web"
attribute = "status"
up_regex = "OK|RUNNING"
interval = { duration = 1, unit = "minutes" }

[[tasks]]
type = "metric"
location = "/os=*/file_store=*"
attribute = "Usable Space"
"#;
    let cfg = AgentConfig::from_toml(toml).unwrap();
    assert_eq!(cfg.agent.endpoint, "app-01");
    assert_eq!(cfg.scheduler.worker_threads, 4);
    assert_eq!(cfg.scheduler.tick_millis, 50);
    assert_eq!(cfg.scheduler.shutdown_timeout_seconds, 30); // default
    assert_eq!(cfg.storage.buffer_size, 500);
    assert_eq!(cfg.storage.max_wait_millis, 1000); // default

    let tasks = cfg.build_tasks().unwrap();
    assert_eq!(tasks.len(), 3);

    let heap = &tasks[0];
    assert_eq!(heap.id(), "app-01-heap");
    assert_eq!(heap.kind().protocol, Protocol::Object);
    assert_eq!(heap.kind().endpoint, "app-01");
    assert_eq!(heap.subref(), Some("used"));
    assert_eq!(heap.interval(), Interval::seconds(30));

    let deployment = &tasks[1];
    assert_eq!(deployment.id(), "deployment-shop.war");
    assert_eq!(deployment.task_type(), TaskType::Avail);
    assert_eq!(deployment.kind().endpoint, "standalone");
    assert_eq!(
        deployment.location().to_string(),
        "/deployment=shop.war/subsystem=web"
    );
    assert!(deployment.up_regex().unwrap().is_match("RUNNING"));
    assert_eq!(deployment.interval(), Interval::seconds(60));

    let disks = &tasks[2];
    assert_eq!(disks.kind().protocol, Protocol::Platform);
    assert_eq!(disks.interval(), Interval::seconds(60));
    assert!(!disks.id().is_empty());
}

#[test]
fn env_overrides_apply_before_validation() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_vigil_env();

    std::env::set_var("VIGIL_AGENT_ENDPOINT", "from-env");
    std::env::set_var("VIGIL_SCHEDULER_WORKER_THREADS", "8");
    std::env::set_var("VIGIL_STORAGE_MAX_WAIT_MILLIS", "250");
    std::env::set_var("VIGIL_STORAGE_BUFFER_SIZE", "not-a-number");

    let cfg = AgentConfig::from_toml("[agent]\nendpoint = \"from-file\"\n").unwrap();
    assert_eq!(cfg.agent.endpoint, "from-env");
    assert_eq!(cfg.scheduler.worker_threads, 8);
    assert_eq!(cfg.storage.max_wait_millis, 250);
    assert_eq!(cfg.storage.buffer_size, 1000, "unparseable override is ignored");

    std::env::set_var("VIGIL_SCHEDULER_TICK_MILLIS", "0");
    let err = AgentConfig::from_toml("").unwrap_err();
    assert!(err.to_string().contains("tick_millis"));

    clear_vigil_env();
}

#[test]
fn invalid_task_definitions_are_rejected() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_vigil_env();

    let bad_location = r#"
[[tasks]]
type = "metric"
location = "/gpu=0"
attribute = "Usage"
"#;
    assert!(matches!(
        AgentConfig::from_toml(bad_location),
        Err(ConfigError::Location { index: 0, .. })
    ));

    let regex_on_metric = r#"
[[tasks]]
id = "cpu"
type = "metric"
location = "/os=*"
attribute = "System CPU Load"
up_regex = "UP"
"#;
    assert!(matches!(
        AgentConfig::from_toml(regex_on_metric),
        Err(ConfigError::Task { index: 0, source: TaskError::UpRegexOnMetric(_) })
    ));

    let zero_interval = r#"
[[tasks]]
id = "cpu"
type = "metric"
location = "/os=*"
attribute = "System CPU Load"
interval = { duration = 0, unit = "seconds" }
"#;
    assert!(matches!(
        AgentConfig::from_toml(zero_interval),
        Err(ConfigError::Task { source: TaskError::ZeroInterval(_), .. })
    ));

    let duplicate = r#"
[[tasks]]
id = "cpu"
type = "metric"
location = "/os=*"
attribute = "System CPU Load"

[[tasks]]
id = "cpu"
type = "avail"
location = "/os=*"
"#;
    let err = AgentConfig::from_toml(duplicate).unwrap_err();
    assert!(err.to_string().contains("duplicate task id 'cpu'"));

    assert!(matches!(
        AgentConfig::from_toml("[[tasks]]\ntype = \"sometimes\"\nlocation = \"/\"\n"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn from_file_reads_toml() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_vigil_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[agent]\nendpoint = \"disk-host\"\n\n[[tasks]]\nid = \"up\"\ntype = \"avail\"\nlocation = \"/os=*\""
    )
    .unwrap();

    let cfg = AgentConfig::from_file(file.path()).unwrap();
    assert_eq!(cfg.agent.endpoint, "disk-host");
    assert_eq!(cfg.tasks.len(), 1);

    let missing = file.path().with_extension("missing");
    assert!(matches!(AgentConfig::from_file(missing), Err(ConfigError::Io(_))));
}

#[test]
fn platform_defaults_are_valid() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_vigil_env();

    let cfg = AgentConfig::platform_defaults().unwrap();
    let tasks = cfg.build_tasks().unwrap();
    assert_eq!(tasks.len(), TaskConfig::platform_defaults().len());
    assert!(tasks.iter().all(|t| t.kind().protocol == Protocol::Platform));
    assert!(tasks.iter().any(|t| t.is_existence_check()));
}
