use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use vigil_core::{Avail, Interval, Kind, Location, Protocol, Sample, Task, TaskType};

use super::*;
use crate::completion::CollectingHandler;
use crate::error::{PollError, SessionError};
use crate::session::{BatchResponse, Session, SessionFactory, StepOutcome, TargetOutcome};

/// Session factory answering every request with a fixed response.
struct ScriptedFactory {
    protocol: Protocol,
    response: Result<BatchResponse, SessionError>,
    delay: Duration,
    requests: Arc<Mutex<Vec<BatchRequest>>>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    fn new(protocol: Protocol, response: Result<BatchResponse, SessionError>) -> Self {
        Self {
            protocol,
            response,
            delay: Duration::ZERO,
            requests: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn outcomes(protocol: Protocol, outcomes: Vec<StepOutcome>) -> Self {
        Self::new(protocol, Ok(BatchResponse { outcomes }))
    }
}

struct ScriptedSession {
    response: Result<BatchResponse, SessionError>,
    delay: Duration,
    requests: Arc<Mutex<Vec<BatchRequest>>>,
    closed: Arc<AtomicUsize>,
}

impl Session for ScriptedSession {
    fn execute(&mut self, request: &BatchRequest) -> Result<BatchResponse, SessionError> {
        self.requests.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.response.clone()
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl SessionFactory for ScriptedFactory {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn open(&self, _kind: &Kind) -> Result<Box<dyn Session>, SessionError> {
        Ok(Box::new(ScriptedSession {
            response: self.response.clone(),
            delay: self.delay,
            requests: Arc::clone(&self.requests),
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct TaskDef<'a> {
    id: &'a str,
    task_type: TaskType,
    location: &'a str,
    attribute: Option<&'a str>,
    subref: Option<&'a str>,
}

fn make_task(protocol: Protocol, interval: Interval, def: TaskDef<'_>) -> Arc<Task> {
    let mut builder = Task::builder(
        def.id,
        def.task_type,
        interval,
        Kind::new(protocol, "local"),
        Location::parse(protocol, def.location).unwrap(),
    );
    if let Some(attribute) = def.attribute {
        builder = builder.attribute(attribute);
    }
    if let Some(subref) = def.subref {
        builder = builder.subref(subref);
    }
    Arc::new(builder.build().unwrap())
}

fn avail(id: &str, attribute: Option<&str>, subref: Option<&str>) -> Arc<Task> {
    make_task(
        Protocol::Tree,
        Interval::seconds(30),
        TaskDef {
            id,
            task_type: TaskType::Avail,
            location: "/subsystem=web",
            attribute,
            subref,
        },
    )
}

fn metric(id: &str, location: &str, attribute: &str, subref: Option<&str>) -> Arc<Task> {
    make_task(
        Protocol::Tree,
        Interval::seconds(30),
        TaskDef {
            id,
            task_type: TaskType::Metric,
            location,
            attribute: Some(attribute),
            subref,
        },
    )
}

fn group_of(tasks: &[Arc<Task>]) -> TaskGroup {
    let mut group = TaskGroup::new(Arc::clone(&tasks[0]));
    for task in &tasks[1..] {
        group.add_task(Arc::clone(task)).unwrap();
    }
    group
}

fn run(
    runnable: &dyn BatchRunnable,
    factory: ScriptedFactory,
    group: &TaskGroup,
) -> (CollectingHandler, Diagnostics, Arc<ScriptedFactory>) {
    let factory = Arc::new(factory);
    let sessions = SessionFactories::new().with(Arc::clone(&factory) as Arc<dyn SessionFactory>);
    let handler = CollectingHandler::new();
    let diagnostics = Diagnostics::new();
    runnable.run(group, &sessions, &handler, &diagnostics);
    (handler, diagnostics, factory)
}

fn avails(handler: &CollectingHandler) -> Vec<(String, Avail)> {
    handler
        .points()
        .iter()
        .map(|p| (p.task.id().to_string(), p.as_avail().unwrap_or(Avail::Unknown)))
        .collect()
}

fn target(location: &str, result: Result<Value, String>) -> TargetOutcome {
    TargetOutcome {
        location: Location::parse(Protocol::Tree, location).unwrap(),
        result,
    }
}

#[test]
fn decode_failure_aborts_remainder_of_group() {
    let tasks = vec![
        avail("one", Some("state"), None),
        avail("two", Some("state"), Some("status")),
        avail("three", Some("state"), None),
    ];
    let group = group_of(&tasks);
    // a scalar where a structured value with a `status` field belongs
    let factory = ScriptedFactory::outcomes(
        Protocol::Tree,
        vec![
            StepOutcome::Value(json!("UP")),
            StepOutcome::Value(json!("UP")),
            StepOutcome::Value(json!("UP")),
        ],
    );

    let (handler, diagnostics, factory) = run(&TreeRunnable, factory, &group);

    assert_eq!(
        avails(&handler),
        vec![
            ("one".to_string(), Avail::Up),
            ("two".to_string(), Avail::Unknown),
            ("three".to_string(), Avail::Unknown),
        ]
    );
    let failures = handler.failures();
    assert_eq!(failures.len(), 1);
    assert!(matches!(&failures[0], PollError::Decode { task, .. } if task == "two"));
    assert_eq!(diagnostics.snapshot().protocols[&Protocol::Tree].errors, 1);
    assert_eq!(factory.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_subref_field_reads_as_down() {
    let tasks = vec![
        avail("one", Some("state"), None),
        avail("two", Some("state"), Some("missing")),
        avail("three", Some("state"), None),
    ];
    let group = group_of(&tasks);
    let factory = ScriptedFactory::outcomes(
        Protocol::Tree,
        vec![
            StepOutcome::Value(json!("UP")),
            StepOutcome::Value(json!({"present": 1})),
            StepOutcome::Value(json!("UP")),
        ],
    );

    let (handler, diagnostics, _) = run(&TreeRunnable, factory, &group);

    assert_eq!(
        avails(&handler),
        vec![
            ("one".to_string(), Avail::Up),
            ("two".to_string(), Avail::Down),
            ("three".to_string(), Avail::Up),
        ]
    );
    assert!(handler.failures().is_empty());
    assert_eq!(diagnostics.snapshot().protocols[&Protocol::Tree].errors, 0);
}

#[test]
fn reported_step_failure_does_not_abort() {
    let tasks = vec![
        avail("one", Some("state"), None),
        avail("two", Some("state"), None),
        avail("three", Some("state"), None),
    ];
    let group = group_of(&tasks);
    let factory = ScriptedFactory::outcomes(
        Protocol::Tree,
        vec![
            StepOutcome::Value(json!("OK")),
            StepOutcome::Failed("resource not found".into()),
            StepOutcome::Value(json!(0)),
        ],
    );

    let (handler, _, _) = run(&TreeRunnable, factory, &group);

    assert_eq!(
        avails(&handler),
        vec![
            ("one".to_string(), Avail::Up),
            ("two".to_string(), Avail::Unknown),
            ("three".to_string(), Avail::Down),
        ]
    );
    assert_eq!(handler.failures().len(), 1);
}

#[test]
fn existence_checks_map_success_and_failure() {
    let tasks = vec![avail("present", None, None), avail("absent", None, None)];
    let group = group_of(&tasks);
    let factory = ScriptedFactory::outcomes(
        Protocol::Tree,
        vec![
            StepOutcome::Value(json!({"name": "web"})),
            StepOutcome::Failed("not found".into()),
        ],
    );

    let (handler, _, factory) = run(&TreeRunnable, factory, &group);

    assert_eq!(
        avails(&handler),
        vec![("present".to_string(), Avail::Up), ("absent".to_string(), Avail::Down)]
    );
    assert!(handler.failures().is_empty(), "a failed existence check is not an error");

    let requests = factory.requests.lock().unwrap();
    assert!(matches!(requests[0].steps[0], ReadStep::Resource { .. }));
}

#[test]
fn multi_target_avail_folds_with_sticky_down() {
    let tasks = vec![avail("pools", Some("state"), None), avail("healthy", Some("state"), None)];
    let group = group_of(&tasks);
    let factory = ScriptedFactory::outcomes(
        Protocol::Tree,
        vec![
            StepOutcome::Targets(vec![
                target("/pool=a", Ok(json!("UP"))),
                target("/pool=b", Ok(json!("DOWN"))),
                target("/pool=c", Ok(json!("UP"))),
            ]),
            StepOutcome::Targets(vec![
                target("/pool=a", Ok(json!("UP"))),
                target("/pool=b", Err("timeout".into())),
                target("/pool=c", Ok(json!("up"))),
            ]),
        ],
    );

    let (handler, diagnostics, _) = run(&TreeRunnable, factory, &group);

    assert_eq!(
        avails(&handler),
        vec![("pools".to_string(), Avail::Down), ("healthy".to_string(), Avail::Up)]
    );
    assert!(handler.failures().is_empty());
    // the skipped target is counted
    assert_eq!(diagnostics.snapshot().protocols[&Protocol::Tree].errors, 1);
}

#[test]
fn multi_target_missing_subref_field_counts_as_down() {
    let tasks = vec![avail("pools", Some("state"), Some("status"))];
    let group = group_of(&tasks);
    let factory = ScriptedFactory::outcomes(
        Protocol::Tree,
        vec![StepOutcome::Targets(vec![
            target("/pool=a", Ok(json!({"status": "UP"}))),
            target("/pool=b", Ok(json!({"other": 1}))),
        ])],
    );

    let (handler, diagnostics, _) = run(&TreeRunnable, factory, &group);

    assert_eq!(avails(&handler), vec![("pools".to_string(), Avail::Down)]);
    assert_eq!(diagnostics.snapshot().protocols[&Protocol::Tree].errors, 0);
}

#[test]
fn multi_target_avail_with_nothing_resolvable_is_unknown() {
    let tasks = vec![avail("pools", Some("state"), None)];
    let group = group_of(&tasks);
    let factory = ScriptedFactory::outcomes(
        Protocol::Tree,
        vec![StepOutcome::Targets(vec![target("/pool=a", Err("gone".into()))])],
    );

    let (handler, _, _) = run(&TreeRunnable, factory, &group);
    assert_eq!(avails(&handler), vec![("pools".to_string(), Avail::Unknown)]);
}

#[test]
fn metrics_decode_subref_locally_and_sum_targets() {
    let tasks = vec![
        metric("heap", "/core-service=platform-mbean/type=memory", "heap-memory-usage", Some("used")),
        metric("sessions", "/deployment=*/subsystem=web", "active-sessions", None),
        metric("enabled", "/subsystem=web", "enabled", None),
    ];
    let group = group_of(&tasks);
    let factory = ScriptedFactory::outcomes(
        Protocol::Tree,
        vec![
            StepOutcome::Value(json!({"used": 1024, "max": 4096})),
            StepOutcome::Targets(vec![
                target("/deployment=a.war/subsystem=web", Ok(json!(3))),
                target("/deployment=b.war/subsystem=web", Ok(json!("4"))),
                target("/deployment=c.war/subsystem=web", Err("undeployed".into())),
            ]),
            StepOutcome::Value(json!(true)),
        ],
    );

    let (handler, _, factory) = run(&TreeRunnable, factory, &group);

    let values: Vec<f64> = handler.points().iter().map(|p| p.as_metric().unwrap()).collect();
    assert_eq!(values, vec![1024.0, 7.0, 1.0]);

    let requests = factory.requests.lock().unwrap();
    assert_eq!(requests.len(), 1, "one combined request per group");
    assert_eq!(requests[0].steps.len(), 3);
    assert!(matches!(&requests[0].steps[0], ReadStep::Attribute { path: None, .. }));
}

#[test]
fn transport_failure_marks_every_task_unknown() {
    let tasks = vec![avail("one", Some("state"), None), avail("two", Some("state"), None)];
    let group = group_of(&tasks);
    let factory = ScriptedFactory::new(Protocol::Tree, Err(SessionError::Transport("connection reset".into())));

    let (handler, _, factory) = run(&TreeRunnable, factory, &group);

    assert_eq!(
        avails(&handler),
        vec![("one".to_string(), Avail::Unknown), ("two".to_string(), Avail::Unknown)]
    );
    assert_eq!(handler.failures().len(), 1);
    assert!(matches!(handler.failures()[0], PollError::Session(_)));
    assert_eq!(factory.closed.load(Ordering::SeqCst), 1);
}

#[test]
fn short_response_aborts_from_first_missing_result() {
    let tasks = vec![
        avail("one", Some("state"), None),
        avail("two", Some("state"), None),
        avail("three", Some("state"), None),
    ];
    let group = group_of(&tasks);
    let factory = ScriptedFactory::outcomes(Protocol::Tree, vec![StepOutcome::Value(json!("UP"))]);

    let (handler, _, _) = run(&TreeRunnable, factory, &group);

    assert_eq!(
        avails(&handler),
        vec![
            ("one".to_string(), Avail::Up),
            ("two".to_string(), Avail::Unknown),
            ("three".to_string(), Avail::Unknown),
        ]
    );
    assert!(matches!(
        handler.failures()[0],
        PollError::MissingResult { index: 1, .. }
    ));
}

#[test]
fn missing_factory_marks_group_unknown() {
    let tasks = vec![avail("one", Some("state"), None)];
    let group = group_of(&tasks);
    let sessions = SessionFactories::new();
    let handler = CollectingHandler::new();
    let diagnostics = Diagnostics::new();

    TreeRunnable.run(&group, &sessions, &handler, &diagnostics);

    assert_eq!(avails(&handler), vec![("one".to_string(), Avail::Unknown)]);
    assert!(matches!(
        handler.failures()[0],
        PollError::Session(SessionError::NoFactory(_))
    ));
}

#[test]
fn slow_round_trip_is_marked_delayed() {
    let task = make_task(
        Protocol::Tree,
        Interval::millis(1),
        TaskDef {
            id: "fast",
            task_type: TaskType::Metric,
            location: "/subsystem=web",
            attribute: Some("requests"),
            subref: None,
        },
    );
    let group = group_of(&[task]);
    let mut factory = ScriptedFactory::outcomes(Protocol::Tree, vec![StepOutcome::Value(json!(5))]);
    factory.delay = Duration::from_millis(20);

    let (handler, diagnostics, _) = run(&TreeRunnable, factory, &group);

    assert_eq!(handler.points()[0].sample, Sample::Metric(5.0));
    let snapshot = diagnostics.snapshot();
    let stats = &snapshot.protocols[&Protocol::Tree];
    assert_eq!(stats.delayed, 1);
    assert_eq!(stats.requests, 1);
}

#[test]
fn object_runnable_sends_subref_as_path_and_reads_null_as_nan() {
    let heap = make_task(
        Protocol::Object,
        Interval::seconds(10),
        TaskDef {
            id: "heap",
            task_type: TaskType::Metric,
            location: "java.lang:type=Memory",
            attribute: Some("HeapMemoryUsage"),
            subref: Some("used"),
        },
    );
    let unset = make_task(
        Protocol::Object,
        Interval::seconds(10),
        TaskDef {
            id: "unset",
            task_type: TaskType::Metric,
            location: "java.lang:type=Memory",
            attribute: Some("Unset"),
            subref: None,
        },
    );
    let group = group_of(&[heap, unset]);
    let factory = ScriptedFactory::outcomes(
        Protocol::Object,
        vec![StepOutcome::Value(json!(2048)), StepOutcome::Value(Value::Null)],
    );

    let (handler, _, factory) = run(&ObjectRunnable, factory, &group);

    let points = handler.points();
    assert_eq!(points[0].as_metric(), Some(2048.0));
    assert!(points[1].as_metric().unwrap().is_nan());

    let requests = factory.requests.lock().unwrap();
    assert!(matches!(
        &requests[0].steps[0],
        ReadStep::Attribute { path: Some(p), .. } if p == "used"
    ));
}

#[test]
fn for_protocol_returns_matching_runnable() {
    for protocol in Protocol::ALL {
        assert_eq!(for_protocol(protocol).protocol(), protocol);
    }
}
