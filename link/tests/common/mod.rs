//! Scripted query engine shared by the integration tests.
//!
//! Every execution runs its script on a dedicated `std::thread`. Before each
//! push the thread waits in a pause guard (`parking_lot::Condvar`) until the
//! stream resumes it, the way a real engine blocks its visitor thread. A
//! configurable number of pushes may still slip through after a pause
//! signal, to simulate an engine that observes the pause late.

#![allow(dead_code)]

use jql_link::{
    EngineError, EngineItem, ExecutionHandle, JqlLinkClient, QueryEngine, QuerySpec, Result,
    ResultSink, StreamConfig, StreamHandlers,
};
use parking_lot::{Condvar, Mutex};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub const EXPLAIN_LOG: &str = "[INDEX] NO [COLLECTOR] PLAIN";

// ── script ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Step {
    Push(EngineItem),
    Fail(EngineError),
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
    in_flight: usize,
    step_delay: Option<Duration>,
    refuse: Option<EngineError>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents `1..=n` followed by the completion sentinel.
    pub fn docs(n: u64) -> Self {
        (1..=n).fold(Self::new(), |script, id| script.doc(id)).end()
    }

    pub fn doc(mut self, id: u64) -> Self {
        let payload = json!({"id": id, "name": format!("doc-{}", id)}).to_string();
        self.steps.push(Step::Push(EngineItem::document(id, payload)));
        self
    }

    pub fn scalar(mut self, value: i64) -> Self {
        self.steps.push(Step::Push(EngineItem::scalar(value)));
        self
    }

    pub fn end(mut self) -> Self {
        self.steps.push(Step::Push(EngineItem::end()));
        self
    }

    pub fn fail(mut self, error: EngineError) -> Self {
        self.steps.push(Step::Fail(error));
        self
    }

    /// Pushes still made after a pause signal before the thread blocks.
    pub fn in_flight(mut self, pushes: usize) -> Self {
        self.in_flight = pushes;
        self
    }

    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = Some(delay);
        self
    }

    /// `start` fails with `error` instead of running the script.
    pub fn refuse(mut self, error: EngineError) -> Self {
        self.refuse = Some(error);
        self
    }

    /// Steps adjusted for the execution's limit and explain flag.
    fn steps_for(&self, spec: &QuerySpec) -> Vec<Step> {
        let mut steps = Vec::with_capacity(self.steps.len());
        let mut docs = 0_u64;
        for step in &self.steps {
            if let Some(limit) = spec.limit {
                if docs >= limit {
                    steps.push(Step::Push(EngineItem::end()));
                    break;
                }
            }
            if matches!(step, Step::Push(EngineItem::Document { .. })) {
                docs += 1;
            }
            steps.push(step.clone());
        }
        if spec.explain {
            if let Some(Step::Push(item)) = steps.first_mut() {
                *item = item.clone().with_explain(EXPLAIN_LOG);
            }
        }
        steps
    }
}

// ── engine ────────────────────────────────────────────────────────────────────

/// Counters observed by the tests.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub started: AtomicUsize,
    pub pushed: AtomicUsize,
    pub accepted: AtomicUsize,
    pub pauses: AtomicUsize,
    pub resumes: AtomicUsize,
    pub aborts: AtomicUsize,
    pub destroys: AtomicUsize,
    pub finished: AtomicUsize,
}

impl EngineStats {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct Control {
    paused: bool,
    aborted: bool,
    destroyed: bool,
    lag: usize,
    parked: bool,
}

#[derive(Debug, Default)]
struct Execution {
    control: Mutex<Control>,
    wakeup: Condvar,
    in_flight: usize,
}

impl Execution {
    fn new(in_flight: usize) -> Self {
        Self {
            control: Mutex::new(Control {
                paused: true,
                ..Control::default()
            }),
            wakeup: Condvar::new(),
            in_flight,
        }
    }

    /// Block while paused. Returns `false` once the execution must stop.
    fn wait_for_permission(&self) -> bool {
        let mut control = self.control.lock();
        loop {
            if control.aborted || control.destroyed {
                return false;
            }
            if !control.paused {
                return true;
            }
            if control.lag > 0 {
                control.lag -= 1;
                return true;
            }
            control.parked = true;
            self.wakeup.wait(&mut control);
            control.parked = false;
        }
    }

    fn update(&self, f: impl FnOnce(&mut Control)) {
        let mut control = self.control.lock();
        f(&mut control);
        self.wakeup.notify_all();
    }
}

pub struct ScriptedEngine {
    script: Script,
    next_handle: AtomicU64,
    executions: Mutex<HashMap<u64, Arc<Execution>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    specs: Mutex<Vec<QuerySpec>>,
    stats: Arc<EngineStats>,
}

impl ScriptedEngine {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            next_handle: AtomicU64::new(1),
            executions: Mutex::new(HashMap::new()),
            threads: Mutex::new(Vec::new()),
            specs: Mutex::new(Vec::new()),
            stats: Arc::new(EngineStats::default()),
        })
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn specs(&self) -> Vec<QuerySpec> {
        self.specs.lock().clone()
    }

    /// `true` if some execution thread is blocked in its pause guard.
    pub fn any_parked(&self) -> bool {
        self.executions.lock().values().any(|exec| exec.control.lock().parked)
    }

    /// Executions started but not yet destroyed.
    pub fn live_executions(&self) -> usize {
        self.executions.lock().len()
    }

    /// Wait for every execution thread to exit.
    pub fn join_all(&self) {
        let threads: Vec<_> = self.threads.lock().drain(..).collect();
        for thread in threads {
            thread.join().expect("engine thread panicked");
        }
    }

    fn execution(&self, handle: ExecutionHandle) -> Option<Arc<Execution>> {
        self.executions.lock().get(&handle.raw()).cloned()
    }
}

impl QueryEngine for ScriptedEngine {
    fn start(&self, spec: QuerySpec, sink: ResultSink) -> Result<ExecutionHandle> {
        if let Some(error) = &self.script.refuse {
            return Err(error.clone().into());
        }
        let handle = ExecutionHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst));
        let steps = self.script.steps_for(&spec);
        self.specs.lock().push(spec);

        let exec = Arc::new(Execution::new(self.script.in_flight));
        self.executions.lock().insert(handle.raw(), exec.clone());
        self.stats.started.fetch_add(1, Ordering::SeqCst);

        let stats = self.stats.clone();
        let delay = self.script.step_delay;
        let thread = std::thread::spawn(move || {
            for step in steps {
                if !exec.wait_for_permission() {
                    break;
                }
                if let Some(delay) = delay {
                    std::thread::sleep(delay);
                }
                stats.pushed.fetch_add(1, Ordering::SeqCst);
                let accepted = match step {
                    Step::Push(item) => sink.push(item),
                    Step::Fail(error) => {
                        sink.fail(error);
                        false
                    },
                };
                if !accepted {
                    break;
                }
                stats.accepted.fetch_add(1, Ordering::SeqCst);
            }
            stats.finished.fetch_add(1, Ordering::SeqCst);
        });
        self.threads.lock().push(thread);
        Ok(handle)
    }

    fn pause(&self, handle: ExecutionHandle) {
        self.stats.pauses.fetch_add(1, Ordering::SeqCst);
        if let Some(exec) = self.execution(handle) {
            let lag = exec.in_flight;
            exec.update(|c| {
                c.paused = true;
                c.lag = lag;
            });
        }
    }

    fn resume(&self, handle: ExecutionHandle) {
        self.stats.resumes.fetch_add(1, Ordering::SeqCst);
        if let Some(exec) = self.execution(handle) {
            exec.update(|c| c.paused = false);
        }
    }

    fn abort(&self, handle: ExecutionHandle) {
        self.stats.aborts.fetch_add(1, Ordering::SeqCst);
        if let Some(exec) = self.execution(handle) {
            exec.update(|c| c.aborted = true);
        }
    }

    fn destroy(&self, handle: ExecutionHandle) {
        self.stats.destroys.fetch_add(1, Ordering::SeqCst);
        if let Some(exec) = self.executions.lock().remove(&handle.raw()) {
            exec.update(|c| c.destroyed = true);
        }
    }
}

// ── helpers ───────────────────────────────────────────────────────────────────

pub fn client(engine: &Arc<ScriptedEngine>, config: StreamConfig) -> JqlLinkClient {
    client_with_handlers(engine, config, StreamHandlers::default())
}

pub fn client_with_handlers(
    engine: &Arc<ScriptedEngine>,
    config: StreamConfig,
    handlers: StreamHandlers,
) -> JqlLinkClient {
    JqlLinkClient::builder()
        .engine_arc(engine.clone())
        .config(config)
        .event_handlers(handlers)
        .build()
        .expect("valid client configuration")
}

pub fn capacity(n: usize) -> StreamConfig {
    StreamConfig::builder()
        .delivery_capacity(n)
        .build()
        .expect("valid capacity")
}

/// Poll `condition` until it holds or `deadline` elapses.
pub async fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    loop {
        if condition() {
            return true;
        }
        if start.elapsed() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
