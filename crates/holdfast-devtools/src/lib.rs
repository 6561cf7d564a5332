use std::fmt::Write as _;

use web_time::Instant;

use holdfast_core::{Container, ContainerSnapshot, InstanceSnapshot, LifecycleState};

/// Captures and renders snapshots of a container.
pub struct Inspector {
    pub show_ages: bool,
    capture_count: u64,
    last_capture: Option<Instant>,
    last: Option<ContainerSnapshot>,
    pub metrics: Option<Metrics>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            show_ages: false,
            capture_count: 0,
            last_capture: None,
            last: None,
            metrics: None,
        }
    }

    pub fn capture(&mut self, container: &Container) -> &ContainerSnapshot {
        self.capture_count += 1;
        let now = Instant::now();
        let since_last_ms = self
            .last_capture
            .replace(now)
            .map(|prev| (now - prev).as_secs_f32() * 1000.0);

        let snapshot = container.snapshot();
        let metrics = Metrics::of(&snapshot, since_last_ms);
        log::debug!(
            "inspector: captured `{}` ({} live, {} pending)",
            snapshot.container,
            metrics.live,
            metrics.pending
        );
        self.metrics = Some(metrics);
        self.last.insert(snapshot)
    }

    pub fn capture_count(&self) -> u64 {
        self.capture_count
    }

    pub fn last(&self) -> Option<&ContainerSnapshot> {
        self.last.as_ref()
    }

    /// Header line, then one line per instance. Empty before the first capture.
    pub fn report(&self) -> String {
        let Some(snapshot) = &self.last else {
            return String::new();
        };
        let mut out = String::new();
        let mut header = vec![
            format!("container: {}", snapshot.container),
            format!("captures: {}", self.capture_count),
        ];
        if let Some(m) = &self.metrics {
            header.push(format!("live: {}", m.live));
            header.push(format!("pending: {}", m.pending));
        }
        if snapshot.disposed {
            header.push("disposed".to_string());
        }
        out.push_str(&header.join("  |  "));

        for instance in &snapshot.instances {
            out.push('\n');
            self.write_instance(&mut out, instance);
        }
        out
    }

    fn write_instance(&self, out: &mut String, i: &InstanceSnapshot) {
        let deps = if i.dependencies.is_empty() {
            "-".to_string()
        } else {
            i.dependencies.join(",")
        };
        let _ = write!(
            out,
            "{} [{}] {} listeners={} maintain={} deps={}",
            i.provider, i.lifetime, i.state, i.listeners, i.maintain_state, deps
        );
        if self.show_ages {
            let _ = write!(out, " age={:.1}ms", i.age.as_secs_f64() * 1000.0);
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.last)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    pub live: usize,
    pub pending: usize,
    pub listeners: usize,
    pub since_last_ms: Option<f32>,
}

impl Metrics {
    fn of(snapshot: &ContainerSnapshot, since_last_ms: Option<f32>) -> Self {
        Self {
            live: snapshot
                .instances
                .iter()
                .filter(|i| i.state != LifecycleState::Disposed)
                .count(),
            pending: snapshot.pending().count(),
            listeners: snapshot.instances.iter().map(|i| i.listeners).sum(),
            since_last_ms,
        }
    }
}

pub mod tests;
