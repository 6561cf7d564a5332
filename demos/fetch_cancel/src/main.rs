use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use holdfast_core::prelude::*;
use holdfast_devtools::Inspector;
use parking_lot::Mutex;

/// Simulated download running on a worker thread. Polls `cancel` between chunks.
fn spawn_download(url: String, cancel: Arc<AtomicBool>) -> thread::JoinHandle<Option<usize>> {
    thread::spawn(move || {
        let mut received = 0;
        for _ in 0..20 {
            if cancel.load(Ordering::SeqCst) {
                log::info!("download of {url} cancelled after {received} bytes");
                return None;
            }
            thread::sleep(Duration::from_millis(10));
            received += 512;
        }
        log::info!("download of {url} finished ({received} bytes)");
        Some(received)
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let url = Provider::new("url", |_| Ok(String::from("https://example.org/report.csv")));

    let download = Provider::auto_dispose("download", {
        let url = url.clone();
        move |ctx| {
            let cancel = Arc::new(AtomicBool::new(false));
            ctx.on_dispose({
                let cancel = cancel.clone();
                move || cancel.store(true, Ordering::SeqCst)
            });
            let worker = spawn_download(ctx.watch(&url)?.to_string(), cancel);
            Ok(Download(Mutex::new(Some(worker))))
        }
    });

    // Kept after its last reader leaves, until told otherwise.
    let cached = Provider::auto_dispose("cached", {
        let url = url.clone();
        move |ctx| {
            let body = format!("contents of {}", ctx.watch(&url)?);
            ctx.set_maintain_state(true);
            Ok(body)
        }
    });

    let container = Container::with_config(ContainerConfig::default().named("demo"));
    let mut inspector = Inspector::new();

    // The screen showing the download goes away before it completes.
    let sub = container.listen(&download)?;
    thread::sleep(Duration::from_millis(35));
    let in_flight = sub.read();
    drop(sub);
    log::info!("download result: {:?}", in_flight.join());

    let sub = container.listen(&cached)?;
    log::info!("cached: {}", sub.value());
    drop(sub);
    inspector.capture(&container);
    println!("{}", inspector.report());

    container.set_maintain_state(&cached, false);
    inspector.capture(&container);
    println!("{}", inspector.report());

    container.dispose();
    Ok(())
}

/// Worker handle, kept until someone collects the result.
struct Download(Mutex<Option<thread::JoinHandle<Option<usize>>>>);

impl Download {
    fn join(&self) -> Option<usize> {
        self.0.lock().take().and_then(|h| h.join().ok().flatten())
    }
}
