//! Callback Delegate.
//!
//! Moves notifications off the engine's own threads and onto the execution
//! context the host asked for. Each notification reads the registered sink
//! once, then either posts a job to the executor or runs it inline. Every
//! notification is also published on the [`EventBus`].

use crate::traits::PlayerCallback;
use bridge_traits::{CallbackExecutor, Job};
use core_async::runtime::Handle;
use core_async::sync::mpsc;
use core_runtime::events::{EventBus, PlayerEvent, PlayerStatus};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Default, Clone)]
struct Sink {
    callback: Option<Arc<dyn PlayerCallback>>,
    executor: Option<Arc<dyn CallbackExecutor>>,
}

pub(crate) struct CallbackDelegate {
    sink: RwLock<Sink>,
    default_executor: Option<Arc<dyn CallbackExecutor>>,
    bus: EventBus,
}

impl CallbackDelegate {
    pub(crate) fn new(bus: EventBus, default_executor: Option<Arc<dyn CallbackExecutor>>) -> Self {
        Self {
            sink: RwLock::new(Sink::default()),
            default_executor,
            bus,
        }
    }

    /// Replace the sink. Without an explicit executor the configured default
    /// is used, and without either callbacks run inline.
    pub(crate) fn set_callback(
        &self,
        callback: Option<Arc<dyn PlayerCallback>>,
        executor: Option<Arc<dyn CallbackExecutor>>,
    ) {
        let executor = executor.or_else(|| self.default_executor.clone());
        debug!(
            has_callback = callback.is_some(),
            has_executor = executor.is_some(),
            "Callback replaced"
        );
        *self.sink.write() = Sink { callback, executor };
    }

    pub(crate) fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub(crate) fn on_loading(&self) {
        self.status(PlayerStatus::Loading, |cb| cb.on_loading());
    }

    pub(crate) fn on_ready(&self) {
        self.status(PlayerStatus::Ready, |cb| cb.on_ready());
    }

    pub(crate) fn on_playing(&self) {
        self.status(PlayerStatus::Playing, |cb| cb.on_playing());
    }

    pub(crate) fn on_paused(&self) {
        self.status(PlayerStatus::Paused, |cb| cb.on_paused());
    }

    pub(crate) fn on_stopped(&self) {
        self.status(PlayerStatus::Stopped, |cb| cb.on_stopped());
    }

    pub(crate) fn on_went_to_next(&self) {
        self.dispatch(PlayerEvent::WentToNext, |cb| cb.on_went_to_next());
    }

    pub(crate) fn on_error_open_current_failed(&self, message: String) {
        let status = PlayerStatus::Error {
            message: message.clone(),
        };
        self.status(status, move |cb| cb.on_error_open_current_failed(&message));
    }

    pub(crate) fn on_error_open_next_failed(&self, message: String) {
        let event = PlayerEvent::OpenNextFailed {
            message: message.clone(),
        };
        self.dispatch(event, move |cb| cb.on_error_open_next_failed(&message));
    }

    /// Bus-only event, no callback counterpart.
    pub(crate) fn publish(&self, event: PlayerEvent) {
        trace!(event = event.description(), "Publishing");
        let _ = self.bus.emit(event);
    }

    fn status<F>(&self, status: PlayerStatus, notify: F)
    where
        F: FnOnce(&dyn PlayerCallback) + Send + 'static,
    {
        self.dispatch(PlayerEvent::StatusChanged(status), notify);
    }

    fn dispatch<F>(&self, event: PlayerEvent, notify: F)
    where
        F: FnOnce(&dyn PlayerCallback) + Send + 'static,
    {
        self.publish(event);

        let Sink { callback, executor } = self.sink.read().clone();
        let Some(callback) = callback else {
            return;
        };

        let job: Job = Box::new(move || notify(callback.as_ref()));
        match executor {
            Some(executor) => executor.execute(job),
            None => job(),
        }
    }
}

impl fmt::Debug for CallbackDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sink = self.sink.read();
        f.debug_struct("CallbackDelegate")
            .field("has_callback", &sink.callback.is_some())
            .field("has_executor", &sink.executor.is_some())
            .field("bus", &self.bus)
            .finish()
    }
}

/// Executor that runs jobs in submission order on a Tokio runtime.
///
/// Jobs go through a channel to a single consumer task, so ordering holds
/// even on a multi-threaded runtime. Dropping the last clone stops the
/// consumer once queued jobs have run.
#[derive(Clone)]
pub struct TokioExecutor {
    jobs: mpsc::UnboundedSender<Job>,
}

impl TokioExecutor {
    /// Start the consumer task on `handle`.
    pub fn new(handle: &Handle) -> Self {
        let (jobs, mut rx) = mpsc::unbounded_channel::<Job>();
        handle.spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
        });
        Self { jobs }
    }

    /// Start the consumer on the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn current() -> Self {
        Self::new(&Handle::current())
    }
}

impl CallbackExecutor for TokioExecutor {
    fn execute(&self, job: Job) {
        if self.jobs.send(job).is_err() {
            debug!("Callback runtime shut down; dropping notification");
        }
    }
}

impl fmt::Debug for TokioExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioExecutor")
            .field("closed", &self.jobs.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockPlayerCallback;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingExecutor(AtomicUsize);

    impl CallbackExecutor for CountingExecutor {
        fn execute(&self, job: Job) {
            self.0.fetch_add(1, Ordering::SeqCst);
            job();
        }
    }

    #[test]
    fn inline_without_executor() {
        let mut callback = MockPlayerCallback::new();
        let mut seq = Sequence::new();
        callback
            .expect_on_loading()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        callback
            .expect_on_error_open_current_failed()
            .with(eq("unsupported codec"))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let delegate = CallbackDelegate::new(EventBus::new(8), None);
        delegate.set_callback(Some(Arc::new(callback)), None);

        delegate.on_loading();
        delegate.on_error_open_current_failed("unsupported codec".to_string());
    }

    #[test]
    fn posts_to_executor() {
        let mut callback = MockPlayerCallback::new();
        callback.expect_on_playing().times(2).return_const(());

        let executor = Arc::new(CountingExecutor(AtomicUsize::new(0)));
        let delegate = CallbackDelegate::new(EventBus::new(8), None);
        delegate.set_callback(Some(Arc::new(callback)), Some(executor.clone()));

        delegate.on_playing();
        delegate.on_playing();
        assert_eq!(executor.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn default_executor_applies_when_none_given() {
        let mut callback = MockPlayerCallback::new();
        callback.expect_on_stopped().times(1).return_const(());

        let executor = Arc::new(CountingExecutor(AtomicUsize::new(0)));
        let delegate = CallbackDelegate::new(EventBus::new(8), Some(executor.clone()));
        delegate.set_callback(Some(Arc::new(callback)), None);

        delegate.on_stopped();
        assert_eq!(executor.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn notifications_without_callback_still_reach_bus() {
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let delegate = CallbackDelegate::new(bus.clone(), None);

        delegate.on_ready();
        delegate.on_error_open_next_failed("404".to_string());

        assert_eq!(
            events.try_recv().unwrap(),
            PlayerEvent::StatusChanged(PlayerStatus::Ready)
        );
        assert_eq!(
            events.try_recv().unwrap(),
            PlayerEvent::OpenNextFailed {
                message: "404".to_string()
            }
        );
        assert_eq!(bus.last_status(), PlayerStatus::Ready);
    }

    #[test]
    fn replaced_callback_receives_later_notifications() {
        let mut first = MockPlayerCallback::new();
        first.expect_on_paused().times(1).return_const(());
        let mut second = MockPlayerCallback::new();
        second.expect_on_paused().times(1).return_const(());

        let delegate = CallbackDelegate::new(EventBus::new(8), None);
        delegate.set_callback(Some(Arc::new(first)), None);
        delegate.on_paused();
        delegate.set_callback(Some(Arc::new(second)), None);
        delegate.on_paused();
        delegate.set_callback(None, None);
        delegate.on_paused();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tokio_executor_preserves_order() {
        let executor = TokioExecutor::current();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        for i in 0..20 {
            let seen = Arc::clone(&seen);
            executor.execute(Box::new(move || seen.lock().push(i)));
        }
        executor.execute(Box::new(move || {
            let _ = done_tx.send(());
        }));

        done_rx.await.unwrap();
        assert_eq!(*seen.lock(), (0..20).collect::<Vec<_>>());
    }
}
