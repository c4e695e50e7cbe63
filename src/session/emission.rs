//! Выдача принятых кодов наружу с подавлением повторов.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::Symbology;
use crate::stabilizer::AcceptedCode;

/// То, что получает потребитель.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanEvent {
    pub code: String,
    pub aliases: Vec<String>,
    pub symbology: Symbology,
}

impl From<AcceptedCode> for ScanEvent {
    fn from(a: AcceptedCode) -> Self {
        Self {
            code: a.code,
            aliases: a.aliases.into_iter().collect(),
            symbology: a.symbology,
        }
    }
}

pub type CodeCallback = Box<dyn FnMut(&ScanEvent) + Send>;

/// Слот единственного потребителя. Клоны делят один слот.
///
/// На время вызова колбэк вынимается из слота, поэтому колбэк может сам
/// зарегистрировать нового потребителя.
#[derive(Clone, Default)]
pub struct CodeSink {
    slot: Arc<Mutex<Option<CodeCallback>>>,
}

impl CodeSink {
    /// Новый потребитель заменяет старого.
    pub fn set(&self, callback: CodeCallback) {
        *self.slot.lock() = Some(callback);
    }

    pub fn is_set(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// `false`, если потребителя нет.
    pub fn deliver(&self, event: &ScanEvent) -> bool {
        let Some(mut callback) = self.slot.lock().take() else {
            return false;
        };
        callback(event);
        let mut slot = self.slot.lock();
        // заменили изнутри колбэка: остаётся новый
        if slot.is_none() {
            *slot = Some(callback);
        }
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmissionRecord {
    pub last_code: String,
    pub last_emit: Instant,
}

pub struct Emitter {
    window: Duration,
    record: Option<EmissionRecord>,
    sink: CodeSink,
}

impl Emitter {
    pub fn new(window: Duration) -> Self {
        Self::with_sink(window, CodeSink::default())
    }

    pub fn with_sink(window: Duration, sink: CodeSink) -> Self {
        Self { window, record: None, sink }
    }

    pub fn set_sink(&mut self, sink: CodeCallback) {
        self.sink.set(sink);
    }

    pub fn record(&self) -> Option<&EmissionRecord> {
        self.record.as_ref()
    }

    /// `true`, если событие ушло потребителю. Подавленный повтор и выдача
    /// без потребителя запись не обновляют.
    pub fn offer(&mut self, event: &ScanEvent, now: Instant) -> bool {
        if event.code.is_empty() {
            return false;
        }
        if let Some(rec) = &self.record {
            if rec.last_code == event.code && now.saturating_duration_since(rec.last_emit) < self.window {
                tracing::debug!(code = %event.code, "duplicate_suppressed");
                return false;
            }
        }
        if !self.sink.deliver(event) {
            tracing::debug!(code = %event.code, "no_code_sink");
            return false;
        }
        self.record = Some(EmissionRecord { last_code: event.code.clone(), last_emit: now });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(code: &str) -> ScanEvent {
        ScanEvent { code: code.into(), aliases: Vec::new(), symbology: Symbology::Code128 }
    }

    fn counting(window_ms: u64) -> (Emitter, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut e = Emitter::new(Duration::from_millis(window_ms));
        let sink = Arc::clone(&seen);
        e.set_sink(Box::new(move |ev: &ScanEvent| sink.lock().push(ev.code.clone())));
        (e, seen)
    }

    #[test]
    fn repeats_inside_window_are_suppressed() {
        let base = Instant::now();
        let (mut e, seen) = counting(1600);
        assert!(e.offer(&event("123"), base));
        assert!(!e.offer(&event("123"), base + Duration::from_millis(1000)));
        assert_eq!(seen.lock().len(), 1);
        assert!(e.offer(&event("123"), base + Duration::from_millis(2000)));
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn suppressed_offer_does_not_extend_window() {
        let base = Instant::now();
        let (mut e, _) = counting(1600);
        e.offer(&event("123"), base);
        e.offer(&event("123"), base + Duration::from_millis(1500));
        assert!(e.offer(&event("123"), base + Duration::from_millis(1700)));
    }

    #[test]
    fn different_code_goes_through() {
        let base = Instant::now();
        let (mut e, seen) = counting(1600);
        e.offer(&event("123"), base);
        assert!(e.offer(&event("456"), base + Duration::from_millis(10)));
        assert!(e.offer(&event("123"), base + Duration::from_millis(20)));
        assert_eq!(*seen.lock(), vec!["123", "456", "123"]);
    }

    #[test]
    fn offer_without_sink_leaves_record_untouched() {
        let base = Instant::now();
        let mut e = Emitter::new(Duration::from_millis(1600));
        assert!(!e.offer(&event("1"), base));
        assert_eq!(e.record(), None);

        // потребитель появился позже: тот же код сразу доходит
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        e.set_sink(Box::new(move |_: &ScanEvent| {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(e.offer(&event("1"), base + Duration::from_millis(100)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(e.record().map(|r| r.last_code.as_str()), Some("1"));
    }

    #[test]
    fn new_sink_replaces_old() {
        let base = Instant::now();
        let mut e = Emitter::new(Duration::from_millis(1600));
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&first);
        e.set_sink(Box::new(move |_: &ScanEvent| {
            f.fetch_add(1, Ordering::SeqCst);
        }));
        let s = Arc::clone(&second);
        e.set_sink(Box::new(move |_: &ScanEvent| {
            s.fetch_add(1, Ordering::SeqCst);
        }));
        e.offer(&event("2"), base);
        assert_eq!((first.load(Ordering::SeqCst), second.load(Ordering::SeqCst)), (0, 1));
    }

    #[test]
    fn callback_can_register_its_replacement() {
        let base = Instant::now();
        let sink = CodeSink::default();
        let mut e = Emitter::with_sink(Duration::from_millis(1600), sink.clone());
        let replaced = Arc::new(AtomicUsize::new(0));

        let slot = sink.clone();
        let r = Arc::clone(&replaced);
        sink.set(Box::new(move |_: &ScanEvent| {
            let r = Arc::clone(&r);
            slot.set(Box::new(move |_: &ScanEvent| {
                r.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        assert!(e.offer(&event("1"), base));
        assert_eq!(replaced.load(Ordering::SeqCst), 0);
        assert!(e.offer(&event("2"), base));
        assert_eq!(replaced.load(Ordering::SeqCst), 1);
        assert!(sink.is_set());
    }
}
