//! Стабилизатор детекций.
//!
//! Поток сырых чтений → кандидаты по основному GTIN в скользящем окне →
//! решение о приёме лидера против ближайшего конкурента. Одиночное случайное
//! чтение соседнего кода не перебивает стабильно читаемый.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::checksum;
use crate::config::StabilizerConfig;
use crate::core::{RawDetection, Symbology};
use crate::gtin;

/// Допуск при сравнении отрывов по уверенности (0.60 - 0.55 в f32 чуть меньше 0.05).
const MARGIN_EPSILON: f32 = 1e-4;

/// Срез кандидата, по которому принимается решение.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CandidateStats {
    pub hits: usize,
    pub mean_confidence: f32,
}

impl CandidateStats {
    pub fn new(hits: usize, mean_confidence: f32) -> Self {
        Self { hits, mean_confidence }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AcceptancePolicy {
    pub min_hits: usize,
    pub fast_hit_margin: usize,
    pub fast_confidence_margin: f32,
    pub fast_min_stable: Duration,
    pub stable_hit_margin: usize,
    pub stable_confidence_margin: f32,
    pub min_stable: Duration,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self::from(&StabilizerConfig::default())
    }
}

impl From<&StabilizerConfig> for AcceptancePolicy {
    fn from(cfg: &StabilizerConfig) -> Self {
        Self {
            min_hits: cfg.min_hits,
            fast_hit_margin: cfg.fast_hit_margin,
            fast_confidence_margin: cfg.fast_confidence_margin,
            fast_min_stable: Duration::from_millis(cfg.fast_min_stable_ms),
            stable_hit_margin: cfg.stable_hit_margin,
            stable_confidence_margin: cfg.stable_confidence_margin,
            min_stable: Duration::from_millis(cfg.min_stable_ms),
        }
    }
}

/// Отрыв лидера: `None`, если лидер уступает по попаданиям.
fn lead(main: CandidateStats, runner: Option<CandidateStats>) -> Option<(usize, f32)> {
    let r = runner.unwrap_or(CandidateStats::new(0, 0.0));
    let hits = main.hits.checked_sub(r.hits)?;
    Some((hits, main.mean_confidence - r.mean_confidence))
}

#[inline]
fn at_least(v: f32, margin: f32) -> bool {
    v + MARGIN_EPSILON >= margin
}

impl AcceptancePolicy {
    fn fast_margin(&self, hits: usize, conf: f32) -> bool {
        hits >= self.fast_hit_margin || at_least(conf, self.fast_confidence_margin)
    }

    fn stable_margin(&self, hits: usize, conf: f32) -> bool {
        hits >= self.stable_hit_margin && at_least(conf, self.stable_confidence_margin)
    }

    /// Какие отрывы держит лидер: (быстрый, узкий).
    pub fn margins(&self, main: CandidateStats, runner: Option<CandidateStats>) -> (bool, bool) {
        lead(main, runner).map_or((false, false), |(h, c)| (self.fast_margin(h, c), self.stable_margin(h, c)))
    }

    /// Чистая функция решения. `elapsed` - сколько лидер удерживает отрыв;
    /// одна и та же длительность для обоих путей.
    pub fn should_accept(
        &self,
        main: CandidateStats,
        runner: Option<CandidateStats>,
        elapsed: Duration,
    ) -> bool {
        self.accepts_held(main, runner, HeldFor { fast: elapsed, stable: elapsed })
    }

    /// То же, но у каждого пути свои часы.
    pub fn accepts_held(&self, main: CandidateStats, runner: Option<CandidateStats>, held: HeldFor) -> bool {
        if main.hits < self.min_hits {
            return false;
        }
        let Some((hits, conf)) = lead(main, runner) else {
            return false;
        };
        if self.fast_margin(hits, conf) && held.fast >= self.fast_min_stable {
            return true;
        }
        self.stable_margin(hits, conf) && held.stable >= self.min_stable
    }
}

/// Сколько непрерывно держится каждый из отрывов.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeldFor {
    pub fast: Duration,
    pub stable: Duration,
}

#[derive(Clone, Debug)]
struct Candidate {
    symbology: Symbology,
    aliases: BTreeSet<String>,
    /// (момент, уверенность), по возрастанию времени.
    hits: VecDeque<(Instant, f32)>,
}

impl Candidate {
    fn stats(&self) -> CandidateStats {
        let n = self.hits.len();
        let sum: f32 = self.hits.iter().map(|&(_, c)| c).sum();
        CandidateStats::new(n, if n == 0 { 0.0 } else { sum / n as f32 })
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&(t, _)) = self.hits.front() {
            if now.saturating_duration_since(t) > window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Принятый код. Выдаётся ровно один раз, после чего состояние сбрасывается.
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptedCode {
    pub code: String,
    pub aliases: BTreeSet<String>,
    pub symbology: Symbology,
    pub hits: usize,
    pub mean_confidence: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Accepted(AcceptedCode),
    Pending,
    /// Не прошла контрольная сумма: в статистику не попадает.
    Rejected,
}

#[derive(Clone, Debug)]
struct Leadership {
    code: String,
    fast_since: Option<Instant>,
    stable_since: Option<Instant>,
}

impl Leadership {
    fn track(&mut self, (fast, stable): (bool, bool), now: Instant) {
        self.fast_since = if fast { self.fast_since.or(Some(now)) } else { None };
        self.stable_since = if stable { self.stable_since.or(Some(now)) } else { None };
    }

    fn held(&self, now: Instant) -> HeldFor {
        let since = |t: Option<Instant>| t.map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
        HeldFor { fast: since(self.fast_since), stable: since(self.stable_since) }
    }
}

pub struct Stabilizer {
    policy: AcceptancePolicy,
    window: Duration,
    default_confidence: f32,
    candidates: HashMap<String, Candidate>,
    leadership: Option<Leadership>,
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(&StabilizerConfig::default())
    }
}

impl Stabilizer {
    pub fn new(cfg: &StabilizerConfig) -> Self {
        Self {
            policy: AcceptancePolicy::from(cfg),
            window: cfg.window(),
            default_confidence: cfg.default_confidence.clamp(0.0, 1.0),
            candidates: HashMap::new(),
            leadership: None,
        }
    }

    pub fn policy(&self) -> &AcceptancePolicy {
        &self.policy
    }

    /// Сколько кандидатов сейчас в окне.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn reset(&mut self) {
        self.candidates.clear();
        self.leadership = None;
    }

    /// Детекции должны приходить в порядке поступления.
    pub fn push(&mut self, det: RawDetection) -> Verdict {
        let now = det.timestamp;
        let text = det.text.trim();
        if text.is_empty() || !checksum::validate(det.symbology, text) {
            tracing::debug!(code = %det.text, symbology = %det.symbology, "checksum_rejected");
            return Verdict::Rejected;
        }

        let norm = gtin::normalize(det.symbology, text);
        let confidence = det.confidence.unwrap_or(self.default_confidence);
        let cand = self.candidates.entry(norm.primary).or_insert_with(|| Candidate {
            symbology: det.symbology,
            aliases: BTreeSet::new(),
            hits: VecDeque::new(),
        });
        cand.aliases.extend(norm.aliases);
        cand.hits.push_back((now, confidence));

        let window = self.window;
        self.candidates.retain(|_, c| {
            c.prune(now, window);
            !c.hits.is_empty()
        });

        let mut ranked: Vec<(&String, CandidateStats)> =
            self.candidates.iter().map(|(code, c)| (code, c.stats())).collect();
        ranked.sort_by(|(ca, a), (cb, b)| {
            b.hits
                .cmp(&a.hits)
                .then(b.mean_confidence.total_cmp(&a.mean_confidence))
                .then(ca.cmp(cb))
        });
        let Some(&(leader, main)) = ranked.first() else {
            return Verdict::Pending;
        };
        let runner = ranked.get(1).map(|&(_, s)| s);

        // отсчёт стабильности: тот же лидер, отрыв не терялся; у каждого пути свой
        if !matches!(&self.leadership, Some(l) if l.code == *leader) {
            self.leadership = Some(Leadership { code: leader.clone(), fast_since: None, stable_since: None });
        }
        let margins = self.policy.margins(main, runner);
        let held = self.leadership.as_mut().map_or(HeldFor::default(), |l| {
            l.track(margins, now);
            l.held(now)
        });

        if !self.policy.accepts_held(main, runner, held) {
            return Verdict::Pending;
        }

        let code = leader.clone();
        let accepted = self.candidates.remove(&code).map(|c| AcceptedCode {
            symbology: c.symbology,
            aliases: c.aliases,
            hits: main.hits,
            mean_confidence: main.mean_confidence,
            code,
        });
        self.reset();
        match accepted {
            Some(a) => {
                tracing::debug!(code = %a.code, hits = a.hits, stable_ms = held.stable.as_millis() as u64, "code_accepted");
                Verdict::Accepted(a)
            }
            None => Verdict::Pending,
        }
    }
}
