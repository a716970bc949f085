//! Per-file state owned by the front end.
//!
//! Unloaded -> Loading -> {Accepted, Rejected} -> (next selection) Loading.
//! Each load is tagged with a token; a completion whose token is not the
//! latest one issued is dropped, so the last selection always wins.

use serde::Serialize;
use std::sync::Arc;

use crate::audio::analysis::{self, Analysis};
use crate::audio::container::{self, Verdict};
use crate::audio::decode::DecodedAudio;
use crate::audio::features::SampleBuffer;
use crate::dsp::fft::SpectralAnalyzer;
use crate::dsp::gain::{self, DEFAULT_TARGET_RMS_DB};
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadToken(u64);

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GainSettings {
    /// RMS target before `offset_db`; `None` keeps the original level.
    pub target_rms_db: Option<f64>,
    /// Volume preset, added to the target.
    pub offset_db: f64,
    /// Fixed change applied after normalization.
    pub attenuation_db: f64,
}

impl Default for GainSettings {
    fn default() -> Self {
        Self {
            target_rms_db: Some(DEFAULT_TARGET_RMS_DB),
            offset_db: 0.0,
            attenuation_db: 0.0,
        }
    }
}

impl GainSettings {
    /// Derive the adjusted buffer from the original. Never cumulative.
    pub fn apply(&self, original: &SampleBuffer) -> Result<SampleBuffer> {
        match self.target_rms_db {
            Some(target) => {
                let normalized = gain::normalize_to_rms(original, target + self.offset_db)?;
                if self.attenuation_db == 0.0 {
                    Ok(normalized)
                } else {
                    gain::attenuate(&normalized, self.attenuation_db)
                }
            }
            None => gain::attenuate(original, self.offset_db + self.attenuation_db),
        }
    }
}

#[derive(Debug)]
pub struct LoadedFile {
    pub name: String,
    pub audio: DecodedAudio,
    pub verdict: Verdict,
}

impl LoadedFile {
    /// The decoded buffer, before any gain.
    pub fn original(&self) -> Result<&SampleBuffer> {
        self.audio
            .samples
            .as_ref()
            .ok_or_else(|| Error::invalid(format!("{} holds no samples", self.name)))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Unloaded,
    Loading,
    Accepted,
    Rejected(String),
}

#[derive(Debug, PartialEq)]
pub enum Completion {
    Applied(Verdict),
    Stale,
}

#[derive(Default)]
pub struct Session {
    issued: u64,
    pending: Option<(LoadToken, String)>,
    current: Option<Arc<LoadedFile>>,
    adjusted: Option<Arc<SampleBuffer>>,
    gain: Option<GainSettings>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load. Any previous file is dropped and any pending load
    /// becomes stale.
    pub fn begin_load(&mut self, name: impl Into<String>) -> LoadToken {
        self.issued += 1;
        let token = LoadToken(self.issued);
        self.pending = Some((token, name.into()));
        self.current = None;
        self.adjusted = None;
        self.gain = None;
        token
    }

    pub fn complete_load(
        &mut self,
        token: LoadToken,
        decoded: Result<DecodedAudio>,
    ) -> Result<Completion> {
        let name = match self.pending.take() {
            Some((pending, name)) if pending == token => name,
            other => {
                log::debug!("Dropping stale completion {:?}", token);
                self.pending = other;
                return Ok(Completion::Stale);
            }
        };

        let audio = match decoded {
            Ok(audio) => audio,
            Err(e) => {
                log::error!("Failed to load {}: {}", name, e);
                return Err(e);
            }
        };

        let verdict = container::validate_decoded(&audio.format, audio.sample_count());
        match &verdict {
            Verdict::Accepted => log::info!("{}: format accepted", name),
            Verdict::Rejected(reason) => log::warn!("{}: format rejected: {}", name, reason),
        }

        self.adjusted = audio.samples.clone().map(Arc::new);
        self.current = Some(Arc::new(LoadedFile {
            name,
            audio,
            verdict: verdict.clone(),
        }));
        Ok(Completion::Applied(verdict))
    }

    pub fn state(&self) -> SessionState {
        if self.pending.is_some() {
            return SessionState::Loading;
        }
        match self.current.as_deref() {
            None => SessionState::Unloaded,
            Some(LoadedFile {
                verdict: Verdict::Accepted,
                ..
            }) => SessionState::Accepted,
            Some(LoadedFile {
                verdict: Verdict::Rejected(reason),
                ..
            }) => SessionState::Rejected(reason.clone()),
        }
    }

    pub fn current(&self) -> Option<Arc<LoadedFile>> {
        self.current.clone()
    }

    pub fn gain(&self) -> Option<GainSettings> {
        self.gain
    }

    fn accepted(&self) -> Result<&Arc<LoadedFile>> {
        let file = self
            .current
            .as_ref()
            .ok_or_else(|| Error::invalid("no file loaded"))?;
        file.verdict.require_accepted()?;
        Ok(file)
    }

    /// Recompute the adjusted buffer. On failure the previous buffer stays.
    pub fn set_gain(&mut self, settings: GainSettings) -> Result<Arc<SampleBuffer>> {
        let file = self.accepted()?;
        let adjusted = Arc::new(settings.apply(file.original()?)?);
        self.adjusted = Some(Arc::clone(&adjusted));
        self.gain = Some(settings);
        Ok(adjusted)
    }

    pub fn adjusted(&self) -> Result<Arc<SampleBuffer>> {
        self.accepted()?;
        self.adjusted
            .clone()
            .ok_or_else(|| Error::invalid("no adjusted buffer"))
    }

    pub fn analyze(&self, fft: &SpectralAnalyzer, preview_len: usize) -> Result<Analysis> {
        let file = self.accepted()?;
        let buffer = self.adjusted()?;
        analysis::analyze(&buffer, file.audio.format.sample_rate, fft, preview_len)
    }
}
