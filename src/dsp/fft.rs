//! Iterative radix-2 decimation-in-time FFT.
//!
//! Tables are built once per size; `transform` takes `&self` and allocates
//! its own work arrays, so one analyzer can be shared freely between calls.

use std::f64::consts::PI;

use crate::audio::features::Spectrum;
use crate::error::{Error, Result};

pub struct SpectralAnalyzer {
    size: usize,
    /// i -> i with the low log2(size) bits reversed.
    reverse: Vec<usize>,
    /// (cos, sin) of -PI / half for half = 1, 2, 4, ... size / 2, one entry
    /// per stage. There is no entry for half = 0.
    twiddles: Vec<(f64, f64)>,
}

impl SpectralAnalyzer {
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 || !size.is_power_of_two() {
            return Err(Error::invalid(format!(
                "FFT size must be a power of two >= 2, got {}",
                size
            )));
        }

        let mut reverse = vec![0usize; size];
        let mut limit = 1;
        let mut bit = size >> 1;
        while limit < size {
            for i in 0..limit {
                reverse[i + limit] = reverse[i] + bit;
            }
            limit <<= 1;
            bit >>= 1;
        }

        let stages = size.trailing_zeros() as usize;
        let twiddles = (0..stages)
            .map(|stage| {
                let angle = -PI / (1usize << stage) as f64;
                (angle.cos(), angle.sin())
            })
            .collect();

        log::debug!("FFT tables built: size={}, stages={}", size, stages);

        Ok(Self {
            size,
            reverse,
            twiddles,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Magnitude spectrum, `2 * |X[k]| / N` for k in [0, N/2).
    pub fn transform(&self, samples: &[f64], sample_rate: u32) -> Result<Spectrum> {
        let n = self.size;
        if samples.len() != n {
            return Err(Error::SizeMismatch {
                expected: n,
                actual: samples.len(),
            });
        }

        let mut real: Vec<f64> = self.reverse.iter().map(|&r| samples[r]).collect();
        let mut imag = vec![0.0f64; n];

        let mut half = 1;
        for &(step_re, step_im) in &self.twiddles {
            let mut phase_re = 1.0f64;
            let mut phase_im = 0.0f64;

            for offset in 0..half {
                let mut i = offset;
                while i < n {
                    let j = i + half;
                    let tr = phase_re * real[j] - phase_im * imag[j];
                    let ti = phase_re * imag[j] + phase_im * real[j];

                    real[j] = real[i] - tr;
                    imag[j] = imag[i] - ti;
                    real[i] += tr;
                    imag[i] += ti;

                    i += half << 1;
                }

                let tmp = phase_re;
                phase_re = tmp * step_re - phase_im * step_im;
                phase_im = tmp * step_im + phase_im * step_re;
            }

            half <<= 1;
        }
        debug_assert_eq!(half, n);

        let scale = 2.0 / n as f64;
        let magnitudes = real[..n / 2]
            .iter()
            .zip(&imag[..n / 2])
            .map(|(&re, &im)| scale * (re * re + im * im).sqrt())
            .collect();

        Ok(Spectrum {
            magnitudes,
            sample_rate,
            fft_size: n,
        })
    }
}
