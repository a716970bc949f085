pub mod fft;
pub mod gain;
pub mod level;
