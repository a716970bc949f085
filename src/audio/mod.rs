pub mod analysis;
pub mod container;
pub mod decode;
pub mod encode;
pub mod features;
