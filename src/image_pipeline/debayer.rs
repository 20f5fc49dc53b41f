//! Debayering module for converting Bayer pattern RAW sensor data to RGB pixel arrays

pub mod cpu_debayer;

pub use cpu_debayer::CpuDebayer;
