//! Small concurrency utilities shared between ISRs and the foreground loop.

pub mod isr_buf;
pub mod seq_lock;
