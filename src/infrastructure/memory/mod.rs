//! Memory Layer - In-Memory State Management
//!
//! 进程内的波形生成互斥表

mod generation_locks;

pub use generation_locks::InMemoryGenerationLocks;
