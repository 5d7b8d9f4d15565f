//! Process lifecycle: startup ordering lives in `main`; shutdown is a
//! broadcast any long-running task can subscribe to.

pub mod shutdown;

pub use shutdown::Shutdown;
