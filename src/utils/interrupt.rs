use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Run-wide interruption flag checked by every poll loop
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route Ctrl+C into this flag
    pub fn install_ctrlc(&self) -> anyhow::Result<()> {
        let flag = self.flag.clone();
        ctrlc::set_handler(move || {
            println!("\n{} Interrupt received, aborting pending waits...", "⏹️ ".yellow());
            flag.store(true, Ordering::SeqCst);
        })?;
        Ok(())
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
