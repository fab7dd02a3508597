/*!

A "logger" used when the `logging` feature is off. It outputs nothing but keeps the public API.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Sets the global max level so disabled messages are skipped early.
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
