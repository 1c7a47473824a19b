// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

/// Logs how long the enclosing scope took at trace level when dropped.
pub struct ScopeTimer {
    name: String,
    start_time: std::time::Instant,
}

impl ScopeTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_time: std::time::Instant::now(),
        }
    }
}

impl Drop for ScopeTimer {
    fn drop(&mut self) {
        let elapsed = self.start_time.elapsed();
        log::trace!("{} took {:.2?}", self.name, elapsed);
    }
}
