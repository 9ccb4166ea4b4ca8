/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

use std::time::Duration;
use std::time::Instant;

/// Log the duration of a scope when it ends, if the scope took at least
/// `min_duration_to_log`.
///
/// Returns `None` when the log level is filtered out to avoid reading the
/// clock at all.
pub struct LogScopeDuration<'a> {
    level: log::Level,
    module_path: &'a str,
    scope_name: &'a str,
    started: Instant,
    min_duration_to_log: Duration,
}

impl<'a> LogScopeDuration<'a> {
    /// Start timing a scope.
    pub fn new(
        level: log::Level,
        module_path: &'a str,
        scope_name: &'a str,
        min_duration_to_log: Duration,
    ) -> Option<Self> {
        log::log_enabled!(target: module_path, level).then(|| Self {
            level,
            module_path,
            scope_name,
            started: Instant::now(),
            min_duration_to_log,
        })
    }

    /// Time elapsed since the scope started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for LogScopeDuration<'_> {
    fn drop(&mut self) {
        let duration = self.elapsed();
        if duration >= self.min_duration_to_log {
            log::log!(target: self.module_path, self.level, "'{}' took {} µs.", self.scope_name, duration.as_micros());
        }
    }
}
