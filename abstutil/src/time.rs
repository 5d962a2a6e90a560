use instant::Instant;

pub fn elapsed_seconds(since: Instant) -> f64 {
    let dt = since.elapsed();
    (dt.as_secs() as f64) + (f64::from(dt.subsec_nanos()) * 1e-9)
}

pub fn prettyprint_time(seconds: f64) -> String {
    format!("{:.4}s", seconds)
}

struct TimerSpan {
    name: String,
    started_at: Instant,
    nested_time: f64,
}

/// Hierarchial magic. Wrap long-running passes in `start`/`stop` to log how long they take,
/// nested by indentation. Notes and warnings are logged immediately and summarized again when
/// the timer is dropped, so they don't get lost in the noise.
pub struct Timer {
    outermost_name: String,
    stack: Vec<TimerSpan>,
    results: Vec<String>,
    notes: Vec<String>,
    warnings: Vec<String>,
}

impl Timer {
    pub fn new<I: Into<String>>(raw_name: I) -> Timer {
        let name = raw_name.into();
        let mut t = Timer {
            outermost_name: name.clone(),
            stack: Vec::new(),
            results: Vec::new(),
            notes: Vec::new(),
            warnings: Vec::new(),
        };
        t.start(name);
        t
    }

    // TODO Shouldn't use this much.
    pub fn throwaway() -> Timer {
        Timer::new("throwaway")
    }

    pub fn start<I: Into<String>>(&mut self, raw_name: I) {
        let name = raw_name.into();
        debug!("{}{}...", "  ".repeat(self.stack.len()), name);
        self.stack.push(TimerSpan {
            name,
            started_at: Instant::now(),
            nested_time: 0.0,
        });
    }

    pub fn stop<I: Into<String>>(&mut self, raw_name: I) {
        let name = raw_name.into();
        let span = match self.stack.pop() {
            Some(span) => span,
            None => {
                warn!("Timer::stop({}) with nothing started", name);
                return;
            }
        };
        if span.name != name {
            warn!("Timer::stop({}), but {} is the current span", name, span.name);
        }
        let elapsed = elapsed_seconds(span.started_at);
        let padding = "  ".repeat(self.stack.len());
        let mut line = format!("{}- {} took {}", padding, span.name, prettyprint_time(elapsed));
        if span.nested_time != 0.0 {
            line = format!(
                "{} ({} outside nested spans)",
                line,
                prettyprint_time(elapsed - span.nested_time)
            );
        }
        debug!("{}", line);
        if let Some(parent) = self.stack.last_mut() {
            parent.nested_time += elapsed;
        }
        self.results.push(line);
    }

    /// Log immediately, but also repeat at the end.
    pub fn note<I: Into<String>>(&mut self, raw_line: I) {
        let line = raw_line.into();
        info!("{}", line);
        self.notes.push(line);
    }

    pub fn warn<I: Into<String>>(&mut self, raw_line: I) {
        let line = raw_line.into();
        warn!("{}", line);
        self.warnings.push(line);
    }

    pub fn num_warnings(&self) -> usize {
        self.warnings.len()
    }

    /// Used to end the scope of a timer early.
    pub fn done(self) {}
}

impl std::ops::Drop for Timer {
    fn drop(&mut self) {
        // Close anything left open, innermost first. The outermost span is the Timer itself.
        while let Some(span) = self.stack.last() {
            let name = span.name.clone();
            if name != self.outermost_name {
                warn!("Timer {} dropped with {} still running", self.outermost_name, name);
            }
            self.stop(name);
        }

        info!("{}", self.outermost_name);
        for line in self.results.iter().rev() {
            debug!("{}", line);
        }
        if !self.notes.is_empty() {
            info!("{} notes:", self.notes.len());
            for line in &self.notes {
                info!("  {}", line);
            }
        }
        if !self.warnings.is_empty() {
            warn!("{} warnings:", self.warnings.len());
            for line in &self.warnings {
                warn!("  {}", line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_spans() {
        let mut timer = Timer::new("outer");
        timer.start("inner");
        timer.warn("something odd");
        timer.stop("inner");
        assert_eq!(timer.num_warnings(), 1);
        assert_eq!(timer.results.len(), 1);
        assert!(timer.results[0].contains("inner took"));
    }
}
