use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub context: String,
    pub error: String,
    pub kind: String,
    pub fatal: bool,
}

/// Append-only log of failures gathered while a unit of work runs. One
/// instance is scoped to process startup (fatal aborts the process) and one
/// to each run invocation (fatal aborts only that run).
#[derive(Debug, Default)]
pub struct ErrorCollection {
    errors: Vec<ErrorRecord>,
}

impl ErrorCollection {
    pub fn new() -> Self {
        ErrorCollection::default()
    }

    pub fn add(&mut self, context: &str, kind: &str, error: impl Display, fatal: bool) {
        let record = ErrorRecord {
            context: context.to_string(),
            error: error.to_string(),
            kind: kind.to_string(),
            fatal,
        };
        if fatal {
            log::error!("FATAL error in {}: {}", record.context, record.error);
        } else {
            log::warn!("Error in {}: {}", record.context, record.error);
        }
        self.errors.push(record);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_fatal_errors(&self) -> bool {
        self.errors.iter().any(|e| e.fatal)
    }

    pub fn summary(&self) -> String {
        if self.errors.is_empty() {
            return "No errors".to_string();
        }
        let mut summary = format!("Collected {} errors:\n", self.errors.len());
        for (i, e) in self.errors.iter().enumerate() {
            let marker = if e.fatal { "[FATAL] " } else { "" };
            summary.push_str(&format!(
                "{}. {}{}: {} - {}\n",
                i + 1,
                marker,
                e.context,
                e.kind,
                e.error
            ));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_has_no_errors() {
        let collection = ErrorCollection::new();
        assert!(!collection.has_errors());
        assert!(!collection.has_fatal_errors());
        assert_eq!(collection.summary(), "No errors");
    }

    #[test]
    fn fatal_flag_is_tracked_separately() {
        let mut collection = ErrorCollection::new();
        collection.add("Search stage", "SearchError", "no results", false);
        assert!(collection.has_errors());
        assert!(!collection.has_fatal_errors());

        collection.add("Configuration", "ConfigError", "missing api_keys.serper", true);
        assert!(collection.has_fatal_errors());
    }

    #[test]
    fn summary_lists_every_record_with_fatal_marker() {
        let mut collection = ErrorCollection::new();
        collection.add("Extraction", "FetchError", "timeout", false);
        collection.add("Configuration", "ConfigError", "missing key", true);
        let summary = collection.summary();
        assert!(summary.contains("Collected 2 errors"));
        assert!(summary.contains("1. Extraction: FetchError - timeout"));
        assert!(summary.contains("2. [FATAL] Configuration: ConfigError - missing key"));
    }
}
