//! Snapshot record for asynchronous collaborator results

/// The `{data, loading, error}` shape every fetch is observed through.
///
/// Errors are carried as display text, never re-thrown across the
/// reconciliation boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> FetchState<T> {
    /// No fetch running and no result; the source is "not yet available".
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    /// A fetch is in flight. Any previous result is dropped wholesale; there
    /// is no incremental merge between fetches.
    pub fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }

    pub fn finish(&mut self, result: Result<T, String>) {
        self.loading = false;
        match result {
            Ok(data) => {
                self.data = Some(data);
                self.error = None;
            }
            Err(message) => {
                self.data = None;
                self.error = Some(message);
            }
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_replaces_previous_outcome() {
        let mut state = FetchState::<u32>::loading();
        assert!(state.loading);

        state.finish(Ok(7));
        assert_eq!(state.data, Some(7));
        assert!(!state.loading);
        assert!(!state.has_error());

        let mut state = FetchState::<u32>::loading();
        state.finish(Err("boom".to_string()));
        assert!(state.data.is_none());
        assert_eq!(state.error.as_deref(), Some("boom"));
    }
}
