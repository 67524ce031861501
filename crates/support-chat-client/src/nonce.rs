use tokio::sync::Mutex;

/// Per-session anti-forgery token.
///
/// Fetched at most once per session and reused for every mutating call until
/// the server refuses it, at which point it is invalidated and fetched again.
#[derive(Debug, Default)]
pub struct NonceCache {
    token: Mutex<Option<String>>,
}

impl NonceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a token handed over by the embedding page
    pub fn with_preset(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: Mutex::new((!token.is_empty()).then_some(token)),
        }
    }

    /// Return the cached token or run `fetch` to obtain one.
    ///
    /// The lock is held across the fetch so concurrent callers share a single
    /// request.
    pub async fn get_or_fetch<F, Fut, E>(&self, fetch: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<String, E>>,
    {
        let mut token = self.token.lock().await;
        if let Some(existing) = token.as_ref() {
            return Ok(existing.clone());
        }

        let fetched = fetch().await?;
        tracing::debug!("anti-forgery token refreshed");
        *token = Some(fetched.clone());
        Ok(fetched)
    }

    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    pub async fn current(&self) -> Option<String> {
        self.token.lock().await.clone()
    }
}
